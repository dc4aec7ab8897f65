use crate::prepared::PreparedRule;
use chrono::{DateTime, Utc};
use redwatch_types::{CompareOp, NodeInfo};
use serde::{Deserialize, Serialize};

/// 相等/不等比较的基准
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EqualityBasis {
    /// 实际值与阈值比较
    #[default]
    Threshold,
    /// 实际值与自身比较（旧行为：相等恒成立，不等恒不成立）
    Observed,
}

/// 规则评估器，纯函数，不修改规则
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEvaluator {
    equality: EqualityBasis,
}

impl RuleEvaluator {
    pub fn new(equality: EqualityBasis) -> Self {
        Self { equality }
    }

    pub fn equality_basis(&self) -> EqualityBasis {
        self.equality
    }

    /// 评估单个节点快照，命中时返回实际值
    pub fn evaluate(&self, node: &NodeInfo, rule: &PreparedRule, now: DateTime<Utc>) -> Option<f64> {
        if !rule.rule.status {
            return None;
        }

        // 未到检测时间
        if !rule.rule.cycle_elapsed(now) {
            return None;
        }

        // 该节点没有此指标
        let observed = node.metric(rule.metric?)?;

        if self.compare(rule.op?, rule.rule.alert_value, observed) {
            Some(observed)
        } else {
            None
        }
    }

    pub fn matches(&self, node: &NodeInfo, rule: &PreparedRule, now: DateTime<Utc>) -> bool {
        self.evaluate(node, rule, now).is_some()
    }

    /// 大于：阈值 > 实际值；小于：阈值 < 实际值
    pub fn compare(&self, op: CompareOp, threshold: f64, observed: f64) -> bool {
        let basis = match self.equality {
            EqualityBasis::Threshold => threshold,
            EqualityBasis::Observed => observed,
        };

        match op {
            CompareOp::Equal => basis == observed,
            CompareOp::NotEqual => basis != observed,
            CompareOp::Greater => threshold > observed,
            CompareOp::Less => threshold < observed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use redwatch_types::{AlertRule, MetricKey};

    fn rule(op: CompareOp, threshold: f64) -> PreparedRule {
        PreparedRule::prepare(
            AlertRule::new(1, "used_memory", op, threshold)
                .with_check_cycle(5)
                .with_last_check_time(Utc::now() - Duration::minutes(6)),
        )
    }

    fn node(used_memory: f64) -> NodeInfo {
        NodeInfo::new("10.0.0.1:6379", 1).with_metric(MetricKey::UsedMemory, used_memory)
    }

    #[test]
    fn test_disabled_rule_never_matches() {
        let evaluator = RuleEvaluator::default();
        let mut prepared = rule(CompareOp::Greater, 100.0);
        prepared.rule.status = false;

        for value in [-1.0, 0.0, 50.0, 100.0, 1e12] {
            assert!(!evaluator.matches(&node(value), &prepared, Utc::now()));
        }
    }

    #[test]
    fn test_throttled_rule_never_matches() {
        let evaluator = RuleEvaluator::default();
        let now = Utc::now();
        let mut prepared = rule(CompareOp::Greater, 100.0);
        prepared.rule.last_check_time = now - Duration::minutes(1);

        assert!(!evaluator.matches(&node(50.0), &prepared, now));

        prepared.rule.last_check_time = now - Duration::minutes(5);
        assert!(evaluator.matches(&node(50.0), &prepared, now));
    }

    #[test]
    fn test_missing_metric_is_no_match() {
        let evaluator = RuleEvaluator::default();
        let prepared = rule(CompareOp::Greater, 100.0);
        let info = NodeInfo::new("10.0.0.1:6379", 1).with_metric(MetricKey::Keys, 1.0);

        assert!(!evaluator.matches(&info, &prepared, Utc::now()));
    }

    #[test]
    fn test_unknown_key_and_operator() {
        let evaluator = RuleEvaluator::default();

        let mut unknown_key = AlertRule::new(1, "no_such_metric", CompareOp::Greater, 100.0);
        unknown_key.check_cycle = 0;
        assert!(!evaluator.matches(&node(50.0), &PreparedRule::prepare(unknown_key), Utc::now()));

        let mut unknown_op = AlertRule::new(2, "used_memory", CompareOp::Greater, 100.0);
        unknown_op.check_cycle = 0;
        unknown_op.compare_type = 7;
        assert!(!evaluator.matches(&node(50.0), &PreparedRule::prepare(unknown_op), Utc::now()));
    }

    #[test]
    fn test_greater_and_less_direction() {
        let evaluator = RuleEvaluator::default();

        // 阈值大于实际值时命中
        assert!(evaluator.compare(CompareOp::Greater, 100.0, 50.0));
        assert!(!evaluator.compare(CompareOp::Greater, 100.0, 100.0));
        assert!(!evaluator.compare(CompareOp::Greater, 100.0, 150.0));

        assert!(evaluator.compare(CompareOp::Less, 100.0, 150.0));
        assert!(!evaluator.compare(CompareOp::Less, 100.0, 100.0));
        assert!(!evaluator.compare(CompareOp::Less, 100.0, 50.0));
    }

    #[test]
    fn test_equality_uses_threshold() {
        let evaluator = RuleEvaluator::new(EqualityBasis::Threshold);

        assert!(evaluator.compare(CompareOp::Equal, 0.1, 0.1));
        assert!(!evaluator.compare(CompareOp::Equal, 100.0, 50.0));
        assert!(evaluator.compare(CompareOp::NotEqual, 100.0, 50.0));
        assert!(!evaluator.compare(CompareOp::NotEqual, 42.0, 42.0));
    }

    #[test]
    fn test_observed_basis_reproduces_self_comparison() {
        let evaluator = RuleEvaluator::new(EqualityBasis::Observed);

        assert!(evaluator.compare(CompareOp::Equal, 100.0, 50.0));
        assert!(!evaluator.compare(CompareOp::NotEqual, 100.0, 50.0));
        // 大于/小于不受影响
        assert!(evaluator.compare(CompareOp::Greater, 100.0, 50.0));
    }

    #[test]
    fn test_evaluate_returns_observed_value() {
        let evaluator = RuleEvaluator::default();
        let prepared = rule(CompareOp::Greater, 100.0);

        assert_eq!(evaluator.evaluate(&node(50.0), &prepared, Utc::now()), Some(50.0));
        assert_eq!(evaluator.evaluate(&node(150.0), &prepared, Utc::now()), None);
    }
}
