use chrono::{DateTime, Utc};
use redwatch_types::{AlertRule, CompareOp, MetricKey};
use tracing::warn;

/// 预处理后的规则
///
/// 指标键和比较类型在加载时解析一次，评估时不再做字符串处理。
#[derive(Debug, Clone)]
pub struct PreparedRule {
    pub rule: AlertRule,
    pub metric: Option<MetricKey>,
    pub op: Option<CompareOp>,
}

impl PreparedRule {
    pub fn prepare(rule: AlertRule) -> Self {
        let metric = MetricKey::from_name(&rule.alert_key);
        if metric.is_none() {
            warn!(
                rule_id = rule.rule_id,
                alert_key = %rule.alert_key,
                "Alert rule targets an unknown metric, it will never match"
            );
        }

        let op = rule.compare_op();
        if op.is_none() {
            warn!(
                rule_id = rule.rule_id,
                compare_type = rule.compare_type,
                "Alert rule has an unknown compare type, it will never match"
            );
        }

        Self { rule, metric, op }
    }

    pub fn prepare_all(rules: Vec<AlertRule>) -> Vec<Self> {
        rules.into_iter().map(Self::prepare).collect()
    }

    pub fn rule_id(&self) -> i64 {
        self.rule.rule_id
    }

    /// 命中后刷新内存中的检测时间，同一轮后续节点按新的周期节流
    pub fn mark_checked(&mut self, now: DateTime<Utc>) {
        self.rule.last_check_time = now;
    }
}
