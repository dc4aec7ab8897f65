use chrono::{DateTime, Utc};
use redwatch_types::{AlertRecord, AlertRule, Cluster, Group, NodeInfo};

/// 告警记录构建器
pub struct AlertRecordBuilder;

impl AlertRecordBuilder {
    /// 由一次命中构建告警记录
    pub fn build(
        group: &Group,
        cluster: &Cluster,
        node: &NodeInfo,
        rule: &AlertRule,
        observed: f64,
        now: DateTime<Utc>,
    ) -> AlertRecord {
        AlertRecord {
            record_id: None,
            group_id: group.group_id,
            group_name: group.group_name.clone(),
            cluster_id: cluster.cluster_id,
            cluster_name: cluster.cluster_name.clone(),
            redis_node: node.node.clone(),
            alert_rule: Self::rule_text(rule),
            actual_data: Self::actual_text(rule, observed),
            global: rule.global,
            rule_info: rule.rule_info.clone(),
            update_time: now,
        }
    }

    /// `<key><compare code><threshold>`，如 `used_memory1100`
    pub fn rule_text(rule: &AlertRule) -> String {
        format!("{}{}{}", rule.alert_key, rule.compare_type, rule.alert_value)
    }

    pub fn actual_text(rule: &AlertRule, observed: f64) -> String {
        format!("{}={}", rule.alert_key, observed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redwatch_types::{CompareOp, MetricKey};

    #[test]
    fn test_build_record() {
        let group = Group::new(1, "prod");
        let cluster = Cluster::new(10, 1, "cache-a");
        let node = NodeInfo::new("10.0.0.1:6379", 10).with_metric(MetricKey::UsedMemory, 50.0);
        let mut rule = AlertRule::new(3, "usedMemory", CompareOp::Greater, 100.0)
            .with_rule_info("memory too low");
        rule.global = true;
        let now = Utc::now();

        let record = AlertRecordBuilder::build(&group, &cluster, &node, &rule, 50.0, now);

        assert_eq!(record.alert_rule, "usedMemory1100");
        assert_eq!(record.actual_data, "usedMemory=50");
        assert_eq!(record.group_name, "prod");
        assert_eq!(record.cluster_name, "cache-a");
        assert_eq!(record.redis_node, "10.0.0.1:6379");
        assert!(record.global);
        assert_eq!(record.rule_info, "memory too low");
        assert_eq!(record.update_time, now);
        assert!(record.record_id.is_none());
    }

    #[test]
    fn test_rule_text_keeps_fraction() {
        let rule = AlertRule::new(1, "mem_fragmentation_ratio", CompareOp::Less, 1.5);
        assert_eq!(AlertRecordBuilder::rule_text(&rule), "mem_fragmentation_ratio-11.5");
    }
}
