use crate::ids::parse_id_list;
use serde::{Deserialize, Serialize};

/// 集群分组
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub group_id: i64,
    pub group_name: String,
}

impl Group {
    pub fn new(group_id: i64, group_name: impl Into<String>) -> Self {
        Self {
            group_id,
            group_name: group_name.into(),
        }
    }
}

/// Redis 集群
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub cluster_id: i64,

    pub group_id: i64,

    pub cluster_name: String,

    /// 告警规则 ID 列表（逗号分隔）
    #[serde(default)]
    pub rule_ids: String,

    /// 告警通道 ID 列表（逗号分隔）
    #[serde(default)]
    pub channel_ids: String,
}

impl Cluster {
    pub fn new(cluster_id: i64, group_id: i64, cluster_name: impl Into<String>) -> Self {
        Self {
            cluster_id,
            group_id,
            cluster_name: cluster_name.into(),
            rule_ids: String::new(),
            channel_ids: String::new(),
        }
    }

    pub fn with_rule_ids(mut self, rule_ids: impl Into<String>) -> Self {
        self.rule_ids = rule_ids.into();
        self
    }

    pub fn with_channel_ids(mut self, channel_ids: impl Into<String>) -> Self {
        self.channel_ids = channel_ids.into();
        self
    }

    pub fn rule_id_list(&self) -> Vec<i64> {
        parse_id_list(&self.rule_ids)
    }

    pub fn channel_id_list(&self) -> Vec<i64> {
        parse_id_list(&self.channel_ids)
    }
}
