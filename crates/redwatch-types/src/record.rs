use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 告警记录，创建后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    /// 由记录存储在写入时分配
    #[serde(default)]
    pub record_id: Option<i64>,
    pub group_id: i64,
    pub group_name: String,
    pub cluster_id: i64,
    pub cluster_name: String,
    pub redis_node: String,
    pub alert_rule: String,
    pub actual_data: String,
    pub global: bool,
    pub rule_info: String,
    pub update_time: DateTime<Utc>,
}
