//! 告警引擎依赖的外部存储接口

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redwatch_types::{
    AlertChannel, AlertRecord, AlertRule, Cluster, DataType, Group, NodeInfo, TimeType,
};

#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn list_groups(&self) -> Result<Vec<Group>>;
}

#[async_trait]
pub trait ClusterStore: Send + Sync {
    /// 按分组列出集群，保持列表顺序
    async fn clusters_by_group(&self, group_id: i64) -> Result<Vec<Cluster>>;
}

#[async_trait]
pub trait RuleStore: Send + Sync {
    /// 按 ID 列表顺序返回存在的规则
    async fn rules_by_ids(&self, rule_ids: &[i64]) -> Result<Vec<AlertRule>>;

    /// 批量更新规则的上次检测时间
    async fn update_last_check_time(&self, rule_ids: &[i64], time: DateTime<Utc>) -> Result<()>;
}

#[async_trait]
pub trait ChannelStore: Send + Sync {
    async fn channels_by_ids(&self, channel_ids: &[i64]) -> Result<Vec<AlertChannel>>;
}

/// 节点快照查询条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfoQuery {
    pub cluster_id: i64,
    pub data_type: DataType,
    pub time_type: TimeType,
}

impl NodeInfoQuery {
    /// 分钟粒度的节点级快照
    pub fn latest_minute(cluster_id: i64) -> Self {
        Self {
            cluster_id,
            data_type: DataType::Node,
            time_type: TimeType::Minute,
        }
    }
}

#[async_trait]
pub trait NodeInfoStore: Send + Sync {
    /// 每个节点最近一次的快照
    async fn latest_node_infos(&self, query: &NodeInfoQuery) -> Result<Vec<NodeInfo>>;
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 追加一批记录，返回写入条数
    async fn add_records(&self, records: &[AlertRecord]) -> Result<usize>;

    /// 删除 `update_time` 早于 `earliest` 的记录，返回删除条数
    async fn delete_before(&self, earliest: DateTime<Utc>) -> Result<u64>;

    async fn delete_by_ids(&self, record_ids: &[i64]) -> Result<u64>;

    async fn records_by_cluster(&self, cluster_id: i64) -> Result<Vec<AlertRecord>>;
}
