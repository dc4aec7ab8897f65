use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

/// 节点指标
///
/// 规则中的 `alert_key` 在加载时解析为该枚举，评估时直接按键查表。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKey {
    ResponseTime,
    ConnectedClients,
    ClientLongestOutputList,
    ClientBiggestInputBuf,
    BlockedClients,
    UsedMemory,
    UsedMemoryRss,
    UsedMemoryOverhead,
    UsedMemoryDataset,
    UsedMemoryDatasetPerc,
    MemFragmentationRatio,
    ConnectionsReceived,
    RejectedConnections,
    CommandsProcessed,
    InstantaneousOpsPerSec,
    TotalNetInputBytes,
    TotalNetOutputBytes,
    InstantaneousInputKbps,
    InstantaneousOutputKbps,
    SyncFull,
    SyncPartialOk,
    SyncPartialErr,
    KeyspaceHits,
    KeyspaceMisses,
    KeyspaceHitsRatio,
    ExpiredKeys,
    EvictedKeys,
    UsedCpuSys,
    UsedCpuUser,
    Keys,
    Expires,
}

const METRIC_NAMES: &[(&str, MetricKey)] = &[
    ("response_time", MetricKey::ResponseTime),
    ("connected_clients", MetricKey::ConnectedClients),
    ("client_longest_output_list", MetricKey::ClientLongestOutputList),
    ("client_biggest_input_buf", MetricKey::ClientBiggestInputBuf),
    ("blocked_clients", MetricKey::BlockedClients),
    ("used_memory", MetricKey::UsedMemory),
    ("used_memory_rss", MetricKey::UsedMemoryRss),
    ("used_memory_overhead", MetricKey::UsedMemoryOverhead),
    ("used_memory_dataset", MetricKey::UsedMemoryDataset),
    ("used_memory_dataset_perc", MetricKey::UsedMemoryDatasetPerc),
    ("mem_fragmentation_ratio", MetricKey::MemFragmentationRatio),
    ("connections_received", MetricKey::ConnectionsReceived),
    ("rejected_connections", MetricKey::RejectedConnections),
    ("commands_processed", MetricKey::CommandsProcessed),
    ("instantaneous_ops_per_sec", MetricKey::InstantaneousOpsPerSec),
    ("total_net_input_bytes", MetricKey::TotalNetInputBytes),
    ("total_net_output_bytes", MetricKey::TotalNetOutputBytes),
    ("instantaneous_input_kbps", MetricKey::InstantaneousInputKbps),
    ("instantaneous_output_kbps", MetricKey::InstantaneousOutputKbps),
    ("sync_full", MetricKey::SyncFull),
    ("sync_partial_ok", MetricKey::SyncPartialOk),
    ("sync_partial_err", MetricKey::SyncPartialErr),
    ("keyspace_hits", MetricKey::KeyspaceHits),
    ("keyspace_misses", MetricKey::KeyspaceMisses),
    ("keyspace_hits_ratio", MetricKey::KeyspaceHitsRatio),
    ("expired_keys", MetricKey::ExpiredKeys),
    ("evicted_keys", MetricKey::EvictedKeys),
    ("used_cpu_sys", MetricKey::UsedCpuSys),
    ("used_cpu_user", MetricKey::UsedCpuUser),
    ("keys", MetricKey::Keys),
    ("expires", MetricKey::Expires),
];

impl MetricKey {
    /// 解析指标名，同时接受 `used_memory` 与 `usedMemory` 两种写法
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = to_snake_case(name.trim());
        METRIC_NAMES
            .iter()
            .find(|(n, _)| *n == normalized)
            .map(|(_, key)| *key)
    }

    pub fn as_str(&self) -> &'static str {
        METRIC_NAMES
            .iter()
            .find(|(_, key)| key == self)
            .map(|(n, _)| *n)
            .unwrap_or("unknown")
    }

    pub fn all() -> impl Iterator<Item = MetricKey> {
        METRIC_NAMES.iter().map(|(_, key)| *key)
    }
}

impl std::fmt::Display for MetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MetricKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MetricKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        MetricKey::from_name(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown metric: {}", name)))
    }
}

fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// 数据粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    #[default]
    Node,
    Cluster,
}

/// 时间粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeType {
    #[default]
    Minute,
    Hour,
    Day,
}

/// 节点指标快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// 节点地址，如 `10.0.0.1:6379`
    pub node: String,
    pub cluster_id: i64,
    #[serde(default)]
    pub data_type: DataType,
    #[serde(default)]
    pub time_type: TimeType,
    pub update_time: DateTime<Utc>,
    #[serde(default)]
    pub metrics: HashMap<MetricKey, f64>,
}

impl NodeInfo {
    pub fn new(node: impl Into<String>, cluster_id: i64) -> Self {
        Self {
            node: node.into(),
            cluster_id,
            data_type: DataType::Node,
            time_type: TimeType::Minute,
            update_time: Utc::now(),
            metrics: HashMap::new(),
        }
    }

    pub fn with_metric(mut self, key: MetricKey, value: f64) -> Self {
        self.metrics.insert(key, value);
        self
    }

    pub fn metric(&self, key: MetricKey) -> Option<f64> {
        self.metrics.get(&key).copied()
    }
}
