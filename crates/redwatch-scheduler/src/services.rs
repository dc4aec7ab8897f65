use redwatch_notify::NotificationDispatcher;
use redwatch_storage::{
    ChannelStore, ClusterStore, GroupStore, NodeInfoStore, RecordStore, RuleStore,
};
use std::sync::Arc;

/// 告警任务依赖的外部协作者
#[derive(Clone)]
pub struct AlertServices {
    pub groups: Arc<dyn GroupStore>,
    pub clusters: Arc<dyn ClusterStore>,
    pub rules: Arc<dyn RuleStore>,
    pub channels: Arc<dyn ChannelStore>,
    pub node_infos: Arc<dyn NodeInfoStore>,
    pub records: Arc<dyn RecordStore>,
    pub dispatcher: Arc<NotificationDispatcher>,
}

impl AlertServices {
    /// 所有存储接口由同一个实现提供
    pub fn from_store<S>(store: Arc<S>, dispatcher: Arc<NotificationDispatcher>) -> Self
    where
        S: GroupStore + ClusterStore + RuleStore + ChannelStore + NodeInfoStore + RecordStore + 'static,
    {
        Self {
            groups: store.clone(),
            clusters: store.clone(),
            rules: store.clone(),
            channels: store.clone(),
            node_infos: store.clone(),
            records: store,
            dispatcher,
        }
    }
}
