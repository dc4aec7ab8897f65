use redwatch_types::{AlertChannel, ChannelType};
use std::collections::BTreeMap;
use tracing::debug;

/// 按通道类型分组后的通道
#[derive(Debug, Clone, Default)]
pub struct ChannelClassification {
    by_type: BTreeMap<ChannelType, Vec<AlertChannel>>,
}

impl ChannelClassification {
    /// 指定类型的通道，没有时为空切片
    pub fn get(&self, channel_type: ChannelType) -> &[AlertChannel] {
        self.by_type
            .get(&channel_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    /// 通道总数
    pub fn len(&self) -> usize {
        self.by_type.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChannelType, &[AlertChannel])> {
        self.by_type.iter().map(|(ty, chans)| (*ty, chans.as_slice()))
    }
}

/// 通道分类器
pub struct ChannelClassifier;

impl ChannelClassifier {
    /// 按类型分组，未知类型的通道直接忽略
    pub fn classify(channels: Vec<AlertChannel>) -> ChannelClassification {
        let mut by_type: BTreeMap<ChannelType, Vec<AlertChannel>> = BTreeMap::new();

        for channel in channels {
            match channel.kind() {
                Some(ty) => by_type.entry(ty).or_default().push(channel),
                None => {
                    debug!(
                        channel_id = channel.channel_id,
                        channel_type = channel.channel_type,
                        "Ignoring channel with unknown type"
                    );
                }
            }
        }

        ChannelClassification { by_type }
    }
}
