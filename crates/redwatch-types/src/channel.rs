use serde::{Deserialize, Serialize};

/// 告警通道类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    /// 邮件
    Email,
    /// 企业微信群机器人
    WeChatWebhook,
    /// 钉钉群机器人
    DingTalkWebhook,
    /// 企业微信应用消息
    WeChatApp,
}

impl ChannelType {
    pub const ALL: [ChannelType; 4] = [
        ChannelType::Email,
        ChannelType::WeChatWebhook,
        ChannelType::DingTalkWebhook,
        ChannelType::WeChatApp,
    ];

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ChannelType::Email),
            1 => Some(ChannelType::WeChatWebhook),
            2 => Some(ChannelType::DingTalkWebhook),
            3 => Some(ChannelType::WeChatApp),
            _ => None,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            ChannelType::Email => 0,
            ChannelType::WeChatWebhook => 1,
            ChannelType::DingTalkWebhook => 2,
            ChannelType::WeChatApp => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Email => "email",
            ChannelType::WeChatWebhook => "wechat_webhook",
            ChannelType::DingTalkWebhook => "dingtalk_webhook",
            ChannelType::WeChatApp => "wechat_app",
        }
    }
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 告警通道
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertChannel {
    pub channel_id: i64,

    #[serde(default)]
    pub channel_name: String,

    /// 通道类型编码，见 [`ChannelType`]
    pub channel_type: i32,

    /// 投递配置，由对应的通知器解析
    #[serde(default)]
    pub config: serde_json::Value,
}

impl AlertChannel {
    pub fn new(channel_id: i64, channel_type: ChannelType, config: serde_json::Value) -> Self {
        Self {
            channel_id,
            channel_name: format!("{}-{}", channel_type, channel_id),
            channel_type: channel_type.code(),
            config,
        }
    }

    pub fn kind(&self) -> Option<ChannelType> {
        ChannelType::from_code(self.channel_type)
    }
}
