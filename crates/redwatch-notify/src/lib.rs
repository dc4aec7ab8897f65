pub mod classifier;
pub mod dispatcher;
pub mod message;
pub mod notifier;
pub mod providers;

pub use classifier::{ChannelClassification, ChannelClassifier};
pub use dispatcher::{DispatchReport, NotificationDispatcher};
pub use message::NotifyMessage;
pub use notifier::{Notifier, NotifyResult};
pub use providers::{
    DingTalkWebhookNotifier, EmailNotifier, WeChatAppNotifier, WeChatWebhookNotifier,
};
