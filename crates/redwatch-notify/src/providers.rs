use crate::message::NotifyMessage;
use crate::notifier::{Notifier, NotifyResult};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use redwatch_types::{AlertChannel, AlertRecord, ChannelType};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{info, warn};

/// 逐个通道投递，单个通道失败只记录日志
async fn deliver_each<T, F, Fut>(
    notifier: &str,
    channels: &[AlertChannel],
    records: &[AlertRecord],
    send: F,
) -> Result<NotifyResult>
where
    T: DeserializeOwned,
    F: Fn(T, NotifyMessage) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    if channels.is_empty() || records.is_empty() {
        return Ok(NotifyResult::skipped());
    }

    let message = NotifyMessage::from_records(records);
    let mut delivered = 0;
    let mut failed = 0;

    for channel in channels {
        let target: T = match serde_json::from_value(channel.config.clone()) {
            Ok(target) => target,
            Err(e) => {
                warn!(
                    notifier,
                    channel_id = channel.channel_id,
                    error = %e,
                    "Invalid channel config"
                );
                failed += 1;
                continue;
            }
        };

        match send(target, message.clone()).await {
            Ok(()) => {
                info!(
                    notifier,
                    channel_id = channel.channel_id,
                    records = records.len(),
                    "Notification sent"
                );
                delivered += 1;
            }
            Err(e) => {
                warn!(
                    notifier,
                    channel_id = channel.channel_id,
                    error = %e,
                    "Notification failed"
                );
                failed += 1;
            }
        }
    }

    Ok(NotifyResult::from_counts(delivered, failed))
}

/// 群机器人、应用消息接口统一返回 `errcode`
async fn check_errcode(response: reqwest::Response, what: &str) -> Result<serde_json::Value> {
    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("{} failed with status: {}", what, status));
    }

    let body: serde_json::Value = response.json().await?;
    match body.get("errcode").and_then(|v| v.as_i64()) {
        None | Some(0) => Ok(body),
        Some(code) => Err(anyhow!(
            "{} failed: errcode={} errmsg={}",
            what,
            code,
            body.get("errmsg").and_then(|v| v.as_str()).unwrap_or("")
        )),
    }
}

// ============================================================================
// 邮件通知
// ============================================================================

fn default_smtp_port() -> u16 {
    465
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailTarget {
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: Vec<String>,
}

pub struct EmailNotifier;

impl EmailNotifier {
    pub fn new() -> Self {
        Self
    }

    pub fn build_email(target: &EmailTarget, message: &NotifyMessage) -> Result<lettre::Message> {
        use lettre::message::header::ContentType;

        if target.to.is_empty() {
            return Err(anyhow!("Email channel has no recipients"));
        }

        let mut builder = lettre::Message::builder()
            .from(target.from.parse()?)
            .subject(&message.title)
            .header(ContentType::TEXT_PLAIN);
        for to in &target.to {
            builder = builder.to(to.parse()?);
        }

        Ok(builder.body(message.plain.clone())?)
    }

    async fn send_one(target: EmailTarget, message: NotifyMessage) -> Result<()> {
        use lettre::transport::smtp::authentication::Credentials;
        use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

        let email = Self::build_email(&target, &message)?;
        let creds = Credentials::new(target.username.clone(), target.password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&target.smtp_host)?
            .credentials(creds)
            .port(target.smtp_port)
            .build();

        mailer.send(email).await?;
        Ok(())
    }
}

impl Default for EmailNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, channels: &[AlertChannel], records: &[AlertRecord]) -> Result<NotifyResult> {
        deliver_each(self.name(), channels, records, Self::send_one).await
    }

    fn name(&self) -> &str {
        "email"
    }

    fn channel_type(&self) -> ChannelType {
        ChannelType::Email
    }
}

// ============================================================================
// 企业微信群机器人
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookTarget {
    pub webhook_url: String,
    #[serde(default)]
    pub secret: Option<String>,
}

pub struct WeChatWebhookNotifier {
    client: reqwest::Client,
}

impl WeChatWebhookNotifier {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn build_message(message: &NotifyMessage) -> serde_json::Value {
        serde_json::json!({
            "msgtype": "markdown",
            "markdown": {
                "content": message.markdown
            }
        })
    }
}

impl Default for WeChatWebhookNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for WeChatWebhookNotifier {
    async fn notify(&self, channels: &[AlertChannel], records: &[AlertRecord]) -> Result<NotifyResult> {
        let client = &self.client;
        deliver_each(
            self.name(),
            channels,
            records,
            |target: WebhookTarget, message| async move {
                let response = client
                    .post(&target.webhook_url)
                    .json(&Self::build_message(&message))
                    .send()
                    .await?;
                check_errcode(response, "WeChat webhook").await?;
                Ok(())
            },
        )
        .await
    }

    fn name(&self) -> &str {
        "wechat_webhook"
    }

    fn channel_type(&self) -> ChannelType {
        ChannelType::WeChatWebhook
    }
}

// ============================================================================
// 钉钉群机器人
// ============================================================================

pub struct DingTalkWebhookNotifier {
    client: reqwest::Client,
}

impl DingTalkWebhookNotifier {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// 配置了加签密钥时在 URL 上附加 timestamp 与 sign
    pub fn sign_url(webhook_url: &str, secret: Option<&str>, timestamp_ms: i64) -> String {
        use base64::Engine;
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        let Some(secret) = secret.filter(|s| !s.is_empty()) else {
            return webhook_url.to_string();
        };

        let string_to_sign = format!("{}\n{}", timestamp_ms, secret);
        let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return webhook_url.to_string(),
        };
        mac.update(string_to_sign.as_bytes());
        let sign = base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());

        let separator = if webhook_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}timestamp={}&sign={}",
            webhook_url,
            separator,
            timestamp_ms,
            urlencoding::encode(&sign)
        )
    }

    pub fn build_message(message: &NotifyMessage) -> serde_json::Value {
        serde_json::json!({
            "msgtype": "markdown",
            "markdown": {
                "title": message.title,
                "text": message.markdown
            }
        })
    }
}

impl Default for DingTalkWebhookNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for DingTalkWebhookNotifier {
    async fn notify(&self, channels: &[AlertChannel], records: &[AlertRecord]) -> Result<NotifyResult> {
        let client = &self.client;
        deliver_each(
            self.name(),
            channels,
            records,
            |target: WebhookTarget, message| async move {
                let url = Self::sign_url(
                    &target.webhook_url,
                    target.secret.as_deref(),
                    chrono::Utc::now().timestamp_millis(),
                );
                let response = client
                    .post(&url)
                    .json(&Self::build_message(&message))
                    .send()
                    .await?;
                check_errcode(response, "DingTalk webhook").await?;
                Ok(())
            },
        )
        .await
    }

    fn name(&self) -> &str {
        "dingtalk_webhook"
    }

    fn channel_type(&self) -> ChannelType {
        ChannelType::DingTalkWebhook
    }
}

// ============================================================================
// 企业微信应用消息
// ============================================================================

const WECHAT_API_BASE: &str = "https://qyapi.weixin.qq.com/cgi-bin";

fn default_wechat_api_base() -> String {
    WECHAT_API_BASE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeChatAppTarget {
    pub corp_id: String,
    pub corp_secret: String,
    pub agent_id: i64,
    #[serde(default)]
    pub to_user: Option<String>,
    #[serde(default)]
    pub to_party: Option<String>,
    #[serde(default = "default_wechat_api_base")]
    pub api_base: String,
}

pub struct WeChatAppNotifier {
    client: reqwest::Client,
}

impl WeChatAppNotifier {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn build_message(target: &WeChatAppTarget, message: &NotifyMessage) -> serde_json::Value {
        let mut body = serde_json::json!({
            "msgtype": "markdown",
            "agentid": target.agent_id,
            "markdown": {
                "content": message.markdown
            }
        });

        // 未指定接收人时发给全部成员
        let to_user = match (&target.to_user, &target.to_party) {
            (Some(user), _) => Some(user.clone()),
            (None, None) => Some("@all".to_string()),
            (None, Some(_)) => None,
        };
        if let Some(user) = to_user {
            body["touser"] = serde_json::Value::String(user);
        }
        if let Some(party) = &target.to_party {
            body["toparty"] = serde_json::Value::String(party.clone());
        }

        body
    }

    async fn access_token(client: &reqwest::Client, target: &WeChatAppTarget) -> Result<String> {
        let response = client
            .get(format!("{}/gettoken", target.api_base))
            .query(&[
                ("corpid", target.corp_id.as_str()),
                ("corpsecret", target.corp_secret.as_str()),
            ])
            .send()
            .await?;
        let body = check_errcode(response, "WeChat gettoken").await?;

        body.get("access_token")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("WeChat gettoken returned no access_token"))
    }
}

impl Default for WeChatAppNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for WeChatAppNotifier {
    async fn notify(&self, channels: &[AlertChannel], records: &[AlertRecord]) -> Result<NotifyResult> {
        let client = &self.client;
        deliver_each(
            self.name(),
            channels,
            records,
            |target: WeChatAppTarget, message| async move {
                let token = Self::access_token(client, &target).await?;
                let response = client
                    .post(format!("{}/message/send", target.api_base))
                    .query(&[("access_token", token.as_str())])
                    .json(&Self::build_message(&target, &message))
                    .send()
                    .await?;
                check_errcode(response, "WeChat app message").await?;
                Ok(())
            },
        )
        .await
    }

    fn name(&self) -> &str {
        "wechat_app"
    }

    fn channel_type(&self) -> ChannelType {
        ChannelType::WeChatApp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn record() -> AlertRecord {
        AlertRecord {
            record_id: None,
            group_id: 1,
            group_name: "prod".to_string(),
            cluster_id: 10,
            cluster_name: "cache-a".to_string(),
            redis_node: "10.0.0.1:6379".to_string(),
            alert_rule: "used_memory1100".to_string(),
            actual_data: "used_memory=50".to_string(),
            global: false,
            rule_info: String::new(),
            update_time: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_empty_channels_is_noop() {
        let notifiers: Vec<Box<dyn Notifier>> = vec![
            Box::new(EmailNotifier::new()),
            Box::new(WeChatWebhookNotifier::new()),
            Box::new(DingTalkWebhookNotifier::new()),
            Box::new(WeChatAppNotifier::new()),
        ];

        for notifier in notifiers {
            let result = notifier.notify(&[], &[record()]).await.unwrap();
            assert!(result.success, "{} should no-op", notifier.name());
            assert_eq!(result.delivered, 0);
        }
    }

    #[tokio::test]
    async fn test_empty_records_is_noop() {
        let channel = AlertChannel::new(
            1,
            ChannelType::WeChatWebhook,
            json!({ "webhook_url": "http://127.0.0.1:1/hook" }),
        );
        let result = WeChatWebhookNotifier::new()
            .notify(&[channel], &[])
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.delivered + result.failed, 0);
    }

    #[tokio::test]
    async fn test_invalid_config_counts_as_failure() {
        let channel = AlertChannel::new(1, ChannelType::DingTalkWebhook, json!({ "url": 1 }));
        let result = DingTalkWebhookNotifier::new()
            .notify(&[channel], &[record()])
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.failed, 1);
    }

    #[test]
    fn test_dingtalk_sign_url() {
        let url = "https://oapi.dingtalk.com/robot/send?access_token=abc";

        assert_eq!(DingTalkWebhookNotifier::sign_url(url, None, 1), url);
        assert_eq!(DingTalkWebhookNotifier::sign_url(url, Some(""), 1), url);

        let signed = DingTalkWebhookNotifier::sign_url(url, Some("SECxyz"), 1_700_000_000_000);
        assert!(signed.starts_with("https://oapi.dingtalk.com/robot/send?access_token=abc&timestamp=1700000000000&sign="));
        let again = DingTalkWebhookNotifier::sign_url(url, Some("SECxyz"), 1_700_000_000_000);
        assert_eq!(signed, again);
    }

    #[test]
    fn test_wechat_app_recipients() {
        let message = NotifyMessage::from_records(&[record()]);
        let mut target = WeChatAppTarget {
            corp_id: "corp".to_string(),
            corp_secret: "secret".to_string(),
            agent_id: 1000002,
            to_user: None,
            to_party: None,
            api_base: default_wechat_api_base(),
        };

        let body = WeChatAppNotifier::build_message(&target, &message);
        assert_eq!(body["touser"], "@all");
        assert_eq!(body["agentid"], 1000002);

        target.to_party = Some("2".to_string());
        let body = WeChatAppNotifier::build_message(&target, &message);
        assert!(body.get("touser").is_none());
        assert_eq!(body["toparty"], "2");
    }

    #[test]
    fn test_build_email() {
        let target = EmailTarget {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 465,
            username: "alert".to_string(),
            password: "pw".to_string(),
            from: "alert@example.com".to_string(),
            to: vec!["ops@example.com".to_string(), "dba@example.com".to_string()],
        };
        let message = NotifyMessage::from_records(&[record()]);
        assert!(EmailNotifier::build_email(&target, &message).is_ok());

        let no_recipients = EmailTarget {
            to: Vec::new(),
            ..target
        };
        assert!(EmailNotifier::build_email(&no_recipients, &message).is_err());
    }
}
