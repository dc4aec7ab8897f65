use chrono::{DateTime, Utc};
use redwatch_types::AlertRecord;
use serde::{Deserialize, Serialize};

/// 通知消息，由一批告警记录渲染而来
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyMessage {
    /// 标题
    pub title: String,

    /// Markdown 内容（群机器人、应用消息）
    pub markdown: String,

    /// 纯文本内容（邮件）
    pub plain: String,

    pub timestamp: DateTime<Utc>,
}

impl NotifyMessage {
    pub fn from_records(records: &[AlertRecord]) -> Self {
        let title = Self::title(records);

        let mut markdown = format!("### {}\n\n", title);
        let mut plain = format!("{}\n\n", title);

        for record in records {
            markdown.push_str(&format!(
                "- **{}/{}** `{}`\n  - Rule: `{}`\n  - Actual: `{}`\n  - Scope: {}\n  - Time: {}\n",
                record.group_name,
                record.cluster_name,
                record.redis_node,
                record.alert_rule,
                record.actual_data,
                Self::scope(record),
                record.update_time.format("%Y-%m-%d %H:%M:%S"),
            ));
            if !record.rule_info.is_empty() {
                markdown.push_str(&format!("  > {}\n", record.rule_info));
            }

            plain.push_str(&format!(
                "[{}/{}] {} rule={} actual={} scope={} time={}",
                record.group_name,
                record.cluster_name,
                record.redis_node,
                record.alert_rule,
                record.actual_data,
                Self::scope(record),
                record.update_time.to_rfc3339(),
            ));
            if !record.rule_info.is_empty() {
                plain.push_str(&format!(" info={}", record.rule_info));
            }
            plain.push('\n');
        }

        Self {
            title,
            markdown,
            plain,
            timestamp: Utc::now(),
        }
    }

    fn title(records: &[AlertRecord]) -> String {
        let mut clusters: Vec<&str> = records.iter().map(|r| r.cluster_name.as_str()).collect();
        clusters.dedup();

        match clusters.as_slice() {
            [] => "[redwatch] No alerts".to_string(),
            [cluster] => format!("[redwatch] {} alert(s) on {}", records.len(), cluster),
            _ => format!(
                "[redwatch] {} alert(s) on {} clusters",
                records.len(),
                clusters.len()
            ),
        }
    }

    fn scope(record: &AlertRecord) -> &'static str {
        if record.global {
            "cluster"
        } else {
            "node"
        }
    }
}
