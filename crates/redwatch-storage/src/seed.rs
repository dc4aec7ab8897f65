use anyhow::{anyhow, Context, Result};
use redwatch_types::{AlertChannel, AlertRule, Cluster, Group, NodeInfo};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 种子数据，用于初始化内存存储
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub clusters: Vec<Cluster>,
    #[serde(default)]
    pub rules: Vec<AlertRule>,
    #[serde(default)]
    pub channels: Vec<AlertChannel>,
    #[serde(default)]
    pub node_infos: Vec<NodeInfo>,
}

impl Seed {
    /// 按扩展名加载 `.json` 或 `.toml` 种子文件
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some("toml") => Ok(toml::from_str(&content)?),
            other => Err(anyhow!("Unsupported seed format: {:?}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redwatch_types::MetricKey;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_toml_seed() {
        let temp_dir = tempdir().unwrap();
        let content = r#"
[[groups]]
group_id = 1
group_name = "prod"

[[clusters]]
cluster_id = 10
group_id = 1
cluster_name = "cache-a"
rule_ids = "1"
channel_ids = "1"

[[rules]]
rule_id = 1
alert_key = "used_memory"
alert_value = 100.0
compare_type = 1
check_cycle = 5
last_check_time = "2024-01-01T00:00:00Z"
status = true

[[channels]]
channel_id = 1
channel_type = 1
config = { webhook_url = "https://example.com/hook" }

[[node_infos]]
node = "10.0.0.1:6379"
cluster_id = 10
update_time = "2024-01-01T00:00:00Z"
metrics = { used_memory = 50.0 }
"#;
        let path = temp_dir.path().join("seed.toml");
        fs::write(&path, content).unwrap();

        let seed = Seed::load(&path).unwrap();
        assert_eq!(seed.groups.len(), 1);
        assert_eq!(seed.clusters[0].rule_id_list(), vec![1]);
        assert_eq!(seed.rules[0].alert_value, 100.0);
        assert_eq!(
            seed.channels[0].config["webhook_url"],
            "https://example.com/hook"
        );
        assert_eq!(seed.node_infos[0].metric(MetricKey::UsedMemory), Some(50.0));
    }

    #[test]
    fn test_load_json_seed() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("seed.json");
        fs::write(&path, r#"{"groups":[{"group_id":1,"group_name":"prod"}]}"#).unwrap();

        let seed = Seed::load(&path).unwrap();
        assert_eq!(seed.groups[0].group_name, "prod");
        assert!(seed.rules.is_empty());
    }

    #[test]
    fn test_unsupported_extension() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("seed.yaml");
        fs::write(&path, "groups: []").unwrap();

        assert!(Seed::load(&path).is_err());
    }
}
