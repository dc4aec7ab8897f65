use redwatch_alert::EqualityBasis;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 应用配置
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub alert: AlertConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

/// 告警调度配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlertConfig {
    /// 告警记录保留天数
    #[serde(default = "default_data_keep_days")]
    pub data_keep_days: u32,

    /// 告警评估 Cron 表达式，为空表示不启用
    #[serde(default)]
    pub collect_cron: String,

    /// 记录清理 Cron 表达式，为空表示不启用
    #[serde(default)]
    pub cleanup_cron: String,

    /// 相等/不等比较的基准
    #[serde(default)]
    pub equality_basis: EqualityBasis,

    /// 单个分组任务的超时时间（秒）
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,
}

/// 工作池配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolConfig {
    /// 最大并发任务数
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// 关闭时等待在途任务的时间（秒）
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 输出 JSON 格式日志
    #[serde(default)]
    pub json: bool,
}

/// 内存存储的种子数据
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SeedConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// 默认值函数
fn default_data_keep_days() -> u32 {
    15
}

fn default_task_timeout_secs() -> u64 {
    300
}

fn default_max_workers() -> usize {
    5
}

fn default_drain_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AlertConfig {
    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }

    pub fn collect_enabled(&self) -> bool {
        !self.collect_cron.trim().is_empty()
    }

    pub fn cleanup_enabled(&self) -> bool {
        !self.cleanup_cron.trim().is_empty()
    }
}

impl PoolConfig {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

// Default trait 实现
impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            data_keep_days: default_data_keep_days(),
            collect_cron: String::new(),
            cleanup_cron: String::new(),
            equality_basis: EqualityBasis::default(),
            task_timeout_secs: default_task_timeout_secs(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
