use anyhow::{anyhow, Result};
use config::{Config, Environment, File, FileFormat};
use std::path::{Path, PathBuf};

use crate::AppConfig;

/// 保留天数上限（约 100 年）
pub const MAX_DATA_KEEP_DAYS: u32 = 36_500;

/// 配置加载器
///
/// 文件不存在时使用默认配置，环境变量 `REDWATCH__SECTION__KEY` 覆盖文件中的值。
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    pub fn new<P: AsRef<Path>>(config_path: P) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self) -> Result<AppConfig> {
        let mut builder = Config::builder();

        if self.config_path.exists() {
            builder = builder.add_source(File::new(
                self.config_path
                    .to_str()
                    .ok_or_else(|| anyhow!("Invalid config path"))?,
                FileFormat::Toml,
            ));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("REDWATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app: AppConfig = config.try_deserialize()?;
        Self::validate(&app)?;
        Ok(app)
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<()> {
        if config.pool.max_workers == 0 {
            return Err(anyhow!("pool.max_workers must be greater than 0"));
        }

        if config.alert.data_keep_days == 0 || config.alert.data_keep_days > MAX_DATA_KEEP_DAYS {
            return Err(anyhow!(
                "alert.data_keep_days must be between 1 and {}",
                MAX_DATA_KEEP_DAYS
            ));
        }

        if config.alert.task_timeout_secs == 0 {
            return Err(anyhow!("alert.task_timeout_secs must be greater than 0"));
        }

        for (name, expr) in [
            ("alert.collect_cron", &config.alert.collect_cron),
            ("alert.cleanup_cron", &config.alert.cleanup_cron),
        ] {
            let fields = expr.split_whitespace().count();
            if fields != 0 && fields != 6 && fields != 7 {
                return Err(anyhow!(
                    "{} must have 6 or 7 fields (sec min hour day month weekday [year]), got {}",
                    name,
                    fields
                ));
            }
        }

        Ok(())
    }
}
