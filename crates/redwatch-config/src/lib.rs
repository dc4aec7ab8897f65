pub mod app;
pub mod loader;

pub use app::{AlertConfig, AppConfig, LoggingConfig, PoolConfig, SeedConfig};
pub use loader::ConfigLoader;
