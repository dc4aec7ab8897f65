pub mod app;
pub mod logging;
pub mod signal;

pub use app::App;
pub use signal::{ShutdownSignal, SignalHandler};
