use anyhow::Result;
use tokio::signal;
use tokio::sync::{broadcast, watch};
use tracing::info;

/// 关闭信号类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGTERM
    Term,

    /// SIGINT - Ctrl+C
    Interrupt,

    /// 手动触发
    Manual,
}

/// 信号处理器
///
/// 手动触发会保留状态，`wait` 晚于触发调用时也能立即返回。
pub struct SignalHandler {
    shutdown_tx: broadcast::Sender<ShutdownSignal>,
    triggered: watch::Sender<bool>,
}

impl SignalHandler {
    pub fn new() -> (Self, broadcast::Receiver<ShutdownSignal>) {
        let (tx, rx) = broadcast::channel(16);
        let (triggered, _) = watch::channel(false);
        (
            Self {
                shutdown_tx: tx,
                triggered,
            },
            rx,
        )
    }

    pub fn is_triggered(&self) -> bool {
        *self.triggered.borrow()
    }

    /// 等待系统信号或手动触发
    #[cfg(unix)]
    pub async fn wait(&self) -> Result<ShutdownSignal> {
        use signal::unix::{signal, SignalKind};

        let mut manual = self.triggered.subscribe();
        if *manual.borrow_and_update() {
            return Ok(ShutdownSignal::Manual);
        }

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        let received = tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
                ShutdownSignal::Term
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
                ShutdownSignal::Interrupt
            }
            _ = manual.changed() => return Ok(ShutdownSignal::Manual),
        };

        let _ = self.shutdown_tx.send(received);
        Ok(received)
    }

    #[cfg(not(unix))]
    pub async fn wait(&self) -> Result<ShutdownSignal> {
        let mut manual = self.triggered.subscribe();
        if *manual.borrow_and_update() {
            return Ok(ShutdownSignal::Manual);
        }

        tokio::select! {
            result = signal::ctrl_c() => {
                result?;
                info!("Received Ctrl+C");
                let _ = self.shutdown_tx.send(ShutdownSignal::Interrupt);
                Ok(ShutdownSignal::Interrupt)
            }
            _ = manual.changed() => Ok(ShutdownSignal::Manual),
        }
    }

    /// 手动触发关闭
    pub fn trigger_shutdown(&self) {
        info!("Manual shutdown triggered");
        self.triggered.send_replace(true);
        let _ = self.shutdown_tx.send(ShutdownSignal::Manual);
    }

    /// 订阅关闭信号
    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownSignal> {
        self.shutdown_tx.subscribe()
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new().0
    }
}
