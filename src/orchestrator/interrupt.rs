//! 中断信号
//!
//! 唯一的取消机制。编排器在步骤之间轮询 `is_raised`，
//! 在"保持会话打开"状态下 `wait` 等待

use std::future::Future;
use std::io;

use tokio::sync::watch;
use tracing::warn;

/// 触发端
#[derive(Debug)]
pub struct InterruptTrigger {
    tx: watch::Sender<bool>,
}

impl InterruptTrigger {
    pub fn raise(&self) {
        // 接收端全部释放时无需通知
        let _ = self.tx.send(true);
    }
}

/// 接收端
#[derive(Debug, Clone)]
pub struct Interrupt {
    rx: watch::Receiver<bool>,
}

impl Interrupt {
    /// 手动触发的中断（测试或嵌入使用）
    pub fn channel() -> (InterruptTrigger, Interrupt) {
        let (tx, rx) = watch::channel(false);
        (InterruptTrigger { tx }, Interrupt { rx })
    }

    /// 由 Ctrl+C 触发的中断，需要在 tokio 运行时内调用
    pub fn ctrl_c() -> Self {
        Self::from_signal(tokio::signal::ctrl_c())
    }

    /// 信号完成时触发中断
    ///
    /// 监听失败时触发端保持存活，`wait` 不会因此提前返回
    pub fn from_signal<F>(signal: F) -> Self
    where
        F: Future<Output = io::Result<()>> + Send + 'static,
    {
        let (trigger, interrupt) = Self::channel();
        tokio::spawn(async move {
            match signal.await {
                Ok(()) => {
                    warn!("\n⚠️ Bot interrupted by user");
                    trigger.raise();
                }
                Err(e) => {
                    warn!("⚠️ 无法监听 Ctrl+C: {}", e);
                    std::future::pending::<()>().await;
                    drop(trigger);
                }
            }
        });
        interrupt
    }

    pub fn is_raised(&self) -> bool {
        *self.rx.borrow()
    }

    /// 等待中断
    ///
    /// 触发端被释放（无法再触发）时立即返回
    pub async fn wait(&mut self) {
        let _ = self.rx.wait_for(|raised| *raised).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_returns_after_raise() {
        let (trigger, mut interrupt) = Interrupt::channel();
        assert!(!interrupt.is_raised());

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.raise();
        });

        tokio::time::timeout(Duration::from_secs(2), interrupt.wait())
            .await
            .expect("中断应在超时前到达");
        assert!(interrupt.is_raised());
    }

    #[tokio::test]
    async fn test_wait_returns_when_trigger_dropped() {
        let (trigger, mut interrupt) = Interrupt::channel();
        drop(trigger);
        tokio::time::timeout(Duration::from_secs(2), interrupt.wait())
            .await
            .expect("触发端释放后不应一直阻塞");
        assert!(!interrupt.is_raised());
    }

    #[tokio::test]
    async fn test_failed_signal_listener_keeps_session_waiting() {
        let mut interrupt = Interrupt::from_signal(async {
            Err::<(), _>(io::Error::new(io::ErrorKind::Other, "no signal handler"))
        });

        let waited = tokio::time::timeout(Duration::from_millis(100), interrupt.wait()).await;
        assert!(waited.is_err(), "监听失败时不应结束等待");
        assert!(!interrupt.is_raised());
    }

    #[tokio::test]
    async fn test_signal_raises_interrupt() {
        let mut interrupt = Interrupt::from_signal(async { Ok::<(), io::Error>(()) });
        tokio::time::timeout(Duration::from_secs(2), interrupt.wait())
            .await
            .expect("信号到达后应结束等待");
        assert!(interrupt.is_raised());
    }
}
