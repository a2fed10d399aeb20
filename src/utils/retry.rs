//! 固定间隔的有界重试

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

/// 重试策略：最多 `max_attempts` 次，两次之间等待固定的 `delay`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// 执行 `op`，失败且 `is_retryable` 为真时等待后重试
    ///
    /// `op` 的参数为当前尝试次数（从 1 开始）。返回最后一次的错误。
    pub async fn run<T, E, F, Fut>(
        &self,
        label: &str,
        mut op: F,
        is_retryable: impl Fn(&E) -> bool,
    ) -> Result<T, E>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if attempt >= self.max_attempts || !is_retryable(&e) {
                        warn!("{} 第 {} 次尝试失败，不再重试: {}", label, attempt, e);
                        return Err(e);
                    }
                    warn!(
                        "{} 第 {}/{} 次尝试失败: {}",
                        label, attempt, self.max_attempts, e
                    );
                    info!("等待 {:?} 后重试...", self.delay);
                    sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
