//! 多采样生成
//!
//! 同一个提示词并发生成 K 份独立解答，按槽位顺序收集。
//! 单个槽位失败（包括 panic）不会向上传播，而是写入错误标记。

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use futures::FutureExt;
use tokio::task::JoinSet;
use tracing::{debug, error, Instrument, Span};

use crate::clients::ModelBackend;
use crate::utils::logging::truncate_text;

/// 按槽位排列的 K 份采样结果，长度恒为 K
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSet(Vec<String>);

impl SampleSet {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }

    /// 失败的槽位数
    pub fn error_count(&self) -> usize {
        self.0
            .iter()
            .enumerate()
            .filter(|(slot, s)| s.starts_with(&marker_prefix(*slot)))
            .count()
    }
}

fn marker_prefix(slot: usize) -> String {
    format!("Error in roll_out_{}: ", slot)
}

/// 槽位失败时写入的标记文本
pub fn error_marker(slot: usize, message: impl std::fmt::Display) -> String {
    format!("{}{}", marker_prefix(slot), message)
}

/// 为每个槽位启动一个任务，按槽位收集结果
///
/// `make` 根据槽位号构造该槽位的 future。返回值长度恒为 `k`。
pub(crate) async fn collect_slots<F, Fut>(k: usize, make: F) -> SampleSet
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = Result<String, String>> + Send + 'static,
{
    let mut tasks = JoinSet::new();
    for slot in 0..k {
        let fut = make(slot);
        tasks.spawn(
            async move {
                let outcome = AssertUnwindSafe(fut).catch_unwind().await;
                let result = match outcome {
                    Ok(result) => result,
                    Err(panic) => Err(panic_message(panic.as_ref())),
                };
                (slot, result)
            }
            .in_current_span(),
        );
    }

    let mut slots: Vec<Option<String>> = vec![None; k];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((slot, Ok(text))) => slots[slot] = Some(text),
            Ok((slot, Err(message))) => {
                error!("❌ roll_out_{} 生成失败: {}", slot, message);
                slots[slot] = Some(error_marker(slot, message));
            }
            Err(e) => error!("roll_out 任务异常结束: {}", e),
        }
    }

    // 只有任务被取消时才会留下空槽位
    let samples = slots
        .into_iter()
        .enumerate()
        .map(|(slot, text)| text.unwrap_or_else(|| error_marker(slot, "任务被取消")))
        .collect();
    SampleSet(samples)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic".to_string()
    }
}

/// 多采样生成器
pub struct SampleGenerator {
    backend: Arc<dyn ModelBackend>,
    roll_out_num: usize,
    span: Span,
}

impl SampleGenerator {
    pub fn new(backend: Arc<dyn ModelBackend>, roll_out_num: usize, span: Span) -> Self {
        Self {
            backend,
            roll_out_num,
            span,
        }
    }

    pub fn roll_out_num(&self) -> usize {
        self.roll_out_num
    }

    /// 并发生成 K 份解答
    ///
    /// `images` 为空时调用 `generate`，否则调用 `generate_with_image`。
    /// 这一层不做重试。
    pub async fn generate_samples(&self, prompt: &str, images: &[PathBuf]) -> SampleSet {
        let prompt: Arc<str> = Arc::from(prompt);
        let images: Arc<[PathBuf]> = Arc::from(images);
        debug!(
            "[LLM INPUT] prompt (generate), {} 份采样:\n{}",
            self.roll_out_num, prompt
        );

        let samples = collect_slots(self.roll_out_num, |slot| {
            let backend = Arc::clone(&self.backend);
            let prompt = Arc::clone(&prompt);
            let images = Arc::clone(&images);
            async move {
                let result = if images.is_empty() {
                    backend.generate(&prompt).await
                } else {
                    backend.generate_with_image(&prompt, &images).await
                };
                if let Ok(text) = &result {
                    debug!(
                        "[LLM OUTPUT] roll_out_{}: {}",
                        slot,
                        truncate_text(text, 200)
                    );
                }
                result.map_err(|e| e.to_string())
            }
        })
        .instrument(self.span.clone())
        .await;

        if samples.error_count() > 0 {
            debug!(
                "{}/{} 份采样失败，已写入错误标记",
                samples.error_count(),
                samples.len()
            );
        }
        samples
    }
}
