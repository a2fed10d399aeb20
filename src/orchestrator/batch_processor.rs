//! 批量题目处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **并发控制**：使用 Semaphore 限制同时处理的题目数量
//! 2. **重试包络**：每道题最多尝试 N 次，两次之间固定等待
//! 3. **时间预算**：单次尝试超过预算视为失败（或只告警，取决于配置）
//! 4. **增量持久化**：每道题成功后立即追加到结果文件
//! 5. **全局统计**：汇总成功与失败的题目
//!
//! 单道题目失败只影响它自己，批处理总会跑完并报告结果文件路径。

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use tokio::sync::Semaphore;
use tracing::{error, info, info_span, warn, Instrument, Span};

use crate::config::BatchConfig;
use crate::error::{ConfigError, PromptError};
use crate::infrastructure::{AppendOutcome, ResultStore};
use crate::models::ProblemItem;
use crate::utils::logging::{log_progress, print_final_stats};
use crate::utils::{LogContext, RetryPolicy};
use crate::workflow::{ItemCtx, ItemWorkflow};

/// 批处理参数
#[derive(Debug, Clone, Copy)]
pub struct BatchSettings {
    pub max_workers: usize,
    pub retry: RetryPolicy,
    pub item_timeout: Duration,
    pub enforce_timeout: bool,
}

impl BatchSettings {
    pub fn from_config(config: &BatchConfig) -> Self {
        Self {
            max_workers: config.max_workers.max(1),
            retry: RetryPolicy::new(config.max_retries, config.retry_delay()),
            item_timeout: config.item_timeout(),
            enforce_timeout: config.enforce_timeout,
        }
    }
}

/// 批处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    /// 重试耗尽后仍失败的题目，按 index 升序
    pub failed_indices: Vec<u32>,
    pub output_path: PathBuf,
}

/// 批量处理器
///
/// 持有结果文件，把每道题交给 `ItemWorkflow` 并负责重试和写入。
pub struct BatchProcessor {
    settings: BatchSettings,
    store: Arc<ResultStore>,
    span: Span,
}

impl BatchProcessor {
    pub fn new(settings: BatchSettings, store: Arc<ResultStore>, log: &LogContext) -> Self {
        Self {
            settings,
            store,
            span: log.span("batch_processor"),
        }
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// 处理全部题目
    pub async fn run<W: ItemWorkflow>(&self, workflow: Arc<W>, items: Vec<ProblemItem>) -> BatchReport {
        let total = items.len();
        let semaphore = Arc::new(Semaphore::new(self.settings.max_workers));
        let completed = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::with_capacity(total);

        info!(
            "📋 {} 流程开始处理 {} 道题目 (并发 {})",
            workflow.name(),
            total,
            self.settings.max_workers
        );

        for item in items {
            let index = item.index;
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!("[题目 {}] 无法获取并发许可: {}", index, e);
                    handles.push((index, None));
                    continue;
                }
            };

            let workflow = Arc::clone(&workflow);
            let store = Arc::clone(&self.store);
            let completed = Arc::clone(&completed);
            let settings = self.settings;
            let span = info_span!(parent: &self.span, "item", index);

            let handle = tokio::spawn(
                async move {
                    let _permit = permit;
                    let ok = process_item(workflow.as_ref(), &store, &item, &settings).await;
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    log_progress(done, total, index, ok);
                    ok
                }
                .instrument(span),
            );
            handles.push((index, Some(handle)));
        }

        // 等待所有任务完成
        let mut succeeded = 0;
        let mut failed_indices = Vec::new();
        for (index, handle) in handles {
            let ok = match handle {
                Some(handle) => match handle.await {
                    Ok(ok) => ok,
                    Err(e) => {
                        error!("[题目 {}] 任务执行失败: {}", index, e);
                        false
                    }
                },
                None => false,
            };
            if ok {
                succeeded += 1;
            } else {
                failed_indices.push(index);
            }
        }
        failed_indices.sort_unstable();

        let report = BatchReport {
            total,
            succeeded,
            failed_indices,
            output_path: self.store.path().to_path_buf(),
        };
        print_final_stats(
            report.succeeded,
            report.failed_indices.len(),
            report.total,
            &report.output_path,
        );
        if !report.failed_indices.is_empty() {
            warn!("失败的题目: {:?}", report.failed_indices);
        }
        report
    }
}

/// 单道题目的重试包络，返回是否最终成功
async fn process_item<W: ItemWorkflow>(
    workflow: &W,
    store: &ResultStore,
    item: &ProblemItem,
    settings: &BatchSettings,
) -> bool {
    let ctx = ItemCtx::from_item(item);
    let label = ctx.to_string();
    let result = settings
        .retry
        .run(
            &label,
            |attempt| {
                info!(
                    "{} 开始处理 (第 {}/{} 次尝试)",
                    ctx, attempt, settings.retry.max_attempts
                );
                attempt_item(workflow, store, item, settings)
            },
            is_item_retryable,
        )
        .await;

    match result {
        Ok(()) => true,
        Err(e) => {
            error!("{} ❌ 重试次数用尽，放弃该题: {:#}", ctx, e);
            false
        }
    }
}

/// 模板或配置错误重试也不会好转，直接放弃
fn is_item_retryable(err: &anyhow::Error) -> bool {
    !err
        .chain()
        .any(|cause| cause.is::<PromptError>() || cause.is::<ConfigError>())
}

/// 一次尝试：运行流程并在成功后写入结果
async fn attempt_item<W: ItemWorkflow>(
    workflow: &W,
    store: &ResultStore,
    item: &ProblemItem,
    settings: &BatchSettings,
) -> Result<()> {
    let started = Instant::now();
    let output = if settings.enforce_timeout {
        tokio::time::timeout(settings.item_timeout, workflow.run(item))
            .await
            .map_err(|_| anyhow!("处理超时 (预算 {:?})", settings.item_timeout))??
    } else {
        let output = workflow.run(item).await;
        if started.elapsed() > settings.item_timeout {
            warn!(
                "题目 {} 处理耗时 {:?}，超过预算 {:?}",
                item.index,
                started.elapsed(),
                settings.item_timeout
            );
        }
        output?
    };

    match store.append(item.index, &output).await? {
        AppendOutcome::Appended { total } => {
            info!("💾 题目 {} 结果已保存 (文件共 {} 条)", item.index, total)
        }
        AppendOutcome::Duplicate => {}
    }
    Ok(())
}
