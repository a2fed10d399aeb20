//! 日志工具模块
//!
//! 提供日志初始化、组件上下文以及日志格式化的辅助函数

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Span};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::LoggingConfig;

/// 日志上下文
///
/// 进程启动时创建一次，显式传给各组件；组件通过 `span()` 派生自己的 span，
/// 不在任何地方隐式查找全局 logger。
#[derive(Debug, Clone)]
pub struct LogContext {
    run_id: String,
    log_file: Option<PathBuf>,
}

impl LogContext {
    /// 安装 tracing 订阅者（控制台 + 可选的日志文件）
    ///
    /// # 参数
    /// - `config`: 日志配置，`RUST_LOG` 优先于 `config.level`
    /// - `log_dir`: 日志文件目录，文件名为 `run_<时间戳>.log`
    pub fn init(config: &LoggingConfig, log_dir: &Path) -> Result<Self> {
        let run_id = timestamp();
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

        let console = match config.format.as_str() {
            "json" => fmt::layer().json().with_target(true).boxed(),
            _ => fmt::layer().with_target(true).boxed(),
        };

        let (file_layer, log_file) = if config.to_file {
            fs::create_dir_all(log_dir)
                .with_context(|| format!("无法创建日志目录: {}", log_dir.display()))?;
            let path = log_dir.join(format!("run_{}.log", run_id));
            let file = fs::File::create(&path)
                .with_context(|| format!("无法创建日志文件: {}", path.display()))?;
            let layer = fmt::layer().with_ansi(false).with_writer(Arc::new(file));
            (Some(layer), Some(path))
        } else {
            (None, None)
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .with(file_layer)
            .try_init()
            .map_err(|e| anyhow::anyhow!("日志初始化失败: {}", e))?;

        info!("日志初始化完成");
        Ok(Self { run_id, log_file })
    }

    /// 不安装订阅者的上下文（测试或嵌入场景）
    pub fn detached(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            log_file: None,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// 为组件派生 span
    pub fn span(&self, component: &'static str) -> Span {
        tracing::info_span!("component", name = component, run = %self.run_id)
    }
}

/// 当前本地时间戳，格式 `YYYYmmdd_HHMMSS`
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// 记录程序启动信息
///
/// # 参数
/// - `pipeline`: 流程名称
/// - `max_workers`: 最大并发数
pub fn log_startup(pipeline: &str, max_workers: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {} 流程", pipeline);
    info!("📊 最大并发数: {}", max_workers);
    info!("{}", "=".repeat(60));
}

/// 记录题目加载信息
pub fn log_items_loaded(total: usize, skipped_by_resume: usize) {
    info!("✓ 找到 {} 道待处理的题目", total);
    if skipped_by_resume > 0 {
        info!("⏭️ 续跑模式跳过 {} 道已完成的题目", skipped_by_resume);
    }
}

/// 记录进度
pub fn log_progress(completed: usize, total: usize, index: u32, success: bool) {
    let mark = if success { "✓" } else { "✗" };
    info!("📈 进度 {}/{} ({} 题目 {})", completed, total, mark, index);
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量
/// - `total`: 总数
/// - `output_path`: 结果文件路径
pub fn print_final_stats(success: usize, failed: usize, total: usize, output_path: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", output_path.display());
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
