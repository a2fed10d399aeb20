//! 应用入口 - 编排层
//!
//! 加载提示词与数据集、按模式创建模型后端和流程，交给批量处理器运行。

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::browser;
use crate::clients::{create_backend, AgentRole};
use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{ChromeRenderer, ResultStore};
use crate::models::{filter_pending, load_completed_indices, load_dataset, ProblemItem};
use crate::orchestrator::batch_processor::{BatchProcessor, BatchReport, BatchSettings};
use crate::services::PromptStore;
use crate::utils::logging::{log_items_loaded, log_startup};
use crate::utils::{results_file_path, LogContext, PathResolver};
use crate::workflow::{CriticWorkflow, I2tWorkflow};

/// 数据集中出现的语言标记
const PROMPT_LANGS: [&str; 2] = ["en", "zh"];

/// 运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    /// 多采样 + 自洽性汇总
    Critic,
    /// 图片转 HTML 并渲染
    I2t,
}

impl FromStr for PipelineMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "critic" => Ok(PipelineMode::Critic),
            "i2t" => Ok(PipelineMode::I2t),
            other => anyhow::bail!("未知的运行模式: {} (支持: critic, i2t)", other),
        }
    }
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineMode::Critic => write!(f, "critic"),
            PipelineMode::I2t => write!(f, "i2t"),
        }
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    log: LogContext,
    mode: PipelineMode,
    prompts: Arc<PromptStore>,
    paths: PathResolver,
}

impl PipelineMode {
    /// 流程用到的 (task, section) 模板
    pub fn required_prompts(self) -> &'static [(&'static str, &'static str)] {
        match self {
            PipelineMode::Critic => &[("critic", "generate"), ("critic", "self_consistency")],
            PipelineMode::I2t => &[("i2t", "generate")],
        }
    }
}

impl App {
    /// 初始化应用：校验配置，加载提示词模板并检查流程所需模板齐全
    ///
    /// 模板缺失属于配置问题，在这里直接失败，不会带进批处理的重试。
    pub async fn initialize(
        config: Config,
        log: LogContext,
        mode: PipelineMode,
    ) -> AppResult<Self> {
        config.validate()?;
        let prompts = PromptStore::load(&config.prompts.templates_dir)?;
        prompts.ensure_sections(mode.required_prompts(), &PROMPT_LANGS)?;
        let paths = PathResolver::from_config(&config);
        Ok(Self {
            config,
            log,
            mode,
            prompts: Arc::new(prompts),
            paths,
        })
    }

    /// 运行初始化时选定的流程
    pub async fn run(&self) -> Result<BatchReport> {
        let mode = self.mode;
        log_startup(&mode.to_string(), self.config.batch.max_workers);

        let items = self.load_items().await?;
        if items.is_empty() {
            warn!("⚠️ 没有待处理的题目");
        }

        let prefix = match (&self.config.batch.experiment_name, mode) {
            (Some(name), _) => Some(name.as_str()),
            (None, PipelineMode::Critic) => None,
            (None, PipelineMode::I2t) => Some("i2t"),
        };
        let output_path = results_file_path(&self.config.output_paths.public_submit, prefix);
        info!("📝 结果文件: {}", output_path.display());

        let processor = BatchProcessor::new(
            BatchSettings::from_config(&self.config.batch),
            Arc::new(ResultStore::new(output_path)),
            &self.log,
        );

        let report = match mode {
            PipelineMode::Critic => {
                let backend = create_backend(&self.config, AgentRole::SelfCritic)?;
                let workflow = CriticWorkflow::new(
                    backend,
                    Arc::clone(&self.prompts),
                    self.paths.clone(),
                    &self.config.critic,
                    &self.log,
                );
                processor.run(Arc::new(workflow), items).await
            }
            PipelineMode::I2t => {
                let backend = create_backend(&self.config, AgentRole::ImageToText)?;
                let browser = browser::open_browser(&self.config.render)
                    .await
                    .context("浏览器不可用，无法渲染图像")?;
                let workflow = I2tWorkflow::new(
                    backend,
                    Arc::clone(&self.prompts),
                    self.paths.clone(),
                    Arc::new(ChromeRenderer::new(browser)),
                    self.config.i2t.max_iterations,
                    &self.log,
                );
                processor.run(Arc::new(workflow), items).await
            }
        };

        Ok(report)
    }

    /// 加载数据集，续跑模式下剔除已完成的题目
    async fn load_items(&self) -> Result<Vec<ProblemItem>> {
        info!("\n📁 正在加载数据集...");
        let items = load_dataset(&self.config.data_paths.final_set).await?;
        let loaded = items.len();

        let items = match &self.config.batch.resume_path {
            Some(resume_path) => {
                let completed = load_completed_indices(resume_path).await?;
                filter_pending(items, &completed)
            }
            None => items,
        };

        log_items_loaded(items.len(), loaded - items.len());
        Ok(items)
    }
}
