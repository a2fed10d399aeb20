//! 自我批判流程 - 流程层
//!
//! 流程顺序：
//! 1. 准备上下文（语言、元信息、图片代码）
//! 2. 并发生成 K 份解答
//! 3. 自洽性汇总
//! 4. 打包结果记录

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, Instrument, Span};

use crate::clients::ModelBackend;
use crate::config::CriticConfig;
use crate::models::{ProblemItem, ResultRecord};
use crate::services::{build_meta_info, Consolidator, PromptStore, SampleGenerator};
use crate::utils::{LogContext, PathResolver};
use crate::workflow::item_ctx::ItemCtx;
use crate::workflow::ItemWorkflow;

/// 自我批判流程
///
/// - 编排单道题目的 生成 → 汇总
/// - 不持有结果文件，不关心重试
pub struct CriticWorkflow {
    prompts: Arc<PromptStore>,
    generator: SampleGenerator,
    consolidator: Consolidator,
    paths: PathResolver,
    include_subject: bool,
    attach_images: bool,
    span: Span,
}

impl CriticWorkflow {
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        prompts: Arc<PromptStore>,
        paths: PathResolver,
        config: &CriticConfig,
        log: &LogContext,
    ) -> Self {
        Self {
            generator: SampleGenerator::new(
                Arc::clone(&backend),
                config.roll_out_num,
                log.span("sample_generator"),
            ),
            consolidator: Consolidator::new(
                backend,
                Arc::clone(&prompts),
                log.span("consolidator"),
            ),
            prompts,
            paths,
            include_subject: config.include_subject,
            attach_images: config.attach_images,
            span: log.span("critic_workflow"),
        }
    }

    /// 处理一道题目
    pub async fn solve(&self, item: &ProblemItem) -> Result<ResultRecord> {
        let ctx = ItemCtx::from_item(item);
        async {
            info!("{} 🧠 开始自我批判流程", ctx);

            // ========== 1. 准备上下文 ==========
            let lang = item.language.tag();
            let meta_info = build_meta_info(item, self.include_subject);
            let image_code = self.collect_image_code(item).await;

            // ========== 2. 多采样生成 ==========
            let generate_prompt = self
                .prompts
                .render(
                    "critic",
                    "generate",
                    lang,
                    &[
                        ("question", item.question.as_str()),
                        ("image_code", image_code.as_str()),
                        ("meta_info", meta_info.as_str()),
                    ],
                )
                .context("格式化 critic/generate 提示词失败")?;

            let images: Vec<PathBuf> = if self.attach_images {
                item.image_path
                    .iter()
                    .map(|p| self.paths.resolve_image_path(p))
                    .collect()
            } else {
                Vec::new()
            };

            let samples = self.generator.generate_samples(&generate_prompt, &images).await;
            info!(
                "{} ✓ 生成 {} 份解答 ({} 份失败)",
                ctx,
                samples.len(),
                samples.error_count()
            );

            // ========== 3. 自洽性汇总 ==========
            let prediction = self
                .consolidator
                .consolidate(&samples, &item.question, lang)
                .await?;
            info!("{} ✅ 汇总完成", ctx);

            // ========== 4. 打包 ==========
            Ok::<_, anyhow::Error>(ResultRecord::from_item(item, prediction))
        }
        .instrument(self.span.clone())
        .await
    }

    /// 每张图片已生成的 HTML 代码，用空行连接
    async fn collect_image_code(&self, item: &ProblemItem) -> String {
        let mut codes = Vec::with_capacity(item.image_path.len());
        for path in &item.image_path {
            codes.push(self.paths.image_code(path).await);
        }
        codes.join("\n\n")
    }
}

#[async_trait]
impl ItemWorkflow for CriticWorkflow {
    type Output = ResultRecord;

    fn name(&self) -> &'static str {
        "critic"
    }

    async fn run(&self, item: &ProblemItem) -> Result<ResultRecord> {
        self.solve(item).await
    }
}
