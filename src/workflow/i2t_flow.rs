//! 图片转 HTML 流程 - 流程层
//!
//! 每张图片：视觉模型生成 → 提取 html 代码块 → 保存 → 渲染截图。
//! 没有代码块或渲染失败只跳过本次迭代，不算题目失败。

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, error, info, warn, Instrument, Span};

use crate::clients::ModelBackend;
use crate::infrastructure::FigureRenderer;
use crate::models::{I2tRecord, ImageOutcome, ProblemItem};
use crate::services::{extract_html_code, save_html_code, PromptStore};
use crate::utils::logging::truncate_text;
use crate::utils::{LogContext, PathResolver};
use crate::workflow::item_ctx::ItemCtx;
use crate::workflow::ItemWorkflow;

pub struct I2tWorkflow {
    backend: Arc<dyn ModelBackend>,
    prompts: Arc<PromptStore>,
    paths: PathResolver,
    renderer: Arc<dyn FigureRenderer>,
    max_iterations: usize,
    span: Span,
}

impl I2tWorkflow {
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        prompts: Arc<PromptStore>,
        paths: PathResolver,
        renderer: Arc<dyn FigureRenderer>,
        max_iterations: usize,
        log: &LogContext,
    ) -> Self {
        Self {
            backend,
            prompts,
            paths,
            renderer,
            max_iterations: max_iterations.max(1),
            span: log.span("i2t_workflow"),
        }
    }

    /// 处理一道题目的全部图片
    pub async fn transcribe(&self, item: &ProblemItem) -> Result<I2tRecord> {
        let ctx = ItemCtx::from_item(item);
        async {
            info!("{} 🖼️ 开始图片转 HTML 流程", ctx);
            let prompt = self
                .prompts
                .render(
                    "i2t",
                    "generate",
                    item.language.tag(),
                    &[
                        ("question", item.question.as_str()),
                        ("img_type", item.img_category.as_str()),
                    ],
                )
                .context("格式化 i2t/generate 提示词失败")?;

            let mut images = Vec::with_capacity(item.image_path.len());
            for relative in &item.image_path {
                images.push(self.transcribe_image(&ctx, item.index, relative, &prompt).await?);
            }
            Ok::<_, anyhow::Error>(I2tRecord {
                index: item.index,
                images,
            })
        }
        .instrument(self.span.clone())
        .await
    }

    // 每张图片有独立的迭代预算；渲染成功即结束
    async fn transcribe_image(
        &self,
        ctx: &ItemCtx,
        index: u32,
        relative: &str,
        prompt: &str,
    ) -> Result<ImageOutcome> {
        let image_id = PathResolver::image_id(relative);
        let resolved = self.paths.resolve_image_path(relative);
        let mut outcome = ImageOutcome {
            image_id: image_id.clone(),
            code_path: None,
            rendered_path: None,
            skipped: None,
        };

        for iteration in 1..=self.max_iterations {
            info!("{} 图片 {} 第 {} 次迭代", ctx, image_id, iteration);
            let response = self
                .backend
                .generate_with_image(prompt, std::slice::from_ref(&resolved))
                .await
                .with_context(|| format!("图片 {} 生成失败", image_id))?;
            debug!("[LLM OUTPUT] {}: {}", image_id, truncate_text(&response, 200));

            let Some(code) = extract_html_code(&response) else {
                warn!("{} 图片 {} 的回复中没有 html 代码块", ctx, image_id);
                outcome.skipped = Some("回复中没有 html 代码块".to_string());
                continue;
            };

            let code_path =
                save_html_code(self.paths.generated_html_dir(), &image_id, code).await?;
            outcome.code_path = Some(code_path);

            let output = self.paths.rendered_image_path(index, &image_id);
            match self.renderer.render(code, &output).await {
                Ok(rendered) => {
                    outcome.rendered_path = Some(rendered);
                    outcome.skipped = None;
                    break;
                }
                Err(e) => {
                    error!("{} 图片 {} 渲染失败: {}", ctx, image_id, e);
                    outcome.skipped = Some(format!("渲染失败: {}", e));
                }
            }
        }

        Ok(outcome)
    }
}

#[async_trait]
impl ItemWorkflow for I2tWorkflow {
    type Output = I2tRecord;

    fn name(&self) -> &'static str {
        "i2t"
    }

    async fn run(&self, item: &ProblemItem) -> Result<I2tRecord> {
        self.transcribe(item).await
    }
}
