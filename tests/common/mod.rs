#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use physics_critic::error::{ModelError, RenderError};
use physics_critic::services::PromptStore;
use physics_critic::utils::PathResolver;
use physics_critic::{FigureRenderer, ModelBackend, ProblemItem};

/// 记录所有调用的假后端
///
/// - 汇总提示词（包含 `## roll_out_`）返回 `FINAL: 9.8 m/s^2`
/// - 其他调用按调用序号返回 `roll_out_<n>: 9.8 m/s^2`
/// - `fail_calls` 中的序号返回错误
#[derive(Default)]
pub struct StubBackend {
    pub calls: AtomicUsize,
    pub fail_calls: Vec<usize>,
    pub prompts: Mutex<Vec<String>>,
    pub image_calls: Mutex<Vec<Vec<PathBuf>>>,
    pub image_response: Option<String>,
}

impl StubBackend {
    pub fn failing(fail_calls: Vec<usize>) -> Self {
        Self {
            fail_calls,
            ..Default::default()
        }
    }

    pub fn with_image_response(response: &str) -> Self {
        Self {
            image_response: Some(response.to_string()),
            ..Default::default()
        }
    }

    pub fn consolidation_prompt(&self) -> Option<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.contains("## roll_out_"))
            .cloned()
    }

    fn respond(&self, prompt: &str) -> Result<String, ModelError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if prompt.contains("## roll_out_") {
            return Ok("FINAL: 9.8 m/s^2".to_string());
        }
        if self.fail_calls.contains(&n) {
            return Err(ModelError::transient("stub", "connection reset"));
        }
        Ok(format!("roll_out_{}: 9.8 m/s^2", n))
    }
}

#[async_trait]
impl ModelBackend for StubBackend {
    fn name(&self) -> &str {
        "stub"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        self.respond(prompt)
    }

    async fn generate_with_image(
        &self,
        prompt: &str,
        images: &[PathBuf],
    ) -> Result<String, ModelError> {
        self.image_calls.lock().unwrap().push(images.to_vec());
        match &self.image_response {
            Some(response) => {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Ok(response.clone())
            }
            None => self.respond(prompt),
        }
    }
}

/// 假渲染器：`fail_ids` 中的图片渲染失败，其余写入一个空文件
#[derive(Default)]
pub struct StubRenderer {
    pub fail_ids: Vec<String>,
    pub renders: AtomicUsize,
}

#[async_trait]
impl FigureRenderer for StubRenderer {
    async fn render(&self, _html: &str, output: &Path) -> Result<PathBuf, RenderError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        let name = output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.fail_ids.iter().any(|id| name.starts_with(&format!("{}_", id))) {
            return Err(RenderError::Page("canvas never painted".to_string()));
        }
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(output, b"png").unwrap();
        Ok(output.to_path_buf())
    }
}

pub fn prompts() -> Arc<PromptStore> {
    Arc::new(PromptStore::from_entries([
        (
            "critic",
            "en",
            "generate",
            "Solve: {question}\nCode:\n{image_code}\nInfo:\n{meta_info}",
        ),
        (
            "critic",
            "en",
            "self_consistency",
            "Question: {question}\n{roll_out_responses}",
        ),
        ("critic", "zh", "generate", "求解：{question}\n{image_code}\n{meta_info}"),
        (
            "critic",
            "zh",
            "self_consistency",
            "题目：{question}\n{roll_out_responses}",
        ),
        ("i2t", "en", "generate", "Draw {img_type} for: {question}"),
    ]))
}

pub fn resolver(root: &Path) -> PathResolver {
    PathResolver::new(
        "data/upscaled_images",
        root.join("html_code"),
        root.join("html_images"),
    )
}

pub fn item(index: u32, images: &[&str]) -> ProblemItem {
    serde_json::from_value(serde_json::json!({
        "index": index,
        "question": "A ball is dropped from rest. What is its acceleration?",
        "subject": "CM",
        "level": 2,
        "language": "English",
        "image_path": images,
        "img_category": "diagram",
        "vision_relevance": "low",
        "sig_figs": "2",
        "caption": "a falling ball"
    }))
    .unwrap()
}
