//! Claude 后端（Anthropic Messages API）

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::factory::BackendSettings;
use super::images::{encode_image, is_png};
use super::ModelBackend;
use crate::error::{ConfigError, ModelError};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 32768;

pub struct ClaudeBackend {
    http: reqwest::Client,
    settings: BackendSettings,
}

#[derive(Debug, Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ClaudeMessage>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage {
    role: &'static str,
    content: Vec<ClaudeContent>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ClaudeContent {
    Image { source: ClaudeImageSource },
    Text { text: String },
}

#[derive(Debug, Serialize)]
struct ClaudeImageSource {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'static str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    #[serde(default)]
    content: Vec<ClaudeResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponseBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

impl ClaudeBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ConfigError::Invalid {
                key: "model".to_string(),
                reason: format!("无法创建 HTTP 客户端: {}", e),
            })?;
        Ok(Self { http, settings })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.settings.api_base.trim_end_matches('/'))
    }

    async fn send_once(&self, body: &ClaudeRequest<'_>) -> Result<String, ModelError> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-api-key", &self.settings.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| ModelError::transient("claude", e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ModelError::BadStatus {
                provider: "claude".to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ClaudeResponse = response
            .json()
            .await
            .map_err(|e| ModelError::transient("claude", format!("响应解析失败: {}", e)))?;

        let text: String = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();

        if text.trim().is_empty() {
            return Err(ModelError::EmptyResponse {
                provider: "claude".to_string(),
                model: self.settings.model.clone(),
            });
        }
        Ok(text)
    }

    async fn complete(&self, content: Vec<ClaudeContent>) -> Result<String, ModelError> {
        let body = ClaudeRequest {
            model: &self.settings.model,
            max_tokens: MAX_TOKENS,
            messages: vec![ClaudeMessage {
                role: "user",
                content,
            }],
        };
        let label = format!("claude ({})", self.settings.model);
        self.settings
            .retry
            .run(&label, |_| self.send_once(&body), ModelError::is_retryable)
            .await
    }
}

#[async_trait]
impl ModelBackend for ClaudeBackend {
    fn name(&self) -> &str {
        "claude"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        debug!("调用 Claude API，模型: {}", self.settings.model);
        self.complete(vec![ClaudeContent::Text {
            text: prompt.to_string(),
        }])
        .await
    }

    /// 只接受本地 PNG 文件
    async fn generate_with_image(
        &self,
        prompt: &str,
        images: &[PathBuf],
    ) -> Result<String, ModelError> {
        debug!(
            "调用 Claude Vision API，模型: {}，包含 {} 张图片",
            self.settings.model,
            images.len()
        );
        let mut content = Vec::with_capacity(images.len() + 1);
        for path in images {
            if !is_png(path) {
                return Err(ModelError::InvalidImage {
                    path: path.clone(),
                    reason: "Claude 后端只支持本地 PNG 文件".to_string(),
                });
            }
            let image = encode_image(path).await?;
            content.push(ClaudeContent::Image {
                source: ClaudeImageSource {
                    kind: "base64",
                    media_type: "image/png",
                    data: image.data,
                },
            });
        }
        content.push(ClaudeContent::Text {
            text: prompt.to_string(),
        });
        self.complete(content).await
    }
}
