//! Gemini 后端（generateContent REST 接口）

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::factory::BackendSettings;
use super::images::encode_images;
use super::ModelBackend;
use crate::error::{ConfigError, ModelError};

pub struct GeminiBackend {
    http: reqwest::Client,
    settings: BackendSettings,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<GeminiBlob>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiBlob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

impl GeminiBackend {
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
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.api_base.trim_end_matches('/'),
            self.settings.model
        )
    }

    async fn send_once(&self, body: &GeminiRequest) -> Result<String, ModelError> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.settings.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ModelError::transient("gemini", e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ModelError::BadStatus {
                provider: "gemini".to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::transient("gemini", format!("响应解析失败: {}", e)))?;

        let text = extract_text(parsed);
        if text.trim().is_empty() {
            return Err(ModelError::EmptyResponse {
                provider: "gemini".to_string(),
                model: self.settings.model.clone(),
            });
        }
        Ok(text)
    }

    async fn complete(&self, parts: Vec<GeminiPart>) -> Result<String, ModelError> {
        let body = GeminiRequest {
            contents: vec![GeminiContent { parts }],
        };
        let label = format!("gemini ({})", self.settings.model);
        self.settings
            .retry
            .run(&label, |_| self.send_once(&body), ModelError::is_retryable)
            .await
    }
}

/// 拼接第一个候选中的全部文本片段
fn extract_text(response: GeminiResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default()
}

fn text_part(text: &str) -> GeminiPart {
    GeminiPart {
        text: Some(text.to_string()),
        inline_data: None,
    }
}

#[async_trait]
impl ModelBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        debug!("调用 Gemini API，模型: {}", self.settings.model);
        self.complete(vec![text_part(prompt)]).await
    }

    async fn generate_with_image(
        &self,
        prompt: &str,
        images: &[PathBuf],
    ) -> Result<String, ModelError> {
        debug!(
            "调用 Gemini Vision API，模型: {}，包含 {} 张图片",
            self.settings.model,
            images.len()
        );
        let mut parts: Vec<GeminiPart> = encode_images(images)
            .await?
            .into_iter()
            .map(|image| GeminiPart {
                text: None,
                inline_data: Some(GeminiBlob {
                    mime_type: image.mime_type.to_string(),
                    data: image.data,
                }),
            })
            .collect();
        parts.push(text_part(prompt));
        self.complete(parts).await
    }
}
