//! OpenAI 兼容后端（OpenAI / 豆包 / DeepSeek）
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型

use std::path::PathBuf;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, ImageDetail, ImageUrl,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use super::factory::BackendSettings;
use super::images::{encode_images, EncodedImage};
use super::ModelBackend;
use crate::error::ModelError;

/// OpenAI 兼容的 chat completions 后端
pub struct OpenAiCompatBackend {
    client: Client<OpenAIConfig>,
    settings: BackendSettings,
}

impl OpenAiCompatBackend {
    pub fn new(settings: BackendSettings) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&settings.api_key)
            .with_api_base(&settings.api_base);

        Self {
            client: Client::with_config(openai_config),
            settings,
        }
    }

    fn invalid(&self, e: impl std::fmt::Display) -> ModelError {
        ModelError::InvalidRequest {
            provider: self.settings.provider.clone(),
            message: e.to_string(),
        }
    }

    /// 构建单条用户消息的请求，图片以 data URL 形式附在文本之后
    fn build_request(
        &self,
        prompt: &str,
        images: &[EncodedImage],
    ) -> Result<CreateChatCompletionRequest, ModelError> {
        let user_msg = if images.is_empty() {
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| self.invalid(e))?
        } else {
            let mut content_parts: Vec<ChatCompletionRequestUserMessageContentPart> =
                Vec::with_capacity(images.len() + 1);

            content_parts.push(ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: prompt.to_string(),
                },
            ));

            for image in images {
                content_parts.push(ChatCompletionRequestUserMessageContentPart::ImageUrl(
                    ChatCompletionRequestMessageContentPartImage {
                        image_url: ImageUrl {
                            url: image.data_url(),
                            detail: Some(ImageDetail::Auto),
                        },
                    },
                ));
            }

            ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Array(
                    content_parts,
                ))
                .build()
                .map_err(|e| self.invalid(e))?
        };

        CreateChatCompletionRequestArgs::default()
            .model(&self.settings.model)
            .messages(vec![ChatCompletionRequestMessage::User(user_msg)])
            .build()
            .map_err(|e| self.invalid(e))
    }

    async fn send_once(&self, request: CreateChatCompletionRequest) -> Result<String, ModelError> {
        let provider = self.settings.provider.as_str();
        let response =
            tokio::time::timeout(self.settings.timeout, self.client.chat().create(request))
                .await
                .map_err(|_| {
                    ModelError::transient(
                        provider,
                        format!("请求超时 ({:?})", self.settings.timeout),
                    )
                })?
                .map_err(|e| {
                    warn!("{} API 调用失败: {}", provider, e);
                    classify_error(provider, e)
                })?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ModelError::EmptyResponse {
                provider: provider.to_string(),
                model: self.settings.model.clone(),
            })
    }

    async fn complete(&self, prompt: &str, images: &[EncodedImage]) -> Result<String, ModelError> {
        let request = self.build_request(prompt, images)?;
        let label = format!("{} ({})", self.settings.provider, self.settings.model);
        self.settings
            .retry
            .run(
                &label,
                |_| self.send_once(request.clone()),
                ModelError::is_retryable,
            )
            .await
    }
}

#[async_trait]
impl ModelBackend for OpenAiCompatBackend {
    fn name(&self) -> &str {
        &self.settings.provider
    }

    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        debug!(
            "调用 {} API，模型: {}，提示词 {} 字符",
            self.settings.provider,
            self.settings.model,
            prompt.chars().count()
        );
        self.complete(prompt, &[]).await
    }

    async fn generate_with_image(
        &self,
        prompt: &str,
        images: &[PathBuf],
    ) -> Result<String, ModelError> {
        debug!(
            "调用 {} Vision API，模型: {}，包含 {} 张图片",
            self.settings.provider,
            self.settings.model,
            images.len()
        );
        let encoded = encode_images(images).await?;
        self.complete(prompt, &encoded).await
    }
}

/// API 返回的错误体（401、400 等）和参数错误不重试，其余按网络错误处理
fn classify_error(provider: &str, err: OpenAIError) -> ModelError {
    match err {
        OpenAIError::ApiError(api) => ModelError::Rejected {
            provider: provider.to_string(),
            message: api.message,
        },
        OpenAIError::InvalidArgument(message) => ModelError::InvalidRequest {
            provider: provider.to_string(),
            message,
        },
        other => ModelError::transient(provider, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::RetryPolicy;
    use std::time::Duration;

    fn test_backend() -> OpenAiCompatBackend {
        OpenAiCompatBackend::new(BackendSettings {
            provider: "openai".to_string(),
            model: "gpt-4.1".to_string(),
            api_base: "http://127.0.0.1:9/v1".to_string(),
            api_key: "sk-test".to_string(),
            retry: RetryPolicy::new(1, Duration::from_millis(1)),
            timeout: Duration::from_secs(5),
        })
    }

    #[test]
    fn test_build_text_request() {
        let request = test_backend().build_request("hello", &[]).unwrap();
        assert_eq!(request.model, "gpt-4.1");
        assert_eq!(request.messages.len(), 1);
    }

    #[test]
    fn test_build_vision_request() {
        let images = vec![EncodedImage {
            mime_type: "image/png",
            data: "AAAA".to_string(),
        }];
        let request = test_backend().build_request("describe", &images).unwrap();
        let json = serde_json::to_value(&request).unwrap();
        let content = &json["messages"][0]["content"];
        assert_eq!(content.as_array().unwrap().len(), 2);
        assert_eq!(content[1]["image_url"]["url"], "data:image/png;base64,AAAA");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transient() {
        let err = test_backend().generate("hi").await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_api_errors_are_not_retried() {
        let api: async_openai::error::ApiError = serde_json::from_value(serde_json::json!({
            "message": "Incorrect API key provided",
            "type": "invalid_request_error",
            "param": null,
            "code": "invalid_api_key"
        }))
        .unwrap();
        let err = classify_error("openai", OpenAIError::ApiError(api));
        assert!(matches!(
            err,
            ModelError::Rejected { ref message, .. } if message.contains("API key")
        ));
        assert!(!err.is_retryable());

        let err = classify_error("doubao", OpenAIError::InvalidArgument("bad".into()));
        assert!(!err.is_retryable());
    }
}
