//! 模型后端
//!
//! 每个厂商一个实现，对外只暴露两种能力：纯文本生成和带图生成。
//! 瞬时错误在后端内部按固定间隔重试，之后才向上抛出。

pub mod claude_client;
pub mod factory;
pub mod gemini_client;
pub mod images;
pub mod openai_client;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::ModelError;

pub use claude_client::ClaudeBackend;
pub use factory::{create_backend, BackendSettings};
pub use gemini_client::GeminiBackend;
pub use openai_client::OpenAiCompatBackend;

/// 模型后端能力
///
/// 实现必须是 `Send + Sync`，同一个实例会被多个任务通过 `Arc` 共享。
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// 后端名称（用于日志）
    fn name(&self) -> &str;

    /// 纯文本生成
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;

    /// 带图片生成，图片为本地文件路径
    async fn generate_with_image(
        &self,
        prompt: &str,
        images: &[PathBuf],
    ) -> Result<String, ModelError>;
}

/// 智能体角色，决定使用哪一把 API 密钥
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRole {
    /// 图片转 HTML
    ImageToText,
    /// 多采样自我批判
    SelfCritic,
}

impl AgentRole {
    /// `[keys]` 中的字段名
    pub fn key_name(self) -> &'static str {
        match self {
            AgentRole::ImageToText => "image2text",
            AgentRole::SelfCritic => "selfcritic",
        }
    }

    /// 对应的环境变量
    pub fn env_var(self) -> &'static str {
        match self {
            AgentRole::ImageToText => "IMAGE2TEXT_API_KEY",
            AgentRole::SelfCritic => "SELFCRITIC_API_KEY",
        }
    }
}
