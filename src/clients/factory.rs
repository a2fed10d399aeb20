//! 后端工厂
//!
//! 按 `model.type` 选择实现，并把各提供方的默认模型、地址和重试参数
//! 与配置合并。

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::{AgentRole, ClaudeBackend, GeminiBackend, ModelBackend, OpenAiCompatBackend};
use crate::config::Config;
use crate::error::ConfigError;
use crate::utils::RetryPolicy;

const ARK_API_BASE: &str = "https://ark.cn-beijing.volces.com/api/v3";

/// 后端运行参数（已合并默认值）
#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub provider: String,
    pub model: String,
    pub api_base: String,
    pub api_key: String,
    pub retry: RetryPolicy,
    pub timeout: Duration,
}

struct ProviderDefaults {
    model: Option<&'static str>,
    api_base: &'static str,
    max_retries: usize,
    retry_delay_secs: u64,
}

fn provider_defaults(provider: &str) -> Option<ProviderDefaults> {
    let defaults = match provider {
        "openai" => ProviderDefaults {
            model: Some("gpt-4.1"),
            api_base: "https://aihubmix.com/v1",
            max_retries: 3,
            retry_delay_secs: 20,
        },
        // 方舟上的模型名是接入点 id，没有通用默认值
        "doubao" | "deepseek" => ProviderDefaults {
            model: None,
            api_base: ARK_API_BASE,
            max_retries: 3,
            retry_delay_secs: 20,
        },
        "claude" => ProviderDefaults {
            model: Some("claude-sonnet-4-20250514"),
            api_base: "https://aihubmix.com",
            max_retries: 3,
            retry_delay_secs: 20,
        },
        "gemini" => ProviderDefaults {
            model: Some("gemini-2.5-pro-preview-06-05"),
            api_base: "https://aihubmix.com/gemini",
            max_retries: 5,
            retry_delay_secs: 2,
        },
        _ => return None,
    };
    Some(defaults)
}

/// 合并配置与提供方默认值
pub fn resolve_settings(config: &Config, role: AgentRole) -> Result<BackendSettings, ConfigError> {
    let provider = config.model.provider.to_ascii_lowercase();
    let defaults = provider_defaults(&provider)
        .ok_or_else(|| ConfigError::UnknownProvider(config.model.provider.clone()))?;

    let api_key = match role {
        AgentRole::ImageToText => config.keys.image2text.as_deref(),
        AgentRole::SelfCritic => config.keys.selfcritic.as_deref(),
    }
    .filter(|k| !k.trim().is_empty())
    .ok_or_else(|| ConfigError::MissingApiKey {
        key_type: role.key_name().to_string(),
        env_var: role.env_var().to_string(),
    })?
    .to_string();

    let model = config
        .model
        .model_name
        .clone()
        .filter(|m| !m.trim().is_empty())
        .or_else(|| defaults.model.map(str::to_string))
        .ok_or_else(|| ConfigError::Invalid {
            key: "model.model_name".to_string(),
            reason: format!("{} 需要显式指定模型名称", provider),
        })?;

    let api_base = config
        .model
        .api_base_url
        .clone()
        .unwrap_or_else(|| defaults.api_base.to_string());

    let retry = RetryPolicy::new(
        config.model.max_retries.unwrap_or(defaults.max_retries),
        Duration::from_secs(
            config
                .model
                .retry_delay_secs
                .unwrap_or(defaults.retry_delay_secs),
        ),
    );

    Ok(BackendSettings {
        provider,
        model,
        api_base,
        api_key,
        retry,
        timeout: Duration::from_secs(config.model.request_timeout_secs),
    })
}

/// 创建模型后端
///
/// # 错误
/// - 未知的 `model.type`
/// - 对应角色缺少 API 密钥
/// - 方舟系模型未指定模型名称
pub fn create_backend(
    config: &Config,
    role: AgentRole,
) -> Result<Arc<dyn ModelBackend>, ConfigError> {
    let settings = resolve_settings(config, role)?;
    info!(
        "🤖 创建模型后端: {} (模型: {}, 角色: {})",
        settings.provider,
        settings.model,
        role.key_name()
    );

    let backend: Arc<dyn ModelBackend> = match settings.provider.as_str() {
        "claude" => Arc::new(ClaudeBackend::new(settings)?),
        "gemini" => Arc::new(GeminiBackend::new(settings)?),
        _ => Arc::new(OpenAiCompatBackend::new(settings)),
    };
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(provider: &str, selfcritic: Option<&str>) -> Config {
        let mut config = Config::default();
        config.model.provider = provider.to_string();
        config.keys.selfcritic = selfcritic.map(str::to_string);
        config
    }

    #[test]
    fn test_unknown_provider() {
        let config = config_with("llama", Some("k"));
        assert!(matches!(
            resolve_settings(&config, AgentRole::SelfCritic),
            Err(ConfigError::UnknownProvider(p)) if p == "llama"
        ));
    }

    #[test]
    fn test_missing_key_for_role() {
        let config = config_with("openai", Some("k"));
        let err = resolve_settings(&config, AgentRole::ImageToText).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingApiKey { ref key_type, .. } if key_type == "image2text"
        ));
    }

    #[test]
    fn test_provider_defaults_applied() {
        let settings = resolve_settings(&config_with("gemini", Some("k")), AgentRole::SelfCritic)
            .unwrap();
        assert_eq!(settings.model, "gemini-2.5-pro-preview-06-05");
        assert_eq!(settings.retry.max_attempts, 5);
        assert_eq!(settings.retry.delay, Duration::from_secs(2));

        let settings = resolve_settings(&config_with("Claude", Some("k")), AgentRole::SelfCritic)
            .unwrap();
        assert_eq!(settings.provider, "claude");
        assert_eq!(settings.retry.delay, Duration::from_secs(20));
    }

    #[test]
    fn test_ark_requires_model_name() {
        let mut config = config_with("doubao", Some("k"));
        assert!(matches!(
            resolve_settings(&config, AgentRole::SelfCritic),
            Err(ConfigError::Invalid { .. })
        ));
        config.model.model_name = Some("ep-20250101-xxxx".to_string());
        let settings = resolve_settings(&config, AgentRole::SelfCritic).unwrap();
        assert_eq!(settings.api_base, ARK_API_BASE);
    }

    #[test]
    fn test_create_backend_names() {
        let backend = create_backend(&config_with("deepseek", Some("k")), AgentRole::SelfCritic);
        assert!(backend.is_err());

        let backend = create_backend(&config_with("claude", Some("k")), AgentRole::SelfCritic)
            .unwrap();
        assert_eq!(backend.name(), "claude");
    }
}
