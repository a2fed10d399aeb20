//! 程序配置
//!
//! 从 `config.toml` 读取，缺省字段使用默认值，随后用环境变量覆盖。

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 程序配置文件
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub keys: KeysConfig,
    pub data_paths: DataPaths,
    pub output_paths: OutputPaths,
    pub logging: LoggingConfig,
    pub batch: BatchConfig,
    pub critic: CriticConfig,
    pub i2t: I2tConfig,
    pub render: RenderConfig,
    pub prompts: PromptsConfig,
}

/// 模型配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// 模型类型: openai | doubao | deepseek | gemini | claude
    #[serde(rename = "type")]
    pub provider: String,
    /// 模型名称（为空时使用各提供方的默认值）
    pub model_name: Option<String>,
    /// API 地址（为空时使用各提供方的默认值）
    pub api_base_url: Option<String>,
    /// 后端内部重试次数（为空时使用各提供方的默认值）
    pub max_retries: Option<usize>,
    /// 后端内部重试间隔（秒）
    pub retry_delay_secs: Option<u64>,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model_name: None,
            api_base_url: None,
            max_retries: None,
            retry_delay_secs: None,
            request_timeout_secs: 600,
        }
    }
}

/// API 密钥，按智能体角色区分
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// i2t 使用的密钥
    pub image2text: Option<String>,
    /// critic 使用的密钥
    pub selfcritic: Option<String>,
}

/// 输入数据路径
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    /// 题目数据集（JSON 数组）
    pub final_set: PathBuf,
    /// 题目图片根目录
    pub image_root: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            final_set: PathBuf::from("data/final_set.json"),
            image_root: PathBuf::from("data/upscaled_images"),
        }
    }
}

/// 输出路径
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct OutputPaths {
    /// 生成的 HTML 代码目录
    pub generated_html_code: PathBuf,
    /// 渲染截图目录
    pub html_images: PathBuf,
    /// 结果文件目录
    pub public_submit: PathBuf,
    /// 运行日志目录
    pub logs: PathBuf,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            generated_html_code: PathBuf::from("results/html_code"),
            html_images: PathBuf::from("results/html_images"),
            public_submit: PathBuf::from("results/public_submit"),
            logs: PathBuf::from("results/logs"),
        }
    }
}

/// 日志配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别（RUST_LOG 优先）
    pub level: String,
    /// 控制台输出格式: pretty | json
    pub format: String,
    /// 是否同时写入日志文件
    pub to_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            to_file: true,
        }
    }
}

/// 批处理配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// 同时处理的题目数量
    pub max_workers: usize,
    /// 每道题最多尝试次数
    pub max_retries: usize,
    /// 两次尝试之间的等待（秒）
    pub retry_delay_secs: u64,
    /// 单次尝试的时间预算（秒）
    pub item_timeout_secs: u64,
    /// 超时后是否取消本次尝试；为 false 时只记录警告
    pub enforce_timeout: bool,
    /// 断点续跑：已完成的结果文件
    pub resume_path: Option<PathBuf>,
    /// 结果文件名前缀
    pub experiment_name: Option<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_workers: 64,
            max_retries: 3,
            retry_delay_secs: 30,
            item_timeout_secs: 3600,
            enforce_timeout: true,
            resume_path: None,
            experiment_name: None,
        }
    }
}

impl BatchConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn item_timeout(&self) -> Duration {
        Duration::from_secs(self.item_timeout_secs)
    }
}

/// critic 流程配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CriticConfig {
    /// 每道题独立采样的次数
    pub roll_out_num: usize,
    /// 元信息中是否包含学科描述
    pub include_subject: bool,
    /// 采样时是否附带题目图片
    pub attach_images: bool,
}

impl Default for CriticConfig {
    fn default() -> Self {
        Self {
            roll_out_num: 3,
            include_subject: false,
            attach_images: false,
        }
    }
}

/// i2t 流程配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct I2tConfig {
    /// 每张图片的最大迭代次数
    pub max_iterations: usize,
}

impl Default for I2tConfig {
    fn default() -> Self {
        Self { max_iterations: 1 }
    }
}

/// 渲染配置
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// 已打开浏览器的调试端口；为空时启动无头浏览器
    pub browser_debug_port: Option<u16>,
    /// 浏览器可执行文件路径
    pub chrome_executable: Option<PathBuf>,
}

/// 提示词配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// 模板目录，结构为 `<dir>/<task>/<lang>.toml`
    pub templates_dir: PathBuf,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("prompts/templates"),
        }
    }
}

impl Config {
    /// 读取配置文件并应用环境变量覆盖
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!("正在加载配置: {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content).map_err(|source| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let config = config.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 环境变量覆盖
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(v) = std::env::var("LLM_PROVIDER") {
            self.model.provider = v;
        }
        if let Ok(v) = std::env::var("LLM_MODEL_NAME") {
            self.model.model_name = Some(v);
        }
        if let Ok(v) = std::env::var("LLM_API_BASE_URL") {
            self.model.api_base_url = Some(v);
        }
        if let Ok(v) = std::env::var("IMAGE2TEXT_API_KEY") {
            self.keys.image2text = Some(v);
        }
        if let Ok(v) = std::env::var("SELFCRITIC_API_KEY") {
            self.keys.selfcritic = Some(v);
        }
        if let Ok(v) = std::env::var("MAX_WORKERS") {
            self.batch.max_workers = v.parse().map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: "MAX_WORKERS".to_string(),
                value: v.clone(),
                expected_type: "usize".to_string(),
            })?;
        }
        Ok(self)
    }

    /// 校验数值配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("batch.max_workers", self.batch.max_workers),
            ("batch.max_retries", self.batch.max_retries),
            ("critic.roll_out_num", self.critic.roll_out_num),
            ("i2t.max_iterations", self.i2t.max_iterations),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    key: key.to_string(),
                    reason: "必须大于 0".to_string(),
                });
            }
        }
        if self.model.max_retries == Some(0) {
            return Err(ConfigError::Invalid {
                key: "model.max_retries".to_string(),
                reason: "必须大于 0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.batch.max_workers, 64);
        assert_eq!(config.batch.max_retries, 3);
        assert_eq!(config.batch.retry_delay_secs, 30);
        assert_eq!(config.batch.item_timeout_secs, 3600);
        assert_eq!(config.critic.roll_out_num, 3);
        assert_eq!(config.model.provider, "openai");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_document() {
        let content = r#"
            [model]
            type = "claude"
            model_name = "claude-sonnet-4-20250514"

            [keys]
            selfcritic = "sk-test"

            [batch]
            max_workers = 8
            resume_path = "results/public_submit/results_20250612_192043.json"

            [critic]
            include_subject = true
        "#;
        let config = Config::from_toml_str(content).unwrap();
        assert_eq!(config.model.provider, "claude");
        assert_eq!(config.keys.selfcritic.as_deref(), Some("sk-test"));
        assert_eq!(config.batch.max_workers, 8);
        assert!(config.batch.resume_path.is_some());
        assert!(config.critic.include_subject);
        // 未出现的字段保持默认
        assert_eq!(config.batch.max_retries, 3);
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let config = Config::from_toml_str("[batch]\nmax_workers = 0").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { ref key, .. }) if key == "batch.max_workers"
        ));
    }
}
