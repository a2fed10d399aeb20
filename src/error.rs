use std::path::PathBuf;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 提示词模板错误
    #[error("提示词错误: {0}")]
    Prompt(#[from] PromptError),
    /// 模型调用错误
    #[error("模型错误: {0}")]
    Model(#[from] ModelError),
    /// 结果存储错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 图像渲染错误
    #[error("渲染错误: {0}")]
    Render(#[from] RenderError),
}

/// 配置错误
///
/// 属于部署缺陷，启动时直接失败，不做恢复
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件读取失败
    #[error("无法读取配置文件 {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 配置文件解析失败
    #[error("无法解析配置文件 {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置值不合法
    #[error("配置项 {key} 不合法: {reason}")]
    Invalid { key: String, reason: String },
    /// 缺少 API 密钥
    #[error("缺少 {key_type} 的 API 密钥 (配置 [keys].{key_type} 或环境变量 {env_var})")]
    MissingApiKey { key_type: String, env_var: String },
    /// 未知的模型提供方
    #[error("未知的模型类型: {0} (支持: openai, doubao, deepseek, gemini, claude)")]
    UnknownProvider(String),
}

/// 提示词模板错误
#[derive(Debug, Error)]
pub enum PromptError {
    /// 模板目录读取失败
    #[error("无法读取提示词模板 {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 模板文件解析失败
    #[error("无法解析提示词模板 {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// (task, lang) 对应的模板不存在
    #[error("未找到提示词: 类型 {task}, 语言 {lang}")]
    TaskNotFound { task: String, lang: String },
    /// 模板中不存在该段落
    #[error("提示词类型 {task} (语言 {lang}) 中不存在段落 {section}")]
    SectionNotFound {
        task: String,
        section: String,
        lang: String,
    },
    /// 格式化时缺少字段
    #[error("提示词格式化缺少字段: {0}")]
    MissingField(String),
    /// 模板中有未闭合的花括号
    #[error("提示词模板格式错误: 位置 {0} 处的花括号未闭合")]
    Malformed(usize),
}

/// 模型调用错误
#[derive(Debug, Error)]
pub enum ModelError {
    /// 网络请求失败（可重试）
    #[error("{provider} 请求失败: {message}")]
    Transient { provider: String, message: String },
    /// 服务端返回错误状态
    #[error("{provider} 返回错误 (HTTP {status}): {message}")]
    BadStatus {
        provider: String,
        status: u16,
        message: String,
    },
    /// 服务端拒绝请求（鉴权失败、参数错误等），不重试
    #[error("{provider} 拒绝请求: {message}")]
    Rejected { provider: String, message: String },
    /// 返回内容为空
    #[error("{provider} 返回内容为空 (模型: {model})")]
    EmptyResponse { provider: String, model: String },
    /// 图片不可用
    #[error("图片不可用 {path}: {reason}")]
    InvalidImage { path: PathBuf, reason: String },
    /// 请求构建失败
    #[error("{provider} 请求构建失败: {message}")]
    InvalidRequest { provider: String, message: String },
}

impl ModelError {
    /// 是否属于可在后端内部重试的瞬时错误
    pub fn is_retryable(&self) -> bool {
        match self {
            ModelError::Transient { .. } | ModelError::EmptyResponse { .. } => true,
            ModelError::BadStatus { status, .. } => *status == 429 || *status >= 500,
            ModelError::Rejected { .. }
            | ModelError::InvalidImage { .. }
            | ModelError::InvalidRequest { .. } => false,
        }
    }

    /// 创建瞬时错误
    pub fn transient(provider: impl Into<String>, message: impl std::fmt::Display) -> Self {
        ModelError::Transient {
            provider: provider.into(),
            message: message.to_string(),
        }
    }
}

/// 结果存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 读取失败
    #[error("读取结果文件失败 ({path}): {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 写入失败
    #[error("写入结果文件失败 ({path}): {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 序列化失败
    #[error("结果序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 图像渲染错误
#[derive(Debug, Error)]
pub enum RenderError {
    /// 浏览器启动或连接失败
    #[error("浏览器不可用: {0}")]
    Browser(String),
    /// 页面操作失败
    #[error("页面渲染失败: {0}")]
    Page(String),
    /// 保存截图失败
    #[error("无法创建输出目录 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<chromiumoxide::error::CdpError> for RenderError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        RenderError::Page(err.to_string())
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ModelError::transient("openai", "timeout").is_retryable());
        assert!(ModelError::BadStatus {
            provider: "claude".into(),
            status: 529,
            message: "overloaded".into(),
        }
        .is_retryable());
        assert!(!ModelError::BadStatus {
            provider: "claude".into(),
            status: 400,
            message: "bad request".into(),
        }
        .is_retryable());
        assert!(!ModelError::InvalidImage {
            path: PathBuf::from("a.jpg"),
            reason: "只支持 PNG".into(),
        }
        .is_retryable());
    }
}
