use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 题目语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    English,
    Chinese,
}

impl Language {
    /// 提示词模板使用的语言标记
    pub fn tag(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Chinese => "zh",
        }
    }
}

/// 数据集中的一道题目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemItem {
    pub index: u32,
    pub question: String,
    pub subject: String,
    pub level: u8,
    pub language: Language,
    #[serde(default)]
    pub image_path: Vec<String>,
    #[serde(default)]
    pub img_category: String,
    #[serde(default)]
    pub vision_relevance: String,
    /// 原样保留（字符串、数字或 null），输出时照抄
    #[serde(default)]
    pub sig_figs: Option<Value>,
    #[serde(default)]
    pub caption: String,
}

impl ProblemItem {
    /// 有效数字要求（空字符串视为没有）
    pub fn sig_figs_hint(&self) -> Option<String> {
        match self.sig_figs.as_ref()? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// critic 流程的输出记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub index: u32,
    pub question: String,
    pub subject: String,
    pub img_category: String,
    pub vision_relevance: String,
    pub language: Language,
    pub level: u8,
    pub sig_figs: Option<Value>,
    pub caption: String,
    pub prediction: String,
}

impl ResultRecord {
    /// 回显题目元信息并附上最终答案
    pub fn from_item(item: &ProblemItem, prediction: String) -> Self {
        Self {
            index: item.index,
            question: item.question.clone(),
            subject: item.subject.clone(),
            img_category: item.img_category.clone(),
            vision_relevance: item.vision_relevance.clone(),
            language: item.language,
            level: item.level,
            sig_figs: item.sig_figs.clone(),
            caption: item.caption.clone(),
            prediction,
        }
    }
}

/// i2t 流程中单张图片的处理结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageOutcome {
    pub image_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendered_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

/// i2t 流程的输出记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct I2tRecord {
    pub index: u32,
    pub images: Vec<ImageOutcome>,
}
