//! 题目处理上下文
//!
//! 封装"我正在处理哪一道题"这一信息，只用于日志

use std::fmt::Display;

use crate::models::{Language, ProblemItem};

/// 题目处理上下文
#[derive(Debug, Clone)]
pub struct ItemCtx {
    /// 题目编号
    pub index: u32,

    /// 学科代码
    pub subject: String,

    /// 题目语言
    pub language: Language,

    /// 题目图片数量
    pub image_count: usize,
}

impl ItemCtx {
    pub fn from_item(item: &ProblemItem) -> Self {
        Self {
            index: item.index,
            subject: item.subject.clone(),
            language: item.language,
            image_count: item.image_path.len(),
        }
    }
}

impl Display for ItemCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[题目#{} 学科#{} 语言#{} 图片#{}]",
            self.index,
            self.subject,
            self.language.tag(),
            self.image_count
        )
    }
}
