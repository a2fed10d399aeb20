//! 流程层
//!
//! 定义"一道题"的完整处理流程，批处理驱动只通过 `ItemWorkflow` 调用。

pub mod critic_flow;
pub mod i2t_flow;
pub mod item_ctx;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::models::ProblemItem;

pub use critic_flow::CriticWorkflow;
pub use i2t_flow::I2tWorkflow;
pub use item_ctx::ItemCtx;

/// 单道题目的处理流程
#[async_trait]
pub trait ItemWorkflow: Send + Sync + 'static {
    /// 写入结果文件的记录类型
    type Output: Serialize + Send + Sync + 'static;

    /// 流程名称（用于日志）
    fn name(&self) -> &'static str;

    /// 处理一道题目；返回错误时由批处理驱动决定是否重试
    async fn run(&self, item: &ProblemItem) -> Result<Self::Output>;
}
