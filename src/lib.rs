//! # Physics Critic
//!
//! 对物理题目做多模型批处理的 Rust 应用程序：
//! - **critic**：同一道题并发生成多份解答，再由模型做自洽性汇总得出最终答案
//! - **i2t**：把题目图片转写为 HTML/canvas 代码并渲染截图
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure / Clients）
//! - `clients/` - 各厂商模型后端，统一为 `ModelBackend` 两种能力
//! - `infrastructure/` - 结果文件（`ResultStore`）与浏览器渲染（`FigureRenderer`）
//!
//! ### ② 业务能力层（Services）
//! - `PromptStore` - 提示词模板
//! - `SampleGenerator` - K 路并发采样
//! - `Consolidator` - 自洽性汇总
//!
//! ### ③ 流程层（Workflow）
//! - `CriticWorkflow` / `I2tWorkflow` - 一道题的完整处理流程
//!
//! ### ④ 编排层（Orchestration）
//! - `BatchProcessor` - 并发、重试、增量持久化
//! - `App` - 启动与模式选择

pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{create_backend, AgentRole, ModelBackend};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{FigureRenderer, ResultStore};
pub use models::{I2tRecord, ProblemItem, ResultRecord};
pub use orchestrator::{App, BatchProcessor, BatchReport, BatchSettings, PipelineMode};
pub use utils::LogContext;
pub use workflow::{CriticWorkflow, I2tWorkflow, ItemWorkflow};
