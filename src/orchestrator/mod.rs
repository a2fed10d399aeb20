//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! app (加载配置、数据集，选择流程)
//!     ↓
//! batch_processor (处理 Vec<ProblemItem>，重试 + 持久化)
//!     ↓
//! workflow::CriticWorkflow / I2tWorkflow (处理单道题目)
//!     ↓
//! services (能力层：提示词 / 采样 / 汇总 / 代码提取)
//!     ↓
//! clients + infrastructure (模型后端、结果文件、浏览器)
//! ```

pub mod app;
pub mod batch_processor;

pub use app::{App, PipelineMode};
pub use batch_processor::{BatchProcessor, BatchReport, BatchSettings};
