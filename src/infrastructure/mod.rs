//! 基础设施层
//!
//! 持有稀缺资源（结果文件、浏览器），只暴露能力，不认识流程。

pub mod figure_renderer;
pub mod result_store;

pub use figure_renderer::{ChromeRenderer, FigureRenderer};
pub use result_store::{AppendOutcome, ResultStore};
