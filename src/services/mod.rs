//! 业务能力层
//!
//! 每个服务只描述"我能做什么"，只处理单道题目，不关心批处理流程。

pub mod code_extractor;
pub mod consolidator;
pub mod meta_info;
pub mod prompt_store;
pub mod sample_generator;

pub use code_extractor::{extract_html_code, save_html_code};
pub use consolidator::{build_roll_out_responses, Consolidator};
pub use meta_info::build_meta_info;
pub use prompt_store::{format_template, PromptStore};
pub use sample_generator::{error_marker, SampleGenerator, SampleSet};
