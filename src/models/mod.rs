pub mod level;
pub mod loaders;
pub mod problem;
pub mod subject;

pub use level::level_label;
pub use loaders::{filter_pending, load_completed_indices, load_dataset};
pub use problem::{I2tRecord, ImageOutcome, Language, ProblemItem, ResultRecord};
pub use subject::Subject;
