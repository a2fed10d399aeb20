pub mod logging;
pub mod paths;
pub mod retry;

pub use logging::LogContext;
pub use paths::{results_file_path, PathResolver};
pub use retry::RetryPolicy;
