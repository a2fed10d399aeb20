pub mod json_loader;

pub use json_loader::{filter_pending, load_completed_indices, load_dataset};
