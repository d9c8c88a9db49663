//! Session orchestration module.

mod orchestrator;
mod summary;

pub use orchestrator::Session;
pub use summary::{print_json, print_summary};
