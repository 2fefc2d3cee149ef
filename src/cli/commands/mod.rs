//! CLI command implementations.

mod ask;
mod build;
mod search;
mod status;
mod summary;

pub use ask::run_ask;
pub use build::run_build;
pub use search::run_search;
pub use status::run_status;
pub use summary::run_summary;
