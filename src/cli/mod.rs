//! CLI command handling

pub mod events;
pub mod output;
pub mod runtime;

pub use events::*;
pub use output::*;
pub use runtime::*;
