// Re-exports so callers can "use crate::config::*".
pub mod logging;
pub mod platform;
pub mod store;
pub mod types;

pub use logging::*;
pub use platform::*;
pub use store::*;
pub use types::*;
