//! Front-end bootstrap: decides, on page load, whether to leave for the
//! install flow, or to obtain and verify a session before rendering.
//!
//! The transitions live in [`machine`] and are pure; [`driver`] runs them
//! against an embedding bridge and the server's `/verify_token`.

pub mod driver;
pub mod machine;

pub use driver::{run_bootstrap, EmbeddingBridge, HttpSessionVerifier, SessionVerifier};
pub use machine::{Bootstrap, BootstrapConfig, BootstrapEvent, BootstrapState, VerifyOutcome};
