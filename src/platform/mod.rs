//! Calls to, and credentials from, the host platform: OAuth code exchange,
//! session token verification, webhook registration and signature checks.

pub mod client;
pub mod oauth;
pub mod session_token;
pub mod webhooks;

pub use client::PlatformClient;
pub use session_token::SessionTokenVerifier;
