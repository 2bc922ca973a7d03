//! The middleware chain in front of the router.
//!
//! Order, outermost first: billing interceptor, session gate, router.

pub mod billing;
pub mod protection;
pub mod session_gate;

pub use billing::{billing_interceptor, CHARGE_PATH};
pub use protection::{GatedRouter, ProtectionTable};
pub use session_gate::{session_gate, DenialReason, GateDenial, GateState};
