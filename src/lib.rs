//! Library exports for appgate, shared between the binary and tests.

pub mod bootstrap;
pub mod config;
pub mod gate;
pub mod models;
pub mod platform;
pub mod routes;
pub mod startup;
pub mod state;
pub mod store;
pub mod utils;
