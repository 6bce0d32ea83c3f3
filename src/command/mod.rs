//! Command routing and per-function handlers

pub mod handlers;
mod router;

pub use router::Router;
