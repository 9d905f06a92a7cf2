//! HTTP gateway for the RBM callback channel.
//!
//! Receives GSMA UP events on `/api/rbm/callback`, runs them through
//! validation, routing, and conversation tracking, and hands each result to
//! the forwarding sink on a detached task. Status and conversation admin
//! queries ride alongside on the same router.

pub mod routes;
pub mod server;
pub mod state;
pub mod sweep;

pub use {
    server::{build_callback_app, sink_from_config, start_gateway},
    state::{CallbackState, DedupeCache, SERVICE_NAME},
};
