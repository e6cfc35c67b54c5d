//! JSON API
//!
//! Thin transport adapter over the session core. Handlers parse untrusted
//! input, run the state machine against the session store and render the
//! outcome.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use server::{create_app, ApiServer};
