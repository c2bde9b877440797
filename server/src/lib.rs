//! Gatehouse authority core: SSH certificate authority, web sessions,
//! provisioning tokens and the authenticating SSH tunnel in front of them.
//!
//! The crate is assembled through [`core::app::AppBuilder`]: inject a
//! keystore adapter (and optionally session/event adapters), build the app,
//! run [`bootstrap::init`] to establish cluster state, then serve
//! [`routes::init`] on the REST address and [`tunnel::server::TunServer`]
//! on the tunnel address.

pub mod api;
pub mod authority;
pub mod bootstrap;
pub mod core;
pub mod crypto;
pub mod error;
pub mod event_adapter;
pub mod keystore_adapter;
pub mod prelude;
pub mod routes;
pub mod services;
pub mod session_adapter;
pub mod tunnel;
pub mod types;

pub use crate::core::app::{App, AppBuilder, AppState};
pub use crate::error::{Error, GhResult};

/// Initializes the tracing subscriber from the environment. Safe to call
/// more than once; later calls are no-ops.
pub fn init_logging() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_target(false)
		.try_init();
}

// vim: ts=4
