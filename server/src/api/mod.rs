//! REST facade: a pure mapping from the `/v1/` HTTP surface onto authority
//! operations. Handlers parse forms, call the authority and shape the JSON
//! response; error translation lives on the `Error` type.

pub mod ca;
pub mod event;
pub mod extract;
pub mod presence;
pub mod session;
pub mod token;
pub mod user;
pub mod web;

use serde::Serialize;

/// `{"message":"ok"}` — the body of mutating endpoints with nothing better
/// to say.
#[derive(Debug, Serialize)]
pub struct OkRes {
	pub message: &'static str,
}

pub const OK: OkRes = OkRes { message: "ok" };

// vim: ts=4
