//! Error handling subsystem. Implements the closed error taxonomy of the
//! authority core.

use axum::{http::StatusCode, response::IntoResponse, Json};

use crate::prelude::*;
use crate::types::ErrorResponse;

pub type GhResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	/// Entity absent or already expired
	NotFound,
	/// Input fails a documented constraint (password policy, missing form
	/// field, FQDN mismatch, tampered secure ID)
	BadParameter(String),
	/// A named lock is currently held by another owner
	AlreadyExists(String),
	/// Key primitive or codec failure
	CryptoError(String),
	/// Any other unexpected condition
	Internal(String),

	// externals
	Io(std::io::Error),
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		warn!("io error: {}", err);
		Self::Io(err)
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "{:?}", self)
	}
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
	fn into_response(self) -> axum::response::Response {
		let (status, message) = match self {
			Error::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
			Error::BadParameter(msg) => (StatusCode::BAD_REQUEST, msg),
			// The remaining variants are never detailed to the client; the
			// original cause is logged here and the body stays generic.
			Error::AlreadyExists(msg) => {
				warn!("already exists: {}", msg);
				(StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
			}
			Error::CryptoError(msg) => {
				warn!("crypto error: {}", msg);
				(StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
			}
			Error::Internal(msg) => {
				warn!("internal error: {}", msg);
				(StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
			}
			Error::Io(err) => {
				warn!("io error: {}", err);
				(StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
			}
		};

		(status, Json(ErrorResponse::new(message))).into_response()
	}
}

impl From<serde_json::Error> for Error {
	fn from(_err: serde_json::Error) -> Self {
		warn!("json error: {}", _err);
		Error::Internal("serialization error".into())
	}
}

impl From<std::str::Utf8Error> for Error {
	fn from(_err: std::str::Utf8Error) -> Self {
		warn!("utf8 error: {}", _err);
		Error::BadParameter("invalid utf-8 payload".into())
	}
}

impl From<ssh_key::Error> for Error {
	fn from(_err: ssh_key::Error) -> Self {
		eprintln!("DEBUG ssh key error: {:?}", _err);
		warn!("ssh key error: {}", _err);
		Error::CryptoError("SSH key operation failed".into())
	}
}

impl From<russh::keys::ssh_key::Error> for Error {
	fn from(_err: russh::keys::ssh_key::Error) -> Self {
		eprintln!("DEBUG russh ssh key error: {:?}", _err);
		warn!("ssh key error: {}", _err);
		Error::CryptoError("SSH key operation failed".into())
	}
}

impl From<russh::Error> for Error {
	fn from(_err: russh::Error) -> Self {
		warn!("ssh error: {}", _err);
		Error::Internal("SSH transport error".into())
	}
}

impl From<axum::Error> for Error {
	fn from(_err: axum::Error) -> Self {
		warn!("axum error: {}", _err);
		Error::Internal("http error".into())
	}
}

impl From<hyper::Error> for Error {
	fn from(_err: hyper::Error) -> Self {
		warn!("hyper error: {}", _err);
		Error::Internal("HTTP client error".into())
	}
}

impl From<hyper::http::Error> for Error {
	fn from(_err: hyper::http::Error) -> Self {
		warn!("http error: {}", _err);
		Error::Internal("HTTP client error".into())
	}
}

impl From<tokio::task::JoinError> for Error {
	fn from(_err: tokio::task::JoinError) -> Self {
		warn!("tokio join error: {}", _err);
		Error::Internal("task execution failed".into())
	}
}

// vim: ts=4
