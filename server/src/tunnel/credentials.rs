//! The structured credential carried in the SSH password field. The tunnel
//! accepts three shapes of it, plus host certificates on the publickey
//! method.

use serde::{Deserialize, Serialize};

use crate::prelude::*;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum CredKind {
	#[serde(rename = "password")]
	Password,
	#[serde(rename = "session")]
	Session,
	#[serde(rename = "provision-token")]
	ProvisionToken,
}

/// The credential bucket marshaled into the SSH password blob
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AuthCred {
	pub user: Box<str>,
	#[serde(rename = "type")]
	pub kind: CredKind,
	pub pass: Box<str>,
}

impl AuthCred {
	pub fn password(user: impl Into<Box<str>>, pass: impl Into<Box<str>>) -> Self {
		Self { user: user.into(), kind: CredKind::Password, pass: pass.into() }
	}

	pub fn session(user: impl Into<Box<str>>, sid: impl Into<Box<str>>) -> Self {
		Self { user: user.into(), kind: CredKind::Session, pass: sid.into() }
	}

	/// For provisioning tokens the user field carries the FQDN the token
	/// was minted for.
	pub fn token(fqdn: impl Into<Box<str>>, token: impl Into<Box<str>>) -> Self {
		Self { user: fqdn.into(), kind: CredKind::ProvisionToken, pass: token.into() }
	}

	pub fn marshal(&self) -> GhResult<String> {
		Ok(serde_json::to_string(self)?)
	}

	pub fn unmarshal(raw: &str) -> GhResult<Self> {
		serde_json::from_str(raw).map_err(|_| Error::BadParameter("malformed credential".into()))
	}
}


// vim: ts=4
