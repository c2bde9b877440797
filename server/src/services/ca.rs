//! Certificate authority entities: the two local CA singletons and the
//! trusted certificates of remote authorities.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::keystore_adapter::KeystoreAdapter;
use crate::prelude::*;

/// The two CA singletons of an administrative domain. They share structure
/// and differ only in the key they live under and the class of certificate
/// their private half signs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CaKind {
	Host,
	User,
}

impl CaKind {
	pub fn key_name(&self) -> &'static str {
		match self {
			CaKind::Host => "hostca",
			CaKind::User => "userca",
		}
	}
}

impl std::fmt::Display for CaKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.key_name())
	}
}

/// A CA key pair. Stored as one value, so the two halves are never
/// observable in a partially written state.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CertAuthority {
	/// Authorized-key form
	pub public_key: Box<str>,
	/// OpenSSH PEM form
	pub private_key: Box<str>,
}

/// Which class of remote certificate a peer authority is trusted for
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteCertKind {
	Host,
	User,
}

impl std::str::FromStr for RemoteCertKind {
	type Err = Error;

	fn from_str(s: &str) -> GhResult<Self> {
		match s {
			"host" => Ok(RemoteCertKind::Host),
			"user" => Ok(RemoteCertKind::User),
			other => Err(Error::BadParameter(format!("unknown remote cert type: {:?}", other))),
		}
	}
}

impl RemoteCertKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			RemoteCertKind::Host => "host",
			RemoteCertKind::User => "user",
		}
	}
}

/// Trust of a peer authority's public key
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RemoteCert {
	#[serde(rename = "type")]
	pub kind: RemoteCertKind,
	pub fqdn: Box<str>,
	pub id: Box<str>,
	/// Authorized-key form
	pub value: Box<str>,
}

#[derive(Clone, Debug)]
pub struct CaService {
	keystore: Arc<dyn KeystoreAdapter>,
}

impl CaService {
	pub fn new(keystore: Arc<dyn KeystoreAdapter>) -> Self {
		Self { keystore }
	}

	/// Replaces the CA singleton in place. Certificates signed by the
	/// superseded key stay syntactically valid but fail trust checks from
	/// this moment on.
	pub async fn upsert_ca(&self, kind: CaKind, ca: &CertAuthority) -> GhResult<()> {
		let value = serde_json::to_vec(ca)?;
		self.keystore.upsert(&["ca", kind.key_name()], &value, Duration::ZERO).await
	}

	pub async fn read_ca(&self, kind: CaKind) -> GhResult<CertAuthority> {
		let value = self.keystore.read(&["ca", kind.key_name()]).await?;
		Ok(serde_json::from_slice(&value)?)
	}

	pub async fn upsert_remote_cert(&self, cert: &RemoteCert) -> GhResult<()> {
		let value = serde_json::to_vec(cert)?;
		self.keystore
			.upsert(&["ca", "remote", cert.kind.as_str(), &cert.fqdn, &cert.id], &value, Duration::ZERO)
			.await
	}

	/// Lists trusted remote certs of `kind`. An empty `fqdn` matches every
	/// remote authority.
	pub async fn get_remote_certs(&self, kind: RemoteCertKind, fqdn: &str) -> GhResult<Vec<RemoteCert>> {
		let fqdns: Vec<Box<str>> = if fqdn.is_empty() {
			self.keystore.list(&["ca", "remote", kind.as_str()]).await?
		} else {
			vec![fqdn.into()]
		};

		let mut certs = Vec::new();
		for fqdn in &fqdns {
			let path = ["ca", "remote", kind.as_str(), fqdn.as_ref()];
			let ids = match self.keystore.list(&path).await {
				Ok(ids) => ids,
				Err(Error::NotFound) => continue,
				Err(err) => return Err(err),
			};
			for id in &ids {
				let value = self
					.keystore
					.read(&["ca", "remote", kind.as_str(), fqdn.as_ref(), id.as_ref()])
					.await?;
				certs.push(serde_json::from_slice(&value)?);
			}
		}
		Ok(certs)
	}

	pub async fn delete_remote_cert(&self, kind: RemoteCertKind, fqdn: &str, id: &str) -> GhResult<()> {
		self.keystore.delete(&["ca", "remote", kind.as_str(), fqdn, id]).await
	}
}

// vim: ts=4
