//! Advisory named locks over the keystore. Acquisition is non-blocking;
//! a held lock auto-expires with its TTL, so a crashed holder cannot wedge
//! the cluster.

use rand::RngExt;
use std::sync::Arc;

use crate::keystore_adapter::KeystoreAdapter;
use crate::prelude::*;

#[derive(Clone, Debug)]
pub struct LockService {
	keystore: Arc<dyn KeystoreAdapter>,
}

impl LockService {
	pub fn new(keystore: Arc<dyn KeystoreAdapter>) -> Self {
		Self { keystore }
	}

	/// Tries to take the named lock. Fails with `AlreadyExists` if another
	/// owner currently holds it.
	pub async fn acquire(&self, name: &str, ttl: Duration) -> GhResult<()> {
		// stored owner tag is only ever read by humans debugging a wedge
		let owner = format!("{:016x}", rand::rng().random::<u64>());
		self.keystore
			.create(&["locks", name], owner.as_bytes(), ttl)
			.await
			.map_err(|err| match err {
				Error::AlreadyExists(_) => Error::AlreadyExists(format!("lock held: {}", name)),
				err => err,
			})
	}

	/// Releases the named lock. Releasing a lock that is not held is not an
	/// error.
	pub async fn release(&self, name: &str) -> GhResult<()> {
		match self.keystore.delete(&["locks", name]).await {
			Ok(()) | Err(Error::NotFound) => Ok(()),
			Err(err) => Err(err),
		}
	}
}

// vim: ts=4
