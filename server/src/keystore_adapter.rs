//! Adapter contract for the cluster keystore: a flat namespaced key/value
//! store with per-key TTL, atomic upsert/create/delete and typed not-found
//! errors. Every conforming backend (in-memory, on-disk, replicated) keeps
//! the same observable semantics.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::prelude::*;

/// Maximum depth of a compound key. Deeper paths are a caller bug.
pub const MAX_PATH_DEPTH: usize = 8;

/// Joins a compound key into its canonical flat form.
///
/// Path segments must be non-empty and must not contain `/`; the canonical
/// form is what conforming backends key on, so two paths are equal exactly
/// when their joined forms are equal.
pub fn join_path(path: &[&str]) -> GhResult<String> {
	if path.is_empty() || path.len() > MAX_PATH_DEPTH {
		return Err(Error::BadParameter(format!("invalid key path depth: {}", path.len())));
	}
	for seg in path {
		if seg.is_empty() || seg.contains('/') {
			return Err(Error::BadParameter(format!("invalid key path segment: {:?}", seg)));
		}
	}
	Ok(path.join("/"))
}

/// A Gatehouse keystore adapter
///
/// All persisted entities of the authority live behind this trait. A TTL of
/// `Duration::ZERO` means the entry is permanent; any other TTL is an
/// absolute deadline measured from the moment of the write, with second
/// resolution. Expired entries behave exactly like absent ones.
#[async_trait]
pub trait KeystoreAdapter: Debug + Send + Sync {
	/// Writes `value` under `path`, replacing any previous value and TTL.
	async fn upsert(&self, path: &[&str], value: &[u8], ttl: Duration) -> GhResult<()>;

	/// Writes `value` under `path` only if no live entry exists there.
	/// Fails with `AlreadyExists` otherwise. The check and the write are a
	/// single atomic step.
	async fn create(&self, path: &[&str], value: &[u8], ttl: Duration) -> GhResult<()>;

	/// Reads the value under `path`. Fails with `NotFound` if the entry is
	/// absent or expired.
	async fn read(&self, path: &[&str]) -> GhResult<Vec<u8>>;

	/// Deletes the entry under `path`. Fails with `NotFound` if there is no
	/// live entry.
	async fn delete(&self, path: &[&str]) -> GhResult<()>;

	/// Deletes every entry at or below `prefix`. Deleting an empty subtree
	/// is not an error.
	async fn delete_range(&self, prefix: &[&str]) -> GhResult<()>;

	/// Lists the names of the immediate children below `prefix`, sorted,
	/// excluding expired entries.
	async fn list(&self, prefix: &[&str]) -> GhResult<Vec<Box<str>>>;
}


// vim: ts=4
