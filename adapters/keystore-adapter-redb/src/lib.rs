//! redb-backed keystore adapter: persistent namespaced key/value storage
//! with per-key TTL.
//!
//! # Storage Layout
//!
//! One table, `entries`, keyed by the joined path. Each value carries an
//! 8-byte big-endian deadline prefix (Unix seconds, 0 = permanent) followed
//! by the payload. Deadlines are wall-clock because they must survive a
//! restart.
//!
//! Expired entries are invisible to every operation; they are physically
//! removed when their key is written again or by [`KeystoreAdapterRedb::vacuum`].

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::warn;

use gatehouse::keystore_adapter::{join_path, KeystoreAdapter};
use gatehouse::{Error, GhResult};

const TABLE_ENTRIES: TableDefinition<&str, &[u8]> = TableDefinition::new("entries");

const DEADLINE_LEN: usize = 8;

fn now_timestamp() -> u64 {
	SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

fn db_err(err: impl std::fmt::Display) -> Error {
	warn!("redb error: {}", err);
	Error::Internal("keystore backend error".into())
}

fn encode_entry(value: &[u8], ttl: Duration) -> Vec<u8> {
	let deadline = if ttl.is_zero() { 0 } else { now_timestamp() + ttl.as_secs().max(1) };
	let mut raw = Vec::with_capacity(DEADLINE_LEN + value.len());
	raw.extend_from_slice(&deadline.to_be_bytes());
	raw.extend_from_slice(value);
	raw
}

/// Returns the payload if the entry is live, `None` if it has expired.
fn decode_entry(raw: &[u8], now: u64) -> Option<Vec<u8>> {
	if raw.len() < DEADLINE_LEN {
		return None;
	}
	let mut deadline = [0u8; DEADLINE_LEN];
	deadline.copy_from_slice(&raw[..DEADLINE_LEN]);
	let deadline = u64::from_be_bytes(deadline);
	if deadline != 0 && now >= deadline {
		return None;
	}
	Some(raw[DEADLINE_LEN..].to_vec())
}

#[derive(Debug)]
pub struct KeystoreAdapterRedb {
	db: Database,
}

impl KeystoreAdapterRedb {
	pub fn new(path: impl AsRef<Path>) -> GhResult<Self> {
		let db = Database::create(path.as_ref()).map_err(db_err)?;

		// Make sure the table exists so read transactions never race its
		// creation.
		let txn = db.begin_write().map_err(db_err)?;
		{
			txn.open_table(TABLE_ENTRIES).map_err(db_err)?;
		}
		txn.commit().map_err(db_err)?;

		Ok(Self { db })
	}

	/// Physically removes every expired entry.
	pub fn vacuum(&self) -> GhResult<u64> {
		let now = now_timestamp();
		let txn = self.db.begin_write().map_err(db_err)?;
		let mut removed = 0;
		{
			let mut table = txn.open_table(TABLE_ENTRIES).map_err(db_err)?;
			let expired: Vec<String> = table
				.iter()
				.map_err(db_err)?
				.filter_map(|item| {
					let (key, value) = item.ok()?;
					if decode_entry(value.value(), now).is_none() {
						Some(key.value().to_owned())
					} else {
						None
					}
				})
				.collect();
			for key in &expired {
				table.remove(key.as_str()).map_err(db_err)?;
				removed += 1;
			}
		}
		txn.commit().map_err(db_err)?;
		Ok(removed)
	}
}

#[async_trait]
impl KeystoreAdapter for KeystoreAdapterRedb {
	async fn upsert(&self, path: &[&str], value: &[u8], ttl: Duration) -> GhResult<()> {
		let key = join_path(path)?;
		let raw = encode_entry(value, ttl);

		let txn = self.db.begin_write().map_err(db_err)?;
		{
			let mut table = txn.open_table(TABLE_ENTRIES).map_err(db_err)?;
			table.insert(key.as_str(), raw.as_slice()).map_err(db_err)?;
		}
		txn.commit().map_err(db_err)?;
		Ok(())
	}

	async fn create(&self, path: &[&str], value: &[u8], ttl: Duration) -> GhResult<()> {
		let key = join_path(path)?;
		let raw = encode_entry(value, ttl);
		let now = now_timestamp();

		let txn = self.db.begin_write().map_err(db_err)?;
		{
			let mut table = txn.open_table(TABLE_ENTRIES).map_err(db_err)?;
			let live = match table.get(key.as_str()).map_err(db_err)? {
				Some(existing) => decode_entry(existing.value(), now).is_some(),
				None => false,
			};
			if live {
				// leave the write transaction unapplied
				return Err(Error::AlreadyExists(key));
			}
			table.insert(key.as_str(), raw.as_slice()).map_err(db_err)?;
		}
		txn.commit().map_err(db_err)?;
		Ok(())
	}

	async fn read(&self, path: &[&str]) -> GhResult<Vec<u8>> {
		let key = join_path(path)?;
		let now = now_timestamp();

		let txn = self.db.begin_read().map_err(db_err)?;
		let table = txn.open_table(TABLE_ENTRIES).map_err(db_err)?;
		match table.get(key.as_str()).map_err(db_err)? {
			Some(raw) => decode_entry(raw.value(), now).ok_or(Error::NotFound),
			None => Err(Error::NotFound),
		}
	}

	async fn delete(&self, path: &[&str]) -> GhResult<()> {
		let key = join_path(path)?;
		let now = now_timestamp();

		let txn = self.db.begin_write().map_err(db_err)?;
		let deleted_live = {
			let mut table = txn.open_table(TABLE_ENTRIES).map_err(db_err)?;
			match table.remove(key.as_str()).map_err(db_err)? {
				Some(old) => decode_entry(old.value(), now).is_some(),
				None => false,
			}
		};
		txn.commit().map_err(db_err)?;

		if deleted_live { Ok(()) } else { Err(Error::NotFound) }
	}

	async fn delete_range(&self, prefix: &[&str]) -> GhResult<()> {
		let prefix = join_path(prefix)?;
		let subtree = format!("{}/", prefix);

		let txn = self.db.begin_write().map_err(db_err)?;
		{
			let mut table = txn.open_table(TABLE_ENTRIES).map_err(db_err)?;
			table.remove(prefix.as_str()).map_err(db_err)?;

			// keys below the prefix sort contiguously from `prefix/`
			let doomed: Vec<String> = table
				.range::<&str>(subtree.as_str()..)
				.map_err(db_err)?
				.map_while(|item| {
					let (key, _) = item.ok()?;
					let key = key.value();
					if key.starts_with(&subtree) { Some(key.to_owned()) } else { None }
				})
				.collect();
			for key in &doomed {
				table.remove(key.as_str()).map_err(db_err)?;
			}
		}
		txn.commit().map_err(db_err)?;
		Ok(())
	}

	async fn list(&self, prefix: &[&str]) -> GhResult<Vec<Box<str>>> {
		let prefix = join_path(prefix)?;
		let subtree = format!("{}/", prefix);
		let now = now_timestamp();

		let txn = self.db.begin_read().map_err(db_err)?;
		let table = txn.open_table(TABLE_ENTRIES).map_err(db_err)?;

		let mut children: Vec<Box<str>> = Vec::new();
		for item in table.range::<&str>(subtree.as_str()..).map_err(db_err)? {
			let (key, value) = item.map_err(db_err)?;
			let key = key.value();
			if !key.starts_with(&subtree) {
				break;
			}
			if decode_entry(value.value(), now).is_none() {
				continue;
			}
			let child = match key[subtree.len()..].split('/').next() {
				Some(child) if !child.is_empty() => child,
				_ => continue,
			};
			if children.last().map(|last| last.as_ref()) != Some(child) {
				children.push(child.into());
			}
		}
		Ok(children)
	}
}

// vim: ts=4
