//! In-memory keystore adapter: a `BTreeMap` behind an async lock, with
//! per-entry deadlines. Expired entries behave exactly like absent ones;
//! they are skipped on read and pruned on the next write.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use gatehouse::keystore_adapter::{join_path, KeystoreAdapter};
use gatehouse::{Error, GhResult};

#[derive(Debug)]
struct Entry {
	value: Vec<u8>,
	expires_at: Option<Instant>,
}

impl Entry {
	fn new(value: &[u8], ttl: Duration) -> Self {
		let expires_at = if ttl.is_zero() { None } else { Some(Instant::now() + ttl) };
		Self { value: value.to_vec(), expires_at }
	}

	fn is_live(&self, now: Instant) -> bool {
		match self.expires_at {
			None => true,
			Some(deadline) => now < deadline,
		}
	}
}

#[derive(Debug, Default)]
pub struct KeystoreAdapterMemory {
	entries: RwLock<BTreeMap<String, Entry>>,
}

impl KeystoreAdapterMemory {
	pub fn new() -> Self {
		Self::default()
	}
}

fn prune(entries: &mut BTreeMap<String, Entry>, now: Instant) {
	entries.retain(|_, entry| entry.is_live(now));
}

#[async_trait]
impl KeystoreAdapter for KeystoreAdapterMemory {
	async fn upsert(&self, path: &[&str], value: &[u8], ttl: Duration) -> GhResult<()> {
		let key = join_path(path)?;
		let mut entries = self.entries.write().await;
		prune(&mut entries, Instant::now());
		entries.insert(key, Entry::new(value, ttl));
		Ok(())
	}

	async fn create(&self, path: &[&str], value: &[u8], ttl: Duration) -> GhResult<()> {
		let key = join_path(path)?;
		let mut entries = self.entries.write().await;
		let now = Instant::now();
		prune(&mut entries, now);
		if entries.contains_key(&key) {
			return Err(Error::AlreadyExists(key));
		}
		entries.insert(key, Entry::new(value, ttl));
		Ok(())
	}

	async fn read(&self, path: &[&str]) -> GhResult<Vec<u8>> {
		let key = join_path(path)?;
		let entries = self.entries.read().await;
		match entries.get(&key) {
			Some(entry) if entry.is_live(Instant::now()) => Ok(entry.value.clone()),
			_ => Err(Error::NotFound),
		}
	}

	async fn delete(&self, path: &[&str]) -> GhResult<()> {
		let key = join_path(path)?;
		let mut entries = self.entries.write().await;
		let now = Instant::now();
		match entries.remove(&key) {
			Some(entry) if entry.is_live(now) => Ok(()),
			_ => Err(Error::NotFound),
		}
	}

	async fn delete_range(&self, prefix: &[&str]) -> GhResult<()> {
		let prefix = join_path(prefix)?;
		let subtree = format!("{}/", prefix);
		let mut entries = self.entries.write().await;
		entries.retain(|key, _| key != &prefix && !key.starts_with(&subtree));
		Ok(())
	}

	async fn list(&self, prefix: &[&str]) -> GhResult<Vec<Box<str>>> {
		let prefix = join_path(prefix)?;
		let subtree = format!("{}/", prefix);
		let now = Instant::now();

		let entries = self.entries.read().await;
		let mut children: Vec<Box<str>> = Vec::new();
		for (key, entry) in entries.range(subtree.clone()..) {
			if !key.starts_with(&subtree) {
				break;
			}
			if !entry.is_live(now) {
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
