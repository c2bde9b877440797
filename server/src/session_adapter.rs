//! Adapter for site sessions (interactive terminal sessions and their
//! parties). The authority core does not interpret these; it only routes
//! REST operations to whichever store is injected.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use tokio::sync::RwLock;

use crate::prelude::*;

/// A participant of a site session
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Party {
	pub id: Box<str>,
	pub user: Box<str>,
	pub remote_addr: Box<str>,
	pub last_active: Timestamp,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SiteSession {
	pub id: Box<str>,
	pub parties: Vec<Party>,
}

#[async_trait]
pub trait SessionAdapter: Debug + Send + Sync {
	async fn upsert_session(&self, session: &SiteSession) -> GhResult<()>;
	async fn read_session(&self, id: &str) -> GhResult<SiteSession>;
	async fn get_sessions(&self) -> GhResult<Vec<SiteSession>>;
	async fn delete_session(&self, id: &str) -> GhResult<()>;

	/// Adds or refreshes a party within a session.
	async fn upsert_party(&self, session_id: &str, party: &Party) -> GhResult<()>;
}

/// Process-local session store, used when no external recorder is wired in.
#[derive(Debug, Default)]
pub struct SessionAdapterMemory {
	sessions: RwLock<HashMap<Box<str>, SiteSession>>,
}

impl SessionAdapterMemory {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl SessionAdapter for SessionAdapterMemory {
	async fn upsert_session(&self, session: &SiteSession) -> GhResult<()> {
		self.sessions.write().await.insert(session.id.clone(), session.clone());
		Ok(())
	}

	async fn read_session(&self, id: &str) -> GhResult<SiteSession> {
		self.sessions.read().await.get(id).cloned().ok_or(Error::NotFound)
	}

	async fn get_sessions(&self) -> GhResult<Vec<SiteSession>> {
		let mut sessions: Vec<_> = self.sessions.read().await.values().cloned().collect();
		sessions.sort_by(|a, b| a.id.cmp(&b.id));
		Ok(sessions)
	}

	async fn delete_session(&self, id: &str) -> GhResult<()> {
		self.sessions.write().await.remove(id).map(|_| ()).ok_or(Error::NotFound)
	}

	async fn upsert_party(&self, session_id: &str, party: &Party) -> GhResult<()> {
		let mut sessions = self.sessions.write().await;
		let session = sessions.get_mut(session_id).ok_or(Error::NotFound)?;
		match session.parties.iter_mut().find(|p| p.id == party.id) {
			Some(existing) => *existing = party.clone(),
			None => session.parties.push(party.clone()),
		}
		Ok(())
	}
}

// vim: ts=4
