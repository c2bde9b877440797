//! Adapter for the audit event log. The core treats it as an opaque sink.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tokio::sync::RwLock;

use crate::prelude::*;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Event {
	/// Event type tag, e.g. `auth.signin`
	pub schema: Box<str>,
	pub created: Timestamp,
	#[serde(default)]
	pub fields: serde_json::Value,
}

#[async_trait]
pub trait EventAdapter: Debug + Send + Sync {
	async fn submit(&self, event: Event) -> GhResult<()>;

	/// Returns events whose schema starts with `schema`; an empty filter
	/// returns everything, oldest first.
	async fn query(&self, schema: &str) -> GhResult<Vec<Event>>;
}

/// Process-local event log, used when no external ingest is wired in.
#[derive(Debug, Default)]
pub struct EventAdapterMemory {
	events: RwLock<Vec<Event>>,
}

impl EventAdapterMemory {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl EventAdapter for EventAdapterMemory {
	async fn submit(&self, event: Event) -> GhResult<()> {
		self.events.write().await.push(event);
		Ok(())
	}

	async fn query(&self, schema: &str) -> GhResult<Vec<Event>> {
		let events = self.events.read().await;
		Ok(events.iter().filter(|e| e.schema.starts_with(schema)).cloned().collect())
	}
}

// vim: ts=4
