//! Handlers for audit event submit/retrieve.

use axum::{
	extract::{Query, State},
	http::StatusCode,
	Json,
};
use serde::{Deserialize, Serialize};

use super::extract::Form;
use super::{OkRes, OK};
use crate::event_adapter::Event;
use crate::prelude::*;

#[derive(Deserialize)]
pub struct EventReq {
	schema: String,
	/// JSON-encoded payload
	fields: Option<String>,
}

/// # POST /v1/events
pub async fn post_event(
	State(app): State<App>,
	Form(req): Form<EventReq>,
) -> GhResult<(StatusCode, Json<OkRes>)> {
	let fields = match req.fields.as_deref() {
		Some(raw) if !raw.is_empty() => serde_json::from_str(raw)
			.map_err(|_| Error::BadParameter("fields is not valid JSON".into()))?,
		_ => serde_json::Value::Null,
	};
	let event = Event { schema: req.schema.into(), created: Timestamp::now(), fields };
	app.events.submit(event).await?;
	Ok((StatusCode::OK, Json(OK)))
}

#[derive(Deserialize)]
pub struct EventQuery {
	schema: Option<String>,
}

#[derive(Serialize)]
pub struct EventsRes {
	events: Vec<Event>,
}

/// # GET /v1/events
pub async fn get_events(
	State(app): State<App>,
	Query(query): Query<EventQuery>,
) -> GhResult<Json<EventsRes>> {
	let events = app.events.query(query.schema.as_deref().unwrap_or_default()).await?;
	Ok(Json(EventsRes { events }))
}

// vim: ts=4
