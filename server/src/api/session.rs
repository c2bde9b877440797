//! Handlers for site sessions, routed to the injected session adapter.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	Json,
};
use serde::{Deserialize, Serialize};

use super::extract::Form;
use super::{OkRes, OK};
use crate::prelude::*;
use crate::session_adapter::{Party, SiteSession};

#[derive(Deserialize)]
pub struct SessionReq {
	id: String,
}

/// # POST /v1/sessions
pub async fn post_session(
	State(app): State<App>,
	Form(req): Form<SessionReq>,
) -> GhResult<(StatusCode, Json<OkRes>)> {
	let session = SiteSession { id: req.id.into(), parties: Vec::new() };
	app.sessions.upsert_session(&session).await?;
	Ok((StatusCode::OK, Json(OK)))
}

#[derive(Serialize)]
pub struct SessionsRes {
	sessions: Vec<SiteSession>,
}

/// # GET /v1/sessions
pub async fn get_sessions(State(app): State<App>) -> GhResult<Json<SessionsRes>> {
	Ok(Json(SessionsRes { sessions: app.sessions.get_sessions().await? }))
}

/// # GET /v1/sessions/{id}
pub async fn get_session(
	State(app): State<App>,
	Path(id): Path<String>,
) -> GhResult<Json<SiteSession>> {
	Ok(Json(app.sessions.read_session(&id).await?))
}

/// # DELETE /v1/sessions/{id}
pub async fn delete_session(
	State(app): State<App>,
	Path(id): Path<String>,
) -> GhResult<(StatusCode, Json<OkRes>)> {
	app.sessions.delete_session(&id).await?;
	Ok((StatusCode::OK, Json(OK)))
}

#[derive(Deserialize)]
pub struct PartyReq {
	id: String,
	user: String,
	remote_addr: Option<String>,
}

/// # POST /v1/sessions/{id}/parties
pub async fn post_party(
	State(app): State<App>,
	Path(session_id): Path<String>,
	Form(req): Form<PartyReq>,
) -> GhResult<(StatusCode, Json<OkRes>)> {
	let party = Party {
		id: req.id.into(),
		user: req.user.into(),
		remote_addr: req.remote_addr.unwrap_or_default().into(),
		last_active: Timestamp::now(),
	};
	app.sessions.upsert_party(&session_id, &party).await?;
	Ok((StatusCode::OK, Json(OK)))
}

// vim: ts=4
