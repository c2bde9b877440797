//! Handlers for node presence.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use super::extract::{parse_ttl, Form};
use super::{OkRes, OK};
use crate::prelude::*;
use crate::services::presence::Server;

#[derive(Deserialize)]
pub struct ServerReq {
	id: String,
	addr: String,
	ttl: Option<String>,
}

/// # POST /v1/servers
pub async fn post_server(
	State(app): State<App>,
	Form(req): Form<ServerReq>,
) -> GhResult<(StatusCode, Json<OkRes>)> {
	let ttl = parse_ttl(req.ttl.as_deref())?;
	let server = Server { id: req.id.into(), addr: req.addr.into() };
	app.authority.upsert_server(&server, ttl).await?;
	Ok((StatusCode::OK, Json(OK)))
}

#[derive(Serialize)]
pub struct ServersRes {
	servers: Vec<Server>,
}

/// # GET /v1/servers
pub async fn get_servers(State(app): State<App>) -> GhResult<Json<ServersRes>> {
	Ok(Json(ServersRes { servers: app.authority.get_servers().await? }))
}

// vim: ts=4
