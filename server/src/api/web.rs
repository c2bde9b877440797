//! Handlers for registered application tunnels.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	Json,
};
use serde::{Deserialize, Serialize};

use super::extract::Form;
use super::{OkRes, OK};
use crate::prelude::*;
use crate::services::web::WebTun;

#[derive(Deserialize)]
pub struct WebTunReq {
	prefix: String,
	target: String,
	proxy: String,
}

/// # POST /v1/tunnels/web
pub async fn post_web_tun(
	State(app): State<App>,
	Form(req): Form<WebTunReq>,
) -> GhResult<(StatusCode, Json<OkRes>)> {
	let tun = WebTun {
		prefix: req.prefix.into(),
		target_addr: req.target.into(),
		proxy_addr: req.proxy.into(),
	};
	app.authority.upsert_web_tun(&tun).await?;
	Ok((StatusCode::OK, Json(OK)))
}

#[derive(Serialize)]
pub struct WebTunsRes {
	tunnels: Vec<WebTun>,
}

/// # GET /v1/tunnels/web
pub async fn get_web_tuns(State(app): State<App>) -> GhResult<Json<WebTunsRes>> {
	Ok(Json(WebTunsRes { tunnels: app.authority.get_web_tuns().await? }))
}

/// # GET /v1/tunnels/web/{prefix}
pub async fn get_web_tun(
	State(app): State<App>,
	Path(prefix): Path<String>,
) -> GhResult<Json<WebTun>> {
	Ok(Json(app.authority.get_web_tun(&prefix).await?))
}

/// # DELETE /v1/tunnels/web/{prefix}
pub async fn delete_web_tun(
	State(app): State<App>,
	Path(prefix): Path<String>,
) -> GhResult<(StatusCode, Json<OkRes>)> {
	app.authority.delete_web_tun(&prefix).await?;
	Ok((StatusCode::OK, Json(OK)))
}

// vim: ts=4
