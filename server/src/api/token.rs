//! Handlers for provisioning tokens.

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	Json,
};
use serde::{Deserialize, Serialize};

use super::extract::{parse_ttl, Form};
use super::{OkRes, OK};
use crate::prelude::*;

#[derive(Deserialize)]
pub struct TokenReq {
	fqdn: String,
	ttl: Option<String>,
}

#[derive(Serialize)]
pub struct TokenRes {
	token: String,
}

/// # POST /v1/tokens
pub async fn post_token(
	State(app): State<App>,
	Form(req): Form<TokenReq>,
) -> GhResult<Json<TokenRes>> {
	let ttl = parse_ttl(req.ttl.as_deref())?;
	let token = app.authority.generate_token(&req.fqdn, ttl).await?;
	Ok(Json(TokenRes { token: token.into() }))
}

#[derive(Deserialize)]
pub struct ValidateQuery {
	token: String,
	fqdn: String,
}

/// # GET /v1/tokens
///
/// Validation is read-only; the token survives any number of checks.
pub async fn get_token_validate(
	State(app): State<App>,
	Query(query): Query<ValidateQuery>,
) -> GhResult<(StatusCode, Json<OkRes>)> {
	app.authority.validate_token(&query.token, &query.fqdn).await?;
	Ok((StatusCode::OK, Json(OK)))
}

/// # DELETE /v1/tokens/{token}
pub async fn delete_token(
	State(app): State<App>,
	Path(token): Path<String>,
) -> GhResult<(StatusCode, Json<OkRes>)> {
	app.authority.delete_token(&token).await?;
	Ok((StatusCode::OK, Json(OK)))
}

// vim: ts=4
