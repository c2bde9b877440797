//! Handlers for user and key CRUD, passwords and web sessions.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	Json,
};
use serde::{Deserialize, Serialize};

use super::extract::{parse_ttl, Form};
use super::{OkRes, OK};
use crate::prelude::*;
use crate::services::user::AuthorizedKey;

#[derive(Serialize)]
pub struct UsersRes {
	users: Vec<Box<str>>,
}

/// # GET /v1/users
pub async fn get_users(State(app): State<App>) -> GhResult<Json<UsersRes>> {
	Ok(Json(UsersRes { users: app.authority.get_users().await? }))
}

/// # DELETE /v1/users/{user}
pub async fn delete_user(
	State(app): State<App>,
	Path(user): Path<String>,
) -> GhResult<(StatusCode, Json<OkRes>)> {
	app.authority.delete_user(&user).await?;
	Ok((StatusCode::OK, Json(OK)))
}

/// # POST /v1/users/{user}/keys
#[derive(Deserialize)]
pub struct UserKeyReq {
	id: String,
	key: String,
	ttl: Option<String>,
}

#[derive(Serialize)]
pub struct CertRes {
	cert: String,
}

pub async fn post_user_key(
	State(app): State<App>,
	Path(user): Path<String>,
	Form(req): Form<UserKeyReq>,
) -> GhResult<Json<CertRes>> {
	let ttl = parse_ttl(req.ttl.as_deref())?;
	let key = AuthorizedKey { id: req.id.into(), value: req.key.into() };
	let cert = app.authority.upsert_user_key(&user, &key, ttl).await?;
	Ok(Json(CertRes { cert: cert.into() }))
}

#[derive(Serialize)]
pub struct UserKeysRes {
	pubkeys: Vec<AuthorizedKey>,
}

/// # GET /v1/users/{user}/keys
pub async fn get_user_keys(
	State(app): State<App>,
	Path(user): Path<String>,
) -> GhResult<Json<UserKeysRes>> {
	Ok(Json(UserKeysRes { pubkeys: app.authority.get_user_keys(&user).await? }))
}

/// # DELETE /v1/users/{user}/keys/{key}
pub async fn delete_user_key(
	State(app): State<App>,
	Path((user, key)): Path<(String, String)>,
) -> GhResult<(StatusCode, Json<OkRes>)> {
	app.authority.delete_user_key(&user, &key).await?;
	Ok((StatusCode::OK, Json(OK)))
}

// Passwords

#[derive(Deserialize)]
pub struct PasswordReq {
	password: String,
}

/// # POST /v1/users/{user}/web/password
pub async fn post_password(
	State(app): State<App>,
	Path(user): Path<String>,
	Form(req): Form<PasswordReq>,
) -> GhResult<(StatusCode, Json<OkRes>)> {
	app.authority.upsert_password(&user, &req.password).await?;
	Ok((StatusCode::OK, Json(OK)))
}

/// # POST /v1/users/{user}/web/password/check
pub async fn post_password_check(
	State(app): State<App>,
	Path(user): Path<String>,
	Form(req): Form<PasswordReq>,
) -> GhResult<(StatusCode, Json<OkRes>)> {
	app.authority.check_password(&user, &req.password).await?;
	Ok((StatusCode::OK, Json(OK)))
}

// Web sessions

#[derive(Serialize)]
pub struct SidRes {
	sid: String,
}

/// # POST /v1/users/{user}/web/signin
pub async fn post_signin(
	State(app): State<App>,
	Path(user): Path<String>,
	Form(req): Form<PasswordReq>,
) -> GhResult<Json<SidRes>> {
	let session = app.authority.sign_in(&user, &req.password).await?;
	Ok(Json(SidRes { sid: session.sid.into() }))
}

#[derive(Serialize)]
pub struct SessionKeysRes {
	pubkeys: Vec<Box<str>>,
}

/// # GET /v1/users/{user}/web/sessions
pub async fn get_web_sessions(
	State(app): State<App>,
	Path(user): Path<String>,
) -> GhResult<Json<SessionKeysRes>> {
	Ok(Json(SessionKeysRes { pubkeys: app.authority.get_web_sessions_keys(&user).await? }))
}

/// # GET /v1/users/{user}/web/sessions/{sid}
///
/// The session key material never travels over REST; the response only
/// confirms the session is live by echoing its secure ID.
pub async fn get_web_session(
	State(app): State<App>,
	Path((user, sid)): Path<(String, String)>,
) -> GhResult<Json<SidRes>> {
	app.authority.get_web_session(&user, &sid).await?;
	Ok(Json(SidRes { sid }))
}

/// # DELETE /v1/users/{user}/web/sessions/{sid}
pub async fn delete_web_session(
	State(app): State<App>,
	Path((user, sid)): Path<(String, String)>,
) -> GhResult<(StatusCode, Json<OkRes>)> {
	app.authority.delete_web_session(&user, &sid).await?;
	Ok((StatusCode::OK, Json(OK)))
}

// vim: ts=4
