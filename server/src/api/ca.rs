//! Handlers for CA lifecycle, certificate minting, remote authority trust
//! and keypair generation.

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	Json,
};
use serde::{Deserialize, Serialize};

use super::extract::{parse_ttl, Form};
use super::{OkRes, OK};
use crate::prelude::*;
use crate::services::ca::{RemoteCert, RemoteCertKind};

#[derive(Deserialize)]
pub struct PassphraseReq {
	pass: Option<String>,
}

#[derive(Serialize)]
pub struct PubKeyRes {
	pubkey: String,
}

#[derive(Serialize)]
pub struct CertRes {
	cert: String,
}

/// # POST /v1/ca/host/keys
pub async fn post_reset_host_ca(
	State(app): State<App>,
	Form(req): Form<PassphraseReq>,
) -> GhResult<(StatusCode, Json<OkRes>)> {
	app.authority.reset_host_ca(req.pass.as_deref().unwrap_or_default()).await?;
	Ok((StatusCode::OK, Json(OK)))
}

/// # POST /v1/ca/user/keys
pub async fn post_reset_user_ca(
	State(app): State<App>,
	Form(req): Form<PassphraseReq>,
) -> GhResult<(StatusCode, Json<OkRes>)> {
	app.authority.reset_user_ca(req.pass.as_deref().unwrap_or_default()).await?;
	Ok((StatusCode::OK, Json(OK)))
}

/// # GET /v1/ca/host/keys/pub
pub async fn get_host_ca_pub(State(app): State<App>) -> GhResult<Json<PubKeyRes>> {
	let pubkey = app.authority.get_host_ca_pub().await?;
	Ok(Json(PubKeyRes { pubkey: pubkey.into() }))
}

/// # GET /v1/ca/user/keys/pub
pub async fn get_user_ca_pub(State(app): State<App>) -> GhResult<Json<PubKeyRes>> {
	let pubkey = app.authority.get_user_ca_pub().await?;
	Ok(Json(PubKeyRes { pubkey: pubkey.into() }))
}

/// # POST /v1/ca/host/certs
#[derive(Deserialize)]
pub struct HostCertReq {
	key: String,
	id: String,
	hostname: String,
	ttl: Option<String>,
}

pub async fn post_host_cert(
	State(app): State<App>,
	Form(req): Form<HostCertReq>,
) -> GhResult<Json<CertRes>> {
	let ttl = parse_ttl(req.ttl.as_deref())?;
	let cert = app.authority.generate_host_cert(&req.key, &req.id, &req.hostname, ttl).await?;
	Ok(Json(CertRes { cert: cert.into() }))
}

/// # POST /v1/ca/user/certs
#[derive(Deserialize)]
pub struct UserCertReq {
	key: String,
	id: String,
	user: String,
	ttl: Option<String>,
}

pub async fn post_user_cert(
	State(app): State<App>,
	Form(req): Form<UserCertReq>,
) -> GhResult<Json<CertRes>> {
	let ttl = parse_ttl(req.ttl.as_deref())?;
	let cert = app.authority.generate_user_cert(&req.key, &req.id, &req.user, ttl).await?;
	Ok(Json(CertRes { cert: cert.into() }))
}

/// # POST /v1/keypair
#[derive(Serialize)]
pub struct KeyPairRes {
	/// Raw private key bytes; kept out of string form in the response
	privkey: Vec<u8>,
	pubkey: String,
}

pub async fn post_keypair(
	State(app): State<App>,
	Form(req): Form<PassphraseReq>,
) -> GhResult<Json<KeyPairRes>> {
	let pair = app.authority.generate_key_pair(req.pass.as_deref().unwrap_or_default()).await?;
	Ok(Json(KeyPairRes {
		privkey: pair.private_key.as_bytes().to_vec(),
		pubkey: pair.public_key.into(),
	}))
}

// Remote authority trust

#[derive(Deserialize)]
pub struct RemoteCertReq {
	id: String,
	key: String,
}

/// # POST /v1/ca/remote/{type}/hosts/{fqdn}
pub async fn post_remote_cert(
	State(app): State<App>,
	Path((kind, fqdn)): Path<(String, String)>,
	Form(req): Form<RemoteCertReq>,
) -> GhResult<(StatusCode, Json<OkRes>)> {
	let kind: RemoteCertKind = kind.parse()?;
	let cert = RemoteCert {
		kind,
		fqdn: fqdn.into(),
		id: req.id.into(),
		value: req.key.into(),
	};
	app.authority.upsert_remote_cert(&cert).await?;
	Ok((StatusCode::OK, Json(OK)))
}

#[derive(Deserialize)]
pub struct RemoteCertQuery {
	fqdn: Option<String>,
}

#[derive(Serialize)]
pub struct RemoteCertsRes {
	certs: Vec<RemoteCert>,
}

/// # GET /v1/ca/remote/{type}
pub async fn get_remote_certs(
	State(app): State<App>,
	Path(kind): Path<String>,
	Query(query): Query<RemoteCertQuery>,
) -> GhResult<Json<RemoteCertsRes>> {
	let kind: RemoteCertKind = kind.parse()?;
	let certs = app.authority.get_remote_certs(kind, query.fqdn.as_deref().unwrap_or_default()).await?;
	Ok(Json(RemoteCertsRes { certs }))
}

/// # DELETE /v1/ca/remote/{type}/hosts/{fqdn}/{id}
pub async fn delete_remote_cert(
	State(app): State<App>,
	Path((kind, fqdn, id)): Path<(String, String, String)>,
) -> GhResult<(StatusCode, Json<OkRes>)> {
	let kind: RemoteCertKind = kind.parse()?;
	app.authority.delete_remote_cert(kind, &fqdn, &id).await?;
	Ok((StatusCode::OK, Json(OK)))
}

// vim: ts=4
