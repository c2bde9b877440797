//! API routes

use axum::{
	routing::{delete, get, post},
	Router,
};
use tower_http::trace::TraceLayer;

use crate::api::{ca, event, presence, session, token, user, web};
use crate::prelude::*;

/// Builds the `/v1/` router over the authority. The surface is reachable
/// only through the SSH tunnel or from the local host; it carries no
/// authentication layer of its own.
pub fn init(app: App) -> Router {
	let v1 = Router::new()
		// --- CA lifecycle ---
		.route("/ca/host/keys", post(ca::post_reset_host_ca))
		.route("/ca/user/keys", post(ca::post_reset_user_ca))
		.route("/ca/host/keys/pub", get(ca::get_host_ca_pub))
		.route("/ca/user/keys/pub", get(ca::get_user_ca_pub))
		.route("/ca/host/certs", post(ca::post_host_cert))
		.route("/ca/user/certs", post(ca::post_user_cert))

		// --- Remote authority trust ---
		.route("/ca/remote/{type}", get(ca::get_remote_certs))
		.route("/ca/remote/{type}/hosts/{fqdn}", post(ca::post_remote_cert))
		.route("/ca/remote/{type}/hosts/{fqdn}/{id}", delete(ca::delete_remote_cert))

		// --- Users, keys, passwords, web sessions ---
		.route("/users", get(user::get_users))
		.route("/users/{user}", delete(user::delete_user))
		.route("/users/{user}/keys", post(user::post_user_key).get(user::get_user_keys))
		.route("/users/{user}/keys/{key}", delete(user::delete_user_key))
		.route("/users/{user}/web/password", post(user::post_password))
		.route("/users/{user}/web/password/check", post(user::post_password_check))
		.route("/users/{user}/web/signin", post(user::post_signin))
		.route("/users/{user}/web/sessions", get(user::get_web_sessions))
		.route(
			"/users/{user}/web/sessions/{sid}",
			get(user::get_web_session).delete(user::delete_web_session),
		)

		// --- Key material ---
		.route("/keypair", post(ca::post_keypair))

		// --- Provisioning tokens ---
		.route("/tokens", post(token::post_token).get(token::get_token_validate))
		.route("/tokens/{token}", delete(token::delete_token))

		// --- Application tunnels ---
		.route("/tunnels/web", post(web::post_web_tun).get(web::get_web_tuns))
		.route("/tunnels/web/{prefix}", get(web::get_web_tun).delete(web::delete_web_tun))

		// --- Presence ---
		.route("/servers", post(presence::post_server).get(presence::get_servers))

		// --- Audit events ---
		.route("/events", post(event::post_event).get(event::get_events))

		// --- Site sessions ---
		.route("/sessions", post(session::post_session).get(session::get_sessions))
		.route(
			"/sessions/{id}",
			get(session::get_session).delete(session::delete_session),
		)
		.route("/sessions/{id}/parties", post(session::post_party));

	Router::new().nest("/v1", v1).layer(TraceLayer::new_for_http()).with_state(app)
}

// vim: ts=4
