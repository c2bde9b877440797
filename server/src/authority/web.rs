//! Web sessions: creation, sign-in, lookup by secure ID.

use super::AuthServer;
use crate::prelude::*;
use crate::services::web::WebSessionData;

/// Default lifetime of a session created by `sign_in`. Callers of
/// `upsert_web_session` choose their own TTL; sessions are never renewed
/// implicitly.
pub const WEB_SESSION_TTL: Duration = Duration::from_secs(3600);

/// A web session as handed to clients: the secure ID travels, the plaintext
/// ID stays inside the process.
#[derive(Debug)]
pub struct Session {
	pub sid: Box<str>,
	pub pid: Box<str>,
	pub ws: WebSessionData,
}

impl AuthServer {
	/// Assembles a new session for `user`: fresh unencrypted keypair, the
	/// public half signed by the current user CA without expiry, and a new
	/// (secure, plaintext) ID pair.
	pub async fn new_web_session(&self, user: &str) -> GhResult<Session> {
		let pair = self.generate_key_pair("").await?;
		let cert = self.generate_user_cert(&pair.public_key, user, user, Duration::ZERO).await?;
		let ids = self.codec.new_id()?;

		Ok(Session {
			sid: ids.sid,
			pid: ids.pid,
			ws: WebSessionData { private_key: pair.private_key, cert },
		})
	}

	pub async fn upsert_web_session(
		&self,
		user: &str,
		session: &Session,
		ttl: Duration,
	) -> GhResult<()> {
		self.web.upsert_session(user, &session.pid, &session.ws, ttl).await
	}

	/// Looks a session up by its secure ID. A secure ID that does not
	/// decode behaves exactly like an absent session.
	pub async fn get_web_session(&self, user: &str, sid: &str) -> GhResult<WebSessionData> {
		let pid = self.codec.decode(sid).map_err(|_| Error::NotFound)?;
		self.web.read_session(user, &pid).await
	}

	pub async fn delete_web_session(&self, user: &str, sid: &str) -> GhResult<()> {
		let pid = self.codec.decode(sid).map_err(|_| Error::NotFound)?;
		self.web.delete_session(user, &pid).await
	}

	/// Returns the per-session certificates of the user's live sessions.
	pub async fn get_web_sessions_keys(&self, user: &str) -> GhResult<Vec<Box<str>>> {
		let sessions = self.web.get_sessions(user).await?;
		Ok(sessions.into_iter().map(|s| s.cert).collect())
	}

	/// Verifies the password, then creates and stores a session with the
	/// default TTL. The returned session carries the secure ID to hand out.
	pub async fn sign_in(&self, user: &str, password: &str) -> GhResult<Session> {
		self.check_password(user, password).await?;
		let session = self.new_web_session(user).await?;
		self.upsert_web_session(user, &session, WEB_SESSION_TTL).await?;
		info!("web session created for {}", user);
		Ok(session)
	}
}

// vim: ts=4
