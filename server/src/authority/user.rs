//! User and key CRUD, password policy and verification.

use super::AuthServer;
use crate::prelude::*;
use crate::services::user::AuthorizedKey;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 128;

const BCRYPT_COST: u32 = 10;

/// Any byte content is allowed; only the length is constrained.
fn check_password_policy(password: &str) -> GhResult<()> {
	let len = password.len();
	if len < MIN_PASSWORD_LEN {
		return Err(Error::BadParameter(format!(
			"password must be at least {} bytes",
			MIN_PASSWORD_LEN
		)));
	}
	if len > MAX_PASSWORD_LEN {
		return Err(Error::BadParameter(format!(
			"password must be at most {} bytes",
			MAX_PASSWORD_LEN
		)));
	}
	Ok(())
}

impl AuthServer {
	/// Signs `key` with the current user CA, producing a certificate valid
	/// for `ttl`, and stores the certificate (not the raw public key) under
	/// the user with the same TTL.
	pub async fn upsert_user_key(
		&self,
		user: &str,
		key: &AuthorizedKey,
		ttl: Duration,
	) -> GhResult<Box<str>> {
		let cert = self.generate_user_cert(&key.value, &key.id, user, ttl).await?;
		let stored = AuthorizedKey { id: key.id.clone(), value: cert.clone() };
		self.users.upsert_key(user, &stored, ttl).await?;
		Ok(cert)
	}

	pub async fn get_users(&self) -> GhResult<Vec<Box<str>>> {
		self.users.get_users().await
	}

	pub async fn delete_user(&self, user: &str) -> GhResult<()> {
		self.users.delete_user(user).await
	}

	pub async fn get_user_keys(&self, user: &str) -> GhResult<Vec<AuthorizedKey>> {
		self.users.get_keys(user).await
	}

	pub async fn delete_user_key(&self, user: &str, id: &str) -> GhResult<()> {
		self.users.delete_key(user, id).await
	}

	/// Hashes `password` and stores the hash. The plaintext never persists.
	pub async fn upsert_password(&self, user: &str, password: &str) -> GhResult<()> {
		check_password_policy(password)?;
		let password = password.to_owned();
		let hash = self
			.worker
			.run_immed(move || {
				bcrypt::hash(&password, BCRYPT_COST)
					.map_err(|_| Error::CryptoError("password hashing failed".into()))
			})
			.await??;
		self.users.upsert_password_hash(user, hash.as_bytes()).await
	}

	/// Verifies `password` for `user`. Policy violations and mismatches
	/// fail with `BadParameter`; a user with no password set fails with
	/// `NotFound`.
	pub async fn check_password(&self, user: &str, password: &str) -> GhResult<()> {
		check_password_policy(password)?;
		let hash = self.users.get_password_hash(user).await?;
		let hash = String::from_utf8(hash)
			.map_err(|_| Error::Internal("stored password hash is not valid utf-8".into()))?;

		let password = password.to_owned();
		let ok = self
			.worker
			.run_immed(move || {
				bcrypt::verify(&password, &hash)
					.map_err(|_| Error::CryptoError("password verification failed".into()))
			})
			.await??;

		if !ok {
			return Err(Error::BadParameter("passwords do not match".into()));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_password_policy_bounds() {
		assert!(check_password_policy("abc12").is_err());
		assert!(check_password_policy("abc123").is_ok());
		assert!(check_password_policy(&"x".repeat(MAX_PASSWORD_LEN)).is_ok());
		assert!(check_password_policy(&"x".repeat(MAX_PASSWORD_LEN + 1)).is_err());
	}
}

// vim: ts=4
