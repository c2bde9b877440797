//! Form parsing helpers shared by the REST handlers.

use axum::extract::{FromRequest, Request};

use crate::prelude::*;

/// `axum::Form` with the rejection folded into the error taxonomy: a
/// missing or malformed form body is a `BadParameter`, not a 422.
pub struct Form<T>(pub T);

impl<T, S> FromRequest<S> for Form<T>
where
	T: serde::de::DeserializeOwned,
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let axum::Form(value) = axum::Form::<T>::from_request(req, state)
			.await
			.map_err(|err| Error::BadParameter(format!("malformed form body: {}", err)))?;
		Ok(Form(value))
	}
}

/// Parses a human-readable TTL (`1h30m`, `10s`, ...) to second resolution.
/// Absent or empty means "no expiry".
pub fn parse_ttl(value: Option<&str>) -> GhResult<Duration> {
	let value = match value {
		None => return Ok(Duration::ZERO),
		Some(value) if value.trim().is_empty() => return Ok(Duration::ZERO),
		Some(value) => value.trim(),
	};
	if value == "0" {
		return Ok(Duration::ZERO);
	}
	let ttl = humantime::parse_duration(value)
		.map_err(|_| Error::BadParameter(format!("invalid ttl: {:?}", value)))?;
	Ok(Duration::from_secs(ttl.as_secs()))
}


// vim: ts=4
