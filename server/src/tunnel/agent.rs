//! Minimal SSH agent, spoken over any stream. The web-session channel needs
//! exactly two protocol operations — request-identities and sign-request —
//! served from a single in-memory identity (the session's private key and
//! certificate), so both ends are implemented here directly over the key
//! primitives.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use signature::Signer;
use ssh_key::PrivateKey;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::prelude::*;

const SSH_AGENT_FAILURE: u8 = 5;
const SSH_AGENTC_REQUEST_IDENTITIES: u8 = 11;
const SSH_AGENT_IDENTITIES_ANSWER: u8 = 12;
const SSH_AGENTC_SIGN_REQUEST: u8 = 13;
const SSH_AGENT_SIGN_RESPONSE: u8 = 14;

const MAX_AGENT_MSG: usize = 256 * 1024;

/// Extracts the wire blob from an authorized-key line (`type base64 [comment]`).
pub fn authorized_key_blob(line: &str) -> GhResult<Vec<u8>> {
	let encoded = line
		.split_whitespace()
		.nth(1)
		.ok_or_else(|| Error::BadParameter("malformed authorized key".into()))?;
	BASE64.decode(encoded).map_err(|_| Error::BadParameter("malformed authorized key".into()))
}

fn put_u32(buf: &mut Vec<u8>, value: u32) {
	buf.extend_from_slice(&value.to_be_bytes());
}

fn put_string(buf: &mut Vec<u8>, value: &[u8]) {
	put_u32(buf, value.len() as u32);
	buf.extend_from_slice(value);
}

struct Reader<'a> {
	buf: &'a [u8],
	pos: usize,
}

impl<'a> Reader<'a> {
	fn new(buf: &'a [u8]) -> Self {
		Self { buf, pos: 0 }
	}

	fn read_u32(&mut self) -> GhResult<u32> {
		let end = self.pos + 4;
		if end > self.buf.len() {
			return Err(Error::BadParameter("truncated agent message".into()));
		}
		let mut raw = [0u8; 4];
		raw.copy_from_slice(&self.buf[self.pos..end]);
		self.pos = end;
		Ok(u32::from_be_bytes(raw))
	}

	fn read_string(&mut self) -> GhResult<&'a [u8]> {
		let len = self.read_u32()? as usize;
		let end = self.pos + len;
		if end > self.buf.len() {
			return Err(Error::BadParameter("truncated agent message".into()));
		}
		let out = &self.buf[self.pos..end];
		self.pos = end;
		Ok(out)
	}
}

async fn read_frame<S: AsyncRead + Unpin>(stream: &mut S) -> GhResult<Option<Vec<u8>>> {
	let mut len_buf = [0u8; 4];
	match stream.read_exact(&mut len_buf).await {
		Ok(_) => {}
		Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
		Err(err) => return Err(err.into()),
	}
	let len = u32::from_be_bytes(len_buf) as usize;
	if len == 0 || len > MAX_AGENT_MSG {
		return Err(Error::BadParameter(format!("agent message of {} bytes", len)));
	}
	let mut msg = vec![0u8; len];
	stream.read_exact(&mut msg).await?;
	Ok(Some(msg))
}

async fn write_frame<S: AsyncWrite + Unpin>(stream: &mut S, payload: &[u8]) -> GhResult<()> {
	let mut framed = Vec::with_capacity(4 + payload.len());
	put_u32(&mut framed, payload.len() as u32);
	framed.extend_from_slice(payload);
	stream.write_all(&framed).await?;
	stream.flush().await?;
	Ok(())
}

fn sign(key: &PrivateKey, data: &[u8]) -> GhResult<Vec<u8>> {
	let sig: ssh_key::Signature =
		key.try_sign(data).map_err(|_| Error::CryptoError("agent signing failed".into()))?;
	let mut wire = Vec::new();
	put_string(&mut wire, sig.algorithm().as_str().as_bytes());
	put_string(&mut wire, sig.as_bytes());
	Ok(wire)
}

fn handle_request(msg: &[u8], key: &PrivateKey, blob: &[u8], comment: &str) -> GhResult<Vec<u8>> {
	let mut reply = Vec::new();
	match msg[0] {
		SSH_AGENTC_REQUEST_IDENTITIES => {
			reply.push(SSH_AGENT_IDENTITIES_ANSWER);
			put_u32(&mut reply, 1);
			put_string(&mut reply, blob);
			put_string(&mut reply, comment.as_bytes());
		}
		SSH_AGENTC_SIGN_REQUEST => {
			let mut reader = Reader::new(&msg[1..]);
			let requested = reader.read_string()?;
			let data = reader.read_string()?;
			let _flags = reader.read_u32()?;
			if requested == blob {
				let signature = sign(key, data)?;
				reply.push(SSH_AGENT_SIGN_RESPONSE);
				put_string(&mut reply, &signature);
			} else {
				reply.push(SSH_AGENT_FAILURE);
			}
		}
		_ => reply.push(SSH_AGENT_FAILURE),
	}
	Ok(reply)
}

/// Serves the agent protocol on `stream` until the peer closes it. The only
/// identity offered is the session certificate, signed for by the session
/// private key.
pub async fn serve<S>(mut stream: S, key: PrivateKey, cert_line: &str) -> GhResult<()>
where
	S: AsyncRead + AsyncWrite + Unpin,
{
	let blob = authorized_key_blob(cert_line)?;
	let comment = key.comment().to_owned();

	while let Some(msg) = read_frame(&mut stream).await? {
		let reply = handle_request(&msg, &key, &blob, &comment)?;
		write_frame(&mut stream, &reply).await?;
	}
	Ok(())
}

/// One identity as reported by an agent
#[derive(Debug)]
pub struct AgentIdentity {
	pub blob: Vec<u8>,
	pub comment: Box<str>,
}

/// Client side of the agent protocol, for callers holding the agent channel.
#[derive(Debug)]
pub struct AgentClient<S> {
	stream: S,
}

impl<S> AgentClient<S>
where
	S: AsyncRead + AsyncWrite + Unpin,
{
	pub fn new(stream: S) -> Self {
		Self { stream }
	}

	async fn round_trip(&mut self, request: &[u8]) -> GhResult<Vec<u8>> {
		write_frame(&mut self.stream, request).await?;
		read_frame(&mut self.stream)
			.await?
			.ok_or_else(|| Error::Internal("agent closed the stream".into()))
	}

	pub async fn request_identities(&mut self) -> GhResult<Vec<AgentIdentity>> {
		let reply = self.round_trip(&[SSH_AGENTC_REQUEST_IDENTITIES]).await?;
		if reply.first() != Some(&SSH_AGENT_IDENTITIES_ANSWER) {
			return Err(Error::Internal("agent refused identity listing".into()));
		}
		let mut reader = Reader::new(&reply[1..]);
		let count = reader.read_u32()?;
		let mut identities = Vec::with_capacity(count as usize);
		for _ in 0..count {
			let blob = reader.read_string()?.to_vec();
			let comment = String::from_utf8_lossy(reader.read_string()?).into();
			identities.push(AgentIdentity { blob, comment });
		}
		Ok(identities)
	}

	/// Asks the agent to sign `data` with the identity `blob`. Returns the
	/// wire-encoded SSH signature.
	pub async fn sign_request(&mut self, blob: &[u8], data: &[u8]) -> GhResult<Vec<u8>> {
		let mut request = vec![SSH_AGENTC_SIGN_REQUEST];
		put_string(&mut request, blob);
		put_string(&mut request, data);
		put_u32(&mut request, 0);

		let reply = self.round_trip(&request).await?;
		if reply.first() != Some(&SSH_AGENT_SIGN_RESPONSE) {
			return Err(Error::Internal("agent refused to sign".into()));
		}
		let mut reader = Reader::new(&reply[1..]);
		Ok(reader.read_string()?.to_vec())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::crypto::keygen;

	#[tokio::test]
	async fn test_identities_and_sign() {
		let ca = keygen::generate_key_pair("").unwrap();
		let pair = keygen::generate_key_pair("").unwrap();
		let cert = keygen::generate_user_cert(
			&ca.private_key,
			&pair.public_key,
			"sess",
			"alice",
			Duration::ZERO,
		)
		.unwrap();

		let key = PrivateKey::from_openssh(pair.private_key.as_ref()).unwrap();
		let (server_io, client_io) = tokio::io::duplex(64 * 1024);

		let cert_line = cert.to_string();
		let serve_task = tokio::spawn(async move {
			serve(server_io, key, &cert_line).await
		});

		let mut agent = AgentClient::new(client_io);
		let identities = agent.request_identities().await.unwrap();
		assert_eq!(identities.len(), 1);
		assert_eq!(identities[0].blob, authorized_key_blob(&cert).unwrap());

		let signature = agent.sign_request(&identities[0].blob, b"payload").await.unwrap();
		let mut reader = Reader::new(&signature);
		assert_eq!(reader.read_string().unwrap(), b"ssh-ed25519");
		let raw = reader.read_string().unwrap();
		assert_eq!(raw.len(), 64);

		drop(agent);
		serve_task.await.unwrap().unwrap();
	}
}

// vim: ts=4
