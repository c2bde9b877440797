//! Authority behavior: sign-in and session round-trips, token lifecycle,
//! CA resets and presence TTLs, all over the memory keystore.

mod common;

use std::time::Duration;

use gatehouse::services::presence::Server;
use gatehouse::services::user::AuthorizedKey;
use gatehouse::Error;
use ssh_key::certificate::Certificate;

use common::create_test_app;

#[tokio::test]
async fn test_signin_and_session_resume() {
	let (app, _tmp) = create_test_app().await;
	let authority = &app.authority;

	authority.upsert_password("user1", "abc123").await.unwrap();
	let session = authority.sign_in("user1", "abc123").await.unwrap();
	assert!(!session.sid.is_empty());

	let ws = authority.get_web_session("user1", &session.sid).await.unwrap();
	assert_eq!(ws, session.ws);

	authority.delete_web_session("user1", &session.sid).await.unwrap();
	assert!(matches!(
		authority.get_web_session("user1", &session.sid).await,
		Err(Error::NotFound)
	));
}

#[tokio::test]
async fn test_signin_error_asymmetry() {
	let (app, _tmp) = create_test_app().await;
	let authority = &app.authority;

	authority.upsert_password("user1", "abc123").await.unwrap();

	// wrong password for a known user
	assert!(matches!(
		authority.sign_in("user1", "abc123123").await,
		Err(Error::BadParameter(_))
	));
	// a user with no password set
	assert!(matches!(authority.sign_in("nobody", "abc123").await, Err(Error::NotFound)));
}

#[tokio::test]
async fn test_password_policy_regardless_of_stored_hash() {
	let (app, _tmp) = create_test_app().await;
	let authority = &app.authority;

	authority.upsert_password("user1", "abc123").await.unwrap();
	assert!(matches!(
		authority.check_password("user1", "short").await,
		Err(Error::BadParameter(_))
	));
	assert!(matches!(
		authority.check_password("user1", &"x".repeat(129)).await,
		Err(Error::BadParameter(_))
	));
	assert!(matches!(
		authority.upsert_password("user1", "abc").await,
		Err(Error::BadParameter(_))
	));
}

#[tokio::test]
async fn test_tampered_session_id() {
	let (app, _tmp) = create_test_app().await;
	let authority = &app.authority;

	authority.upsert_password("user1", "abc123").await.unwrap();
	let session = authority.sign_in("user1", "abc123").await.unwrap();

	// flip one character of the secure ID
	let mut sid: Vec<char> = session.sid.chars().collect();
	sid[10] = if sid[10] == 'A' { 'B' } else { 'A' };
	let tampered: String = sid.into_iter().collect();

	assert!(authority.get_web_session("user1", &tampered).await.is_err());
}

#[tokio::test]
async fn test_session_ttl_is_a_parameter() {
	let (app, _tmp) = create_test_app().await;
	let authority = &app.authority;

	let session = authority.new_web_session("user1").await.unwrap();
	authority
		.upsert_web_session("user1", &session, Duration::from_millis(200))
		.await
		.unwrap();
	assert!(authority.get_web_session("user1", &session.sid).await.is_ok());

	tokio::time::sleep(Duration::from_millis(400)).await;
	assert!(matches!(
		authority.get_web_session("user1", &session.sid).await,
		Err(Error::NotFound)
	));
}

#[tokio::test]
async fn test_token_lifecycle() {
	let (app, _tmp) = create_test_app().await;
	let authority = &app.authority;

	let token = authority.generate_token("a.example.com", Duration::ZERO).await.unwrap();

	// validation is read-only
	assert!(matches!(
		authority.validate_token(&token, "b.example.com").await,
		Err(Error::BadParameter(_))
	));
	authority.validate_token(&token, "a.example.com").await.unwrap();
	authority.validate_token(&token, "a.example.com").await.unwrap();

	// one-shot consumption
	authority.delete_token(&token).await.unwrap();
	assert!(matches!(
		authority.validate_token(&token, "a.example.com").await,
		Err(Error::NotFound)
	));
	assert!(matches!(authority.delete_token(&token).await, Err(Error::NotFound)));
}

#[tokio::test]
async fn test_garbage_token_rejected() {
	let (app, _tmp) = create_test_app().await;
	assert!(app.authority.validate_token("bla bla", "a.example.com").await.is_err());
}

#[tokio::test]
async fn test_token_expiry() {
	let (app, _tmp) = create_test_app().await;
	let authority = &app.authority;

	let token = authority
		.generate_token("a.example.com", Duration::from_millis(200))
		.await
		.unwrap();
	authority.validate_token(&token, "a.example.com").await.unwrap();

	tokio::time::sleep(Duration::from_millis(400)).await;
	assert!(matches!(
		authority.validate_token(&token, "a.example.com").await,
		Err(Error::NotFound)
	));
}

#[tokio::test]
async fn test_host_cert_minting() {
	let (app, _tmp) = create_test_app().await;
	let authority = &app.authority;

	authority.reset_host_ca("").await.unwrap();
	let pair = authority.generate_key_pair("").await.unwrap();
	let cert = authority
		.generate_host_cert(&pair.public_key, "id1", "a.example.com", Duration::from_secs(3600))
		.await
		.unwrap();

	let cert = Certificate::from_openssh(&cert).unwrap();
	assert_eq!(cert.key_id(), "id1");
	assert_eq!(cert.valid_principals(), ["a.example.com".to_string()]);

	let ca_pub = authority.get_host_ca_pub().await.unwrap();
	gatehouse::crypto::keygen::validate_cert(&cert, &ca_pub).unwrap();
}

#[tokio::test]
async fn test_user_ca_reset_invalidates_prior_certs() {
	let (app, _tmp) = create_test_app().await;
	let authority = &app.authority;

	let pair = authority.generate_key_pair("").await.unwrap();
	let key = AuthorizedKey { id: "k1".into(), value: pair.public_key.clone() };
	let cert = authority.upsert_user_key("alice", &key, Duration::ZERO).await.unwrap();
	let cert = Certificate::from_openssh(&cert).unwrap();

	let old_pub = authority.get_user_ca_pub().await.unwrap();
	gatehouse::crypto::keygen::validate_cert(&cert, &old_pub).unwrap();

	authority.reset_user_ca("").await.unwrap();
	let new_pub = authority.get_user_ca_pub().await.unwrap();
	assert_ne!(old_pub, new_pub);
	assert!(gatehouse::crypto::keygen::validate_cert(&cert, &new_pub).is_err());
}

#[tokio::test]
async fn test_user_and_key_crud() {
	let (app, _tmp) = create_test_app().await;
	let authority = &app.authority;

	let pair = authority.generate_key_pair("").await.unwrap();
	let key = AuthorizedKey { id: "k1".into(), value: pair.public_key.clone() };
	authority.upsert_user_key("alice", &key, Duration::ZERO).await.unwrap();
	authority.upsert_password("bob", "secret99").await.unwrap();

	let users = authority.get_users().await.unwrap();
	assert_eq!(users, vec!["alice".into(), "bob".into()] as Vec<Box<str>>);

	let keys = authority.get_user_keys("alice").await.unwrap();
	assert_eq!(keys.len(), 1);
	assert_eq!(keys[0].id.as_ref(), "k1");
	// the stored value is the signed certificate, not the raw key
	assert!(keys[0].value.contains("cert"));

	authority.delete_user_key("alice", "k1").await.unwrap();
	assert!(authority.get_user_keys("alice").await.unwrap().is_empty());

	authority.delete_user("bob").await.unwrap();
	assert!(matches!(authority.delete_user("bob").await, Err(Error::NotFound)));
}

#[tokio::test]
async fn test_bootstrap_idempotent_and_file_modes() {
	use std::os::unix::fs::PermissionsExt;

	let (app, tmp) = create_test_app().await;

	// a second init leaves the cluster state alone
	let host_pub = app.authority.get_host_ca_pub().await.unwrap();
	gatehouse::bootstrap::init(&app).await.unwrap();
	assert_eq!(app.authority.get_host_ca_pub().await.unwrap(), host_pub);

	let files = [
		"teleport.secret".to_string(),
		format!("{}.key", common::TEST_FQDN),
		format!("{}.cert", common::TEST_FQDN),
	];
	for name in &files {
		let meta = std::fs::metadata(tmp.path().join(name)).unwrap();
		assert_eq!(meta.permissions().mode() & 0o777, 0o600, "{}", name);
	}
}

#[tokio::test]
async fn test_named_lock() {
	let (app, _tmp) = create_test_app().await;

	app.locks.acquire("maintenance", Duration::from_millis(200)).await.unwrap();
	assert!(matches!(
		app.locks.acquire("maintenance", Duration::from_secs(60)).await,
		Err(Error::AlreadyExists(_))
	));

	// a crashed holder releases the cluster when the TTL runs out
	tokio::time::sleep(Duration::from_millis(400)).await;
	app.locks.acquire("maintenance", Duration::from_secs(60)).await.unwrap();

	// release is idempotent
	app.locks.release("maintenance").await.unwrap();
	app.locks.release("maintenance").await.unwrap();
	app.locks.acquire("maintenance", Duration::from_secs(60)).await.unwrap();
}

#[tokio::test]
async fn test_presence_upsert_and_expiry() {
	let (app, _tmp) = create_test_app().await;
	let authority = &app.authority;

	let server = Server { id: "node1".into(), addr: "10.0.0.1:3022".into() };
	authority.upsert_server(&server, Duration::from_secs(60)).await.unwrap();
	authority.upsert_server(&server, Duration::from_secs(60)).await.unwrap();

	// idempotent upsert: the server appears exactly once
	let servers = authority.get_servers().await.unwrap();
	assert_eq!(servers, vec![server.clone()]);

	let transient = Server { id: "node2".into(), addr: "10.0.0.2:3022".into() };
	authority.upsert_server(&transient, Duration::from_millis(200)).await.unwrap();
	assert_eq!(authority.get_servers().await.unwrap().len(), 2);

	tokio::time::sleep(Duration::from_millis(400)).await;
	assert_eq!(authority.get_servers().await.unwrap(), vec![server]);
}

#[tokio::test]
async fn test_remote_cert_crud() {
	use gatehouse::services::ca::{RemoteCert, RemoteCertKind};

	let (app, _tmp) = create_test_app().await;
	let authority = &app.authority;

	let make = |fqdn: &str, id: &str| RemoteCert {
		kind: RemoteCertKind::User,
		fqdn: fqdn.into(),
		id: id.into(),
		value: "ssh-ed25519 AAAA remote".into(),
	};
	authority.upsert_remote_cert(&make("a.example.com", "ca1")).await.unwrap();
	authority.upsert_remote_cert(&make("b.example.com", "ca2")).await.unwrap();

	// an empty FQDN matches every remote authority
	let all = authority.get_remote_certs(RemoteCertKind::User, "").await.unwrap();
	assert_eq!(all.len(), 2);
	let one = authority.get_remote_certs(RemoteCertKind::User, "a.example.com").await.unwrap();
	assert_eq!(one.len(), 1);
	assert_eq!(one[0].id.as_ref(), "ca1");

	// host and user namespaces are disjoint
	assert!(authority.get_remote_certs(RemoteCertKind::Host, "").await.unwrap().is_empty());

	authority.delete_remote_cert(RemoteCertKind::User, "a.example.com", "ca1").await.unwrap();
	assert!(matches!(
		authority.delete_remote_cert(RemoteCertKind::User, "a.example.com", "ca1").await,
		Err(Error::NotFound)
	));
}

#[tokio::test]
async fn test_web_sessions_keys_listing() {
	let (app, _tmp) = create_test_app().await;
	let authority = &app.authority;

	authority.upsert_password("user1", "abc123").await.unwrap();
	authority.sign_in("user1", "abc123").await.unwrap();
	authority.sign_in("user1", "abc123").await.unwrap();

	let certs = authority.get_web_sessions_keys("user1").await.unwrap();
	assert_eq!(certs.len(), 2);
	assert!(certs.iter().all(|c| c.contains("cert")));
}

// vim: ts=4
