//! Contract tests for the redb keystore adapter, plus persistence across
//! reopen and vacuum behavior.

use std::time::Duration;
use tempfile::TempDir;

use gatehouse::keystore_adapter::KeystoreAdapter;
use gatehouse::Error;
use gatehouse_keystore_adapter_redb::KeystoreAdapterRedb;

fn open(tmp: &TempDir) -> KeystoreAdapterRedb {
	KeystoreAdapterRedb::new(tmp.path().join("keystore.db")).expect("open keystore")
}

#[tokio::test]
async fn test_read_round_trip() {
	let tmp = TempDir::new().unwrap();
	let ks = open(&tmp);

	ks.upsert(&["servers", "a"], b"one", Duration::ZERO).await.unwrap();
	assert_eq!(ks.read(&["servers", "a"]).await.unwrap(), b"one");

	ks.upsert(&["servers", "a"], b"two", Duration::ZERO).await.unwrap();
	assert_eq!(ks.read(&["servers", "a"]).await.unwrap(), b"two");

	assert!(matches!(ks.read(&["servers", "b"]).await, Err(Error::NotFound)));
}

#[tokio::test]
async fn test_persists_across_reopen() {
	let tmp = TempDir::new().unwrap();
	{
		let ks = open(&tmp);
		ks.upsert(&["ca", "hostca"], b"keypair", Duration::ZERO).await.unwrap();
	}
	let ks = open(&tmp);
	assert_eq!(ks.read(&["ca", "hostca"]).await.unwrap(), b"keypair");
}

#[tokio::test]
async fn test_ttl_expiry() {
	let tmp = TempDir::new().unwrap();
	let ks = open(&tmp);

	ks.upsert(&["servers", "a"], b"one", Duration::from_secs(1)).await.unwrap();
	assert!(ks.read(&["servers", "a"]).await.is_ok());

	tokio::time::sleep(Duration::from_millis(2100)).await;
	assert!(matches!(ks.read(&["servers", "a"]).await, Err(Error::NotFound)));
	assert!(ks.list(&["servers"]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_conflicts_while_live() {
	let tmp = TempDir::new().unwrap();
	let ks = open(&tmp);

	ks.create(&["locks", "init"], b"me", Duration::from_secs(1)).await.unwrap();
	assert!(matches!(
		ks.create(&["locks", "init"], b"you", Duration::ZERO).await,
		Err(Error::AlreadyExists(_))
	));

	tokio::time::sleep(Duration::from_millis(2100)).await;
	ks.create(&["locks", "init"], b"you", Duration::ZERO).await.unwrap();
}

#[tokio::test]
async fn test_delete_is_one_shot() {
	let tmp = TempDir::new().unwrap();
	let ks = open(&tmp);

	ks.upsert(&["tokens", "t1"], b"x", Duration::ZERO).await.unwrap();
	ks.delete(&["tokens", "t1"]).await.unwrap();
	assert!(matches!(ks.delete(&["tokens", "t1"]).await, Err(Error::NotFound)));
}

#[tokio::test]
async fn test_list_and_delete_range() {
	let tmp = TempDir::new().unwrap();
	let ks = open(&tmp);

	ks.upsert(&["web", "users", "alice", "password"], b"h", Duration::ZERO).await.unwrap();
	ks.upsert(&["web", "users", "alice", "keys", "k1"], b"v", Duration::ZERO).await.unwrap();
	ks.upsert(&["web", "users", "bob", "password"], b"h", Duration::ZERO).await.unwrap();
	ks.upsert(&["web", "tunnels", "app"], b"t", Duration::ZERO).await.unwrap();

	let users = ks.list(&["web", "users"]).await.unwrap();
	assert_eq!(users, vec!["alice".into(), "bob".into()] as Vec<Box<str>>);

	ks.delete_range(&["web", "users", "alice"]).await.unwrap();
	assert!(ks.read(&["web", "users", "alice", "keys", "k1"]).await.is_err());
	assert!(ks.read(&["web", "users", "bob", "password"]).await.is_ok());
	assert!(ks.read(&["web", "tunnels", "app"]).await.is_ok());
}

#[tokio::test]
async fn test_vacuum_removes_expired() {
	let tmp = TempDir::new().unwrap();
	let ks = open(&tmp);

	ks.upsert(&["servers", "a"], b"one", Duration::from_secs(1)).await.unwrap();
	ks.upsert(&["servers", "b"], b"two", Duration::ZERO).await.unwrap();

	tokio::time::sleep(Duration::from_millis(2100)).await;
	assert_eq!(ks.vacuum().unwrap(), 1);
	assert!(ks.read(&["servers", "b"]).await.is_ok());
}

// vim: ts=4
