//! REST facade: route wiring, response shapes and error translation,
//! driven directly against the router.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use common::create_test_app;
use gatehouse::routes;

fn form(method: &str, path: &str, body: &str) -> Request<Body> {
	Request::builder()
		.method(method)
		.uri(path)
		.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
		.body(Body::from(body.to_owned()))
		.expect("request")
}

async fn body_json(res: axum::response::Response) -> serde_json::Value {
	let bytes = res.into_body().collect().await.expect("body").to_bytes();
	serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn test_ca_pub_round_trip() {
	let (app, _tmp) = create_test_app().await;
	let router = routes::init(app);

	let res = router
		.clone()
		.oneshot(Request::get("/v1/ca/host/keys/pub").body(Body::empty()).expect("request"))
		.await
		.expect("response");
	assert_eq!(res.status(), StatusCode::OK);
	let json = body_json(res).await;
	assert!(json["pubkey"].as_str().expect("pubkey").starts_with("ssh-ed25519 "));

	let res = router
		.oneshot(form("POST", "/v1/ca/user/keys", ""))
		.await
		.expect("response");
	assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_signin_returns_sid_only() {
	let (app, _tmp) = create_test_app().await;
	let router = routes::init(app);

	let res = router
		.clone()
		.oneshot(form("POST", "/v1/users/user1/web/password", "password=abc123"))
		.await
		.expect("response");
	assert_eq!(res.status(), StatusCode::OK);

	let res = router
		.clone()
		.oneshot(form("POST", "/v1/users/user1/web/signin", "password=abc123"))
		.await
		.expect("response");
	assert_eq!(res.status(), StatusCode::OK);
	let json = body_json(res).await;
	let sid = json["sid"].as_str().expect("sid").to_owned();
	assert!(!sid.is_empty());
	assert!(json.get("pid").is_none());

	let res = router
		.oneshot(
			Request::get(format!("/v1/users/user1/web/sessions/{}", sid))
				.body(Body::empty())
				.expect("request"),
		)
		.await
		.expect("response");
	assert_eq!(res.status(), StatusCode::OK);
	assert_eq!(body_json(res).await["sid"].as_str(), Some(sid.as_str()));
}

#[tokio::test]
async fn test_error_translation() {
	let (app, _tmp) = create_test_app().await;
	let router = routes::init(app);

	// NotFound -> 404 with a {"message"} body
	let res = router
		.clone()
		.oneshot(form("POST", "/v1/users/nobody/web/signin", "password=abc123"))
		.await
		.expect("response");
	assert_eq!(res.status(), StatusCode::NOT_FOUND);
	assert!(body_json(res).await["message"].is_string());

	// policy violation -> 400
	let res = router
		.clone()
		.oneshot(form("POST", "/v1/users/user1/web/password", "password=ab"))
		.await
		.expect("response");
	assert_eq!(res.status(), StatusCode::BAD_REQUEST);

	// malformed ttl -> 400
	let res = router
		.oneshot(form("POST", "/v1/servers", "id=a&addr=b&ttl=whenever"))
		.await
		.expect("response");
	assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_keypair_shape() {
	let (app, _tmp) = create_test_app().await;
	let router = routes::init(app);

	let res = router.oneshot(form("POST", "/v1/keypair", "")).await.expect("response");
	assert_eq!(res.status(), StatusCode::OK);
	let json = body_json(res).await;
	assert!(json["privkey"].is_array());
	assert!(json["pubkey"].as_str().expect("pubkey").starts_with("ssh-ed25519 "));
}

#[tokio::test]
async fn test_token_routes() {
	let (app, _tmp) = create_test_app().await;
	let router = routes::init(app);

	let res = router
		.clone()
		.oneshot(form("POST", "/v1/tokens", "fqdn=a.example.com&ttl=1h"))
		.await
		.expect("response");
	assert_eq!(res.status(), StatusCode::OK);
	let token = body_json(res).await["token"].as_str().expect("token").to_owned();

	let query = serde_urlencoded::to_string([("token", token.as_str()), ("fqdn", "a.example.com")])
		.expect("query");
	let res = router
		.clone()
		.oneshot(
			Request::get(format!("/v1/tokens?{}", query)).body(Body::empty()).expect("request"),
		)
		.await
		.expect("response");
	assert_eq!(res.status(), StatusCode::OK);

	let res = router
		.clone()
		.oneshot(
			Request::delete(format!("/v1/tokens/{}", token))
				.body(Body::empty())
				.expect("request"),
		)
		.await
		.expect("response");
	assert_eq!(res.status(), StatusCode::OK);

	let res = router
		.oneshot(
			Request::delete(format!("/v1/tokens/{}", token))
				.body(Body::empty())
				.expect("request"),
		)
		.await
		.expect("response");
	assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_servers_and_tunnels_routes() {
	let (app, _tmp) = create_test_app().await;
	let router = routes::init(app);

	let res = router
		.clone()
		.oneshot(form("POST", "/v1/servers", "id=node1&addr=10.0.0.1:3022&ttl=1m"))
		.await
		.expect("response");
	assert_eq!(res.status(), StatusCode::OK);

	let res = router
		.clone()
		.oneshot(Request::get("/v1/servers").body(Body::empty()).expect("request"))
		.await
		.expect("response");
	let json = body_json(res).await;
	assert_eq!(json["servers"][0]["id"].as_str(), Some("node1"));

	let res = router
		.clone()
		.oneshot(form("POST", "/v1/tunnels/web", "prefix=app&target=10.0.0.5:80&proxy=10.0.0.6:80"))
		.await
		.expect("response");
	assert_eq!(res.status(), StatusCode::OK);

	let res = router
		.clone()
		.oneshot(Request::get("/v1/tunnels/web/app").body(Body::empty()).expect("request"))
		.await
		.expect("response");
	assert_eq!(res.status(), StatusCode::OK);
	assert_eq!(body_json(res).await["prefix"].as_str(), Some("app"));

	let res = router
		.oneshot(Request::delete("/v1/tunnels/web/app").body(Body::empty()).expect("request"))
		.await
		.expect("response");
	assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_sessions_and_events_routes() {
	let (app, _tmp) = create_test_app().await;
	let router = routes::init(app);

	let res = router
		.clone()
		.oneshot(form("POST", "/v1/sessions", "id=sess1"))
		.await
		.expect("response");
	assert_eq!(res.status(), StatusCode::OK);

	let res = router
		.clone()
		.oneshot(form("POST", "/v1/sessions/sess1/parties", "id=p1&user=alice"))
		.await
		.expect("response");
	assert_eq!(res.status(), StatusCode::OK);

	let res = router
		.clone()
		.oneshot(Request::get("/v1/sessions/sess1").body(Body::empty()).expect("request"))
		.await
		.expect("response");
	let json = body_json(res).await;
	assert_eq!(json["parties"][0]["user"].as_str(), Some("alice"));

	let res = router
		.clone()
		.oneshot(form("POST", "/v1/events", "schema=auth.signin&fields={\"user\":\"alice\"}"))
		.await
		.expect("response");
	assert_eq!(res.status(), StatusCode::OK);

	let res = router
		.oneshot(Request::get("/v1/events?schema=auth").body(Body::empty()).expect("request"))
		.await
		.expect("response");
	let json = body_json(res).await;
	assert_eq!(json["events"][0]["schema"].as_str(), Some("auth.signin"));
}

// vim: ts=4
