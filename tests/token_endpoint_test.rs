use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use base64::Engine as _;
use installation_tokens::{
    app::{build_router, AppState},
    authorizer::TOKEN_LIFE_IN_HOURS,
    config::{AppConfig, DbCfg, ServerCfg},
    security::hash_token,
};
use serde_json::Value;
use tower::ServiceExt; // for `oneshot`

mod common;

fn router(fx: &common::Fixture) -> axum::Router {
    let cfg = AppConfig {
        server: ServerCfg { bind_addr: "127.0.0.1:0".to_string() },
        db: DbCfg { url: fx.db_path.clone() },
    };
    build_router(AppState::new(cfg, fx.repo.clone()))
}

fn token_request(installation_id: &str, form: &str) -> Request<Body> {
    Request::post(format!("/api/0/installations/{installation_id}/authorizations"))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

async fn send(app: axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), 1024 * 1024).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn healthz_ok() {
    let fx = common::setup().await;
    let res = router(&fx)
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn exchanges_code_with_form_credentials() {
    let fx = common::setup().await;
    let form = format!(
        "grant_type=authorization_code&code={}&client_id={}&client_secret={}",
        common::CODE,
        common::CLIENT_ID,
        common::CLIENT_SECRET
    );

    let (status, body) = send(router(&fx), token_request(&fx.install.id, &form)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], TOKEN_LIFE_IN_HOURS * 3600);
    assert_eq!(body["scopes"], serde_json::json!(["project:read", "event:write"]));

    let id = body["id"].as_str().unwrap();
    let stored = fx.repo.get_token(id).await.unwrap().expect("stored token");
    assert_eq!(stored.token_hash, hash_token(body["token"].as_str().unwrap()));
    assert_eq!(stored.refresh_token_hash, hash_token(body["refresh_token"].as_str().unwrap()));
    assert_eq!(body["expires_at"], stored.expires_at);
}

#[tokio::test]
async fn exchanges_code_then_refresh_with_basic_credentials() {
    let fx = common::setup().await;
    let basic = format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", common::CLIENT_ID, common::CLIENT_SECRET))
    );

    let mut req = token_request(&fx.install.id, &format!("grant_type=authorization_code&code={}", common::CODE));
    req.headers_mut().insert(header::AUTHORIZATION, basic.parse().unwrap());
    let (status, first) = send(router(&fx), req).await;
    assert_eq!(status, StatusCode::CREATED);

    let form = format!("grant_type=refresh_token&refresh_token={}", first["refresh_token"].as_str().unwrap());
    let mut req = token_request(&fx.install.id, &form);
    req.headers_mut().insert(header::AUTHORIZATION, basic.parse().unwrap());
    let (status, second) = send(router(&fx), req).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(second["token"], first["token"]);
    assert_ne!(second["refresh_token"], first["refresh_token"]);
}

#[tokio::test]
async fn every_rejection_looks_the_same() {
    let fx = common::setup().await;
    let cases = [
        // wrong client secret
        format!("grant_type=authorization_code&code={}&client_id={}&client_secret=nope", common::CODE, common::CLIENT_ID),
        // unknown client
        format!("grant_type=authorization_code&code={}&client_id=ghost&client_secret={}", common::CODE, common::CLIENT_SECRET),
        // no client credentials
        format!("grant_type=authorization_code&code={}", common::CODE),
        // unknown code
        format!("grant_type=authorization_code&code=123&client_id={}&client_secret={}", common::CLIENT_ID, common::CLIENT_SECRET),
        // unsupported grant type
        format!("grant_type=stuff&code={}&client_id={}&client_secret={}", common::CODE, common::CLIENT_ID, common::CLIENT_SECRET),
        // missing grant type
        format!("code={}&client_id={}&client_secret={}", common::CODE, common::CLIENT_ID, common::CLIENT_SECRET),
        // neither code nor refresh token
        format!("grant_type=refresh_token&client_id={}&client_secret={}", common::CLIENT_ID, common::CLIENT_SECRET),
    ];

    for form in cases {
        let (status, body) = send(router(&fx), token_request(&fx.install.id, &form)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "form: {form}");
        assert_eq!(body, serde_json::json!({ "detail": "unauthorized" }), "form: {form}");
    }

    // None of the above consumed the grant.
    assert!(fx.repo.find_grant(&hash_token(common::CODE)).await.unwrap().is_some());
}

#[tokio::test]
async fn unreadable_body_looks_like_any_other_rejection() {
    let fx = common::setup().await;
    let uri = format!("/api/0/installations/{}/authorizations", fx.install.id);
    let form = format!(
        "grant_type=authorization_code&code={}&client_id={}&client_secret={}",
        common::CODE,
        common::CLIENT_ID,
        common::CLIENT_SECRET
    );

    let requests = [
        // no content type
        Request::post(&uri).body(Body::from(form.clone())).unwrap(),
        // JSON instead of a form
        Request::post(&uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"grant_type":"authorization_code"}"#))
            .unwrap(),
        // form that does not deserialize
        token_request(
            &fx.install.id,
            &format!(
                "grant_type=authorization_code&grant_type=refresh_token&code={}&client_id={}&client_secret={}",
                common::CODE,
                common::CLIENT_ID,
                common::CLIENT_SECRET
            ),
        ),
    ];

    for req in requests {
        let (status, body) = send(router(&fx), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, serde_json::json!({ "detail": "unauthorized" }));
    }

    assert!(fx.repo.find_grant(&hash_token(common::CODE)).await.unwrap().is_some());
}

#[tokio::test]
async fn unknown_installation_is_unauthorized() {
    let fx = common::setup().await;
    let form = format!(
        "grant_type=authorization_code&code={}&client_id={}&client_secret={}",
        common::CODE,
        common::CLIENT_ID,
        common::CLIENT_SECRET
    );

    let (status, body) = send(router(&fx), token_request("no-such-install", &form)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, serde_json::json!({ "detail": "unauthorized" }));
}
