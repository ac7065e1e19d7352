use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, blogs, calendar, dashboard, magazines, pdfs, requests, users};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .merge(auth::router())
                .merge(users::router())
                .merge(pdfs::router())
                .merge(magazines::router())
                .merge(calendar::router())
                .merge(requests::router())
                .merge(blogs::router())
                .merge(dashboard::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::JwtKeys;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use axum::extract::FromRef;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app() -> (Router, JwtKeys) {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        (build_app(state), keys)
    }

    fn json_request(method: Method, uri: &str, body: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(t) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_text(res: axum::response::Response) -> String {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (app, _) = app();
        let res = app
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_text(res).await, "ok");
    }

    #[tokio::test]
    async fn pdf_topics_are_listed_without_db() {
        let (app, _) = app();
        let res = app
            .oneshot(Request::get("/api/v1/pdfs/topics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(res).await).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(10));
        assert_eq!(json[3]["value"], "general_awareness");
        assert_eq!(json[3]["label"], "General Awareness");
    }

    #[tokio::test]
    async fn me_requires_token() {
        let (app, _) = app();
        let res = app
            .oneshot(Request::get("/api/v1/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let (app, _) = app();
        let res = app
            .oneshot(json_request(Method::GET, "/api/v1/admin/users", "", Some("not.a.jwt")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn user_token_cannot_reach_admin_routes() {
        let (app, keys) = app();
        let token = keys.sign_access(Uuid::new_v4()).unwrap();
        for uri in ["/api/v1/admin/dashboard", "/api/v1/admin/users", "/api/v1/admin/requests"] {
            let res = app
                .clone()
                .oneshot(json_request(Method::GET, uri, "", Some(&token)))
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::FORBIDDEN, "{uri}");
        }
    }

    #[tokio::test]
    async fn admin_token_cannot_act_as_user() {
        let (app, keys) = app();
        let token = keys.sign_admin().unwrap();
        let res = app
            .oneshot(json_request(Method::GET, "/api/v1/me", "", Some(&token)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn refresh_token_is_not_an_access_token() {
        let (app, keys) = app();
        let token = keys.sign_refresh(Uuid::new_v4()).unwrap();
        let res = app
            .oneshot(json_request(Method::GET, "/api/v1/me", "", Some(&token)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn signup_rejects_mismatched_passwords() {
        let (app, _) = app();
        let body = r#"{
            "full_name": "Test User",
            "email": "test@example.com",
            "mobile_number": "9876543210",
            "exam_type": "PO (SBI, IBPS, RRB)",
            "password": "password123",
            "confirm_password": "password124",
            "agree_to_terms": true
        }"#;
        let res = app
            .oneshot(json_request(Method::POST, "/api/v1/auth/signup", body, None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(res).await, "Password does not match");
    }

    #[tokio::test]
    async fn signup_rejects_empty_fields() {
        let (app, _) = app();
        let res = app
            .oneshot(json_request(Method::POST, "/api/v1/auth/signup", r#"{"email":"a@b.co"}"#, None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(res).await, "Please fill all fields");
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let (app, _) = app();
        let res = app
            .oneshot(json_request(Method::POST, "/api/v1/auth/login", r#"{"email":"a@b.co"}"#, None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn admin_login_checks_configured_credentials() {
        let (app, keys) = app();
        let res = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/v1/admin/login",
                r#"{"username":"admin","password":"nope"}"#,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = app
            .oneshot(json_request(
                Method::POST,
                "/api/v1/admin/login",
                r#"{"username":"admin","password":"admin-pass"}"#,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(res).await).unwrap();
        let token = json["access_token"].as_str().unwrap();
        assert!(keys.verify(token).is_ok());
    }

    #[tokio::test]
    async fn request_form_requires_fields() {
        let (app, _) = app();
        let res = app
            .oneshot(json_request(
                Method::POST,
                "/api/v1/requests",
                r#"{"name":"Asha","email":"asha@example.com","subject":"","message":"hi"}"#,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(res).await, "Please fill all required fields");
    }

    #[tokio::test]
    async fn tracking_id_must_be_five_digits() {
        let (app, _) = app();
        let res = app
            .oneshot(
                Request::get("/api/v1/requests/track/12ab5?email=asha@example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn tracking_lookup_requires_email() {
        let (app, _) = app();
        let res = app
            .oneshot(Request::get("/api/v1/requests/track/48213").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(res).await, "Please enter the email used for the request");
    }

    #[tokio::test]
    async fn respond_requires_text() {
        let (app, keys) = app();
        let token = keys.sign_admin().unwrap();
        let uri = format!("/api/v1/admin/requests/{}/respond", Uuid::new_v4());
        let res = app
            .oneshot(json_request(Method::POST, &uri, r#"{"response":"  "}"#, Some(&token)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn admin_forms_validate_before_saving() {
        let (app, keys) = app();
        let token = keys.sign_admin().unwrap();
        let cases = [
            ("/api/v1/admin/pdfs", r#"{"title":"","topic":"quants","google_drive_link":"x"}"#),
            ("/api/v1/admin/magazines", r#"{"title":"CA","month":"Smarch","year":2025,"google_drive_link":"x"}"#),
            ("/api/v1/admin/calendar", r#"{"exam_name":"IBPS PO","form_fill_last_date":"2025-09-10","prelims_exam_dates":[""],"mains_exam_dates":["2025-11-29"]}"#),
            ("/api/v1/admin/blogs", r#"{"title":"Plan","content":""}"#),
            ("/api/v1/admin/users/block-toggle", r#"{"email":" "}"#),
        ];
        for (uri, body) in cases {
            let res = app
                .clone()
                .oneshot(json_request(Method::POST, uri, body, Some(&token)))
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn download_requires_sign_in() {
        let (app, _) = app();
        let uri = format!("/api/v1/pdfs/{}/download", Uuid::new_v4());
        let res = app
            .oneshot(json_request(Method::POST, &uri, "", None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
