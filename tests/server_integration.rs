//! Integration tests for the HTTP surface.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`, with
//! a stub image provider standing in for the images API.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

use smile::config::Config;
use smile::imagegen::{GenerateError, ImageProvider};
use smile::server::{router, State};

// =============================================================================
// Test Helpers
// =============================================================================

struct StubProvider {
    fail_with: Option<u16>,
}

#[async_trait]
impl ImageProvider for StubProvider {
    async fn generate(&self, _prompt: &str) -> Result<Vec<u8>, GenerateError> {
        if let Some(status) = self.fail_with {
            return Err(GenerateError::HttpError {
                status,
                body: "upstream exploded".to_string(),
            });
        }
        let img = RgbImage::from_pixel(32, 32, Rgb([255, 180, 60]));
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .expect("Failed to encode stub image");
        Ok(out)
    }

    fn model(&self) -> &str {
        "stub"
    }
}

/// Builds the router over a fresh temporary root.
/// Returns the router, the shared state and the temp directory (which must be kept alive).
fn create_test_app(fail_with: Option<u16>) -> (Router, Arc<State>, TempDir) {
    let dir = tempdir().expect("Failed to create temp directory");
    let vars: HashMap<&str, String> = HashMap::from([
        ("SMILE_ROOT", dir.path().to_string_lossy().to_string()),
        ("SMILE_SECRET", "integration-test-secret".to_string()),
    ]);
    let config = Config::from_lookup(|key| vars.get(key).cloned()).expect("Failed to load config");

    let state = State::with_provider(&config, Arc::new(StubProvider { fail_with }))
        .expect("Failed to build state");
    (router(state.clone()), state, dir)
}

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("Request failed")
}

async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body should be UTF-8")
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn rate_request(rating: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/rate")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(format!("rating={rating}"))).unwrap()
}

/// Returns the `name=value` part of the response's Set-Cookie header.
fn session_cookie(response: &Response<Body>) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Response should set a cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

async fn generate_async(app: &Router) -> (String, Value) {
    let response = send(app, post("/generate_async")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);
    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    (cookie, json)
}

fn rating_count(state: &State) -> i64 {
    state
        .service
        .with_db(|db| db.rating_count())
        .expect("Failed to count ratings")
}

// =============================================================================
// Basic Routes
// =============================================================================

mod basic_tests {
    use super::*;

    #[tokio::test]
    async fn test_healthz() {
        let (app, _state, _dir) = create_test_app(None);
        let response = send(&app, get("/healthz")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "ok");
    }

    #[tokio::test]
    async fn test_index_page() {
        let (app, _state, _dir) = create_test_app(None);
        let response = send(&app, get("/")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response).await;
        assert!(body.contains("I Need A Smile"));
        assert!(body.contains("/generate_async"));
    }

    #[tokio::test]
    async fn test_empty_album() {
        let (app, _state, _dir) = create_test_app(None);
        let response = send(&app, get("/album")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["images"], serde_json::json!([]));
    }
}

// =============================================================================
// Generation
// =============================================================================

mod generate_tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_async_returns_image_and_sets_session() {
        let (app, state, _dir) = create_test_app(None);
        let (cookie, json) = generate_async(&app).await;

        assert!(cookie.starts_with("smile_session="));
        let image_path = json["image_path"].as_str().unwrap();
        assert!(image_path.starts_with("generated/smile_"));
        assert_eq!(json["image_url"], format!("/static/{image_path}"));
        assert_eq!(json["selections"].as_object().unwrap().len(), 4);
        assert!(json["prompt"].as_str().unwrap().starts_with("Create a highly detailed"));

        let on_disk = state.service.layout().static_dir().join(image_path);
        assert!(on_disk.is_file(), "Generated image should be written to disk");

        let response = send(&app, get(json["image_url"].as_str().unwrap())).await;
        assert_eq!(response.status(), StatusCode::OK, "Image should be served from /static");
    }

    #[tokio::test]
    async fn test_generate_async_failure_is_bad_gateway() {
        let (app, state, _dir) = create_test_app(Some(500));
        let response = send(&app, post("/generate_async")).await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(json["error"].as_str().unwrap().contains("upstream exploded"));

        let log = std::fs::read_to_string(state.service.layout().prompt_log_path()).unwrap();
        assert_eq!(log.lines().count(), 1, "Failed prompts are still logged");
    }

    #[tokio::test]
    async fn test_generate_form_renders_page() {
        let (app, _state, _dir) = create_test_app(None);
        let response = send(&app, post("/generate")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_some());
        let body = body_string(response).await;
        assert!(body.contains("/static/generated/smile_"));
        assert!(body.contains("action=\"/rate\""));
    }

    #[tokio::test]
    async fn test_generate_form_renders_error() {
        let (app, _state, _dir) = create_test_app(Some(401));
        let response = send(&app, post("/generate")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("No smile this time"));
        assert!(body.contains("401"));
    }
}

// =============================================================================
// Rating
// =============================================================================

mod rate_tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_records_and_clears_session() {
        let (app, state, _dir) = create_test_app(None);
        let (cookie, _json) = generate_async(&app).await;

        let response = send(&app, rate_request("3", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
        let cleared = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cleared.contains("Max-Age=0"));

        assert_eq!(rating_count(&state), 1);
        assert!(state.service.list_album().unwrap().is_empty(), "Only 5 stars reach the album");
    }

    #[tokio::test]
    async fn test_five_stars_saves_to_album() {
        let (app, _state, _dir) = create_test_app(None);
        let (cookie, _json) = generate_async(&app).await;

        let response = send(&app, rate_request("5", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = send(&app, get("/album")).await;
        let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
        let images = json["images"].as_array().unwrap();
        assert_eq!(images.len(), 1);
        assert!(images[0].as_str().unwrap().starts_with("/static/album_images/album_"));
    }

    #[tokio::test]
    async fn test_rate_without_session_is_ignored() {
        let (app, state, _dir) = create_test_app(None);

        let response = send(&app, rate_request("5", None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(rating_count(&state), 0);
    }

    #[tokio::test]
    async fn test_rate_with_forged_session_is_ignored() {
        let (app, state, _dir) = create_test_app(None);

        let response = send(&app, rate_request("5", Some("smile_session=forged"))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(rating_count(&state), 0);
    }

    #[tokio::test]
    async fn test_rate_out_of_range_is_ignored() {
        let (app, state, _dir) = create_test_app(None);
        let (cookie, _json) = generate_async(&app).await;

        for rating in ["0", "6", "lots"] {
            let response = send(&app, rate_request(rating, Some(&cookie))).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
        }
        assert_eq!(rating_count(&state), 0);
    }

    #[tokio::test]
    async fn test_rate_without_form_body_redirects() {
        let (app, state, _dir) = create_test_app(None);
        let (cookie, _json) = generate_async(&app).await;

        let request = Request::builder()
            .method("POST")
            .uri("/rate")
            .header(header::COOKIE, &cookie)
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
        assert_eq!(rating_count(&state), 0);
    }

    #[tokio::test]
    async fn test_rate_with_repeated_field_redirects() {
        let (app, state, _dir) = create_test_app(None);
        let (cookie, _json) = generate_async(&app).await;

        let response = send(&app, rate_request("5&rating=4", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(rating_count(&state), 0);
    }
}

// =============================================================================
// Album
// =============================================================================

mod album_tests {
    use super::*;

    #[tokio::test]
    async fn test_save_to_album_needs_session() {
        let (app, _state, _dir) = create_test_app(None);
        let response = send(&app, post("/album")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_save_to_album_with_session() {
        let (app, state, _dir) = create_test_app(None);
        let (cookie, _json) = generate_async(&app).await;

        let request = Request::builder()
            .method("POST")
            .uri("/album")
            .header(header::COOKIE, &cookie)
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        assert_eq!(state.service.list_album().unwrap().len(), 1);
        assert_eq!(rating_count(&state), 0, "Saving is not rating");
    }
}
