use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use integration_tests::{write_png, TestEnv};
use rt_core::ingest::ingest_directory;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn seeded(reply: &str) -> (TestEnv, Router) {
    let env = TestEnv::new(reply).await;
    write_png(env.dir.path(), "street.png", 100, 100);
    ingest_directory(env.store.as_ref(), env.repo.as_ref()).await.unwrap();
    let app = env.router();
    (env, app)
}

#[tokio::test]
async fn empty_store_has_no_random_image() {
    let env = TestEnv::new("Valid").await;
    let (status, body) = call(&env.router(), get("/api/image")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn annotator_round_trip() {
    let (_env, app) = seeded("Valid").await;

    let (status, image) = call(&app, get("/api/image")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(image["image_id"], 1);
    assert_eq!(image["image_url"], "http://localhost:8080/api/image/street.png");

    let (status, _) = call(&app, get("/api/image/street.png")).await;
    assert_eq!(status, StatusCode::OK);

    let boxes = json!([
        { "x": 10.0, "y": 12.5, "width": 30.0, "height": 40.0 },
        { "x": 0.0, "y": 0.0, "width": 5.0, "height": 5.0 }
    ]);
    let (status, _) = call(
        &app,
        post(
            "/api/submit",
            json!({
                "worker_id": "w-7",
                "annotations": [
                    { "image_id": 1, "bounding_boxes": boxes },
                    { "image_id": 1, "bounding_boxes": [] }
                ]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, listed) = call(&app, get("/api/annotations")).await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["worker_id"], "w-7");
    assert_eq!(listed[0]["image_id"], 1);
    assert_eq!(listed[0]["bounding_boxes"], boxes);
    assert_eq!(listed[1]["bounding_boxes"], json!([]));
    // YYYY-MM-DD HH:MM:SS
    assert_eq!(listed[0]["timestamp"].as_str().unwrap().len(), 19);
}

#[tokio::test]
async fn batch_naming_unknown_image_stores_nothing() {
    let (_env, app) = seeded("Valid").await;

    let (status, _) = call(
        &app,
        post(
            "/api/submit",
            json!({
                "worker_id": "w",
                "annotations": [
                    { "image_id": 1, "bounding_boxes": [] },
                    { "image_id": 404, "bounding_boxes": [] }
                ]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, listed) = call(&app, get("/api/annotations")).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn validation_renders_and_returns_model_verdict() {
    let (env, app) = seeded("Valid: the box fits the car tightly").await;

    let (status, body) = call(
        &app,
        post("/api/validate", json!({ "image_id": 1, "bounding_box": [10, 10, 50, 50] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "valid": true, "reason": "Valid: the box fits the car tightly" })
    );
    assert_eq!(env.verifier.calls(), 1);

    let (_, listed) = call(&app, get("/api/annotations")).await;
    assert_eq!(listed, json!([]), "validation must not persist anything");
}

#[tokio::test]
async fn validation_of_unknown_image_never_reaches_the_model() {
    let (env, app) = seeded("Valid").await;
    let (status, _) = call(
        &app,
        post("/api/validate", json!({ "image_id": 99, "bounding_box": [1, 2, 3, 4] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(env.verifier.calls(), 0);
}

#[tokio::test]
async fn row_without_file_is_a_render_error() {
    let (env, app) = seeded("Valid").await;
    std::fs::remove_file(env.dir.path().join("street.png")).unwrap();

    let (status, body) = call(
        &app,
        post("/api/validate", json!({ "image_id": 1, "bounding_box": [1, 2, 3, 4] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "image not found or unreadable");

    let (status, _) = call(&app, get("/api/image/street.png")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(env.verifier.calls(), 0);
}

#[tokio::test]
async fn debug_listing_shows_directory_contents() {
    let (_env, app) = seeded("Valid").await;
    let (status, body) = call(&app, get("/debug/files")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "files": ["street.png"] }));
}

#[tokio::test]
async fn box_far_outside_frame_still_gets_a_verdict() {
    let (env, app) = seeded("Invalid: nothing is enclosed").await;
    for bbox in [json!([1e300, 0, 1, 1]), json!([-1e300, 0, 1, 1])] {
        let (status, body) = call(
            &app,
            post("/api/validate", json!({ "image_id": 1, "bounding_box": bbox })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "body {body}");
        assert_eq!(body["valid"], false);
    }
    assert_eq!(env.verifier.calls(), 2);
}
