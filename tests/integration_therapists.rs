mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{TestApp, send, token};
use rejuvenators_core::Role;
use rejuvenators_models::TherapistId;

async fn upload_photo(
    app: &TestApp,
    token: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("PUT")
        .uri("/api/my-profile/photo")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", content_type)
        .body(Body::from(bytes))
        .unwrap();

    let response = app.router().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_admin_lists_therapists() {
    let app = TestApp::new();
    app.seed_therapist("Ana").await;
    app.seed_therapist("Ben").await;

    let admin = token(Some(Role::Admin), None);
    let res = send(app.router(), "GET", "/api/therapists", Some(&admin), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"].as_array().unwrap().len(), 2);

    let therapist = token(Some(Role::Therapist), Some(TherapistId::new()));
    let res = send(app.router(), "GET", "/api/therapists", Some(&therapist), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_get_single_therapist() {
    let app = TestApp::new();
    let ana = app.seed_therapist("Ana").await;
    let admin = token(Some(Role::Admin), None);

    let res = send(
        app.router(),
        "GET",
        &format!("/api/therapists/{}", ana.id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["first_name"], "Ana");
    assert_eq!(res.body["photo_display_url"], Value::Null);

    let res = send(
        app.router(),
        "GET",
        &format!("/api/therapists/{}", TherapistId::new()),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_my_profile_is_for_therapists_only() {
    let app = TestApp::new();
    let ana = app.seed_therapist("Ana").await;

    let therapist = token(Some(Role::Therapist), Some(ana.id));
    let res = send(app.router(), "GET", "/api/my-profile", Some(&therapist), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["id"], ana.id.to_string());

    // Admins hold canEditOwnProfile but are not therapists.
    let admin = token(Some(Role::Admin), None);
    let res = send(app.router(), "GET", "/api/my-profile", Some(&admin), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let unlinked = token(Some(Role::Therapist), None);
    let res = send(app.router(), "GET", "/api/my-profile", Some(&unlinked), None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_my_profile() {
    let app = TestApp::new();
    let ana = app.seed_therapist("Ana").await;
    let therapist = token(Some(Role::Therapist), Some(ana.id));

    let res = send(
        app.router(),
        "PUT",
        "/api/my-profile",
        Some(&therapist),
        Some(json!({ "bio": "Deep tissue and sports massage", "phone": "555-0100" })),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["bio"], "Deep tissue and sports massage");
    assert_eq!(res.body["first_name"], "Ana");

    let res = send(
        app.router(),
        "PUT",
        "/api/my-profile",
        Some(&therapist),
        Some(json!({ "is_active": false })),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_photo_upload_sets_display_url() {
    let app = TestApp::new();
    let ana = app.seed_therapist("Ana").await;
    let therapist = token(Some(Role::Therapist), Some(ana.id));

    let (status, body) = upload_photo(&app, &therapist, "image/png", vec![0x89, 0x50, 0x4e, 0x47]).await;
    assert_eq!(status, StatusCode::OK);

    let url = body["profile_pic"].as_str().unwrap();
    let prefix = format!("http://files.test/therapist-photos/{}/", ana.id);
    assert!(url.starts_with(&prefix));
    assert!(url.ends_with(".png"));
    let display = body["photo_display_url"].as_str().unwrap();
    assert!(display.contains("width=128"));
    assert!(display.contains("height=128"));

    let bucket_dir = app
        .state
        .storage_config
        .upload_dir
        .join(&app.state.storage_config.photo_bucket);
    let first_key = url.strip_prefix("http://files.test/therapist-photos/").unwrap();
    let first_file = bucket_dir.join(first_key);
    assert!(first_file.exists());

    let (status, body) = upload_photo(&app, &therapist, "image/jpeg; charset=binary", vec![0xff, 0xd8]).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["profile_pic"].as_str().unwrap().ends_with(".jpg"));
    // The replaced photo is removed from storage.
    assert!(!first_file.exists());

    let _ = std::fs::remove_dir_all(&app.state.storage_config.upload_dir);
}

#[tokio::test]
async fn test_photo_upload_rejects_bad_input() {
    let app = TestApp::new();
    let ana = app.seed_therapist("Ana").await;
    let therapist = token(Some(Role::Therapist), Some(ana.id));

    let (status, _) = upload_photo(&app, &therapist, "application/pdf", vec![1, 2, 3]).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let (status, _) = upload_photo(&app, &therapist, "image/png", vec![0u8; 2048]).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    let (status, _) = upload_photo(&app, &therapist, "image/png", Vec::new()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let admin = token(Some(Role::Admin), None);
    let (status, _) = upload_photo(&app, &admin, "image/png", vec![1]).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
