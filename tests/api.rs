mod common;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use common::{Harness, JWT_SECRET, RecordingQueue, encoders, exists};
use jsonwebtoken::{EncodingKey, Header, encode};
use movie_town::app::create_app;
use movie_town::middleware::auth::TokenClaims;
use movie_town::modules::video::model::{Access, Resolution};
use movie_town::modules::video::repository::VideoRepository;
use serde_json::Value;
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

const BOUNDARY: &str = "movie-town-boundary";

fn token(sub: Uuid, role: &str) -> String {
    let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
    let claims = TokenClaims {
        sub,
        role: role.to_string(),
        iat: now,
        exp: now + 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

async fn setup(queue: Arc<RecordingQueue>) -> (Harness, Router) {
    let harness = Harness::new(&encoders().ok, queue, vec![Resolution::P720]).await;
    let app = create_app(harness.state());
    (harness, app)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<Value>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).ok())
}

fn get(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn delete(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::delete(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn upload(bearer: &str, fields: &[(&str, &str)], file_name: &str) -> Request<Body> {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"video\"; filename=\"{file_name}\"\r\nContent-Type: video/mp4\r\n\r\nnot really a video\r\n--{BOUNDARY}--\r\n"
    ));

    Request::post("/api/v1/videos")
        .header(header::AUTHORIZATION, format!("Bearer {bearer}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

const VALID_FIELDS: [(&str, &str); 4] = [
    ("title", "Movie"),
    ("description", "A short film"),
    ("genre", "drama"),
    ("access", "public"),
];

fn listed_ids(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["video"]["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn health_is_public() {
    let (_harness, app) = setup(Arc::default()).await;
    let response = app.oneshot(get("/api/v1/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn upload_creates_thumbnail_and_enqueues_transcodes() {
    let queue = Arc::new(RecordingQueue::default());
    let (harness, app) = setup(queue.clone()).await;
    let owner = Uuid::new_v4();

    let (status, body) = send(&app, upload(&token(owner, "USER"), &VALID_FIELDS, "movie.mp4")).await;

    assert_eq!(status, StatusCode::CREATED);
    let body = body.unwrap();
    let video = &body["data"]["video"];
    assert_eq!(video["source_path"], "videos/movie.mp4");
    assert_eq!(video["thumbnail_path"], "thumbnails/movie.jpg");
    assert_eq!(video["owner_id"], owner.to_string());
    assert!(body["data"]["thumbnail_url"].is_string());
    assert!(body["data"]["video_720p_url"].is_null());

    assert!(exists(harness.root().join("videos/movie.mp4")).await);
    assert!(exists(harness.root().join("thumbnails/movie.jpg")).await);
    let jobs = queue.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].resolution, Resolution::P720);
}

#[tokio::test]
async fn second_upload_with_same_name_gets_its_own_file() {
    let (harness, app) = setup(Arc::default()).await;
    let bearer = token(Uuid::new_v4(), "USER");

    let (first, _) = send(&app, upload(&bearer, &VALID_FIELDS, "movie.mp4")).await;
    let (second, body) = send(&app, upload(&bearer, &VALID_FIELDS, "movie.mp4")).await;

    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::CREATED);
    let source = body.unwrap()["data"]["video"]["source_path"]
        .as_str()
        .unwrap()
        .to_string();
    assert_ne!(source, "videos/movie.mp4");
    assert!(exists(harness.root().join(&source)).await);
    assert!(exists(harness.root().join("videos/movie.mp4")).await);
}

fn data_str<'a>(body: &'a Value, pointer: &str) -> &'a str {
    body.pointer(pointer).and_then(Value::as_str).unwrap()
}

#[tokio::test]
async fn uploads_differing_only_in_extension_keep_their_own_thumbnails() {
    let (harness, app) = setup(Arc::default()).await;
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

    let (_, first) = send(&app, upload(&token(alice, "USER"), &VALID_FIELDS, "movie.mp4")).await;
    let (_, second) = send(&app, upload(&token(bob, "USER"), &VALID_FIELDS, "movie.mkv")).await;
    let (first, second) = (first.unwrap(), second.unwrap());

    let alice_thumb = data_str(&first, "/data/video/thumbnail_path");
    let bob_thumb = data_str(&second, "/data/video/thumbnail_path").to_string();
    assert_ne!(alice_thumb, bob_thumb);

    let uri = format!("/api/v1/videos/{}", data_str(&first, "/data/video/id"));
    let (status, _) = send(&app, delete(&uri, Some(&token(alice, "USER")))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let bob_source = data_str(&second, "/data/video/source_path");
    assert!(exists(harness.root().join(bob_source)).await);
    assert!(exists(harness.root().join(&bob_thumb)).await);
    let uri = format!("/api/v1/videos/{}", data_str(&second, "/data/video/id"));
    let (_, body) = send(&app, get(&uri, None)).await;
    assert!(body.unwrap()["data"]["thumbnail_url"].is_string());
}

#[tokio::test]
async fn upload_named_like_a_resolution_never_belongs_to_another_video() {
    let (harness, app) = setup(Arc::default()).await;
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

    let (_, bobs) = send(&app, upload(&token(bob, "USER"), &VALID_FIELDS, "movie_720p.mp4")).await;
    let (_, alices) = send(&app, upload(&token(alice, "USER"), &VALID_FIELDS, "movie.mp4")).await;
    let (bobs, alices) = (bobs.unwrap(), alices.unwrap());

    let bob_source = data_str(&bobs, "/data/video/source_path").to_string();
    assert_ne!(bob_source, "videos/movie_720p.mp4");
    assert!(alices["data"]["video_720p_url"].is_null());

    let uri = format!("/api/v1/videos/{}", data_str(&alices, "/data/video/id"));
    let (status, _) = send(&app, delete(&uri, Some(&token(alice, "USER")))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert!(exists(harness.root().join(&bob_source)).await);
    let stream = format!("/api/v1/videos/{}/stream", data_str(&bobs, "/data/video/id"));
    let response = app.clone().oneshot(get(&stream, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn later_upload_avoids_an_existing_videos_derived_names() {
    let (harness, app) = setup(Arc::default()).await;
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

    let (_, alices) = send(&app, upload(&token(alice, "USER"), &VALID_FIELDS, "movie.mp4")).await;
    tokio::fs::write(harness.root().join("videos/movie_720p.mp4"), b"encoded")
        .await
        .unwrap();
    let (_, bobs) = send(&app, upload(&token(bob, "USER"), &VALID_FIELDS, "movie_720p.mp4")).await;
    let (alices, bobs) = (alices.unwrap(), bobs.unwrap());

    assert_eq!(
        tokio::fs::read(harness.root().join("videos/movie_720p.mp4")).await.unwrap(),
        b"encoded"
    );
    assert!(bobs["data"]["video_720p_url"].is_null());

    let uri = format!("/api/v1/videos/{}", data_str(&bobs, "/data/video/id"));
    let (status, _) = send(&app, delete(&uri, Some(&token(bob, "USER")))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert!(exists(harness.root().join("videos/movie.mp4")).await);
    assert!(exists(harness.root().join("videos/movie_720p.mp4")).await);
    assert!(exists(harness.root().join(data_str(&alices, "/data/video/thumbnail_path"))).await);
}

#[tokio::test]
async fn invalid_form_is_rejected_and_upload_discarded() {
    let queue = Arc::new(RecordingQueue::default());
    let (harness, app) = setup(queue.clone()).await;
    let fields = [
        ("title", "Movie"),
        ("description", "A short film"),
        ("genre", "western"),
        ("access", "public"),
    ];

    let (status, _) = send(&app, upload(&token(Uuid::new_v4(), "USER"), &fields, "movie.mp4")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!exists(harness.root().join("videos/movie.mp4")).await);
    assert!(queue.jobs().is_empty());
    assert!(harness.repo.list_visible(None, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn file_without_extension_is_rejected() {
    let (harness, app) = setup(Arc::default()).await;

    let (status, _) = send(&app, upload(&token(Uuid::new_v4(), "USER"), &VALID_FIELDS, "movie")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(harness.repo.list_visible(None, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn upload_requires_a_token() {
    let (_harness, app) = setup(Arc::default()).await;
    let mut request = upload("ignored", &VALID_FIELDS, "movie.mp4");
    request.headers_mut().remove(header::AUTHORIZATION);

    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn listing_hides_other_users_private_videos() {
    let (harness, app) = setup(Arc::default()).await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let public = harness.create_video("public.mp4", alice, Access::Public).await;
    let private = harness.create_video("private.mp4", alice, Access::Private).await;

    let (status, body) = send(&app, get("/api/v1/videos", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed_ids(&body.unwrap()), [public.id.to_string()]);

    let (_, body) = send(&app, get("/api/v1/videos", Some(&token(bob, "USER")))).await;
    assert_eq!(listed_ids(&body.unwrap()), [public.id.to_string()]);

    let (_, body) = send(&app, get("/api/v1/videos", Some(&token(alice, "USER")))).await;
    let mut ids = listed_ids(&body.unwrap());
    ids.sort();
    let mut expected = vec![public.id.to_string(), private.id.to_string()];
    expected.sort();
    assert_eq!(ids, expected);

    let uri = format!("/api/v1/users/{alice}/videos");
    let (_, body) = send(&app, get(&uri, Some(&token(bob, "USER")))).await;
    assert_eq!(listed_ids(&body.unwrap()), [public.id.to_string()]);

    let uri = format!("/api/v1/videos/{}", private.id);
    let (status, _) = send(&app, get(&uri, Some(&token(bob, "USER")))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, get(&uri, Some(&token(alice, "USER")))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn invalid_token_is_rejected_even_on_public_routes() {
    let (_harness, app) = setup(Arc::default()).await;
    let (status, _) = send(&app, get("/api/v1/videos", Some("garbage"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn resolution_urls_appear_once_the_file_exists() {
    let (harness, app) = setup(Arc::default()).await;
    let video = harness.create_video("movie.mp4", Uuid::new_v4(), Access::Public).await;
    let uri = format!("/api/v1/videos/{}", video.id);

    let (_, body) = send(&app, get(&uri, None)).await;
    assert!(body.unwrap()["data"]["video_720p_url"].is_null());

    tokio::fs::write(harness.root().join("videos/movie_720p.mp4"), b"encoded")
        .await
        .unwrap();

    let (_, body) = send(&app, get(&uri, None)).await;
    let body = body.unwrap();
    assert_eq!(
        body["data"]["video_720p_url"],
        format!("/api/v1/videos/{}/stream/720p", video.id)
    );
    assert!(body["data"]["video_480p_url"].is_null());

    let response = app
        .clone()
        .oneshot(get(&format!("{uri}/stream/720p"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = app
        .oneshot(get(&format!("{uri}/stream/1080p"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_checks_ownership_and_cleans_up() {
    let (harness, app) = setup(Arc::default()).await;
    let owner = Uuid::new_v4();
    let video = harness.create_video("movie.mp4", owner, Access::Public).await;
    tokio::fs::write(harness.root().join("videos/movie_720p.mp4"), b"encoded")
        .await
        .unwrap();
    let uri = format!("/api/v1/videos/{}", video.id);

    let (status, _) = send(&app, delete(&uri, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, delete(&uri, Some(&token(Uuid::new_v4(), "USER")))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, delete(&uri, Some(&token(owner, "USER")))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(!exists(harness.root().join("videos/movie.mp4")).await);
    assert!(!exists(harness.root().join("videos/movie_720p.mp4")).await);

    let (status, _) = send(&app, delete(&uri, Some(&token(owner, "USER")))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admins_may_delete_any_video() {
    let (harness, app) = setup(Arc::default()).await;
    let video = harness.create_video("movie.mp4", Uuid::new_v4(), Access::Private).await;
    let uri = format!("/api/v1/videos/{}", video.id);

    let (status, _) = send(&app, delete(&uri, Some(&token(Uuid::new_v4(), "ADMIN")))).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(harness.repo.find_by_id(video.id).await.unwrap().is_none());
}
