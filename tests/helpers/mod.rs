//! Test helper utilities: in-process app spawning and mock vendor servers.
#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

use staging_relay::app_state::AppState;
use staging_relay::routes;
use staging_relay::services::correlator::WebhookCorrelator;
use staging_relay::services::image_host::ImgbbClient;
use staging_relay::services::image_pipeline::ImagePipeline;
use staging_relay::services::instantdeco::InstantDecoClient;
use staging_relay::services::poll::PollPolicy;
use staging_relay::services::rate_limit::RateLimiter;
use staging_relay::services::reimagine::ReimagineClient;
use staging_relay::services::result_store::ResultStore;
use staging_relay::services::submitter::{JobSubmitter, SubmitterSettings};

/// One in-process server standing in for all three vendors.
pub struct VendorMocks {
    pub base_url: String,
    pub instantdeco_url: String,
    pub reimagine_url: String,
    pub imgbb_url: String,
    /// A downloadable JPEG, used as both input photo and vendor output.
    pub image_url: String,
    /// Every payload the InstantDeco mock received, in order.
    pub instantdeco_payloads: Arc<Mutex<Vec<Value>>>,
}

#[derive(Clone)]
struct MockState {
    base_url: String,
    instantdeco_payloads: Arc<Mutex<Vec<Value>>>,
    mask_polls: Arc<AtomicU32>,
    render_polls: Arc<AtomicU32>,
}

pub async fn spawn_vendor_mocks() -> VendorMocks {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock listener");
    let addr = listener.local_addr().expect("mock local addr");
    let base_url = format!("http://{addr}");

    let payloads = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        base_url: base_url.clone(),
        instantdeco_payloads: payloads.clone(),
        mask_polls: Arc::new(AtomicU32::new(0)),
        render_polls: Arc::new(AtomicU32::new(0)),
    };

    let router = Router::new()
        .route("/instantdeco", post(instantdeco_submit))
        .route("/reimagine/create_mask", post(create_mask))
        .route("/reimagine/create_mask/{job_id}", get(mask_status))
        .route("/reimagine/generate_image", post(generate_image))
        .route("/reimagine/generate_image/{job_id}", get(render_status))
        .route("/imgbb", post(imgbb_upload))
        .route("/image", get(source_image))
        .with_state(state);

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock server");
    });

    VendorMocks {
        instantdeco_url: format!("{base_url}/instantdeco"),
        reimagine_url: format!("{base_url}/reimagine"),
        imgbb_url: format!("{base_url}/imgbb"),
        image_url: format!("{base_url}/image"),
        base_url,
        instantdeco_payloads: payloads,
    }
}

async fn instantdeco_submit(
    State(state): State<MockState>,
    Json(payload): Json<Value>,
) -> Json<Value> {
    state
        .instantdeco_payloads
        .lock()
        .expect("payload log poisoned")
        .push(payload);

    Json(json!({
        "status": "success",
        "response": { "request_id": "mock-req-1" }
    }))
}

async fn create_mask(State(_state): State<MockState>) -> Json<Value> {
    Json(json!({
        "status": "success",
        "data": { "job_id": "mask-job-1" }
    }))
}

/// Pending on the first poll, done with one furnishing and one architectural
/// mask afterwards.
async fn mask_status(State(state): State<MockState>, Path(_id): Path<String>) -> Json<Value> {
    let polls = state.mask_polls.fetch_add(1, Ordering::SeqCst) + 1;
    if polls == 1 {
        return Json(json!({
            "status": "success",
            "data": { "job_status": "in_progress" }
        }));
    }

    Json(json!({
        "status": "success",
        "data": {
            "job_status": "done",
            "masks": [
                {
                    "url": format!("{}/mask/furnishing.png", state.base_url),
                    "category": "furnishing",
                    "area_percent": 41.5
                },
                {
                    "url": format!("{}/mask/wall.png", state.base_url),
                    "category": "architectural",
                    "area_percent": 30.0
                }
            ]
        }
    }))
}

async fn generate_image(State(_state): State<MockState>) -> Json<Value> {
    Json(json!({
        "status": "success",
        "data": { "job_id": "render-job-1" }
    }))
}

/// Pending on the first poll, done with two rendered variants afterwards.
async fn render_status(State(state): State<MockState>, Path(_id): Path<String>) -> Json<Value> {
    let polls = state.render_polls.fetch_add(1, Ordering::SeqCst) + 1;
    if polls == 1 {
        return Json(json!({
            "status": "success",
            "data": { "job_status": "in_progress" }
        }));
    }

    let image_url = format!("{}/image", state.base_url);
    Json(json!({
        "status": "success",
        "data": {
            "job_status": "done",
            "generated_images": [
                { "url": image_url },
                { "url": image_url }
            ]
        }
    }))
}

async fn imgbb_upload(State(state): State<MockState>) -> Json<Value> {
    let hosted = format!("{}/hosted/{}", state.base_url, Uuid::new_v4());
    Json(json!({
        "data": { "url": hosted, "display_url": hosted },
        "success": true,
        "status": 200
    }))
}

async fn source_image() -> impl IntoResponse {
    (
        [(axum::http::header::CONTENT_TYPE, "image/jpeg")],
        tiny_jpeg(),
    )
}

/// A small valid JPEG for download/recompress paths.
pub fn tiny_jpeg() -> Vec<u8> {
    let img = image::DynamicImage::new_rgb8(64, 48);
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Jpeg)
        .expect("encode test jpeg");
    buf
}

/// An image endpoint that serves each download after a fixed delay and
/// records the highest number of simultaneously in-flight requests.
pub struct SlowImageSource {
    pub url: String,
    max_in_flight: Arc<AtomicU32>,
}

impl SlowImageSource {
    pub fn max_in_flight(&self) -> u32 {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct SlowSourceState {
    delay: Duration,
    in_flight: Arc<AtomicU32>,
    max_in_flight: Arc<AtomicU32>,
}

pub async fn spawn_slow_image_source(delay: Duration) -> SlowImageSource {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind slow source listener");
    let addr = listener.local_addr().expect("slow source local addr");

    let state = SlowSourceState {
        delay,
        in_flight: Arc::new(AtomicU32::new(0)),
        max_in_flight: Arc::new(AtomicU32::new(0)),
    };
    let max_in_flight = state.max_in_flight.clone();

    let router = Router::new()
        .route("/image", get(slow_source_image))
        .with_state(state);

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("slow source server");
    });

    SlowImageSource {
        url: format!("http://{addr}/image"),
        max_in_flight,
    }
}

async fn slow_source_image(State(state): State<SlowSourceState>) -> impl IntoResponse {
    let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.max_in_flight.fetch_max(now, Ordering::SeqCst);
    tokio::time::sleep(state.delay).await;
    state.in_flight.fetch_sub(1, Ordering::SeqCst);

    (
        [(axum::http::header::CONTENT_TYPE, "image/jpeg")],
        tiny_jpeg(),
    )
}

/// The application under test, bound to an ephemeral port.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub state: AppState,
}

pub struct TestAppBuilder {
    instantdeco_url: String,
    reimagine_url: String,
    imgbb_url: String,
    min_interval: Duration,
    window: Duration,
    window_max: u32,
    result_ttl: Duration,
    mask_policy: PollPolicy,
    render_policy: PollPolicy,
}

impl TestAppBuilder {
    /// Defaults: no cooldown, generous quota, fast polling. Individual tests
    /// tighten what they exercise.
    pub fn new(mocks: &VendorMocks) -> Self {
        Self {
            instantdeco_url: mocks.instantdeco_url.clone(),
            reimagine_url: mocks.reimagine_url.clone(),
            imgbb_url: mocks.imgbb_url.clone(),
            min_interval: Duration::ZERO,
            window: Duration::from_secs(3600),
            window_max: 1000,
            result_ttl: Duration::from_secs(3600),
            mask_policy: PollPolicy::new(10, Duration::from_millis(50)),
            render_policy: PollPolicy::new(10, Duration::from_millis(50)),
        }
    }

    pub fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    pub fn imgbb_url(mut self, url: &str) -> Self {
        self.imgbb_url = url.to_string();
        self
    }

    pub async fn spawn(self) -> TestApp {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind app listener");
        let addr = listener.local_addr().expect("app local addr");

        let limiter = Arc::new(RateLimiter::new(
            self.min_interval,
            self.window,
            self.window_max,
        ));
        let results = Arc::new(ResultStore::new(self.result_ttl));
        let host = Arc::new(ImgbbClient::new(&self.imgbb_url, "test-key").expect("imgbb client"));
        let pipeline = Arc::new(ImagePipeline::new(host.clone()).expect("pipeline"));
        let instantdeco = Arc::new(
            InstantDecoClient::new(&self.instantdeco_url, "test-key").expect("instantdeco client"),
        );
        let reimagine =
            Arc::new(ReimagineClient::new(&self.reimagine_url, "test-key").expect("reimagine client"));

        let settings = SubmitterSettings {
            webhook_url: format!("http://{addr}/webhook-receiver"),
            num_images: 1,
            high_resolution: true,
            mask_policy: self.mask_policy,
            render_policy: self.render_policy,
        };
        let submitter = Arc::new(JobSubmitter::new(
            settings,
            limiter.clone(),
            results.clone(),
            instantdeco,
            reimagine,
            host,
            pipeline.clone(),
        ));
        let correlator = Arc::new(WebhookCorrelator::new(results.clone(), pipeline));

        let state = AppState {
            limiter,
            results,
            submitter,
            correlator,
        };

        let app = routes::api_router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test app server");
        });

        TestApp {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            state,
        }
    }
}

pub async fn spawn_app(mocks: &VendorMocks) -> TestApp {
    TestAppBuilder::new(mocks).spawn().await
}

/// A well-formed staging request body.
pub fn stage_request_body(image: &str, update_flooring: bool) -> Value {
    json!({
        "image": image,
        "transformationType": "furnish",
        "spaceType": "interior",
        "roomType": "living_room",
        "designStyle": "scandinavian",
        "updateFlooring": update_flooring,
        "blockDecorative": false
    })
}
