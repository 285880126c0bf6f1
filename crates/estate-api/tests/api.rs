//! Router-level API tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use estate_api::{create_router, ApiConfig, AppState};
use estate_render::{CompositionRenderer, RenderCommand, RenderError, RenderResult, RenderService};

const BOUNDARY: &str = "----estate-test-boundary";

/// Listing host accepted by the test configuration.
const LISTING_HOST: &str = "listing.test";

/// Writes the composition name into the requested output file.
#[derive(Default)]
struct FakeRenderer {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl CompositionRenderer for FakeRenderer {
    async fn render(&self, cmd: &RenderCommand) -> RenderResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RenderError::tool_failed(
                "exit",
                Some("Could not find composition".to_string()),
                Some(1),
            ));
        }
        tokio::fs::write(cmd.output(), cmd.composition()).await?;
        Ok(())
    }
}

struct TestApp {
    router: Router,
    dir: TempDir,
    renderer: Arc<FakeRenderer>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_renderer(FakeRenderer::default())
    }

    fn with_renderer(renderer: FakeRenderer) -> Self {
        Self::build(renderer, |state| state)
    }

    #[cfg(feature = "scrape")]
    fn with_scraper(scraper: Arc<dyn estate_scrape::ListingSource>) -> Self {
        Self::build(FakeRenderer::default(), |state| state.with_scraper(scraper))
    }

    fn build(renderer: FakeRenderer, wire: impl FnOnce(AppState) -> AppState) -> Self {
        let dir = TempDir::new().unwrap();
        let config = ApiConfig {
            public_dir: dir.path().join("public"),
            scrape_allowed_domains: vec!["otodom.pl".to_string(), LISTING_HOST.to_string()],
            ..Default::default()
        };
        let renderer = Arc::new(renderer);
        let service = RenderService::new(renderer.clone(), dir.path().join("out"));
        let state = wire(AppState::new(config, service).without_scraper());

        Self {
            router: create_router(state, None),
            dir,
            renderer,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        (status, headers, body)
    }

    async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, _, body) = self.send(request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

fn multipart(uri: &str, parts: &[Part]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n", name, value)
                        .as_bytes(),
                );
            }
            Part::File(name, file_name, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new();
    let (status, headers, body) = app.send(get("/healthz")).await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(headers.get("X-Content-Type-Options").unwrap(), "nosniff");
    assert!(headers.contains_key("X-Request-ID"));
}

#[tokio::test]
async fn test_metrics_disabled() {
    let app = TestApp::new();
    let (status, _, _) = app.send(get("/metrics")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_photos_with_trailing_session_field() {
    let app = TestApp::new();
    let request = multipart(
        "/upload",
        &[
            Part::File("photo1", "salon duzy.jpg", b"jpeg-1"),
            Part::File("photo2", "kuchnia.jpg", b"jpeg-2"),
            Part::Text("session_id", "sesja-1"),
        ],
    );

    let (status, body) = app.send_json(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_id"], "sesja-1");
    assert_eq!(
        body["files"],
        json!([
            {"name": "salon_duzy.jpg", "path": "uploads/sesja-1/salon_duzy.jpg"},
            {"name": "kuchnia.jpg", "path": "uploads/sesja-1/kuchnia.jpg"}
        ])
    );

    let saved = app.dir.path().join("public/uploads/sesja-1/salon_duzy.jpg");
    assert_eq!(std::fs::read(saved).unwrap(), b"jpeg-1");

    // Uploaded files are previewable
    let (status, _, body) = app.send(get("/uploads/sesja-1/kuchnia.jpg")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"jpeg-2");
}

#[tokio::test]
async fn test_upload_generates_session() {
    let app = TestApp::new();
    let (status, body) = app
        .send_json(multipart("/upload", &[Part::File("f", "a.jpg", b"x")]))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_id"].as_str().unwrap().len(), 8);
}

#[tokio::test]
async fn test_upload_rejects_bad_input() {
    let app = TestApp::new();

    let (status, _) = app
        .send_json(multipart(
            "/upload",
            &[Part::File("f", "a.jpg", b"x"), Part::Text("session_id", "../etc")],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send_json(multipart("/upload", &[Part::File("f", "..", b"x")]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_logo() {
    let app = TestApp::new();

    let (status, body) = app
        .send_json(multipart("/upload-logo", &[Part::Text("session_id", "s1")]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Brak pliku logo"}));

    let (status, body) = app
        .send_json(multipart(
            "/upload-logo",
            &[Part::Text("session_id", "s1"), Part::File("logo", "moje logo.png", b"png")],
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"session_id": "s1", "logoPath": "uploads/s1/logo_moje_logo.png"}));
}

#[tokio::test]
async fn test_render_reel_and_download() {
    let app = TestApp::new();
    let request = post_json(
        "/render",
        json!({
            "template": "reel",
            "title": "Dom z ogrodem",
            "photos": [{"path": "uploads/s1/a.jpg"}, {"path": "uploads/s1/b.jpg", "label": "Ogrod"}]
        }),
    );

    let (status, body) = app.send_json(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["type"], "video");
    assert!(body.get("slide_count").is_none());

    let download_url = body["download_url"].as_str().unwrap();
    assert!(download_url.starts_with("/download/") && download_url.ends_with("-rolka.mp4"));
    assert!(body["filename"].as_str().unwrap().starts_with("rolka-"));

    let (status, headers, bytes) = app.send(get(download_url)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"RealEstateReel");
    let disposition = headers.get(header::CONTENT_DISPOSITION).unwrap().to_str().unwrap();
    assert!(disposition.starts_with("attachment"));
}

#[tokio::test]
async fn test_render_carousel() {
    let app = TestApp::new();
    let (status, body) = app
        .send_json(post_json(
            "/render",
            json!({"template": "carousel", "photos": [{"path": "uploads/s1/a.jpg"}, {"path": "uploads/s1/b.jpg"}]}),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "carousel");
    assert_eq!(body["slide_count"], 5);
    assert!(body["download_url"].as_str().unwrap().ends_with("-karuzela.zip"));
    assert_eq!(app.renderer.calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_render_validation_errors() {
    let app = TestApp::new();

    let (status, body) = app
        .send_json(post_json("/render", json!({"template": "sold", "photos": []})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Dodaj przynajmniej 1 zdjęcie");

    let (status, body) = app
        .send_json(post_json("/render", json!({"template": "plot", "photos": [{"path": "a.jpg"}]})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Nieznany szablon: plot");

    assert_eq!(app.renderer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_render_tool_failure() {
    let app = TestApp::with_renderer(FakeRenderer {
        fail: true,
        ..Default::default()
    });

    let (status, body) = app
        .send_json(post_json("/render", json!({"photos": [{"path": "uploads/s1/a.jpg"}]})))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"error": "Rendering nie powiódł się", "details": "Could not find composition"})
    );
}

#[tokio::test]
async fn test_download_missing_file() {
    let app = TestApp::new();

    let (status, body) = app.send_json(get("/download/nope-rolka.mp4")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Plik nie znaleziony"}));

    let (status, _) = app.send_json(get("/download/..%2Fsecret")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cleanup_removes_session() {
    let app = TestApp::new();
    app.send_json(multipart(
        "/upload",
        &[Part::File("f", "a.jpg", b"x"), Part::Text("session_id", "do-usuniecia")],
    ))
    .await;
    let session_dir = app.dir.path().join("public/uploads/do-usuniecia");
    assert!(session_dir.exists());

    let (status, body) = app
        .send_json(post_json("/cleanup", json!({"session_id": "do-usuniecia"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));
    assert!(!session_dir.exists());

    // No session id: nothing to do
    let request = Request::builder()
        .method("POST")
        .uri("/cleanup")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send_json(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_scrape_unavailable() {
    let app = TestApp::new();
    let (status, body) = app
        .send_json(post_json(
            "/scrape",
            json!({"url": "https://www.otodom.pl/pl/oferta/mieszkanie-ID4abc"}),
        ))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
}

#[cfg(feature = "scrape")]
#[tokio::test]
async fn test_scrape_rejects_foreign_and_internal_urls() {
    let app = TestApp::new();

    for url in ["https://example.com/oferta", "http://127.0.0.1:5558/oferta", "ftp://otodom.pl/x"] {
        let (status, _) = app.send_json(post_json("/scrape", json!({"url": url}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{url}");
    }
}

#[tokio::test]
async fn test_malformed_json_gets_json_error() {
    let app = TestApp::new();

    let request = Request::builder()
        .method("POST")
        .uri("/render")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"photos\": ["))
        .unwrap();
    let (status, headers, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(headers
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("Nieprawidłowe dane JSON"));

    // Missing content type on /scrape
    let request = Request::builder()
        .method("POST")
        .uri("/scrape")
        .body(Body::from("{\"url\": \"https://www.otodom.pl/x\"}"))
        .unwrap();
    let (status, body) = app.send_json(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(app.renderer.calls.load(Ordering::SeqCst), 0);
}

#[cfg(feature = "scrape")]
mod scrape {
    use super::*;

    use estate_models::ListingRecord;
    use estate_scrape::{
        ExtractedListing, ExtractionSource, FetchedPhoto, ListingScraper, ListingSource, ScrapeError,
        ScrapeResult, ScraperConfig,
    };
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Serves a fixed listing and photo set, or fails with a status.
    struct FakeListingSource {
        blocked: Option<u16>,
        photos: Vec<FetchedPhoto>,
    }

    #[async_trait]
    impl ListingSource for FakeListingSource {
        async fn scrape(&self, _url: &str) -> ScrapeResult<ExtractedListing> {
            if let Some(code) = self.blocked {
                return Err(ScrapeError::Blocked(code));
            }
            Ok(ExtractedListing {
                listing: ListingRecord {
                    title: "Dom pod lasem".to_string(),
                    ..Default::default()
                },
                photo_urls: self.photos.iter().map(|p| p.url.clone()).collect(),
                source: ExtractionSource::PageState,
            })
        }

        async fn fetch_photos(&self, _urls: &[String]) -> Vec<FetchedPhoto> {
            self.photos.clone()
        }
    }

    fn photo(url: &str, extension: &'static str) -> FetchedPhoto {
        FetchedPhoto {
            url: url.to_string(),
            bytes: vec![1, 2, 3],
            extension,
        }
    }

    fn listing_url(server: &MockServer, path: &str) -> String {
        format!("http://{}:{}{}", LISTING_HOST, server.address().port(), path)
    }

    #[tokio::test]
    async fn test_scrape_saves_downloaded_photos() {
        let server = MockServer::start().await;
        let images: Vec<Value> = ["/1.jpg", "/2.jpg", "/3.png"]
            .iter()
            .map(|p| json!({ "large": listing_url(&server, p) }))
            .collect();
        let state = json!({"props": {"pageProps": {"ad": {
            "title": "Mieszkanie z balkonem",
            "target": {"Price": 650000},
            "images": images
        }}}});
        let html = format!(
            r#"<html><body><script id="__NEXT_DATA__">{}</script></body></html>"#,
            state
        );

        Mock::given(method("GET"))
            .and(path("/oferta/mieszkanie"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/1.jpg"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg")
                    .set_body_bytes(b"jpeg".to_vec()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/2.jpg"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/3.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(b"png".to_vec()),
            )
            .mount(&server)
            .await;

        let builder = reqwest::Client::builder().resolve(LISTING_HOST, *server.address());
        let scraper = ListingScraper::with_client_builder(ScraperConfig::default(), builder).unwrap();
        let app = TestApp::with_scraper(Arc::new(scraper));

        let (status, body) = app
            .send_json(post_json(
                "/scrape",
                json!({"url": listing_url(&server, "/oferta/mieszkanie"), "session_id": "sesja-oferta"}),
            ))
            .await;

        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["success"], true);
        assert_eq!(body["session_id"], "sesja-oferta");
        assert_eq!(body["listing"]["title"], "Mieszkanie z balkonem");
        assert_eq!(body["listing"]["price"], "650 000 PLN");
        assert_eq!(
            body["listing"]["photos"],
            json!([
                {"name": "scraped_1.jpg", "path": "uploads/sesja-oferta/scraped_1.jpg"},
                {"name": "scraped_2.png", "path": "uploads/sesja-oferta/scraped_2.png"}
            ])
        );

        let session_dir = app.dir.path().join("public/uploads/sesja-oferta");
        assert_eq!(std::fs::read(session_dir.join("scraped_1.jpg")).unwrap(), b"jpeg");
        assert_eq!(std::fs::read(session_dir.join("scraped_2.png")).unwrap(), b"png");
    }

    #[tokio::test]
    async fn test_scrape_skips_photos_that_cannot_be_saved() {
        let source = FakeListingSource {
            blocked: None,
            photos: vec![
                photo("https://img.otodom.pl/a.jpg", "jpg"),
                photo("https://img.otodom.pl/b.png", "png"),
            ],
        };
        let app = TestApp::with_scraper(Arc::new(source));

        // A directory in the way makes the first save fail
        let session_dir = app.dir.path().join("public/uploads/sesja-zajeta");
        std::fs::create_dir_all(session_dir.join("scraped_1.jpg")).unwrap();

        let (status, body) = app
            .send_json(post_json(
                "/scrape",
                json!({"url": "https://www.otodom.pl/pl/oferta/dom-ID1", "session_id": "sesja-zajeta"}),
            ))
            .await;

        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["listing"]["title"], "Dom pod lasem");
        assert_eq!(
            body["listing"]["photos"],
            json!([{"name": "scraped_1.png", "path": "uploads/sesja-zajeta/scraped_1.png"}])
        );
    }

    #[tokio::test]
    async fn test_scrape_upstream_block() {
        let source = FakeListingSource {
            blocked: Some(403),
            photos: Vec::new(),
        };
        let app = TestApp::with_scraper(Arc::new(source));

        let (status, body) = app
            .send_json(post_json("/scrape", json!({"url": "https://www.otodom.pl/pl/oferta/dom-ID1"})))
            .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Serwis zablokował pobieranie strony (HTTP 403)");
    }
}
