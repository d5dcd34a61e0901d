use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures_util::StreamExt;
use hicfront_common::{BannerMetadata, BuildConfig, PipelineKind, ProjectLayout};
use hicfront_dev_server::{
    ReloadHub, ReloadMessage, ReloadServer, WatchOrchestrator, LIVERELOAD_PATH,
};
use hicfront_pipeline::Pipelines;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

fn site() -> (TempDir, ReloadServer, Arc<ReloadHub>) {
    let dir = TempDir::new().unwrap();
    let dist = dir.path().join("dist");
    std::fs::create_dir_all(dist.join("css")).unwrap();
    std::fs::create_dir_all(dist.join("blog")).unwrap();
    std::fs::create_dir_all(dist.join("images")).unwrap();
    std::fs::write(dist.join("index.html"), "<html><body><h1>Home</h1></body></html>").unwrap();
    std::fs::write(dist.join("blog/index.html"), "<body>Blog</body>").unwrap();
    std::fs::write(dist.join("css/main.css"), "a{color:red}").unwrap();
    std::fs::write(dist.join("images/my logo.svg"), "<svg/>").unwrap();
    std::fs::write(dir.path().join("secret.txt"), "secret").unwrap();

    let hub = Arc::new(ReloadHub::new(&dist));
    let server = ReloadServer::new(&dist, hub.clone(), "127.0.0.1:0");
    (dir, server, hub)
}

async fn get(server: &ReloadServer, uri: &str) -> (StatusCode, String, String) {
    let response = server
        .router()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, String::from_utf8_lossy(&body).into_owned())
}

#[tokio::test]
async fn test_index_gets_client_injected() {
    let (_dir, server, _hub) = site();

    let (status, content_type, body) = get(&server, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/html"));
    assert_eq!(
        body,
        "<html><body><h1>Home</h1><script src=\"/__hicfront/client.js\"></script></body></html>"
    );

    let (status, _, body) = get(&server, "/blog/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("<body>Blog<script"));
}

#[tokio::test]
async fn test_static_assets() {
    let (_dir, server, _hub) = site();

    let (status, content_type, body) = get(&server, "/css/main.css").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "text/css; charset=utf-8");
    assert_eq!(body, "a{color:red}");

    let (status, content_type, body) = get(&server, "/__hicfront/client.js").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("application/javascript"));
    assert!(body.contains(LIVERELOAD_PATH));
}

#[tokio::test]
async fn test_percent_encoded_path() {
    let (_dir, server, _hub) = site();

    let (status, content_type, body) = get(&server, "/images/my%20logo.svg").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "image/svg+xml");
    assert_eq!(body, "<svg/>");

    let (status, _, body) = get(&server, "/%2e%2e/secret.txt").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!body.contains("secret"));
}

#[tokio::test]
async fn test_missing_and_traversal() {
    let (_dir, server, _hub) = site();

    let (status, _, _) = get(&server, "/nope.html").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, body) = get(&server, "/../secret.txt").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!body.contains("secret"));
}

#[tokio::test]
async fn test_websocket_receives_messages() {
    let (_dir, server, hub) = site();
    let listener = server.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });

    let url = format!("ws://{}{}", addr, LIVERELOAD_PATH);
    let (mut socket, _) = tokio_tungstenite::connect_async(url).await.unwrap();

    let next = |frame: tokio_tungstenite::tungstenite::Message| -> ReloadMessage {
        serde_json::from_str(frame.to_text().unwrap()).unwrap()
    };

    let first = socket.next().await.unwrap().unwrap();
    assert_eq!(next(first), ReloadMessage::Connected);

    hub.send(ReloadMessage::FullReload {
        reason: "markup changed".into(),
    });
    let pushed = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(
        next(pushed),
        ReloadMessage::FullReload {
            reason: "markup changed".into()
        }
    );
}

#[tokio::test]
async fn test_style_error_publishes_error_only() {
    let dir = TempDir::new().unwrap();
    let layout = ProjectLayout::new(dir.path());
    std::fs::create_dir_all(layout.styles_dir()).unwrap();
    std::fs::write(layout.styles_dir().join("main.scss"), ".a {\n  color: red;\n}\n").unwrap();

    let banner = BannerMetadata::from_package(&Default::default(), &Default::default(), 2026);
    let pipelines = Pipelines::new(&layout, &BuildConfig::default(), &banner).unwrap();
    let styles = pipelines.get(PipelineKind::Styles);
    let hub = ReloadHub::new(layout.output_dir());
    let mut rx = hub.subscribe();

    hub.publish(&styles.run().await.unwrap());
    match rx.try_recv().unwrap() {
        ReloadMessage::StyleUpdate { paths, .. } => {
            assert_eq!(paths, vec!["/css/main.css", "/css/main.min.css"]);
        }
        other => panic!("unexpected message: {other:?}"),
    }
    let expanded = std::fs::read(layout.css_output_dir().join("main.css")).unwrap();
    let minified = std::fs::read(layout.css_output_dir().join("main.min.css")).unwrap();

    std::fs::write(layout.styles_dir().join("main.scss"), ".a {\n  color: red;\n").unwrap();
    hub.publish(&styles.run().await.unwrap());

    match rx.try_recv().unwrap() {
        ReloadMessage::Error { message } => assert!(message.contains("main.scss")),
        other => panic!("unexpected message: {other:?}"),
    }
    assert!(rx.try_recv().is_err());
    assert_eq!(std::fs::read(layout.css_output_dir().join("main.css")).unwrap(), expanded);
    assert_eq!(std::fs::read(layout.css_output_dir().join("main.min.css")).unwrap(), minified);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watch_rebuilds_changed_pipeline() {
    let dir = TempDir::new().unwrap();
    let layout = ProjectLayout::new(dir.path());
    for source in [layout.styles_dir(), layout.scripts_dir(), layout.images_dir()] {
        std::fs::create_dir_all(source).unwrap();
    }

    let banner = BannerMetadata::from_package(&Default::default(), &Default::default(), 2026);
    let pipelines = Pipelines::new(&layout, &BuildConfig::default(), &banner).unwrap();
    let hub = Arc::new(ReloadHub::new(layout.output_dir()));
    let mut rx = hub.subscribe();

    let orchestrator = WatchOrchestrator::new(
        layout.clone(),
        pipelines,
        hub.clone(),
        Duration::from_millis(50),
    );
    let active = orchestrator.watch().unwrap();
    let watching = tokio::spawn(async move { orchestrator.listen(active).await });

    std::fs::write(layout.scripts_dir().join("app.js"), "var a = 1;\n").unwrap();

    let message = tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        message,
        ReloadMessage::FullReload {
            reason: "scripts changed".into()
        }
    );
    assert!(layout.js_output_dir().join("app.min.js").is_file());

    watching.abort();
}
