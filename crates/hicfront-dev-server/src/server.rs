use crate::hub::{ReloadHub, ReloadMessage};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use hicfront_common::{BuildError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tower_http::trace::TraceLayer;

/// WebSocket endpoint browsers subscribe to
pub const LIVERELOAD_PATH: &str = "/__hicfront/livereload";

/// Browser client script
pub const CLIENT_PATH: &str = "/__hicfront/client.js";

const CLIENT_SCRIPT: &str = include_str!("client.js");

/// Serves the output tree and pushes reload messages
pub struct ReloadServer {
    /// Directory served at `/`
    output_dir: PathBuf,

    /// Shared with the watch orchestrator
    hub: Arc<ReloadHub>,

    /// `host:port`
    bind_addr: String,
}

/// Server state shared across handlers
#[derive(Clone)]
struct ServerState {
    output_dir: Arc<PathBuf>,
    hub: Arc<ReloadHub>,
}

impl ReloadServer {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        hub: Arc<ReloadHub>,
        bind_addr: impl Into<String>,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            hub,
            bind_addr: bind_addr.into(),
        }
    }

    pub fn router(&self) -> Router {
        let state = ServerState {
            output_dir: Arc::new(self.output_dir.clone()),
            hub: self.hub.clone(),
        };

        Router::new()
            .route(LIVERELOAD_PATH, get(livereload_handler))
            .route(CLIENT_PATH, get(client_handler))
            .fallback(static_handler)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    pub async fn bind(&self) -> Result<TcpListener> {
        TcpListener::bind(&self.bind_addr)
            .await
            .map_err(|e| BuildError::Server(format!("cannot bind {}: {}", self.bind_addr, e)))
    }

    /// Serve on an already bound listener until the task is dropped
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!("Serving {} on http://{}", self.output_dir.display(), addr);
        }
        axum::serve(listener, self.router())
            .await
            .map_err(|e| BuildError::Server(e.to_string()))
    }

    pub async fn run(&self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }
}

async fn livereload_handler(ws: WebSocketUpgrade, State(state): State<ServerState>) -> Response {
    ws.on_upgrade(|socket| livereload_socket(socket, state.hub))
}

fn encode(message: &ReloadMessage) -> Option<Message> {
    match serde_json::to_string(message) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            tracing::error!("Cannot encode reload message: {}", e);
            None
        }
    }
}

async fn livereload_socket(socket: WebSocket, hub: Arc<ReloadHub>) {
    tracing::debug!("Live reload client connected");

    let (mut sender, mut receiver) = socket.split();
    // Subscribe before confirming so nothing sent after `connected` is missed
    let mut rx = hub.subscribe();

    let send_task = tokio::spawn(async move {
        let mut next = Some(ReloadMessage::Connected);
        loop {
            let message = match next.take() {
                Some(message) => message,
                None => match rx.recv().await {
                    Ok(message) => message,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("Live reload client skipped {} messages", skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
            };
            let Some(frame) = encode(&message) else { continue };
            if sender.send(frame).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if let Message::Close(_) = message {
                break;
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    tracing::debug!("Live reload client disconnected");
}

async fn client_handler() -> Response {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        CLIENT_SCRIPT,
    )
        .into_response()
}

/// Percent-decode a request path and reject parent segments
fn request_path(raw: &str) -> Option<String> {
    let decoded = urlencoding::decode(raw).ok()?;
    if decoded.split(['/', '\\']).any(|segment| segment == "..") {
        return None;
    }
    Some(decoded.trim_start_matches('/').to_string())
}

async fn static_handler(State(state): State<ServerState>, uri: Uri) -> Response {
    tracing::debug!("Serving: {}", uri.path());

    let Some(path) = request_path(uri.path()) else {
        return (StatusCode::BAD_REQUEST, "Invalid path").into_response();
    };

    let mut file = state.output_dir.join(path);
    if tokio::fs::metadata(&file)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
    {
        file = file.join("index.html");
    }

    let content = match tokio::fs::read(&file).await {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!("Not found {}: {}", file.display(), e);
            return (StatusCode::NOT_FOUND, "Not found").into_response();
        }
    };

    let content_type = guess_content_type(&file);
    if content_type.starts_with("text/html") {
        let html = inject_client(&String::from_utf8_lossy(&content));
        return ([(header::CONTENT_TYPE, content_type)], html).into_response();
    }

    ([(header::CONTENT_TYPE, content_type)], content).into_response()
}

/// Add the client script tag before the last `</body>`, or at the end
pub fn inject_client(html: &str) -> String {
    let tag = format!("<script src=\"{}\"></script>", CLIENT_PATH);
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(pos) => format!("{}{}{}", &html[..pos], tag, &html[pos..]),
        None => format!("{}{}", html, tag),
    }
}

fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "application/javascript; charset=utf-8",
        Some("json") | Some("map") => "application/json; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        _ => "application/octet-stream",
    }
}
