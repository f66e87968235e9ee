//! Stand-in Tika servers for integration tests.

#![allow(dead_code)]

use axum::Router;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use parking_lot::Mutex;
use std::sync::Arc;

/// A request as seen by a stand-in server.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub accept: Option<String>,
    pub body: Vec<u8>,
}

pub type RequestLog = Arc<Mutex<Vec<Recorded>>>;

/// Serve `router` on an ephemeral loopback port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A server that answers every request with `status` and `body`, recording
/// each request it receives.
pub async fn serve_fixed(status: StatusCode, body: &'static str) -> (String, RequestLog) {
    let log: RequestLog = Arc::default();
    let sink = Arc::clone(&log);
    let router = Router::new().fallback(move |method: Method, uri: Uri, headers: HeaderMap, payload: Bytes| {
        let sink = Arc::clone(&sink);
        async move {
            sink.lock().push(Recorded {
                method: method.to_string(),
                path: uri.path().to_string(),
                accept: headers
                    .get("accept")
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string),
                body: payload.to_vec(),
            });
            (status, body)
        }
    });
    (serve(router).await, log)
}

/// Last request received by a [`serve_fixed`] server.
pub fn last_request(log: &RequestLog) -> Recorded {
    log.lock().last().cloned().expect("no request recorded")
}
