//! Local HTTP servers standing in for vendor APIs.

use axum::Router;

use crate::http::HttpOptions;

/// Serve `app` on an ephemeral localhost port and return its base URL.
pub(crate) async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Options with no backoff delay.
pub(crate) fn fast(retries: u32) -> HttpOptions {
    HttpOptions {
        timeout_secs: 5,
        retries,
        backoff_ms: 0,
    }
}
