//! Request logging: tags every request with a generated id and logs the
//! method, path, status, and latency around the inner handler.

use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn request_logger_middleware(mut req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    // Make the id visible to downstream handlers.
    req.headers_mut()
        .insert(REQUEST_ID_HEADER, request_id.parse().unwrap());

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        "Incoming request"
    );

    let response = next.run(req).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        latency_ms = latency.as_millis(),
        "Outgoing response"
    );

    let (mut parts, body) = response.into_parts();
    parts
        .headers
        .insert(REQUEST_ID_HEADER, request_id.parse().unwrap());

    Response::from_parts(parts, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use axum::{body::Body, routing::post, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_request_logger_adds_request_id() {
        let app = Router::new()
            .route("/test", post(|| async { "ok" }))
            .layer(axum::middleware::from_fn(request_logger_middleware));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }
}
