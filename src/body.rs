//! Size-bounded JSON body reading.

use axum::body::Body;
use axum::http::{header, HeaderMap};
use futures_util::StreamExt;
use serde_json::Value;

use crate::error::AppError;

/// Failure modes of [`read_json_body`], each carrying its HTTP meaning
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BodyError {
    #[error("request body too large")]
    TooLarge,
    #[error("invalid JSON payload")]
    Malformed,
}

impl From<BodyError> for AppError {
    fn from(err: BodyError) -> Self {
        match err {
            BodyError::TooLarge => AppError::PayloadTooLarge,
            BodyError::Malformed => AppError::InvalidJson,
        }
    }
}

/// Parse a `content-length` header, ignoring anything that is not a plain
/// non-negative integer.
pub fn declared_content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
}

/// Read and parse a JSON body of at most `max_bytes` bytes.
///
/// A declared length over the limit fails before the stream is touched.
/// The stream is then counted chunk by chunk and dropped (cancelling the
/// transfer) as soon as the running total passes `max_bytes`, so a missing
/// or understated length buys nothing.
pub async fn read_json_body(
    headers: &HeaderMap,
    body: Body,
    max_bytes: usize,
) -> Result<Value, BodyError> {
    if let Some(declared) = declared_content_length(headers) {
        if declared > max_bytes as u64 {
            return Err(BodyError::TooLarge);
        }
    }

    let mut stream = body.into_data_stream();
    let mut buf: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            tracing::debug!("Body stream error: {}", e);
            BodyError::Malformed
        })?;
        if buf.len() + chunk.len() > max_bytes {
            drop(stream);
            return Err(BodyError::TooLarge);
        }
        buf.extend_from_slice(&chunk);
    }

    if buf.is_empty() {
        return Err(BodyError::Malformed);
    }

    let text = String::from_utf8_lossy(&buf);
    serde_json::from_str(&text).map_err(|_| BodyError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    fn chunked(chunks: Vec<&'static str>) -> Body {
        let stream = futures_util::stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok::<_, std::io::Error>(Bytes::from_static(c.as_bytes()))),
        );
        Body::from_stream(stream)
    }

    #[tokio::test]
    async fn test_parses_valid_object() {
        let value = read_json_body(&json_headers(), Body::from(r#"{"ok":true}"#), 1024)
            .await
            .unwrap();
        assert_eq!(value, serde_json::json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_rejects_invalid_json() {
        let err = read_json_body(&json_headers(), Body::from(r#"{"broken": "#), 1024)
            .await
            .unwrap_err();
        assert_eq!(err, BodyError::Malformed);
    }

    #[tokio::test]
    async fn test_rejects_declared_length_without_reading() {
        let polled = Arc::new(AtomicUsize::new(0));
        let counter = polled.clone();
        let stream = futures_util::stream::iter(vec![Bytes::from_static(b"{}")]).map(move |b| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, std::io::Error>(b)
        });

        let mut headers = json_headers();
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("4096"));

        let err = read_json_body(&headers, Body::from_stream(stream), 128)
            .await
            .unwrap_err();
        assert_eq!(err, BodyError::TooLarge);
        assert_eq!(polled.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rejects_oversized_chunked_body() {
        let body = chunked(vec![
            r#"{"message":""#,
            "xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx",
            r#""}"#,
        ]);
        let err = read_json_body(&json_headers(), body, 64).await.unwrap_err();
        assert_eq!(err, BodyError::TooLarge);
    }

    #[tokio::test]
    async fn test_limit_is_inclusive() {
        // {"m":"<56 x>"} is exactly 64 bytes
        let payload: &'static str =
            Box::leak(format!(r#"{{"m":"{}"}}"#, "x".repeat(56)).into_boxed_str());
        assert_eq!(payload.len(), 64);

        let (head, tail) = payload.split_at(40);
        let value = read_json_body(&json_headers(), chunked(vec![head, tail]), 64)
            .await
            .unwrap();
        assert_eq!(value["m"].as_str().unwrap().len(), 56);

        let err = read_json_body(&json_headers(), chunked(vec![head, tail, " "]), 64)
            .await
            .unwrap_err();
        assert_eq!(err, BodyError::TooLarge);
    }

    #[tokio::test]
    async fn test_stops_pulling_after_limit() {
        let polled = Arc::new(AtomicUsize::new(0));
        let counter = polled.clone();
        let stream = futures_util::stream::iter((0..10).map(|_| Bytes::from(vec![b' '; 32])))
            .map(move |b| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, std::io::Error>(b)
            });

        let err = read_json_body(&json_headers(), Body::from_stream(stream), 64)
            .await
            .unwrap_err();
        assert_eq!(err, BodyError::TooLarge);
        assert_eq!(polled.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_rejects_empty_body() {
        let err = read_json_body(&HeaderMap::new(), Body::empty(), 1024)
            .await
            .unwrap_err();
        assert_eq!(err, BodyError::Malformed);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_malformed_not_panic() {
        let body = Body::from(vec![b'"', 0xff, 0xfe, b'"']);
        // Lossy decoding turns the bytes into replacement chars inside a string
        let value = read_json_body(&HeaderMap::new(), body, 1024).await.unwrap();
        assert!(value.is_string());

        let body = Body::from(vec![0xff, 0xfe]);
        let err = read_json_body(&HeaderMap::new(), body, 1024).await.unwrap_err();
        assert_eq!(err, BodyError::Malformed);
    }

    #[test]
    fn test_declared_content_length_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(declared_content_length(&headers), None);
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("123"));
        assert_eq!(declared_content_length(&headers), Some(123));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("-1"));
        assert_eq!(declared_content_length(&headers), None);
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("abc"));
        assert_eq!(declared_content_length(&headers), None);
    }
}
