use super::content_type::ContentType;
use super::request::HttpRequest;
use http::StatusCode;
use std::time::Instant;

/// Mutable HTTP response under construction.
///
/// Handlers and decorator failure paths set status and content type as side
/// effects; the transport serializes the response exactly once at the end of
/// the request lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub content_type: ContentType,
    pub version: String,
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl HttpResponse {
    #[must_use]
    pub fn new(content_type: ContentType, version: &str, status: StatusCode, body: Vec<u8>) -> Self {
        Self {
            content_type,
            version: version.to_string(),
            status,
            body,
        }
    }

    /// Bodyless status response echoing the request's protocol version.
    #[must_use]
    pub fn empty_status(request: &HttpRequest, status: StatusCode) -> Self {
        Self::new(ContentType::Text, &request.version, status, Vec::new())
    }

    /// Bodyless 500 for requests that never parsed; assumes HTTP/1.1.
    #[must_use]
    pub fn internal_error() -> Self {
        Self::new(
            ContentType::Text,
            "HTTP/1.1",
            StatusCode::INTERNAL_SERVER_ERROR,
            Vec::new(),
        )
    }

    /// Serialize to wire bytes:
    /// `{version} {code} {reason}`, `content-type`, `Content-Length`,
    /// optional `Server-Timing`, blank line, body.
    #[must_use]
    pub fn serialize(&self, received_at: Option<Instant>) -> Vec<u8> {
        let reason = self.status.canonical_reason().unwrap_or("");
        let mut out = Vec::with_capacity(128 + self.body.len());
        out.extend_from_slice(
            format!("{} {} {}\r\n", self.version.trim(), self.status.as_u16(), reason).as_bytes(),
        );
        out.extend_from_slice(format!("content-type: {}\r\n", self.content_type.as_str()).as_bytes());
        out.extend_from_slice(format!("Content-Length: {}\r\n", self.body.len()).as_bytes());
        if let Some(start) = received_at {
            out.extend_from_slice(
                format!("Server-Timing: {}\r\n", start.elapsed().as_secs_f64()).as_bytes(),
            );
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body);
        out
    }
}
