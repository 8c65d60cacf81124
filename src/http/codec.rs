use crate::cache::{RequestKey, ResponseRecord};
use bytes::{Buf, BufMut, BytesMut};
use http::header::{CONNECTION, CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderName, HeaderValue, StatusCode, Uri};
use std::io;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

/// Maximum number of request headers accepted per request
const MAX_HEADERS: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum HttpProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("HTTP parsing error: {0}")]
    HttpParse(String),
    #[error("Request too large: {actual} bytes, maximum allowed: {max} bytes")]
    RequestTooLarge { actual: usize, max: usize },
    #[error("Unsupported request body: {0}")]
    UnsupportedBody(String),
}

impl HttpProtocolError {
    /// Status to answer the client with before closing, if any
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpProtocolError::Io(_) => None,
            HttpProtocolError::HttpParse(_) | HttpProtocolError::UnsupportedBody(_) => {
                Some(StatusCode::BAD_REQUEST)
            }
            HttpProtocolError::RequestTooLarge { .. } => {
                Some(StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE)
            }
        }
    }
}

/// A decoded inbound request; the body is consumed and dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRequest {
    pub method: String,
    /// URL path without query string or fragment
    pub path: String,
    /// Minor HTTP version (`0` or `1`)
    pub version: u8,
    pub keep_alive: bool,
}

impl InboundRequest {
    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.method.as_str(), self.path.as_str())
    }

    pub fn is_head(&self) -> bool {
        self.method == "HEAD"
    }
}

/// A response ready to be written to the wire
#[derive(Debug, Clone, Copy)]
pub struct ResponseFrame<'a> {
    pub status: StatusCode,
    pub record: &'a ResponseRecord,
    pub keep_alive: bool,
    /// `false` for `HEAD` requests; `Content-Length` is still announced
    pub include_body: bool,
}

/// HTTP/1.x framing for the mock server
///
/// Decodes request heads with `httparse` and encodes recorded responses. The
/// framing headers (`Content-Length`, `Transfer-Encoding`, `Connection`) are
/// always computed here; recorded values for them are ignored.
#[derive(Debug, Clone)]
pub struct HttpCodec {
    max_request_size: usize,
    server_name: Option<String>,
}

impl HttpCodec {
    pub fn new(max_request_size: usize, server_name: Option<String>) -> Self {
        Self {
            max_request_size,
            server_name,
        }
    }

    fn check_size(&self, actual: usize) -> Result<(), HttpProtocolError> {
        if actual > self.max_request_size {
            return Err(HttpProtocolError::RequestTooLarge {
                actual,
                max: self.max_request_size,
            });
        }
        Ok(())
    }
}

fn request_path(target: &str) -> String {
    match target.parse::<Uri>() {
        Ok(uri) => uri.path().to_string(),
        Err(_) => target
            .split(['?', '#'])
            .next()
            .unwrap_or(target)
            .to_string(),
    }
}

fn has_token(value: &[u8], token: &str) -> bool {
    String::from_utf8_lossy(value)
        .split(',')
        .any(|t| t.trim().eq_ignore_ascii_case(token))
}

fn is_framing_header(name: &HeaderName) -> bool {
    name == CONTENT_LENGTH || name == TRANSFER_ENCODING || name == CONNECTION
}

impl Decoder for HttpCodec {
    type Item = InboundRequest;
    type Error = HttpProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut req = httparse::Request::new(&mut headers);

        let head_len = match req.parse(&src[..]) {
            Ok(httparse::Status::Complete(parsed_len)) => parsed_len,
            Ok(httparse::Status::Partial) => {
                self.check_size(src.len())?;
                return Ok(None);
            }
            Err(e) => {
                return Err(HttpProtocolError::HttpParse(format!(
                    "Failed to parse request head: {e}"
                )));
            }
        };
        self.check_size(head_len)?;

        let method = req.method.unwrap_or_default().to_string();
        let path = request_path(req.path.unwrap_or_default());
        let version = req.version.unwrap_or(1);

        let mut content_length = 0usize;
        let mut close = false;
        let mut keep_alive = false;
        for header in req.headers.iter() {
            if header.name.eq_ignore_ascii_case(CONTENT_LENGTH.as_str()) {
                content_length = std::str::from_utf8(header.value)
                    .ok()
                    .and_then(|v| v.trim().parse().ok())
                    .ok_or_else(|| {
                        HttpProtocolError::HttpParse("Invalid Content-Length header".to_string())
                    })?;
            } else if header.name.eq_ignore_ascii_case(TRANSFER_ENCODING.as_str()) {
                return Err(HttpProtocolError::UnsupportedBody(
                    "Transfer-Encoding request bodies are not supported".to_string(),
                ));
            } else if header.name.eq_ignore_ascii_case(CONNECTION.as_str()) {
                close |= has_token(header.value, "close");
                keep_alive |= has_token(header.value, "keep-alive");
            }
        }

        let total = head_len.checked_add(content_length).ok_or(
            HttpProtocolError::RequestTooLarge {
                actual: usize::MAX,
                max: self.max_request_size,
            },
        )?;
        self.check_size(total)?;
        if src.len() < total {
            // Body not fully received yet
            src.reserve(total - src.len());
            return Ok(None);
        }
        src.advance(total);

        let keep_alive = match version {
            0 => keep_alive && !close,
            _ => !close,
        };

        Ok(Some(InboundRequest {
            method,
            path,
            version,
            keep_alive,
        }))
    }
}

impl Encoder<ResponseFrame<'_>> for HttpCodec {
    type Error = HttpProtocolError;

    fn encode(&mut self, frame: ResponseFrame<'_>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let status = frame.status;
        let body = frame.record.body.as_bytes();

        dst.put_slice(
            format!(
                "HTTP/1.1 {} {}\r\n",
                status.as_str(),
                status.canonical_reason().unwrap_or("")
            )
            .as_bytes(),
        );

        // Recorded names go out with their original casing
        for (raw_name, raw_value) in &frame.record.headers {
            let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(raw_name.as_bytes()),
                HeaderValue::from_str(raw_value),
            ) else {
                warn!(header = %raw_name, "Skipping invalid recorded header");
                continue;
            };
            if is_framing_header(&name) {
                continue;
            }
            put_header(dst, raw_name, value.as_bytes());
        }

        put_header(dst, "Content-Length", body.len().to_string().as_bytes());
        if let Some(server_name) = &self.server_name {
            put_header(dst, "Server", server_name.as_bytes());
        }
        if !frame.keep_alive {
            put_header(dst, "Connection", b"close");
        }
        dst.put_slice(b"\r\n");

        if frame.include_body {
            dst.put_slice(body);
        }
        Ok(())
    }
}

fn put_header(dst: &mut BytesMut, name: &str, value: &[u8]) {
    dst.reserve(name.len() + value.len() + 4);
    dst.put_slice(name.as_bytes());
    dst.put_slice(b": ");
    dst.put_slice(value);
    dst.put_slice(b"\r\n");
}
