//! Write-once response sink owned by a request context.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Response, StatusCode};
use bytes::{Bytes, BytesMut};

use crate::context::CONTENT_TYPE_TEXT_PLAIN;
use crate::error::{Error, Result};

/// Buffered response for one request.
///
/// Status and headers stay mutable until the first terminal write; after that
/// every write fails with [`Error::ResponseAlreadySent`].
#[derive(Debug)]
pub struct ResponseSink {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    sent: bool,
}

impl Default for ResponseSink {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
            sent: false,
        }
    }
}

impl ResponseSink {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }

    pub(crate) fn set_status(&mut self, status: StatusCode) -> Result<()> {
        self.ensure_open()?;
        self.status = status;
        Ok(())
    }

    pub(crate) fn set_header(&mut self, key: &str, value: &str, append: bool) -> Result<()> {
        self.ensure_open()?;
        let name = HeaderName::try_from(key).map_err(|_| Error::InvalidHeader(key.to_string()))?;
        let value =
            HeaderValue::try_from(value).map_err(|_| Error::InvalidHeader(key.to_string()))?;
        if append {
            self.headers.append(name, value);
        } else {
            self.headers.insert(name, value);
        }
        Ok(())
    }

    pub(crate) fn set_default_content_type(&mut self, value: &'static str) {
        if !self.headers.contains_key(header::CONTENT_TYPE) {
            self.headers
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(value));
        }
    }

    /// Append to the body buffer without ending the response.
    pub(crate) fn write(&mut self, chunk: &[u8]) -> Result<()> {
        self.ensure_open()?;
        self.body.extend_from_slice(chunk);
        Ok(())
    }

    /// Append `chunk` and seal the response.
    pub(crate) fn finish(&mut self, chunk: &[u8]) -> Result<()> {
        self.write(chunk)?;
        self.sent = true;
        Ok(())
    }

    /// Replace whatever was buffered with an error response.
    pub(crate) fn fail(&mut self, status: StatusCode, message: &str) {
        self.status = status;
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(CONTENT_TYPE_TEXT_PLAIN),
        );
        self.body.clear();
        self.body.extend_from_slice(message.as_bytes());
        self.sent = true;
    }

    pub(crate) fn into_response(self) -> Response<Bytes> {
        let mut response = Response::new(self.body.freeze());
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }

    fn ensure_open(&self) -> Result<()> {
        if self.sent {
            Err(Error::ResponseAlreadySent)
        } else {
            Ok(())
        }
    }
}
