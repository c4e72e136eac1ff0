//! In-process request execution.
//!
//! Runs a request through the full pipeline (dispatch, middleware, handler)
//! without a socket, so routes can be exercised from ordinary `#[test]`s.

use axum::http::{HeaderMap, Method, Request, Response, StatusCode};
use bytes::Bytes;

use crate::error::Result;
use crate::routing::Router;

/// A request under construction for [`Router::test`].
#[derive(Debug)]
pub struct TestRequest<'r> {
    router: &'r Router,
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl<'r> TestRequest<'r> {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Dispatch the request and capture the response.
    pub fn send(self) -> Result<TestResponse> {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let request = builder.body(self.body)?;
        Ok(TestResponse::from(self.router.handle(request)))
    }
}

/// Captured status, headers and body of a dispatched request.
#[derive(Debug, Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of `name`, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_str(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap_or_default()
    }
}

impl From<Response<Bytes>> for TestResponse {
    fn from(response: Response<Bytes>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }
}

impl Router {
    /// Start an in-process request against this router.
    pub fn test(&self, method: Method, uri: impl Into<String>) -> TestRequest<'_> {
        TestRequest {
            router: self,
            method,
            uri: uri.into(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Ctx;
    use crate::Error;

    #[test]
    fn test_round_trip_with_headers_and_body() {
        let router = Router::new();
        router
            .post("/echo", |c: &mut Ctx| {
                let who = c.header("X-Who").unwrap_or("nobody").to_string();
                c.set("X-Echo", &who)?;
                let body = c.body().to_vec();
                c.send(body)
            })
            .unwrap();

        let res = router
            .test(Method::POST, "/echo")
            .header("X-Who", "jeff")
            .body("payload")
            .send()
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.header("x-echo"), Some("jeff"));
        assert_eq!(res.body_str(), "payload");
    }

    #[test]
    fn test_invalid_header_is_reported() {
        let router = Router::new();
        let err = router
            .test(Method::GET, "/")
            .header("bad header", "x")
            .send()
            .unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }
}
