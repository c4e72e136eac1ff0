//! Per-request context handed to middleware and handlers.

use std::collections::HashMap;

use axum::http::{header, request, Extensions, HeaderMap, Method, Request, Response, StatusCode};
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};

use crate::context::response::ResponseSink;
use crate::error::{BodyParseError, Error, Result};
use crate::routing::query::parse_query;

pub const CONTENT_TYPE_APP_JSON: &str = "application/json";
pub const CONTENT_TYPE_APP_XML: &str = "application/xml";
pub const CONTENT_TYPE_TEXT_XML: &str = "text/xml";
pub const CONTENT_TYPE_TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Request/response state for one in-flight request.
///
/// Path parameters are bound once at dispatch and query parameters are parsed
/// at construction; both are read-only afterwards. The response side is a
/// [`ResponseSink`] that accepts exactly one terminal write.
#[derive(Debug)]
pub struct Ctx {
    request: request::Parts,
    body: Bytes,
    params: HashMap<String, String>,
    query: HashMap<String, String>,
    response: ResponseSink,
    locals: Extensions,
}

impl Ctx {
    /// Build a context for `request` with already-bound path parameters.
    pub fn new(request: Request<Bytes>, params: HashMap<String, String>) -> Self {
        let (parts, body) = request.into_parts();
        let query = parts.uri.query().map(parse_query).unwrap_or_default();
        Self {
            request: parts,
            body,
            params,
            query,
            response: ResponseSink::default(),
            locals: Extensions::new(),
        }
    }

    // ---- request view ----

    pub fn method(&self) -> &Method {
        &self.request.method
    }

    pub fn path(&self) -> &str {
        self.request.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.request.headers
    }

    /// First value of a request header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Value of the named cookie from the `Cookie` request header.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.request
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.trim_matches('"'))
    }

    /// Path parameter by name; empty when the route declared no such name.
    pub fn param(&self, name: &str) -> &str {
        self.params.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Query parameter by name; empty when absent.
    pub fn query(&self, name: &str) -> &str {
        self.query.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn queries(&self) -> &HashMap<String, String> {
        &self.query
    }

    /// Whether the request's `Accept` header admits `mime`.
    pub fn client_accepts(&self, mime: &str) -> bool {
        match self.header(header::ACCEPT.as_str()) {
            None => true,
            Some(accept) => accept.split(',').any(|item| {
                let item = item.split(';').next().unwrap_or("").trim();
                item == "*/*"
                    || item.eq_ignore_ascii_case(mime)
                    || item
                        .strip_suffix("/*")
                        .zip(mime.split_once('/'))
                        .is_some_and(|(kind, (mime_kind, _))| kind.eq_ignore_ascii_case(mime_kind))
            }),
        }
    }

    /// Raw request body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Request body as text, replacing invalid UTF-8.
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the request body according to its `Content-Type`.
    ///
    /// JSON types (and a missing content type) decode as JSON, XML types as
    /// XML; anything else is rejected.
    pub fn body_parser<T: DeserializeOwned>(&self) -> std::result::Result<T, BodyParseError> {
        let content_type = self.header(header::CONTENT_TYPE.as_str()).unwrap_or("");
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        if mime.is_empty() || mime == CONTENT_TYPE_APP_JSON || mime.ends_with("+json") {
            Ok(serde_json::from_slice(&self.body)?)
        } else if mime == CONTENT_TYPE_APP_XML || mime == CONTENT_TYPE_TEXT_XML || mime.ends_with("+xml") {
            Ok(quick_xml::de::from_reader(self.body.as_ref())?)
        } else {
            Err(BodyParseError::UnsupportedContentType(content_type.to_string()))
        }
    }

    /// Alias of [`Ctx::body_parser`].
    pub fn bind<T: DeserializeOwned>(&self) -> std::result::Result<T, BodyParseError> {
        self.body_parser()
    }

    // ---- per-request values ----

    /// Store a typed value for later stages of the chain.
    pub fn insert_local<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.locals.insert(value)
    }

    pub fn local<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.locals.get::<T>()
    }

    // ---- response ----

    /// Set the response status. Ignored, with a warning, once the response
    /// has been sent.
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        if self.response.set_status(status).is_err() {
            tracing::warn!(path = %self.path(), %status, "status change after response was sent");
        }
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.response.status()
    }

    /// Set a response header, replacing earlier values.
    pub fn set(&mut self, key: &str, value: &str) -> Result<&mut Self> {
        self.response.set_header(key, value, false)?;
        Ok(self)
    }

    /// Add a response header value after any existing ones.
    pub fn append(&mut self, key: &str, value: &str) -> Result<&mut Self> {
        self.response.set_header(key, value, true)?;
        Ok(self)
    }

    /// Advertise the content type this route accepts via the response
    /// `Accept` header.
    pub fn accepts(&mut self, mime: &str) -> Result<&mut Self> {
        self.set(header::ACCEPT.as_str(), mime)
    }

    pub fn response_headers(&self) -> &HeaderMap {
        self.response.headers()
    }

    pub fn is_sent(&self) -> bool {
        self.response.is_sent()
    }

    /// Buffer bytes without ending the response.
    pub fn write(&mut self, chunk: &[u8]) -> Result<()> {
        self.response.write(chunk)
    }

    /// Send raw bytes and end the response.
    pub fn send(&mut self, body: impl AsRef<[u8]>) -> Result<()> {
        self.response.finish(body.as_ref())
    }

    /// Send text and end the response.
    pub fn send_string(&mut self, body: impl AsRef<str>) -> Result<()> {
        self.response.finish(body.as_ref().as_bytes())
    }

    /// Serialize `value` as JSON and end the response.
    pub fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let encoded = serde_json::to_vec(value)?;
        self.send_typed(CONTENT_TYPE_APP_JSON, &encoded)
    }

    /// Serialize `value` as XML and end the response.
    pub fn xml<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let encoded = quick_xml::se::to_string(value)?;
        self.send_typed(CONTENT_TYPE_TEXT_XML, encoded.as_bytes())
    }

    fn send_typed(&mut self, content_type: &'static str, body: &[u8]) -> Result<()> {
        if self.response.is_sent() {
            return Err(Error::ResponseAlreadySent);
        }
        self.response.set_default_content_type(content_type);
        self.response.finish(body)
    }

    /// Write an error response for `err` unless something was already sent.
    pub(crate) fn recover(&mut self, err: &Error) {
        if self.response.is_sent() {
            tracing::error!(path = %self.path(), error = %err, "handler failed after response was sent");
            return;
        }
        let status = err.status_code();
        self.response.fail(status, &err.to_string());
    }

    /// Consume the context into the final response.
    pub fn into_response(self) -> Response<Bytes> {
        self.response.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn ctx(builder: axum::http::request::Builder, body: &'static str) -> Ctx {
        Ctx::new(builder.body(Bytes::from_static(body.as_bytes())).unwrap(), HashMap::new())
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Person {
        name: String,
        age: u32,
    }

    #[test]
    fn test_param_absent_is_empty() {
        let mut params = HashMap::new();
        params.insert("id".to_string(), "42".to_string());
        let c = Ctx::new(Request::new(Bytes::new()), params);
        assert_eq!(c.param("id"), "42");
        assert_eq!(c.param("missing"), "");
    }

    #[test]
    fn test_query_parsed_at_construction() {
        let c = ctx(Request::builder().uri("/test?some=1&bad&x=a%20b"), "");
        assert_eq!(c.query("some"), "1");
        assert_eq!(c.query("x"), "a b");
        assert_eq!(c.query("bad"), "");
        assert_eq!(c.queries().len(), 2);
    }

    #[test]
    fn test_body_parser_json_default() {
        let c = ctx(Request::builder(), r#"{"name":"jeff","age":35}"#);
        let p: Person = c.body_parser().unwrap();
        assert_eq!(p, Person { name: "jeff".into(), age: 35 });
    }

    #[test]
    fn test_body_parser_xml() {
        let c = ctx(
            Request::builder().header("Content-Type", "text/xml"),
            "<Person><name>Jeff</name><age>35</age></Person>",
        );
        let p: Person = c.bind().unwrap();
        assert_eq!(p.name, "Jeff");
    }

    #[test]
    fn test_body_parser_errors() {
        let bad = ctx(Request::builder().header("Content-Type", "application/json"), "{nope");
        assert!(matches!(bad.body_parser::<Person>(), Err(BodyParseError::Json(_))));

        let csv = ctx(Request::builder().header("Content-Type", "text/csv"), "a,b");
        assert!(matches!(
            csv.body_parser::<Person>(),
            Err(BodyParseError::UnsupportedContentType(_))
        ));
    }

    #[test]
    fn test_json_sets_content_type_once() {
        let mut c = ctx(Request::builder(), "");
        c.set("Content-Type", "application/vnd.api+json").unwrap();
        c.json(&Person { name: "jeff".into(), age: 35 }).unwrap();
        assert_eq!(c.response_headers()["content-type"], "application/vnd.api+json");
        let res = c.into_response();
        assert_eq!(res.body().as_ref(), br#"{"name":"jeff","age":35}"#);
    }

    #[test]
    fn test_single_terminal_write() {
        let mut c = ctx(Request::builder(), "");
        c.status(StatusCode::CREATED).send_string("first").unwrap();
        assert!(matches!(c.send_string("second"), Err(Error::ResponseAlreadySent)));
        assert!(matches!(c.set("X-Late", "1"), Err(Error::ResponseAlreadySent)));
        c.status(StatusCode::IM_A_TEAPOT);

        let res = c.into_response();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.body().as_ref(), b"first");
        assert!(res.headers().get("x-late").is_none());
    }

    #[test]
    fn test_cookie_lookup() {
        let c = ctx(Request::builder().header("Cookie", "a=1; jwt=tok.en; b=2"), "");
        assert_eq!(c.cookie("jwt"), Some("tok.en"));
        assert_eq!(c.cookie("nope"), None);
    }

    #[test]
    fn test_client_accepts() {
        let c = ctx(Request::builder().header("Accept", "text/html, application/*;q=0.8"), "");
        assert!(c.client_accepts("application/json"));
        assert!(c.client_accepts("text/html"));
        assert!(!c.client_accepts("image/png"));
        assert!(ctx(Request::builder(), "").client_accepts("image/png"));
    }

    #[test]
    fn test_accepts_sets_response_header_and_chains() {
        let mut c = ctx(Request::builder(), "");
        c.accepts("application/xml")
            .unwrap()
            .status(StatusCode::CREATED)
            .send_string("ok")
            .unwrap();
        assert_eq!(c.response_headers()["accept"], "application/xml");
        assert_eq!(c.status_code(), StatusCode::CREATED);

        assert!(matches!(c.accepts("text/plain"), Err(Error::ResponseAlreadySent)));
    }

    #[test]
    fn test_locals_round_trip() {
        let mut c = ctx(Request::builder(), "");
        c.insert_local(7u32);
        assert_eq!(c.local::<u32>(), Some(&7));
        assert!(c.local::<String>().is_none());
    }

    #[test]
    fn test_recover_after_send_keeps_response() {
        let mut c = ctx(Request::builder(), "");
        c.send_string("ok").unwrap();
        c.recover(&Error::handler("late failure"));
        assert_eq!(c.into_response().body().as_ref(), b"ok");
    }
}
