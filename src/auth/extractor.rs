//! Credential extraction strategies.

use crate::auth::AuthError;
use crate::context::Ctx;

/// Where to look for a credential in a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extractor {
    /// `<name>: <scheme> <token>`; an empty scheme takes the whole value.
    Header { name: String, scheme: String },
    Query(String),
    Param(String),
    Cookie(String),
}

impl Extractor {
    pub fn header(name: impl Into<String>, scheme: impl Into<String>) -> Self {
        Extractor::Header {
            name: name.into(),
            scheme: scheme.into(),
        }
    }

    /// Pull a non-empty credential out of `ctx`.
    pub fn extract(&self, ctx: &Ctx) -> Result<String, AuthError> {
        let found = match self {
            Extractor::Header { name, scheme } => ctx
                .header(name)
                .and_then(|value| strip_scheme(value, scheme)),
            Extractor::Query(name) => Some(ctx.query(name)),
            Extractor::Param(name) => Some(ctx.param(name)),
            Extractor::Cookie(name) => ctx.cookie(name),
        };
        match found {
            Some(token) if !token.is_empty() => Ok(token.to_string()),
            _ => Err(AuthError::MissingCredential),
        }
    }
}

/// `Bearer abc` → `abc`. The scheme compares case-insensitively and must be
/// followed by whitespace.
fn strip_scheme<'a>(value: &'a str, scheme: &str) -> Option<&'a str> {
    if scheme.is_empty() {
        return Some(value.trim());
    }
    let head = value.get(..scheme.len())?;
    let rest = &value[scheme.len()..];
    if !head.eq_ignore_ascii_case(scheme) || !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim())
}

/// Try each extractor in order; the first non-empty credential wins.
pub fn extract_credential(extractors: &[Extractor], ctx: &Ctx) -> Result<String, AuthError> {
    extractors
        .iter()
        .find_map(|extractor| extractor.extract(ctx).ok())
        .ok_or(AuthError::MissingCredential)
}

/// Parse `"header:Authorization,query:token,param:token,cookie:jwt"`.
///
/// `scheme` applies to every header source.
pub fn parse_token_lookup(lookup: &str, scheme: &str) -> Result<Vec<Extractor>, AuthError> {
    let extractors = lookup
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let invalid = || AuthError::InvalidLookup(item.to_string());
            let (source, name) = item.split_once(':').ok_or_else(invalid)?;
            let name = name.trim();
            if name.is_empty() {
                return Err(invalid());
            }
            match source.trim() {
                "header" => Ok(Extractor::header(name, scheme)),
                "query" => Ok(Extractor::Query(name.to_string())),
                "param" => Ok(Extractor::Param(name.to_string())),
                "cookie" => Ok(Extractor::Cookie(name.to_string())),
                _ => Err(invalid()),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    if extractors.is_empty() {
        return Err(AuthError::InvalidLookup(lookup.to_string()));
    }
    Ok(extractors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use bytes::Bytes;
    use std::collections::HashMap;

    fn ctx(builder: axum::http::request::Builder, params: &[(&str, &str)]) -> Ctx {
        let params: HashMap<String, String> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Ctx::new(builder.body(Bytes::new()).unwrap(), params)
    }

    #[test]
    fn test_header_with_scheme() {
        let bearer = Extractor::header("Authorization", "Bearer");

        let ok = ctx(Request::builder().header("Authorization", "Bearer abc"), &[]);
        assert_eq!(bearer.extract(&ok).unwrap(), "abc");

        let lower = ctx(Request::builder().header("Authorization", "bearer  abc "), &[]);
        assert_eq!(bearer.extract(&lower).unwrap(), "abc");

        let basic = ctx(Request::builder().header("Authorization", "Basic abc"), &[]);
        assert_eq!(bearer.extract(&basic), Err(AuthError::MissingCredential));

        let glued = ctx(Request::builder().header("Authorization", "Bearerabc"), &[]);
        assert_eq!(bearer.extract(&glued), Err(AuthError::MissingCredential));

        let bare = ctx(Request::builder().header("Authorization", "Bearer "), &[]);
        assert_eq!(bearer.extract(&bare), Err(AuthError::MissingCredential));

        let short = ctx(Request::builder().header("Authorization", "Be"), &[]);
        assert_eq!(bearer.extract(&short), Err(AuthError::MissingCredential));
    }

    #[test]
    fn test_header_without_scheme() {
        let raw = Extractor::header("X-Token", "");
        let c = ctx(Request::builder().header("X-Token", "tok"), &[]);
        assert_eq!(raw.extract(&c).unwrap(), "tok");
    }

    #[test]
    fn test_query_param_cookie_sources() {
        let c = ctx(
            Request::builder()
                .uri("/p/x?token=q1")
                .header("Cookie", "jwt=c1"),
            &[("token", "p1")],
        );
        assert_eq!(Extractor::Query("token".into()).extract(&c).unwrap(), "q1");
        assert_eq!(Extractor::Param("token".into()).extract(&c).unwrap(), "p1");
        assert_eq!(Extractor::Cookie("jwt".into()).extract(&c).unwrap(), "c1");
        assert!(Extractor::Query("other".into()).extract(&c).is_err());
    }

    #[test]
    fn test_chain_falls_through_to_query() {
        let chain = parse_token_lookup(
            "header:Authorization,query:token,param:token,cookie:jwt",
            "Bearer",
        )
        .unwrap();
        assert_eq!(chain.len(), 4);

        let c = ctx(Request::builder().uri("/x?token=from-query"), &[]);
        assert_eq!(extract_credential(&chain, &c).unwrap(), "from-query");
    }

    #[test]
    fn test_chain_prefers_earlier_source() {
        let chain = vec![
            Extractor::header("Authorization", "Bearer"),
            Extractor::Query("token".into()),
        ];
        let c = ctx(
            Request::builder()
                .uri("/x?token=from-query")
                .header("Authorization", "Bearer from-header"),
            &[],
        );
        assert_eq!(extract_credential(&chain, &c).unwrap(), "from-header");
    }

    #[test]
    fn test_chain_exhausted() {
        let chain = parse_token_lookup("header:Authorization,cookie:jwt", "Bearer").unwrap();
        let c = ctx(Request::builder(), &[]);
        assert_eq!(extract_credential(&chain, &c), Err(AuthError::MissingCredential));
    }

    #[test]
    fn test_parse_token_lookup_errors() {
        for bad in ["", "header", "header:", "carrier:pigeon", " , "] {
            assert!(
                matches!(parse_token_lookup(bad, "Bearer"), Err(AuthError::InvalidLookup(_))),
                "{:?}",
                bad
            );
        }
    }
}
