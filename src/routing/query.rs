//! Query string parsing.

use std::collections::HashMap;

use url::form_urlencoded;

/// Parse a raw query string into a name → value map.
///
/// Pairs are `&`-separated and split on the first `=`; names and values are
/// percent-decoded. A pair without `=` is dropped. When a name repeats, the
/// last value wins.
pub fn parse_query(raw: &str) -> HashMap<String, String> {
    raw.split('&')
        .filter(|pair| pair.contains('='))
        .filter_map(|pair| form_urlencoded::parse(pair.as_bytes()).next())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_pairs() {
        let q = parse_query("some=1&other=two");
        assert_eq!(q.len(), 2);
        assert_eq!(q["some"], "1");
        assert_eq!(q["other"], "two");
    }

    #[test]
    fn test_malformed_pair_dropped() {
        let q = parse_query("flag&token=abc&&");
        assert_eq!(q.len(), 1);
        assert_eq!(q["token"], "abc");
    }

    #[test]
    fn test_percent_decoding() {
        let q = parse_query("name=john%20doe&expr=a%3Db");
        assert_eq!(q["name"], "john doe");
        assert_eq!(q["expr"], "a=b");
    }

    #[test]
    fn test_value_may_contain_equals() {
        let q = parse_query("sig=abc==");
        assert_eq!(q["sig"], "abc==");
    }

    #[test]
    fn test_empty_value_kept() {
        let q = parse_query("empty=");
        assert_eq!(q["empty"], "");
    }

    #[test]
    fn test_last_value_wins() {
        let q = parse_query("k=1&k=2");
        assert_eq!(q["k"], "2");
    }
}
