//! Query-string helpers.
//!
//! Encoding percent-encodes every reserved byte and writes spaces as `%20`, so values
//! survive servers that do not treat `+` as a space. Decoding accepts both forms.

use url::form_urlencoded;

/// Percent-encode one query component.
pub fn encode_component(raw: &str) -> String {
    // byte_serialize escapes a literal '+' as %2B, so every '+' left is a space.
    form_urlencoded::byte_serialize(raw.as_bytes()).collect::<String>().replace('+', "%20")
}

/// Encode `key=value` pairs in the given order.
pub fn encode_query<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", encode_component(k.as_ref()), encode_component(v.as_ref())))
        .collect::<Vec<_>>()
        .join("&")
}

fn decode_pair(pair: &str) -> (String, String) {
    form_urlencoded::parse(pair.as_bytes())
        .next()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .unwrap_or_default()
}

/// Split a query string into keys with every value they were given, in first-seen order.
///
/// A key without `=` or with an empty value records `None`.
pub fn split_query(query: &str) -> Vec<(String, Vec<Option<String>>)> {
    let mut out: Vec<(String, Vec<Option<String>>)> = Vec::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = decode_pair(pair);
        let value = (pair.contains('=') && !value.is_empty()).then_some(value);
        match out.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => out.push((key, vec![value])),
        }
    }
    out
}

/// Split a query string into single-valued pairs, in first-seen order.
///
/// A repeated key keeps its first position and its last value.
pub fn split_query_single(query: &str) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = decode_pair(pair);
        match out.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => out.push((key, value)),
        }
    }
    out
}
