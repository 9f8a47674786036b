//! HTTP header abstractions for [`Response`](crate::http::response::Response)
//! and the view-rendering pipeline.
//!
//! Two types live here. [`Header`] is a single parsed header line: a name and
//! the list of comma-separated values that followed it. Templates emit these
//! through [`TemplateContext::header`](crate::view::context::TemplateContext::header)
//! and the renderer copies them onto the outgoing response. [`HttpHeaders`] is
//! the response-side store: an insertion-ordered multimap from header name to
//! value list.
//!
//! Headers are stored as raw strings, without validation or restrictions on
//! which names are allowed. Name lookup is exact-case. No HTTP semantics are
//! enforced here; higher-level types apply their own rules.

use indexmap::IndexMap;

/// One parsed header line: a name plus its comma-separated values.
///
/// Values never carry leading or trailing whitespace; empty pieces are kept
/// as empty strings, so `"X:"` parses to one empty value while a bare `"X"`
/// parses to none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    name: String,
    values: Vec<String>,
}

impl Header {
    /// Parses a raw header line such as `"Accept: text/html, text/plain"`.
    ///
    /// Without a colon the whole string is taken as the name and the value
    /// list is empty. The name is the substring before the first colon, kept
    /// verbatim; the remainder is split on `,` with each piece trimmed.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            None => Self {
                name: raw.to_string(),
                values: Vec::new(),
            },
            Some((name, content)) => Self {
                name: name.to_string(),
                values: split_content(content),
            },
        }
    }

    /// Builds a header from a bare name and a content string, comma-split
    /// and trimmed like the remainder of a raw line.
    pub fn from_content(name: &str, content: &str) -> Self {
        Self {
            name: name.to_string(),
            values: split_content(content),
        }
    }

    /// Builds a header from a bare name and several content strings, each
    /// comma-split and trimmed, flattened in order. Duplicates are kept.
    pub fn from_list<I, S>(name: &str, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut values = Vec::new();
        for item in items {
            values.extend(split_content(item.as_ref()));
        }
        Self {
            name: name.to_string(),
            values,
        }
    }

    /// Appends further comma-split values to an already-built header.
    pub fn append_content(&mut self, content: &str) {
        self.values.extend(split_content(content));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

fn split_content(content: &str) -> Vec<String> {
    content.split(',').map(|v| v.trim().to_string()).collect()
}

/// Insertion-ordered response header store, one value list per name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpHeaders {
    headers: IndexMap<String, Vec<String>>,
}

impl HttpHeaders {
    pub fn new() -> Self {
        Self {
            headers: IndexMap::new(),
        }
    }

    /// Replaces the values under `name` with a single value.
    pub fn set(&mut self, name: &str, value: &str) {
        self.headers
            .insert(name.to_string(), vec![value.to_string()]);
    }

    /// Replaces the values under `name` with the given list.
    pub fn set_all(&mut self, name: &str, values: Vec<String>) {
        self.headers.insert(name.to_string(), values);
    }

    /// Appends one value under `name`, keeping existing ones.
    pub fn add(&mut self, name: &str, value: &str) {
        self.headers
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.headers.get(name).map(|v| v.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Serializes all headers as `Name: v1, v2\r\n` wire lines.
    pub fn stringify(&self) -> String {
        let mut result = String::new();
        for (name, values) in &self.headers {
            result.push_str(name);
            result.push_str(": ");
            result.push_str(&values.join(", "));
            result.push_str("\r\n");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_and_trims_values() {
        let header = Header::parse("N: a, b , c");
        assert_eq!(header.name(), "N");
        assert_eq!(header.values(), ["a", "b", "c"]);
    }

    #[test]
    fn test_parse_without_colon_has_no_values() {
        let header = Header::parse("X-Marker");
        assert_eq!(header.name(), "X-Marker");
        assert!(header.values().is_empty());
    }

    #[test]
    fn test_parse_keeps_name_untrimmed_and_empty_pieces() {
        let header = Header::parse(" Spaced : one,,two");
        assert_eq!(header.name(), " Spaced ");
        assert_eq!(header.values(), ["one", "", "two"]);

        let trailing = Header::parse("X:");
        assert_eq!(trailing.values(), [""]);
    }

    #[test]
    fn test_from_content_comma_splits() {
        let header = Header::from_content("Accept", "text/html, text/plain");
        assert_eq!(header.values(), ["text/html", "text/plain"]);
    }

    #[test]
    fn test_from_list_flattens_and_keeps_duplicates() {
        let header = Header::from_list("Vary", ["Accept, Accept-Encoding", "Accept"]);
        assert_eq!(header.values(), ["Accept", "Accept-Encoding", "Accept"]);
    }

    #[test]
    fn test_append_content_extends_parsed_values() {
        let mut header = Header::parse("X-Test: first");
        header.append_content("second, third");
        assert_eq!(header.values(), ["first", "second", "third"]);
    }

    #[test]
    fn test_http_headers_set_replaces_and_add_appends() {
        let mut headers = HttpHeaders::new();
        headers.set("X-Test", "one");
        headers.add("X-Test", "two");
        assert_eq!(headers.get("X-Test").unwrap(), ["one", "two"]);

        headers.set("X-Test", "three");
        assert_eq!(headers.get("X-Test").unwrap(), ["three"]);
    }

    #[test]
    fn test_http_headers_preserve_insertion_order() {
        let mut headers = HttpHeaders::new();
        headers.set("B-First", "1");
        headers.set("A-Second", "2");
        let names: Vec<&str> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["B-First", "A-Second"]);
    }

    #[test]
    fn test_stringify_joins_values() {
        let mut headers = HttpHeaders::new();
        headers.set_all("X-Test", vec!["a".to_string(), "b".to_string()]);
        headers.set("Content-Type", "text/html");
        assert_eq!(
            headers.stringify(),
            "X-Test: a, b\r\nContent-Type: text/html\r\n"
        );
    }
}
