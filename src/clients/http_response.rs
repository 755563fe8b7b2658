//! HTTP response types.
//!
//! This module provides the [`HttpResponse`] type returned by every
//! [`HttpTransport`](crate::clients::HttpTransport), plus parsing of the
//! headers list endpoints use to describe pagination.

use std::collections::HashMap;

/// Links parsed from an RFC 8288 `Link` header.
///
/// # Example
///
/// ```rust
/// use rest_resource::clients::PageLinks;
///
/// let links = PageLinks::parse(
///     r#"<https://api.example.com/todos?page=3>; rel="next", <https://api.example.com/todos?page=1>; rel="prev""#,
/// );
/// assert_eq!(links.next.as_deref(), Some("https://api.example.com/todos?page=3"));
/// assert_eq!(links.previous.as_deref(), Some("https://api.example.com/todos?page=1"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageLinks {
    /// URL of the previous page, if advertised.
    pub previous: Option<String>,
    /// URL of the next page, if advertised.
    pub next: Option<String>,
}

impl PageLinks {
    /// Parses a `Link` header value of the form `<url>; rel="next", <url>; rel="prev"`.
    #[must_use]
    pub fn parse(header_value: &str) -> Self {
        let mut result = Self::default();

        for link in header_value.split(',') {
            let mut parts = link.split(';');
            let url = parts
                .next()
                .map(|s| s.trim().trim_start_matches('<').trim_end_matches('>'));
            let rel = parts.find_map(|part| {
                part.trim()
                    .strip_prefix("rel=")
                    .map(|rel| rel.trim_matches('"'))
            });

            if let (Some(url), Some(rel)) = (url, rel) {
                match rel {
                    "next" => result.next = Some(url.to_string()),
                    "prev" | "previous" => result.previous = Some(url.to_string()),
                    _ => {}
                }
            }
        }

        result
    }
}

/// An HTTP response: status, headers and parsed JSON body.
///
/// Header names are stored lower-cased; a header may carry several values.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// Response headers (headers may have multiple values).
    pub headers: HashMap<String, Vec<String>>,
    /// The parsed response body (`Null` when the body was empty).
    pub body: serde_json::Value,
}

impl HttpResponse {
    /// Creates a new `HttpResponse`, lower-casing header names.
    ///
    /// ```rust
    /// use rest_resource::clients::HttpResponse;
    /// use serde_json::json;
    /// use std::collections::HashMap;
    ///
    /// let headers = HashMap::from([("X-Total-Count".to_string(), vec!["12".to_string()])]);
    /// let response = HttpResponse::new(200, headers, json!([]));
    /// assert_eq!(response.total_count(), Some(12));
    /// ```
    #[must_use]
    pub fn new(code: u16, headers: HashMap<String, Vec<String>>, body: serde_json::Value) -> Self {
        let mut normalized: HashMap<String, Vec<String>> = HashMap::with_capacity(headers.len());
        for (name, values) in headers {
            normalized
                .entry(name.to_ascii_lowercase())
                .or_default()
                .extend(values);
        }
        Self {
            code,
            headers: normalized,
            body,
        }
    }

    /// Creates a `200 OK` response with no headers.
    #[must_use]
    pub fn ok(body: serde_json::Value) -> Self {
        Self::new(200, HashMap::new(), body)
    }

    /// Returns `true` if the response status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns the first value of a header, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns the `X-Request-Id` header value, if present.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header("x-request-id")
    }

    /// Returns the `X-Total-Count` header parsed as a number.
    #[must_use]
    pub fn total_count(&self) -> Option<u64> {
        self.header("x-total-count")
            .and_then(|value| value.trim().parse().ok())
    }

    /// Returns the pagination links from the `Link` header.
    #[must_use]
    pub fn links(&self) -> PageLinks {
        self.header("link").map(PageLinks::parse).unwrap_or_default()
    }
}
