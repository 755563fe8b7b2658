//! Per-call options for list, detail and save.

use std::collections::BTreeMap;

/// Options accepted by `list` and `detail`.
///
/// # Example
///
/// ```rust
/// use rest_resource::rest::RequestOptions;
///
/// let options = RequestOptions::new()
///     .use_cache(false)
///     .resolve_related()
///     .query_param("status", "open")
///     .page(2)
///     .page_size(50);
///
/// assert!(!options.uses_cache());
/// assert!(options.resolves_related());
/// assert_eq!(options.current_page(), Some(2));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestOptions {
    use_cache: bool,
    resolve_related: bool,
    resolve_related_deep: bool,
    query: BTreeMap<String, String>,
    page: Option<u64>,
    page_size: Option<u64>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            resolve_related: false,
            resolve_related_deep: false,
            query: BTreeMap::new(),
            page: None,
            page_size: None,
        }
    }
}

impl RequestOptions {
    /// Creates options with the cache enabled and no relation resolution.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or bypasses the cache read for this call.
    #[must_use]
    pub const fn use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    /// Resolves one level of declared relations after the fetch.
    #[must_use]
    pub const fn resolve_related(mut self) -> Self {
        self.resolve_related = true;
        self
    }

    /// Resolves declared relations recursively after the fetch.
    #[must_use]
    pub const fn resolve_related_deep(mut self) -> Self {
        self.resolve_related_deep = true;
        self
    }

    /// Adds a query parameter forwarded to the transport.
    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Requests a page of a list endpoint.
    #[must_use]
    pub const fn page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    /// Requests a page size for a list endpoint.
    #[must_use]
    pub const fn page_size(mut self, page_size: u64) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Returns `true` unless the cache read is bypassed.
    #[must_use]
    pub const fn uses_cache(&self) -> bool {
        self.use_cache
    }

    /// Returns `true` if any relation resolution was requested.
    #[must_use]
    pub const fn resolves_related(&self) -> bool {
        self.resolve_related || self.resolve_related_deep
    }

    /// Returns `true` if deep relation resolution was requested.
    #[must_use]
    pub const fn resolves_related_deep(&self) -> bool {
        self.resolve_related_deep
    }

    /// Returns the extra query parameters.
    #[must_use]
    pub const fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    /// Returns the requested page, if any.
    #[must_use]
    pub const fn current_page(&self) -> Option<u64> {
        self.page
    }

    /// Returns the requested page size, if any.
    #[must_use]
    pub const fn current_page_size(&self) -> Option<u64> {
        self.page_size
    }
}

/// Options accepted by `save`.
///
/// With `fields` set, only those fields are sent (if they have pending
/// changes). Otherwise the class whitelist applies, and without one every
/// pending field is sent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveOptions {
    fields: Option<Vec<String>>,
}

impl SaveOptions {
    /// Creates options that defer to the class whitelist.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts this save to the given fields.
    ///
    /// ```rust
    /// use rest_resource::rest::SaveOptions;
    ///
    /// let options = SaveOptions::new().fields(["address"]);
    /// assert_eq!(options.field_list(), Some(&["address".to_string()][..]));
    /// ```
    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Returns the per-call whitelist, if set.
    #[must_use]
    pub fn field_list(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }
}
