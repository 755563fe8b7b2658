//! Response wrapper for resource operations.
//!
//! [`ResourceResponse<T>`] pairs the materialized data with the raw
//! [`HttpResponse`] it came from. It implements `Deref<Target = T>`, so a
//! list response can be iterated directly:
//!
//! ```rust,ignore
//! let page = todos.list(&client, RequestOptions::new().page_size(20)).await?;
//!
//! for todo in page.iter() {
//!     println!("{:?}", todo.get(Some("title"))?);
//! }
//!
//! if let Some(next) = page.next(&client).await? {
//!     println!("next page has {} rows", next.len());
//! }
//! ```

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::clients::HttpResponse;
use crate::rest::{RequestOptions, Resource, ResourceClass, ResourceError, RestClient};

/// Pagination state derived from a list response.
///
/// A list body may be a bare array (with an optional `X-Total-Count` header
/// and `Link` header), an envelope `{count, next, previous, results}`, or a
/// single object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pagination {
    pub(crate) count: Option<u64>,
    pub(crate) current_page: u64,
    pub(crate) per_page: u64,
    pub(crate) has_next: bool,
    pub(crate) has_previous: bool,
}

impl Pagination {
    /// Total number of rows across all pages, when the server reports it.
    #[must_use]
    pub const fn count(&self) -> Option<u64> {
        self.count
    }

    /// Number of pages, when both the count and page size are known.
    ///
    /// ```rust
    /// use rest_resource::rest::Pagination;
    ///
    /// let pagination = Pagination::new(Some(45), 1, 20, true, false);
    /// assert_eq!(pagination.pages(), Some(3));
    /// ```
    #[must_use]
    pub const fn pages(&self) -> Option<u64> {
        match self.count {
            Some(count) if self.per_page > 0 => Some(count.div_ceil(self.per_page)),
            Some(0) => Some(0),
            _ => None,
        }
    }

    /// The 1-based page this response holds.
    #[must_use]
    pub const fn current_page(&self) -> u64 {
        self.current_page
    }

    /// Rows per page: the requested page size, or the row count when none
    /// was requested.
    #[must_use]
    pub const fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Returns `true` if another page follows.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.has_next
    }

    /// Returns `true` if a page precedes this one.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.has_previous
    }

    /// Creates pagination state directly.
    #[must_use]
    pub const fn new(
        count: Option<u64>,
        current_page: u64,
        per_page: u64,
        has_next: bool,
        has_previous: bool,
    ) -> Self {
        Self {
            count,
            current_page,
            per_page,
            has_next,
            has_previous,
        }
    }
}

/// The list call that produced a response, kept so neighbouring pages can
/// be fetched.
#[derive(Clone, Debug)]
pub(crate) struct ListRequest {
    pub(crate) class: Arc<ResourceClass>,
    pub(crate) options: RequestOptions,
}

/// A response from a resource operation.
#[derive(Clone, Debug)]
pub struct ResourceResponse<T> {
    data: T,
    response: HttpResponse,
    pagination: Option<Pagination>,
    list_request: Option<ListRequest>,
}

impl<T> ResourceResponse<T> {
    /// Creates a new `ResourceResponse` without pagination.
    #[must_use]
    pub const fn new(data: T, response: HttpResponse) -> Self {
        Self {
            data,
            response,
            pagination: None,
            list_request: None,
        }
    }

    pub(crate) fn with_pagination(mut self, pagination: Pagination, request: ListRequest) -> Self {
        self.pagination = Some(pagination);
        self.list_request = Some(request);
        self
    }

    /// Consumes the response and returns the inner data.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Returns a reference to the inner data.
    #[must_use]
    pub const fn data(&self) -> &T {
        &self.data
    }

    /// Returns the raw HTTP response.
    #[must_use]
    pub const fn response(&self) -> &HttpResponse {
        &self.response
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.response.code
    }

    /// Returns the `X-Request-Id` header value, if present.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.response.request_id()
    }

    /// Returns pagination state for list responses.
    #[must_use]
    pub const fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    /// Shorthand for the pagination row count.
    #[must_use]
    pub fn count(&self) -> Option<u64> {
        self.pagination.as_ref().and_then(Pagination::count)
    }

    /// Shorthand for the pagination page count.
    #[must_use]
    pub fn pages(&self) -> Option<u64> {
        self.pagination.as_ref().and_then(Pagination::pages)
    }

    /// Returns `true` if another page follows.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.pagination.as_ref().is_some_and(Pagination::has_next)
    }

    /// Returns `true` if a page precedes this one.
    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.pagination
            .as_ref()
            .is_some_and(Pagination::has_previous)
    }
}

impl ResourceResponse<Vec<Resource>> {
    /// Fetches the next page, or returns `None` on the last page.
    ///
    /// # Errors
    ///
    /// Propagates any error from the list call.
    pub async fn next(&self, client: &RestClient) -> Result<Option<Self>, ResourceError> {
        match (&self.pagination, &self.list_request) {
            (Some(pagination), Some(request)) if pagination.has_next => {
                let Some(page) = pagination.current_page.checked_add(1) else {
                    return Ok(None);
                };
                let options = request.options.clone().page(page);
                client.list(&request.class, options).await.map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Fetches the previous page, or returns `None` on the first page.
    ///
    /// # Errors
    ///
    /// Propagates any error from the list call.
    pub async fn previous(&self, client: &RestClient) -> Result<Option<Self>, ResourceError> {
        match (&self.pagination, &self.list_request) {
            (Some(pagination), Some(request))
                if pagination.has_previous && pagination.current_page > 1 =>
            {
                let options = request.options.clone().page(pagination.current_page - 1);
                client.list(&request.class, options).await.map(Some)
            }
            _ => Ok(None),
        }
    }
}

impl<T> Deref for ResourceResponse<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<T> DerefMut for ResourceResponse<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}
