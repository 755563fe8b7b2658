//! Resource modeling on top of the HTTP transport.
//!
//! This module provides:
//!
//! - **[`ResourceClass`]**: an immutable descriptor of one kind of remote
//!   resource (endpoint, cache namespace, relations, save whitelist)
//! - **[`Resource`]**: a shared handle to one instance with committed and
//!   pending attributes ([`AttributeStore`])
//! - **[`RelatedManager`]**: the relation object behind a related field
//! - **[`ResourceCache`]**: the identity cache keyed by `(class name, id)`
//! - **[`RestClient`]**: the coordinator that issues requests, deduplicates
//!   concurrent fetches and writes the cache
//! - **[`ResourceResponse<T>`]**: data plus the raw response and pagination
//! - **[`ResourceError`]**: semantic errors for resource operations
//!
//! # Example
//!
//! ```rust,ignore
//! use rest_resource::rest::{RequestOptions, ResourceClass, RestClient, SaveOptions};
//! use serde_json::json;
//!
//! let users = ResourceClass::builder("User", "/users").build()?;
//! let todos = ResourceClass::builder("Todo", "/todos")
//!     .related("user", "User")
//!     .fields(["title", "completed"])
//!     .build()?;
//! client.register(&users);
//!
//! // Fetch with relations resolved
//! let todo = todos.detail(&client, "1", RequestOptions::new().resolve_related()).await?;
//! println!("{:?}", todo.get_value("user.name")?);
//!
//! // Page through a collection
//! let page = todos.list(&client, RequestOptions::new().page_size(20)).await?;
//! println!("{} of {:?}", page.len(), page.count());
//!
//! // Create
//! let draft = todos.new_resource(json!({"title": "Ship it"}));
//! draft.save(&client, SaveOptions::new()).await?;
//! assert!(draft.id().is_some());
//! ```

mod attributes;
mod cache;
pub(crate) mod class;
mod client;
mod errors;
mod options;
mod path;
pub(crate) mod related;
pub(crate) mod resource;
mod response;

pub use attributes::AttributeStore;
pub use cache::{CacheKey, CacheMaxAge, CachedResource, ResourceCache};
pub use class::{ResourceClass, ResourceClassBuilder, DEFAULT_PK_FIELD};
pub use client::{ErrorHook, RestClient};
pub use errors::ResourceError;
pub use options::{RequestOptions, SaveOptions};
pub use path::AttributePath;
pub use related::{DefaultRelatedManager, RelatedIds, RelatedManager, RelatedManagerPolicy, ResolveState};
pub use resource::{Attribute, Resource};
pub use response::{Pagination, ResourceResponse};
