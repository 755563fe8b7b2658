//! # REST resource client
//!
//! Client-side modeling of REST resources: declare resource classes, fetch
//! and list instances, read nested attributes through dotted paths, follow
//! relations between resources, track local changes and save them back.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`ClientConfig`] and [`ClientConfigBuilder`]
//! - Validated newtypes for the base URL, endpoints and bearer tokens
//! - A pluggable transport ([`clients::HttpTransport`]) with a reqwest-backed
//!   default ([`clients::HttpClient`])
//! - An identity cache: one live [`Resource`] handle per `(class, id)`
//! - Coalescing of concurrent fetches for the same route
//! - Relation resolution, shallow or deep, with cycle detection
//! - Change tracking with whitelisted partial saves
//!
//! ## Quick Start
//!
//! ```rust
//! use rest_resource::{BaseUrl, BearerToken, ClientConfig};
//!
//! let config = ClientConfig::builder()
//!     .base_url(BaseUrl::new("https://api.example.com").unwrap())
//!     .bearer_token(BearerToken::new("token").unwrap())
//!     .build()
//!     .unwrap();
//! ```
//!
//! ## Working with Resources
//!
//! ```rust,ignore
//! use rest_resource::rest::{RequestOptions, ResourceClass, SaveOptions};
//! use rest_resource::RestClient;
//! use serde_json::json;
//!
//! let client = RestClient::new(&config)?;
//!
//! let users = ResourceClass::builder("User", "/users").build()?;
//! let todos = ResourceClass::builder("Todo", "/todos")
//!     .related("user", "User")
//!     .build()?;
//! client.register(&users);
//!
//! let todo = todos.detail(&client, "1", RequestOptions::new()).await?;
//! let owner = todo.get_async(Some("user.name"), &client).await?;
//!
//! todo.set("completed", json!(true));
//! todo.save(&client, SaveOptions::new()).await?;
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: the cache and class registry live in a [`RestClient`]
//! - **Fail-fast validation**: all newtypes validate on construction
//! - **Thread-safe**: all types are `Send + Sync`
//! - **Async-first**: designed for use with the Tokio runtime

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod rest;

// Re-export public types at crate root for convenience
pub use auth::BearerToken;
pub use config::{BaseUrl, ClientConfig, ClientConfigBuilder, Endpoint};
pub use error::ConfigError;

// Re-export HTTP client types
pub use clients::{
    HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, HttpResponseError,
    HttpTransport, InvalidHttpRequestError,
};

// Re-export resource types
pub use rest::{
    RequestOptions, Resource, ResourceClass, ResourceError, ResourceResponse, RestClient,
    SaveOptions,
};
