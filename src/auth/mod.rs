//! Authentication types.
//!
//! - [`BearerToken`]: A bearer credential whose JWT claims can be inspected
//!   for expiry
//!
//! The default [`HttpClient`](crate::clients::HttpClient) sends the token in
//! an `Authorization: Bearer` header while [`BearerToken::is_valid`] holds.

mod bearer;

pub use bearer::BearerToken;
