//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - IDs are serialised as hex strings.
//! - Datetimes are serialised as RFC 3339 strings.

pub mod ai;
pub mod auth;
pub mod form;
pub mod id;
pub mod pagination;
pub mod response;
pub mod results;
