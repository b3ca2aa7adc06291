//! Wire types shared by the storage layer, the HTTP handlers and the tests.
//!
//! `api` holds what clients send (requests, patches, query strings, claims),
//! `models` holds what the server sends back.
pub mod api;
pub mod models;
