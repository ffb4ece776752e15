//! HelloHi API client library
//!
//! [`api`] holds the session, entity façade and response normalizer,
//! [`config`] loads connection settings and [`import`] replays customer
//! exports through the API.

pub mod api;
pub mod config;
pub mod import;
