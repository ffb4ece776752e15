//! HelloHi REST API client
//!
//! An OAuth2-authenticated [`Session`], a generic [`Entity`] façade for CRUD
//! and relation traversal, and the response normalizer that turns `data`
//! envelopes into entities and pages.

pub mod auth;
pub mod client;
pub mod constants;
pub mod entity;
pub mod error;
pub mod manager;
pub mod models;
pub mod normalize;
pub mod page;
pub mod query;
pub mod uploads;

pub use auth::{AuthManager, StaticToken, TokenSource};
pub use client::Session;
pub use entity::{Entity, Field};
pub use error::{ApiError, ApiResult};
pub use manager::ClientManager;
pub use models::{CredentialSet, Pagination, SessionConfig, TokenInfo};
pub use normalize::{Resource, classify, extract_pagination, from_data, unwrap_envelopes};
pub use page::Page;
pub use query::ListQuery;
pub use uploads::{DossierItemUpload, FileUpload, Part, ThreadAttachment};
