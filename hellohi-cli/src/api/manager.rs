//! Process-wide holder for the active session

use arc_swap::ArcSwapOption;
use log::{debug, info};
use std::sync::Arc;

use super::client::Session;
use super::error::{ApiError, ApiResult};
use super::models::SessionConfig;

/// Holds at most one open [`Session`]
///
/// Opening a new session replaces the previous one; handles already given
/// out keep working until they are dropped.
#[derive(Debug, Default)]
pub struct ClientManager {
    current: ArcSwapOption<Session>,
}

impl ClientManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session from `config` and make it the active one
    pub fn open(&self, config: SessionConfig) -> ApiResult<Arc<Session>> {
        let session = Session::open(config)?;
        Ok(self.install(session))
    }

    /// Make an already opened session the active one
    pub fn install(&self, session: Session) -> Arc<Session> {
        let session = Arc::new(session);
        if self.current.swap(Some(session.clone())).is_some() {
            info!("Replaced active session with {}", session.base_url());
        } else {
            debug!("Activated session for {}", session.base_url());
        }
        session
    }

    /// The active session
    pub fn session(&self) -> ApiResult<Arc<Session>> {
        self.current.load_full().ok_or(ApiError::NotInitialized)
    }

    pub fn is_open(&self) -> bool {
        self.current.load().is_some()
    }

    /// Drop the active session so a new one can be opened with other
    /// credentials. Returns whether a session was open.
    pub async fn close(&self) -> bool {
        match self.current.swap(None) {
            Some(session) => {
                match Arc::try_unwrap(session) {
                    Ok(session) => session.close().await,
                    Err(_) => debug!("Session closed while handles are still in use"),
                }
                true
            }
            None => false,
        }
    }
}
