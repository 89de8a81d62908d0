use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use actix_web::web;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::user::User;
use crate::error::BoxError;
use crate::repository::{RepositoryError, UserRepository};
use crate::security::oauth2::{OAuth2Error, OAuth2Provider};
use crate::security::token::TokenService;

pub const DEFAULT_STATE_TTL: Duration = Duration::from_secs(3 * 60);
pub const DEFAULT_CLEAN_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_STATES: usize = 10_000;

const STATE_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum GoogleLoginError {
    #[error("invalid oauth state")]
    InvalidState,
    #[error("oauth state expired")]
    StateExpired,
    #[error("get user info error")]
    UserInfo(#[source] OAuth2Error),
    #[error("get user info error: provider timed out")]
    Timeout,
    #[error("user already exists")]
    AlreadyExists,
    #[error("too many pending logins, retry later")]
    TooManyStates,
    #[error("Something went wrong. Please retry later.")]
    Unexpected(#[source] BoxError),
}

#[derive(Default)]
struct LoginMetrics {
    states_deleted: AtomicU32,
    states_added: AtomicU32,
    logged_in: AtomicU32,
    login_errors: AtomicU32,
}

impl LoginMetrics {
    fn bump(counter: &AtomicU32) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoginMetricsSnapshot {
    #[serde(rename = "deleted_states_count")]
    pub states_deleted: u32,
    #[serde(rename = "added_states_count")]
    pub states_added: u32,
    #[serde(rename = "succesfully_login_users")]
    pub logged_in: u32,
    #[serde(rename = "error_login_processes")]
    pub login_errors: u32,
}

/// "Sign in with Google".
///
/// Every redirect issues a one-shot `state` that the callback must present
/// before it expires. Expired states are left in place by the callback and
/// reclaimed by the cleaner task.
pub struct GoogleLoginService {
    provider: Arc<dyn OAuth2Provider>,
    tokens: Arc<dyn TokenService>,
    users: Arc<dyn UserRepository>,

    /// state -> expiry
    states: Mutex<HashMap<String, Instant>>,
    state_ttl: Duration,
    max_states: usize,
    request_timeout: Duration,

    metrics: LoginMetrics,
}

impl GoogleLoginService {
    pub fn new(
        provider: Arc<dyn OAuth2Provider>,
        tokens: Arc<dyn TokenService>,
        users: Arc<dyn UserRepository>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            tokens,
            users,
            states: Mutex::new(HashMap::new()),
            state_ttl: DEFAULT_STATE_TTL,
            max_states: DEFAULT_MAX_STATES,
            request_timeout,
            metrics: LoginMetrics::default(),
        }
    }

    #[cfg(test)] // only needed in tests
    pub fn with_state_ttl(mut self, state_ttl: Duration) -> Self {
        self.state_ttl = state_ttl;
        self
    }

    #[cfg(test)]
    pub fn with_max_states(mut self, max_states: usize) -> Self {
        self.max_states = max_states;
        self
    }

    fn states(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a fresh state and returns the provider URL to send the
    /// browser to. Refuses once `max_states` live states are pending.
    pub fn redirect_url(&self) -> Result<String, GoogleLoginError> {
        let state = Uuid::new_v4().simple().to_string()[..STATE_LEN].to_string();
        let now = Instant::now();

        {
            let mut states = self.states();
            if states.len() >= self.max_states && self.purge_locked(&mut states, now) == 0 {
                log::warn!("op=redirect_url: {} oauth states pending", states.len());
                return Err(GoogleLoginError::TooManyStates);
            }
            states.insert(state.clone(), now + self.state_ttl);
        }
        LoginMetrics::bump(&self.metrics.states_added);
        log::debug!("op=redirect_url: new oauth state generated");

        Ok(self.provider.authorize_url(&state))
    }

    /// Completes a login: checks `state`, trades `code` for the user's
    /// profile, stores the user and returns a token for them.
    pub async fn callback(&self, state: &str, code: &str) -> Result<String, GoogleLoginError> {
        let result = self.try_callback(state, code).await;
        match &result {
            Ok(_) => LoginMetrics::bump(&self.metrics.logged_in),
            Err(e) => {
                log::debug!("op=prepare_callback: {e}");
                LoginMetrics::bump(&self.metrics.login_errors);
            }
        }
        result
    }

    async fn try_callback(&self, state: &str, code: &str) -> Result<String, GoogleLoginError> {
        self.take_state(state, Instant::now())?;

        let user_info = self.provider.user_info(code);
        let user = match tokio::time::timeout(self.request_timeout, user_info).await {
            Ok(Ok(user)) => user,
            Ok(Err(e)) => {
                log::error!("op=prepare_callback: provider error: {e}");
                return Err(GoogleLoginError::UserInfo(e));
            }
            Err(_) => return Err(GoogleLoginError::Timeout),
        };

        let users = self.users.clone();
        let user_id = user.id.clone();
        web::block(move || store_user(users.as_ref(), &user))
            .await
            .map_err(|e| GoogleLoginError::Unexpected(Box::new(e)))??;

        let token = self.tokens.generate(&user_id).map_err(|e| {
            log::error!("op=prepare_callback: token generate error: {e}");
            GoogleLoginError::Unexpected(Box::new(e))
        })?;

        log::debug!("op=prepare_callback: user {user_id} logged in");
        Ok(token)
    }

    fn take_state(&self, state: &str, now: Instant) -> Result<(), GoogleLoginError> {
        let mut states = self.states();
        let expires_at = states
            .get(state)
            .copied()
            .ok_or(GoogleLoginError::InvalidState)?;
        if expires_at <= now {
            return Err(GoogleLoginError::StateExpired);
        }

        states.remove(state);
        LoginMetrics::bump(&self.metrics.states_deleted);
        Ok(())
    }

    /// Drops every state that expired at or before `now`.
    pub fn purge_expired(&self, now: Instant) -> usize {
        self.purge_locked(&mut self.states(), now)
    }

    fn purge_locked(&self, states: &mut HashMap<String, Instant>, now: Instant) -> usize {
        let before = states.len();
        states.retain(|_, expires_at| *expires_at > now);
        let removed = before - states.len();

        if removed > 0 {
            self.metrics
                .states_deleted
                .fetch_add(removed as u32, Ordering::Relaxed);
            log::trace!("op=state_cleaner: {removed} expired oauth states removed");
        }
        removed
    }

    /// Purges expired states every `every` until `cancel` fires.
    pub fn spawn_state_cleaner(
        self: &Arc<Self>,
        every: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let service = Arc::clone(self);
        actix_web::rt::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        service.purge_expired(Instant::now());
                    }
                }
            }
            log::debug!("op=state_cleaner: stopped");
        })
    }

    pub fn metrics(&self) -> LoginMetricsSnapshot {
        LoginMetricsSnapshot {
            states_deleted: self.metrics.states_deleted.load(Ordering::Relaxed),
            states_added: self.metrics.states_added.load(Ordering::Relaxed),
            logged_in: self.metrics.logged_in.load(Ordering::Relaxed),
            login_errors: self.metrics.login_errors.load(Ordering::Relaxed),
        }
    }

    #[cfg(test)]
    fn pending_states(&self) -> usize {
        self.states().len()
    }
}

/// A user already known under the same id is a returning login.
fn store_user(users: &dyn UserRepository, user: &User) -> Result<(), GoogleLoginError> {
    match users.add_user(user) {
        Ok(()) => Ok(()),
        Err(RepositoryError::AlreadyExists) => match users.get_user_by_id(&user.id) {
            Ok(_) => Ok(()),
            // The email belongs to another account.
            Err(RepositoryError::NotFound) => Err(GoogleLoginError::AlreadyExists),
            Err(e) => Err(GoogleLoginError::Unexpected(Box::new(e))),
        },
        Err(e) => {
            log::error!("op=prepare_callback: user save error: {e}");
            Err(GoogleLoginError::Unexpected(Box::new(e)))
        }
    }
}
