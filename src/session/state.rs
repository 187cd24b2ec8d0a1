use crate::models::User;

/// How the current user was established
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Signed in through the host auth exchange
    Host,
    /// Local-only identity, no token
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Loading,
    Authenticated(AuthMode),
    Anonymous,
}

/// Current identity as seen by the rest of the application
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub(crate) user: Option<User>,
    pub(crate) token: Option<String>,
    pub(crate) is_host_runtime: bool,
    pub(crate) state: SessionState,
}

impl Session {
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    #[must_use]
    pub fn is_host_runtime(&self) -> bool {
        self.is_host_runtime
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state == SessionState::Loading
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated(_))
    }

    /// Payment needs both a host and a token from a successful exchange
    #[must_use]
    pub fn can_pay(&self) -> bool {
        self.is_host_runtime && self.token.is_some()
    }

    /// Settle the state from the user and mode currently held
    pub(crate) fn settle(&mut self, mode: AuthMode) {
        self.state = if self.user.is_some() {
            SessionState::Authenticated(mode)
        } else {
            SessionState::Anonymous
        };
    }
}
