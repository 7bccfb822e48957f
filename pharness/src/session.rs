//! Ephemeral identity and resource state shared by the scenarios of one run.
//!
//! ```rust
//! use pharness::SessionState;
//!
//! let mut session = SessionState::new();
//! assert!(!session.is_authenticated());
//!
//! session.establish("access-1", "refresh-1");
//! assert!(session.is_authenticated());
//!
//! session.revoke();
//! assert!(!session.is_authenticated());
//! assert!(session.revoked_access_token.is_some());
//!
//! session.clear();
//! assert!(session.revoked_access_token.is_none());
//! ```

use pcommon::ResourceId;
use ptransport::SecretString;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMessage {
    pub role: String,
    pub content: String,
}

impl SessionMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Plain mutable record owned by a single run.
///
/// `access_token` being present is the only definition of "authenticated".
/// After logout the old token moves to `revoked_access_token` so the
/// invalidation check can still present it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub access_token: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
    pub revoked_access_token: Option<SecretString>,
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub is_new_user: bool,
    pub current_session: Option<ResourceId>,
    pub knowledge_file: Option<ResourceId>,
    pub messages: Vec<SessionMessage>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token
            .as_ref()
            .is_some_and(|token| !token.is_empty())
    }

    pub fn establish(
        &mut self,
        access_token: impl Into<SecretString>,
        refresh_token: impl Into<SecretString>,
    ) {
        self.access_token = Some(access_token.into());
        self.refresh_token = Some(refresh_token.into());
        self.revoked_access_token = None;
    }

    /// Swaps in a refreshed access token and hands back the previous one.
    pub fn replace_access_token(
        &mut self,
        access_token: impl Into<SecretString>,
    ) -> Option<SecretString> {
        self.access_token.replace(access_token.into())
    }

    /// Moves the access token aside after logout and drops the refresh token.
    pub fn revoke(&mut self) {
        self.revoked_access_token = self.access_token.take();
        self.refresh_token = None;
    }

    pub fn set_current_session(&mut self, id: impl Into<ResourceId>) {
        self.current_session = Some(id.into());
        self.messages.clear();
    }

    pub fn take_current_session(&mut self) -> Option<ResourceId> {
        self.messages.clear();
        self.current_session.take()
    }

    pub fn push_message(&mut self, message: SessionMessage) {
        self.messages.push(message);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_access_token_is_not_authenticated() {
        let mut session = SessionState::new();
        session.establish("", "refresh");
        assert!(!session.is_authenticated());
    }

    #[test]
    fn replace_access_token_returns_previous_value() {
        let mut session = SessionState::new();
        session.establish("old", "refresh");

        let previous = session.replace_access_token("new").expect("had a token");
        assert_eq!(previous.expose(), "old");
        assert_eq!(
            session.access_token.as_ref().map(SecretString::expose),
            Some("new")
        );
    }

    #[test]
    fn clear_resets_every_field() {
        let mut session = SessionState::new();
        session.establish("a", "r");
        session.user_id = Some("u-1".to_string());
        session.is_new_user = true;
        session.set_current_session("s-1");
        session.push_message(SessionMessage::new("user", "hi"));
        session.knowledge_file = Some(ResourceId::new("f-1"));

        session.clear();
        assert_eq!(session, SessionState::default());
    }

    #[test]
    fn switching_sessions_drops_accumulated_messages() {
        let mut session = SessionState::new();
        session.set_current_session("s-1");
        session.push_message(SessionMessage::new("user", "hello"));

        assert_eq!(session.take_current_session(), Some(ResourceId::new("s-1")));
        assert!(session.messages.is_empty());
        assert!(session.current_session.is_none());
    }
}
