//! Signed-in user identity

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

/// A signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Opaque stable user id
    pub uid: String,
    /// Name shown in the header
    #[serde(default)]
    pub display_name: Option<String>,
    /// Email address
    #[serde(default)]
    pub email: Option<String>,
    /// Avatar URL
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl UserProfile {
    /// Creates a profile with only a uid
    #[must_use]
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            email: None,
            photo_url: None,
        }
    }

    /// Sets the display name
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Sets the email
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the avatar URL
    #[must_use]
    pub fn with_photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }

    /// Display name, falling back to email, then uid
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.uid)
    }
}

/// Source of the signed-in user
pub trait IdentityProvider: Send + Sync {
    /// The user signed in right now
    fn current_user(&self) -> Option<UserProfile>;

    /// Receives every sign-in and sign-out
    fn subscribe(&self) -> watch::Receiver<Option<UserProfile>>;
}

/// In-process identity provider
#[derive(Debug)]
pub struct LocalIdentity {
    user: watch::Sender<Option<UserProfile>>,
}

impl Default for LocalIdentity {
    fn default() -> Self {
        Self::signed_out()
    }
}

impl LocalIdentity {
    /// Starts with nobody signed in
    #[must_use]
    pub fn signed_out() -> Self {
        let (user, _) = watch::channel(None);
        Self { user }
    }

    /// Starts with `profile` signed in
    #[must_use]
    pub fn signed_in(profile: UserProfile) -> Self {
        let (user, _) = watch::channel(Some(profile));
        Self { user }
    }

    /// Signs `profile` in, replacing any current user
    pub fn sign_in(&self, profile: UserProfile) {
        info!(uid = %profile.uid, "signed in");
        self.user.send_replace(Some(profile));
    }

    /// Signs the current user out
    pub fn sign_out(&self) {
        if let Some(previous) = self.user.send_replace(None) {
            info!(uid = %previous.uid, "signed out");
        }
    }
}

impl IdentityProvider for LocalIdentity {
    fn current_user(&self) -> Option<UserProfile> {
        self.user.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<UserProfile>> {
        self.user.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_prefers_display_name() {
        let user = UserProfile::new("u1")
            .with_email("a@example.com")
            .with_display_name("Ada");
        assert_eq!(user.label(), "Ada");
    }

    #[test]
    fn test_label_falls_back_to_email_then_uid() {
        let user = UserProfile::new("u1").with_email("a@example.com");
        assert_eq!(user.label(), "a@example.com");
        assert_eq!(UserProfile::new("u1").label(), "u1");
    }

    #[test]
    fn test_profile_deserialize_minimal() {
        let user: UserProfile = serde_json::from_str(r#"{"uid":"x"}"#).unwrap();
        assert_eq!(user, UserProfile::new("x"));
    }

    #[test]
    fn test_local_identity_sign_in_out() {
        let identity = LocalIdentity::signed_out();
        assert!(identity.current_user().is_none());

        identity.sign_in(UserProfile::new("u1").with_photo_url("https://example.com/a.png"));
        assert_eq!(identity.current_user().unwrap().uid, "u1");

        identity.sign_out();
        assert!(identity.current_user().is_none());
    }

    #[tokio::test]
    async fn test_local_identity_subscribe_sees_changes() {
        let identity = LocalIdentity::signed_in(UserProfile::new("u1"));
        let mut rx = identity.subscribe();
        assert_eq!(rx.borrow().as_ref().map(|u| u.uid.clone()), Some("u1".into()));

        identity.sign_out();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }
}
