//! Identity / token source.

use async_trait::async_trait;
use secrecy::SecretString;

/// The authentication provider as seen by onboarding.
///
/// `get_token` may transiently return `None` right after sign-in; callers
/// that need a token poll with a bound.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Whether the provider has finished restoring its session.
    fn is_loaded(&self) -> bool;

    fn is_signed_in(&self) -> bool;

    async fn get_token(&self) -> Option<SecretString>;
}

/// Identity backed by a fixed token, e.g. one handed to the driver binary.
pub struct StaticIdentity {
    token: Option<SecretString>,
}

impl StaticIdentity {
    pub fn new(token: Option<SecretString>) -> Self {
        Self { token }
    }

    pub fn signed_out() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    fn is_loaded(&self) -> bool {
        true
    }

    fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    async fn get_token(&self) -> Option<SecretString> {
        self.token.clone()
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[tokio::test]
    async fn static_identity() {
        let id = StaticIdentity::new(Some(SecretString::from("tok")));
        assert!(id.is_loaded());
        assert!(id.is_signed_in());
        assert_eq!(id.get_token().await.unwrap().expose_secret(), "tok");

        let anon = StaticIdentity::signed_out();
        assert!(!anon.is_signed_in());
        assert!(anon.get_token().await.is_none());
    }
}
