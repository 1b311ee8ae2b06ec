use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Admits every request as `anonymous`.
///
/// Must be chosen explicitly with `method = "none"`.
#[derive(Debug, Default)]
pub struct NoneAuthenticator;

#[async_trait]
impl Authenticator for NoneAuthenticator {
    async fn authenticate(&self, _request: &AuthRequest) -> Result<Identity, AuthError> {
        Ok(Identity::anonymous())
    }

    fn method_name(&self) -> &'static str {
        "none"
    }
}
