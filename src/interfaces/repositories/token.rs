use jsonwebtoken::TokenData;

#[cfg(test)]
use mockall::automock;

use crate::{entities::token::Claims, errors::AuthError};

#[cfg_attr(test, automock)]
pub trait TokenServiceRepository: Send + Sync {
    /// Creates a signed admin access token
    fn create_admin_jwt(&self) -> Result<String, AuthError>;

    /// Decodes a JWT and returns the claims
    fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError>;

    /// Lifetime of issued tokens in seconds
    fn expires_in(&self) -> i64;
}
