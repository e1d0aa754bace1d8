use validator::Validate;

use crate::auth::password::verify_password;
use crate::entities::token::{AuthResponse, Claims, LoginRequest};
use crate::errors::AuthError;
use crate::repositories::token::TokenServiceRepository;

pub struct AuthHandler<T>
where
    T: TokenServiceRepository + ?Sized,
{
    pub token_service: Box<T>,
    password_hash: Option<String>,
}

impl<T> AuthHandler<T>
where
    T: TokenServiceRepository + ?Sized,
{
    /// `password_hash` is the argon2 PHC string of the admin password.
    /// `None` disables login.
    pub fn new(token_service: Box<T>, password_hash: Option<String>) -> Self {
        AuthHandler {
            token_service,
            password_hash: password_hash.filter(|hash| !hash.trim().is_empty()),
        }
    }

    /// Exchanges the admin password for a bearer token.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        request.validate().map_err(|_| AuthError::MissingCredentials)?;

        let hash = self.password_hash.as_deref().ok_or(AuthError::AdminDisabled)?;

        let is_password_valid = verify_password(&request.password, hash)
            .map_err(|e| {
                tracing::error!(error = %e, "Stored admin password hash is unusable");
                AuthError::WrongCredentials
            })?;
        if !is_password_valid {
            tracing::warn!("Admin login rejected");
            return Err(AuthError::WrongCredentials);
        }

        let access_token = self.token_service.create_admin_jwt()
            .map_err(|e| {
                tracing::warn!("Failed to create JWT: {}", e);
                AuthError::TokenCreation
            })?;

        tracing::info!("Admin logged in");
        Ok(AuthResponse::new(access_token, self.token_service.expires_in()))
    }

    /// Decodes a bearer token and requires admin privileges.
    pub fn authorize_admin(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.token_service.decode_jwt(token)?.claims;
        if !claims.admin {
            return Err(AuthError::Forbidden);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::repositories::token::MockTokenServiceRepository;
    use jsonwebtoken::{Header, TokenData};

    fn login_request(password: &str) -> LoginRequest {
        LoginRequest { password: password.to_string() }
    }

    fn claims(admin: bool) -> TokenData<Claims> {
        TokenData {
            header: Header::default(),
            claims: Claims { sub: "admin".into(), admin, exp: 0, iat: 0 },
        }
    }

    #[tokio::test]
    async fn login_issues_token_for_correct_password() {
        let mut tokens = MockTokenServiceRepository::new();
        tokens.expect_create_admin_jwt().times(1).returning(|| Ok("signed".into()));
        tokens.expect_expires_in().return_const(3600_i64);

        let handler = AuthHandler::new(Box::new(tokens), Some(hash_password("s3cret").unwrap()));
        let response = handler.login(login_request("s3cret")).await.unwrap();

        assert_eq!(response.access_token, "signed");
        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 3600);
    }

    #[tokio::test]
    async fn wrong_password_never_issues_a_token() {
        let mut tokens = MockTokenServiceRepository::new();
        tokens.expect_create_admin_jwt().never();

        let handler = AuthHandler::new(Box::new(tokens), Some(hash_password("s3cret").unwrap()));
        let result = handler.login(login_request("guess")).await;

        assert!(matches!(result, Err(AuthError::WrongCredentials)));
    }

    #[tokio::test]
    async fn login_is_disabled_without_a_hash() {
        let handler = AuthHandler::new(Box::new(MockTokenServiceRepository::new()), Some("  ".into()));
        let result = handler.login(login_request("anything")).await;

        assert!(matches!(result, Err(AuthError::AdminDisabled)));
    }

    #[test]
    fn non_admin_tokens_are_forbidden() {
        let mut tokens = MockTokenServiceRepository::new();
        tokens.expect_decode_jwt().returning(|_| Ok(claims(false)));

        let handler = AuthHandler::new(Box::new(tokens), None);
        assert!(matches!(handler.authorize_admin("t"), Err(AuthError::Forbidden)));
    }
}
