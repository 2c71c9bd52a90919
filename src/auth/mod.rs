/*!
 * # Authentication Module
 *
 * Token issuance and verification for the storefront and the back office:
 *
 * - Access tokens are HS256 JWTs sent as `Authorization: A-Verify <token>`
 * - Password reset tokens share the format but carry `purpose = "reset"`
 *   and are refused wherever an access token is expected
 * - Staff (admins and sub-admins) carry their role in the token
 */

pub mod password;

use crate::{config::AppConfig, errors::ServiceError, AppState};
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
    response::{IntoResponse, Response},
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scheme expected in front of the token in the `Authorization` header.
pub const AUTH_SCHEME: &str = "A-Verify";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    SubAdmin,
}

impl Role {
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::SubAdmin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    Access,
    Reset,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub role: Role,
    pub purpose: TokenPurpose,
    pub iat: i64,
    pub exp: i64,
}

/// Identity a token is minted for.
#[derive(Debug, Clone)]
pub struct TokenSubject {
    pub id: i32,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub role: Role,
}

/// Authenticated caller extracted from an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i32,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub role: Role,
}

impl AuthUser {
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_ttl: ChronoDuration,
    pub reset_token_ttl: ChronoDuration,
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            jwt_secret: cfg.jwt_secret.clone(),
            access_token_ttl: ChronoDuration::days(cfg.token_ttl_days),
            reset_token_ttl: ChronoDuration::seconds(cfg.reset_token_ttl_secs),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Unsupported authorization scheme")]
    WrongScheme,

    #[error("Missing token")]
    MissingToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Reader account required")]
    ReaderOnly,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingAuth | AuthError::WrongScheme => {
                ServiceError::Unauthorized("Access Denied".into())
            }
            AuthError::MissingToken => {
                ServiceError::Unauthorized("Unauthorized - Token not provided".into())
            }
            AuthError::TokenExpired => {
                ServiceError::Forbidden("Forbidden - Token has expired".into())
            }
            AuthError::InvalidToken => ServiceError::Forbidden("Forbidden - Invalid token".into()),
            AuthError::InsufficientPermissions => {
                ServiceError::Forbidden("Forbidden - Staff access required".into())
            }
            AuthError::ReaderOnly => {
                ServiceError::Forbidden("Forbidden - Reader account required".into())
            }
            AuthError::TokenCreation(msg) => ServiceError::JwtError(msg),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ServiceError::from(self).into_response()
    }
}

/// Signs and verifies tokens.
#[derive(Debug, Clone)]
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Issues a long-lived access token.
    pub fn issue_access_token(&self, subject: &TokenSubject) -> Result<String, AuthError> {
        self.issue(subject, TokenPurpose::Access, self.config.access_token_ttl)
    }

    /// Issues a short-lived password reset token.
    pub fn issue_reset_token(&self, subject: &TokenSubject) -> Result<String, AuthError> {
        self.issue(subject, TokenPurpose::Reset, self.config.reset_token_ttl)
    }

    fn issue(
        &self,
        subject: &TokenSubject,
        purpose: TokenPurpose,
        ttl: ChronoDuration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.id.to_string(),
            name: subject.name.clone(),
            phone: subject.phone.clone(),
            email: subject.email.clone(),
            role: subject.role,
            purpose,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Decodes and verifies signature and expiry.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }

    /// Validates an access token and returns the caller.
    pub fn authenticate(&self, token: &str) -> Result<AuthUser, AuthError> {
        let claims = self.validate_token(token)?;
        if claims.purpose != TokenPurpose::Access {
            return Err(AuthError::InvalidToken);
        }
        let id = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthUser {
            id,
            name: claims.name,
            phone: claims.phone,
            email: claims.email,
            role: claims.role,
        })
    }

    /// Validates a password reset token and returns its claims.
    pub fn validate_reset_token(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.validate_token(token)?;
        if claims.purpose != TokenPurpose::Reset {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }
}

/// Pulls the token out of `Authorization: A-Verify <token>`.
///
/// Returns `Ok(None)` when the header is absent.
pub fn bearer_token(parts: &Parts) -> Result<Option<&str>, AuthError> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AuthError::WrongScheme)?;
    let mut pieces = value.split_whitespace();
    if pieces.next() != Some(AUTH_SCHEME) {
        return Err(AuthError::WrongScheme);
    }
    pieces.next().map(Some).ok_or(AuthError::MissingToken)
}

fn caller(parts: &Parts, state: &AppState) -> Result<AuthUser, AuthError> {
    let token = bearer_token(parts)?.ok_or(AuthError::MissingAuth)?;
    state.auth.authenticate(token)
}

/// Reader caller. Staff ids live in their own tables, so staff tokens are
/// refused on routes that act on a reader's cart, library or profile.
#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = caller(parts, state)?;
        if user.role != Role::User {
            return Err(AuthError::ReaderOnly);
        }
        Ok(user)
    }
}

/// Caller identity on routes that also serve anonymous visitors.
///
/// A header that is present must still be valid.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl OptionalAuthUser {
    /// The caller when it is a reader. Staff browse the catalog anonymously.
    pub fn reader(self) -> Option<AuthUser> {
        self.0.filter(|user| user.role == Role::User)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OptionalAuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_token(parts)? {
            Some(token) => state.auth.authenticate(token).map(|u| Self(Some(u))),
            None => Ok(Self(None)),
        }
    }
}

/// Admin or sub-admin caller.
#[derive(Debug, Clone)]
pub struct StaffUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for StaffUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = caller(parts, state)?;
        if !user.is_staff() {
            return Err(AuthError::InsufficientPermissions);
        }
        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::Request;

    fn service() -> AuthService {
        AuthService::new(AuthConfig {
            jwt_secret: "unit-test-secret-that-is-long-enough-to-sign".into(),
            access_token_ttl: ChronoDuration::days(365),
            reset_token_ttl: ChronoDuration::seconds(240),
        })
    }

    fn reader() -> TokenSubject {
        TokenSubject {
            id: 7,
            name: "Reader".into(),
            phone: "5550001".into(),
            email: Some("reader@example.com".into()),
            role: Role::User,
        }
    }

    fn parts_with(header_value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/cart");
        if let Some(value) = header_value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn access_token_round_trips_to_auth_user() {
        let auth = service();
        let token = auth.issue_access_token(&reader()).unwrap();
        let user = auth.authenticate(&token).unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.role, Role::User);
        assert!(!user.is_staff());
    }

    #[test]
    fn reset_token_is_not_an_access_token() {
        let auth = service();
        let token = auth.issue_reset_token(&reader()).unwrap();
        assert_matches!(auth.authenticate(&token), Err(AuthError::InvalidToken));
        assert!(auth.validate_reset_token(&token).is_ok());
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let auth = AuthService::new(AuthConfig {
            access_token_ttl: ChronoDuration::hours(-2),
            ..service().config
        });
        let token = auth.issue_access_token(&reader()).unwrap();
        assert_matches!(auth.authenticate(&token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let other = AuthService::new(AuthConfig {
            jwt_secret: "a-completely-different-secret-for-signing".into(),
            ..service().config
        });
        let token = other.issue_access_token(&reader()).unwrap();
        assert_matches!(service().authenticate(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn header_parsing_follows_the_scheme() {
        assert_matches!(bearer_token(&parts_with(None)), Ok(None));
        assert_matches!(
            bearer_token(&parts_with(Some("Bearer abc"))),
            Err(AuthError::WrongScheme)
        );
        assert_matches!(
            bearer_token(&parts_with(Some("A-Verify"))),
            Err(AuthError::MissingToken)
        );
        assert_matches!(
            bearer_token(&parts_with(Some("A-Verify abc.def"))),
            Ok(Some("abc.def"))
        );
    }

    #[test]
    fn auth_errors_map_to_statuses() {
        use axum::http::StatusCode;
        assert_eq!(
            ServiceError::from(AuthError::MissingAuth).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::from(AuthError::TokenExpired).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServiceError::from(AuthError::InvalidToken).status_code(),
            StatusCode::FORBIDDEN
        );
    }
}
