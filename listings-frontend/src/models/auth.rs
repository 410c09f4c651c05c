use crate::error::UpstreamError;
use crate::utils::jwt::decode_jwt_claims;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Login form submission.
#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: Secret<String>,
}

/// Body of `POST /authentication`.
#[derive(Serialize)]
pub struct AuthenticationRequest<'a> {
    pub strategy: &'static str,
    pub email: &'a str,
    pub password: &'a str,
}

impl<'a> From<&'a Credentials> for AuthenticationRequest<'a> {
    fn from(credentials: &'a Credentials) -> Self {
        Self {
            strategy: "local",
            email: &credentials.email,
            password: credentials.password.expose_secret(),
        }
    }
}

#[derive(Deserialize)]
pub struct AuthenticationResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

/// A bearer token issued by the upstream API. Never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn parse(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

/// Outcome of a successful login: the token plus the user id it was issued for.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub access_token: AccessToken,
    pub user_id: String,
}

impl TryFrom<AuthenticationResponse> for AuthResult {
    type Error = UpstreamError;

    fn try_from(response: AuthenticationResponse) -> Result<Self, Self::Error> {
        let access_token = AccessToken::parse(response.access_token)
            .ok_or_else(|| UpstreamError::Token("empty accessToken".to_string()))?;

        let claims = decode_jwt_claims(access_token.as_str())
            .map_err(|e| UpstreamError::Token(e.to_string()))?;

        let user_id = claims
            .subject()
            .ok_or_else(|| UpstreamError::Token("no user id in token claims".to_string()))?;

        Ok(Self {
            access_token,
            user_id,
        })
    }
}
