use crate::config::SessionSettings;
use crate::models::auth::{AccessToken, AuthResult};
use crate::utils::jwt::decode_jwt_claims;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const UID_COOKIE: &str = "uid";

/// The logged-in user, read from the `accessToken` and `uid` cookies.
///
/// Extraction fails unless both cookies are present, the token is a
/// readable, unexpired JWT, and the uid derived from it matches the cookie.
#[derive(Debug, Clone)]
pub struct UserSession {
    pub access_token: AccessToken,
    pub uid: String,
}

impl UserSession {
    pub fn from_jar(jar: &CookieJar, now_unix: i64) -> Result<Self, SessionRejection> {
        let access_token = jar
            .get(ACCESS_TOKEN_COOKIE)
            .and_then(|c| AccessToken::parse(c.value()))
            .ok_or(SessionRejection::Missing)?;
        let uid = jar
            .get(UID_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|uid| !uid.is_empty())
            .ok_or(SessionRejection::Missing)?;

        let claims = decode_jwt_claims(access_token.as_str())
            .map_err(|e| SessionRejection::Invalid(e.to_string()))?;

        if claims.is_expired_at(now_unix) {
            return Err(SessionRejection::Expired);
        }

        match claims.subject() {
            Some(subject) if subject == uid => Ok(Self { access_token, uid }),
            _ => Err(SessionRejection::Invalid(
                "uid cookie does not match token".to_string(),
            )),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for UserSession
where
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        Self::from_jar(&jar, chrono::Utc::now().timestamp())
    }
}

/// Why a request is treated as not logged in.
#[derive(Debug)]
pub enum SessionRejection {
    Missing,
    Expired,
    Invalid(String),
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        match &self {
            SessionRejection::Missing => tracing::debug!("No session cookies, redirecting to login"),
            SessionRejection::Expired => tracing::info!("Access token expired, clearing session"),
            SessionRejection::Invalid(reason) => {
                tracing::warn!(reason = %reason, "Rejected session cookies")
            }
        }

        (clear(CookieJar::new()), Redirect::to("/")).into_response()
    }
}

fn session_cookie(
    name: &'static str,
    value: String,
    settings: &SessionSettings,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(settings.http_only)
        .secure(settings.secure)
        .same_site(settings.same_site.into())
        .max_age(time::Duration::seconds(settings.max_age_secs))
        .build()
}

/// Add both session cookies for a fresh login.
pub fn establish(jar: CookieJar, auth: &AuthResult, settings: &SessionSettings) -> CookieJar {
    jar.add(session_cookie(
        ACCESS_TOKEN_COOKIE,
        auth.access_token.as_str().to_string(),
        settings,
    ))
    .add(session_cookie(UID_COOKIE, auth.user_id.clone(), settings))
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, "")).path("/").build();
    cookie.make_removal();
    cookie
}

/// Expire both session cookies, whether or not the request carried them.
pub fn clear(jar: CookieJar) -> CookieJar {
    jar.add(removal_cookie(ACCESS_TOKEN_COOKIE))
        .add(removal_cookie(UID_COOKIE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SameSitePolicy;
    use axum_extra::extract::cookie::SameSite;
    use base64::{engine::general_purpose, Engine as _};

    const NOW: i64 = 1_700_000_000;

    fn token(payload: &str) -> String {
        format!("h.{}.s", general_purpose::URL_SAFE_NO_PAD.encode(payload))
    }

    fn jar(token: Option<&str>, uid: Option<&str>) -> CookieJar {
        let mut jar = CookieJar::new();
        if let Some(token) = token {
            jar = jar.add(Cookie::new(ACCESS_TOKEN_COOKIE, token.to_string()));
        }
        if let Some(uid) = uid {
            jar = jar.add(Cookie::new(UID_COOKIE, uid.to_string()));
        }
        jar
    }

    #[test]
    fn valid_session() {
        let token = token(r#"{"userId":42,"exp":1800000000}"#);
        let session = UserSession::from_jar(&jar(Some(&token), Some("42")), NOW).unwrap();

        assert_eq!(session.uid, "42");
        assert_eq!(session.access_token.as_str(), token);
    }

    #[test]
    fn both_cookies_are_required() {
        let token = token(r#"{"userId":42}"#);

        assert!(matches!(
            UserSession::from_jar(&jar(Some(&token), None), NOW),
            Err(SessionRejection::Missing)
        ));
        assert!(matches!(
            UserSession::from_jar(&jar(None, Some("42")), NOW),
            Err(SessionRejection::Missing)
        ));
        assert!(matches!(
            UserSession::from_jar(&jar(Some(""), Some("42")), NOW),
            Err(SessionRejection::Missing)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = token(r#"{"userId":42,"exp":1600000000}"#);

        assert!(matches!(
            UserSession::from_jar(&jar(Some(&token), Some("42")), NOW),
            Err(SessionRejection::Expired)
        ));
    }

    #[test]
    fn uid_must_match_token() {
        let token = token(r#"{"userId":42}"#);

        assert!(matches!(
            UserSession::from_jar(&jar(Some(&token), Some("7")), NOW),
            Err(SessionRejection::Invalid(_))
        ));
    }

    #[test]
    fn establish_applies_cookie_policy() {
        let settings = SessionSettings {
            secure: true,
            http_only: true,
            same_site: SameSitePolicy::Strict,
            max_age_secs: 3600,
        };
        let auth = AuthResult {
            access_token: AccessToken::parse("tok").unwrap(),
            user_id: "42".to_string(),
        };

        let jar = establish(CookieJar::new(), &auth, &settings);

        let token = jar.get(ACCESS_TOKEN_COOKIE).unwrap();
        assert_eq!(token.value(), "tok");
        assert_eq!(token.path(), Some("/"));
        assert_eq!(token.http_only(), Some(true));
        assert_eq!(token.secure(), Some(true));
        assert_eq!(token.same_site(), Some(SameSite::Strict));
        assert_eq!(token.max_age(), Some(time::Duration::seconds(3600)));
        assert_eq!(jar.get(UID_COOKIE).unwrap().value(), "42");
    }

    #[test]
    fn clear_expires_both_cookies() {
        let jar = clear(CookieJar::new());

        for name in [ACCESS_TOKEN_COOKIE, UID_COOKIE] {
            let cookie = jar.get(name).unwrap();
            assert_eq!(cookie.value(), "");
            assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
        }
    }
}
