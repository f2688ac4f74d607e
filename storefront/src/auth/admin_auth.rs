//! HTTP Basic Auth for the `/admin` surface

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use shared::error::AppError;

use crate::state::AppState;

const REALM_CHALLENGE: &str = "Basic realm=\"Admin\"";

/// Operator credentials, both required at startup
#[derive(Clone)]
pub struct AdminCredentials {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

impl AdminCredentials {
    /// Constant-time check of both fields
    pub fn matches(&self, user: &str, password: &str) -> bool {
        // Evaluate both so timing does not reveal which one failed
        let user_ok = constant_time_eq(self.user.as_bytes(), user.as_bytes());
        let password_ok = constant_time_eq(self.password.as_bytes(), password.as_bytes());
        user_ok & password_ok
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Decode `Authorization: Basic base64(user:password)`
pub fn parse_basic(header: &str) -> Option<(String, String)> {
    let encoded = header
        .strip_prefix("Basic ")
        .or_else(|| header.strip_prefix("basic "))?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

/// Middleware that rejects requests without valid admin Basic credentials
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let Some((user, password)) = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_basic)
    else {
        return Err(unauthorized(AppError::not_authenticated()));
    };

    if !state.admin.matches(&user, &password) {
        tracing::warn!(user = %user, "Admin authentication failed");
        return Err(unauthorized(AppError::invalid_credentials()));
    }

    Ok(next.run(request).await)
}

fn unauthorized(err: AppError) -> Response {
    let mut response = err.into_response();
    response.headers_mut().insert(
        http::header::WWW_AUTHENTICATE,
        http::HeaderValue::from_static(REALM_CHALLENGE),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> AdminCredentials {
        AdminCredentials {
            user: "admin".into(),
            password: "s3cret".into(),
        }
    }

    #[test]
    fn test_parse_basic() {
        let header = format!("Basic {}", STANDARD.encode("admin:s3cret:with:colons"));
        assert_eq!(
            parse_basic(&header),
            Some(("admin".into(), "s3cret:with:colons".into()))
        );
        assert_eq!(parse_basic("Bearer abc"), None);
        assert_eq!(parse_basic("Basic !!!"), None);
        assert_eq!(parse_basic(&format!("Basic {}", STANDARD.encode("nocolon"))), None);
    }

    #[test]
    fn test_matches() {
        let c = creds();
        assert!(c.matches("admin", "s3cret"));
        assert!(!c.matches("admin", "s3cre"));
        assert!(!c.matches("admin", "s3cret!"));
        assert!(!c.matches("root", "s3cret"));
    }

    #[test]
    fn test_debug_hides_password() {
        assert!(!format!("{:?}", creds()).contains("s3cret"));
    }
}
