//! HTTP Basic authentication against a single argon2-hashed credential.

use std::sync::Arc;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::{Request, State},
  http::{HeaderMap, header::AUTHORIZATION},
  middleware::Next,
  response::Response,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use rand_core::OsRng;
use tracing::debug;

use crate::error::{Error, Result};

/// The one volunteer account this server accepts.
#[derive(Clone)]
pub struct AuthConfig {
  pub username:      String,
  /// argon2 PHC string, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

impl AuthConfig {
  /// Hash `password` with a fresh salt, producing a PHC string suitable for
  /// `auth_password_hash`.
  pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map(|hash| hash.to_string())
      .map_err(|e| anyhow::anyhow!("argon2: {e}"))
  }

  fn accepts(&self, username: &str, password: &str) -> bool {
    if username != self.username {
      return false;
    }
    // A malformed configured hash rejects everyone.
    let Ok(hash) = PasswordHash::new(&self.password_hash) else {
      return false;
    };
    Argon2::default()
      .verify_password(password.as_bytes(), &hash)
      .is_ok()
  }
}

/// `(username, password)` from a `Basic` authorization header.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
  let encoded = value.strip_prefix("Basic ")?;
  let decoded = String::from_utf8(B64.decode(encoded).ok()?).ok()?;
  let (user, pass) = decoded.split_once(':')?;
  Some((user.to_owned(), pass.to_owned()))
}

/// Check the request's credentials against `config`.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<()> {
  match basic_credentials(headers) {
    Some((user, pass)) if config.accepts(&user, &pass) => Ok(()),
    _ => Err(Error::Unauthorized),
  }
}

/// Middleware in front of every `/api` route.
pub async fn require_auth(
  State(auth): State<Arc<AuthConfig>>,
  req: Request,
  next: Next,
) -> Result<Response> {
  verify_auth(req.headers(), &auth).inspect_err(|_| {
    debug!(method = %req.method(), uri = %req.uri(), "rejected request without valid credentials");
  })?;
  Ok(next.run(req).await)
}
