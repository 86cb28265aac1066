//! Signed-in session and the local token storage behind it.
//!
//! The token and role are persisted under fixed keys. A [`Session`] is built
//! once, checking that a token exists and, when the token is a JWT carrying
//! an `exp` claim, that it has not expired. Every request then borrows the
//! session instead of re-reading storage.

use std::{
  collections::BTreeMap,
  fs,
  io::ErrorKind,
  path::{Path, PathBuf},
  sync::{Mutex, PoisonError},
};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use paystruct_core::form::Credentials;
use serde::Deserialize;
use tracing::info;

use crate::{ApiClient, ClientError, Result, client::AuthGrant};

pub const TOKEN_KEY: &str = "usr-token";
pub const ROLE_KEY: &str = "usr-role";

// ─── Token storage ───────────────────────────────────────────────────────────

/// A small string key/value store for credentials.
pub trait TokenStore: Send + Sync {
  fn get(&self, key: &str) -> Result<Option<String>>;
  fn set(&self, key: &str, value: &str) -> Result<()>;
  fn remove(&self, key: &str) -> Result<()>;
}

/// Keys kept in a JSON object on disk.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
  path: PathBuf,
}

impl FileTokenStore {
  pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

  pub fn path(&self) -> &Path { &self.path }

  fn read(&self) -> Result<BTreeMap<String, String>> {
    match fs::read_to_string(&self.path) {
      Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
      Ok(raw) => serde_json::from_str(&raw)
        .map_err(|e| ClientError::Storage(format!("{}: {e}", self.path.display()))),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
      Err(e) => Err(ClientError::Storage(format!("{}: {e}", self.path.display()))),
    }
  }

  fn write(&self, map: &BTreeMap<String, String>) -> Result<()> {
    let storage = |e: std::io::Error| ClientError::Storage(format!("{}: {e}", self.path.display()));
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent).map_err(storage)?;
    }
    let raw = serde_json::to_string_pretty(map).map_err(|e| ClientError::Storage(e.to_string()))?;
    fs::write(&self.path, raw).map_err(storage)
  }
}

impl TokenStore for FileTokenStore {
  fn get(&self, key: &str) -> Result<Option<String>> { Ok(self.read()?.remove(key)) }

  fn set(&self, key: &str, value: &str) -> Result<()> {
    let mut map = self.read()?;
    map.insert(key.to_string(), value.to_string());
    self.write(&map)
  }

  fn remove(&self, key: &str) -> Result<()> {
    let mut map = self.read()?;
    if map.remove(key).is_some() {
      self.write(&map)?;
    }
    Ok(())
  }
}

/// In-process store, for tests and one-shot commands.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
  map: Mutex<BTreeMap<String, String>>,
}

impl MemoryTokenStore {
  pub fn new() -> Self { Self::default() }
}

impl TokenStore for MemoryTokenStore {
  fn get(&self, key: &str) -> Result<Option<String>> {
    Ok(self.map.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<()> {
    self
      .map
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<()> {
    self.map.lock().unwrap_or_else(PoisonError::into_inner).remove(key);
    Ok(())
  }
}

// ─── Session ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  token:      String,
  role:       Option<String>,
  expires_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct Claims {
  exp: Option<i64>,
}

/// The `exp` claim of a JWT, if `token` is one and carries it. The signature
/// is not checked; the server does that.
fn jwt_expiry(token: &str) -> Option<DateTime<Utc>> {
  let mut parts = token.split('.');
  let (_, payload, _) = (parts.next()?, parts.next()?, parts.next()?);
  let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
  let claims: Claims = serde_json::from_slice(&bytes).ok()?;
  DateTime::from_timestamp(claims.exp?, 0)
}

impl Session {
  /// Validate `token` as of `now`.
  pub fn establish(token: &str, role: Option<String>, now: DateTime<Utc>) -> Result<Self> {
    let token = token.trim();
    if token.is_empty() {
      return Err(ClientError::Unauthorized);
    }
    let session = Self {
      token: token.to_string(),
      role,
      expires_at: jwt_expiry(token),
    };
    if session.is_expired(now) {
      return Err(ClientError::Expired);
    }
    Ok(session)
  }

  /// Rebuild the session persisted in `store`.
  pub fn load(store: &dyn TokenStore, now: DateTime<Utc>) -> Result<Self> {
    let token = store.get(TOKEN_KEY)?.ok_or(ClientError::Unauthorized)?;
    let role = store.get(ROLE_KEY)?;
    Self::establish(&token, role, now)
  }

  pub fn persist(&self, store: &dyn TokenStore) -> Result<()> {
    store.set(TOKEN_KEY, &self.token)?;
    match &self.role {
      Some(role) => store.set(ROLE_KEY, role),
      None => store.remove(ROLE_KEY),
    }
  }

  /// Forget any persisted session.
  pub fn clear(store: &dyn TokenStore) -> Result<()> {
    store.remove(TOKEN_KEY)?;
    store.remove(ROLE_KEY)
  }

  pub fn role(&self) -> Option<&str> { self.role.as_deref() }

  pub fn expires_at(&self) -> Option<DateTime<Utc>> { self.expires_at }

  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { self.expires_at.is_some_and(|exp| exp <= now) }

  /// Value of the `Authorization` header.
  pub fn bearer(&self) -> String { format!("bearer {}", self.token) }

  /// Sign in and persist the resulting session.
  pub async fn sign_in(
    client: &ApiClient,
    store: &dyn TokenStore,
    credentials: &Credentials,
  ) -> Result<Self> {
    let grant = client.sign_in(credentials).await?;
    Self::adopt(grant, store)
  }

  /// Register, then persist the session the server hands back.
  pub async fn sign_up(
    client: &ApiClient,
    store: &dyn TokenStore,
    credentials: &Credentials,
  ) -> Result<Self> {
    let grant = client.sign_up(credentials).await?;
    Self::adopt(grant, store)
  }

  fn adopt(grant: AuthGrant, store: &dyn TokenStore) -> Result<Self> {
    let session = Self::establish(&grant.token, grant.role, Utc::now())?;
    session.persist(store)?;
    info!(role = session.role().unwrap_or("-"), "signed in");
    Ok(session)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn jwt(exp: i64) -> String {
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"u1","exp":{exp}}}"#));
    format!("eyJhbGciOiJIUzI1NiJ9.{payload}.sig")
  }

  fn now() -> DateTime<Utc> { DateTime::from_timestamp(1_700_000_000, 0).unwrap() }

  #[test]
  fn missing_token_is_unauthorized() {
    let store = MemoryTokenStore::new();
    assert_eq!(Session::load(&store, now()), Err(ClientError::Unauthorized));
    assert_eq!(Session::establish("  ", None, now()), Err(ClientError::Unauthorized));
  }

  #[test]
  fn expired_jwt_is_rejected_once() {
    assert_eq!(
      Session::establish(&jwt(1_600_000_000), None, now()),
      Err(ClientError::Expired)
    );
    let live = Session::establish(&jwt(1_800_000_000), Some("admin".into()), now()).unwrap();
    assert_eq!(live.expires_at(), DateTime::from_timestamp(1_800_000_000, 0));
    assert_eq!(live.role(), Some("admin"));
  }

  #[test]
  fn opaque_tokens_never_expire() {
    let session = Session::establish("opaque-token", None, now()).unwrap();
    assert_eq!(session.expires_at(), None);
    assert_eq!(session.bearer(), "bearer opaque-token");
  }

  #[test]
  fn persist_load_clear() {
    let store = MemoryTokenStore::new();
    let session = Session::establish("t", Some("user".into()), now()).unwrap();
    session.persist(&store).unwrap();
    assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("t"));
    assert_eq!(Session::load(&store, now()).unwrap(), session);

    Session::clear(&store).unwrap();
    assert_eq!(store.get(ROLE_KEY).unwrap(), None);
    assert_eq!(Session::load(&store, now()), Err(ClientError::Unauthorized));
  }

  #[test]
  fn file_store_creates_parent_dirs() {
    let dir = std::env::temp_dir().join(format!("paystruct-store-{}", std::process::id()));
    let store = FileTokenStore::new(dir.join("nested").join("storage.json"));

    assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    store.set(TOKEN_KEY, "abc").unwrap();
    store.set(ROLE_KEY, "admin").unwrap();
    store.remove(ROLE_KEY).unwrap();

    let reopened = FileTokenStore::new(store.path());
    assert_eq!(reopened.get(TOKEN_KEY).unwrap().as_deref(), Some("abc"));
    assert_eq!(reopened.get(ROLE_KEY).unwrap(), None);

    fs::remove_dir_all(&dir).ok();
  }
}
