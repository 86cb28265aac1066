//! Async HTTP client wrapping the PayStruct management API.
//!
//! Every response is wrapped in `{status, message, data}`. Failures surface
//! the server's `message`, or a per-call fallback when the body has none.

use std::sync::Arc;

use paystruct_core::{
  form::{ContractSubmission, Credentials},
  wbs::WbsItem,
};
use reqwest::{
  Client, Method, RequestBuilder, Response,
  header::AUTHORIZATION,
  multipart::{Form, Part},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
  ClientError, Result,
  resource::{Fetchable, Resource},
  session::Session,
};

/// Fallback for failed writes whose body carries no message.
const UNKNOWN_ERROR: &str = "خطای ناشناخته";

#[derive(Deserialize)]
struct Envelope {
  #[serde(default)]
  message: Option<String>,
  #[serde(default)]
  data:    Value,
}

/// Token and role returned by sign-in and sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthGrant {
  pub token: String,
  #[serde(default)]
  pub role:  Option<String>,
}

/// Async HTTP client for the management API.
///
/// Cheap to clone: the inner [`reqwest::Client`] and the session are shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
  client:   Client,
  base_url: Arc<str>,
  session:  Option<Arc<Session>>,
}

impl ApiClient {
  /// An anonymous client. No request timeout is configured.
  pub fn new(base_url: &str) -> Result<Self> {
    let client = Client::builder().build()?;
    Ok(Self {
      client,
      base_url: Arc::from(base_url.trim_end_matches('/')),
      session: None,
    })
  }

  pub fn with_session(mut self, session: Session) -> Self {
    self.session = Some(Arc::new(session));
    self
  }

  pub fn session(&self) -> Option<&Session> { self.session.as_deref() }

  pub fn base_url(&self) -> &str { &self.base_url }

  fn url(&self, path: &str) -> String { format!("{}{}", self.base_url, path) }

  /// Start an authenticated request. Without a session nothing is sent.
  fn authed(&self, method: Method, url: &str) -> Result<RequestBuilder> {
    let session = self.session.as_ref().ok_or(ClientError::Unauthorized)?;
    Ok(self.client.request(method, url).header(AUTHORIZATION, session.bearer()))
  }

  async fn send(&self, req: RequestBuilder, method: &Method, url: &str) -> Result<Response> {
    let resp = req.send().await.map_err(|e| {
      warn!(%method, url, error = %e, "request failed");
      ClientError::from(e)
    })?;
    debug!(%method, url, status = resp.status().as_u16(), "response");
    Ok(resp)
  }

  /// Turn a non-2xx response into [`ClientError::Http`].
  async fn reject(resp: Response, fallback: &str) -> ClientError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Envelope>(&body)
      .ok()
      .and_then(|e| e.message)
      .filter(|m| !m.trim().is_empty())
      .unwrap_or_else(|| fallback.to_string());
    warn!(status, %message, "request rejected");
    ClientError::Http { status, message }
  }

  async fn accept(resp: Response) -> Result<()> {
    if resp.status().is_success() {
      Ok(())
    } else {
      Err(Self::reject(resp, UNKNOWN_ERROR).await)
    }
  }

  async fn envelope(resp: Response, fallback: &str) -> Result<Envelope> {
    if !resp.status().is_success() {
      return Err(Self::reject(resp, fallback).await);
    }
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| ClientError::Format(format!("Invalid response format: {e}")))
  }

  /// `GET path`, requiring `data` to be an array of `T`.
  async fn get_array<T: DeserializeOwned>(&self, path: &str, fallback: &str) -> Result<Vec<T>> {
    let url = self.url(path);
    let req = self.authed(Method::GET, &url)?;
    let resp = self.send(req, &Method::GET, &url).await?;
    let envelope = Self::envelope(resp, fallback).await?;
    if !envelope.data.is_array() {
      return Err(ClientError::Format(
        "Invalid response format: data is not an array".into(),
      ));
    }
    serde_json::from_value(envelope.data)
      .map_err(|e| ClientError::Format(format!("Invalid response format: {e}")))
  }

  // ── Collections ───────────────────────────────────────────────────────────

  /// `GET {base}{T::RESOURCE.path()}`
  pub async fn fetch_all<T: Fetchable>(&self) -> Result<Vec<T>> {
    let resource = T::RESOURCE;
    self.get_array(resource.path(), &resource.fallback_message()).await
  }

  /// `GET {base}/management/contracts/wbs/{contract_number}`
  pub async fn wbs_for(&self, contract_number: &str) -> Result<Vec<WbsItem>> {
    let path = format!("{}{}", Resource::Wbs.path(), contract_number.trim());
    self.get_array(&path, &Resource::Wbs.fallback_message()).await
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// `POST` a JSON body to a collection.
  pub async fn create_json<B: Serialize + ?Sized>(&self, resource: Resource, body: &B) -> Result<()> {
    let url = self.url(resource.path());
    let req = self.authed(Method::POST, &url)?.json(body);
    let resp = self.send(req, &Method::POST, &url).await?;
    Self::accept(resp).await
  }

  /// `POST` a new contract as multipart form data.
  pub async fn create_contract(&self, submission: ContractSubmission) -> Result<()> {
    let ContractSubmission { fields, file } = submission;
    let form = fields
      .into_iter()
      .fold(Form::new(), |form, (name, value)| form.text(name, value))
      .part("scanned_file", Part::bytes(file.content).file_name(file.file_name));

    let url = self.url(Resource::Contracts.path());
    let req = self.authed(Method::POST, &url)?.multipart(form);
    let resp = self.send(req, &Method::POST, &url).await?;
    Self::accept(resp).await
  }

  /// `DELETE {base}{resource.path()}{id}`
  pub async fn delete(&self, resource: Resource, id: &str) -> Result<()> {
    let url = format!("{}{}", self.url(resource.path()), id);
    let req = self.authed(Method::DELETE, &url)?;
    let resp = self.send(req, &Method::DELETE, &url).await?;
    Self::accept(resp).await
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  /// `POST {base}/users/signin`
  pub async fn sign_in(&self, credentials: &Credentials) -> Result<AuthGrant> {
    self.authenticate("/users/signin", credentials).await
  }

  /// `POST {base}/users/signup`
  pub async fn sign_up(&self, credentials: &Credentials) -> Result<AuthGrant> {
    self.authenticate("/users/signup", credentials).await
  }

  async fn authenticate(&self, path: &str, credentials: &Credentials) -> Result<AuthGrant> {
    let url = self.url(path);
    let req = self.client.post(&url).json(credentials);
    let resp = self.send(req, &Method::POST, &url).await?;
    let envelope = Self::envelope(resp, UNKNOWN_ERROR).await?;
    serde_json::from_value(envelope.data)
      .map_err(|e| ClientError::Format(format!("Invalid response format: {e}")))
  }
}
