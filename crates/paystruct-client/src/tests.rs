//! Client, cache and mutation tests against an in-process mock backend.

use std::{
  sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering::SeqCst},
  },
  time::Duration,
};

use axum::{
  Json, Router,
  body::Bytes,
  extract::{Path, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
  routing::{delete, get, post},
};
use chrono::{NaiveDate, Utc};
use paystruct_core::{
  calendar::PersianDate,
  entity::{Contractor, Project, StatusStatement},
  form::{Credentials, NewContract, NewContractor, NewStatusStatement, ScannedFile},
};
use serde_json::{Value, json};
use tokio::{net::TcpListener, sync::Notify};
use tokio_util::sync::CancellationToken;

use crate::{
  ApiClient, ClientError, MemoryTokenStore, QueryCache, Session, TokenStore,
  mutation::{create_contract, create_contractor, create_status_statement, delete_and_invalidate},
  session::{ROLE_KEY, TOKEN_KEY},
};

// ─── Mock backend ────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct Mock {
  contractor_gets: Arc<AtomicUsize>,
  contract_posts:  Arc<AtomicUsize>,
  failing:         Arc<AtomicBool>,
  /// The next contractor list is answered only after `release` fires.
  hold:            Arc<AtomicBool>,
  release:         Arc<Notify>,
  contractors:     Arc<Mutex<Vec<Value>>>,
  authorization:   Arc<Mutex<Option<String>>>,
  upload:          Arc<Mutex<Option<(String, Vec<u8>)>>>,
  statement_body:  Arc<Mutex<Option<Value>>>,
}

fn contractor_json(id: &str, first: &str, last: &str) -> Value {
  json!({
    "ID": id,
    "legal_entity": false,
    "first_name": first,
    "last_name": last,
    "national_id": format!("00{id}"),
  })
}

fn fail(status: StatusCode, message: &str) -> Response {
  (status, Json(json!({ "status": status.as_u16(), "message": message }))).into_response()
}

async fn list_contractors(State(mock): State<Mock>, headers: HeaderMap) -> Response {
  mock.contractor_gets.fetch_add(1, SeqCst);
  *mock.authorization.lock().unwrap() = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .map(str::to_string);
  let data = mock.contractors.lock().unwrap().clone();
  if mock.hold.swap(false, SeqCst) {
    mock.release.notified().await;
  }
  tokio::time::sleep(Duration::from_millis(20)).await;

  if mock.failing.load(SeqCst) {
    return fail(StatusCode::INTERNAL_SERVER_ERROR, "boom");
  }
  Json(json!({ "status": 200, "message": "ok", "data": data })).into_response()
}

async fn create_contractor_locked() -> Response {
  fail(StatusCode::INTERNAL_SERVER_ERROR, "db locked")
}

async fn delete_contractor(State(mock): State<Mock>, Path(id): Path<String>) -> Response {
  if id == "locked" {
    return fail(StatusCode::INTERNAL_SERVER_ERROR, "db locked");
  }
  mock.contractors.lock().unwrap().retain(|c| c["ID"] != id.as_str());
  Json(json!({ "status": 200, "message": "deleted" })).into_response()
}

async fn projects_not_an_array() -> Response {
  Json(json!({ "status": 200, "message": "ok", "data": { "ID": "p1" } })).into_response()
}

async fn contracts_unavailable() -> StatusCode { StatusCode::SERVICE_UNAVAILABLE }

async fn upload_contract(State(mock): State<Mock>, headers: HeaderMap, body: Bytes) -> StatusCode {
  mock.contract_posts.fetch_add(1, SeqCst);
  let content_type = headers
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .unwrap_or_default()
    .to_string();
  *mock.upload.lock().unwrap() = Some((content_type, body.to_vec()));
  StatusCode::CREATED
}

async fn slow_statements() -> Response {
  tokio::time::sleep(Duration::from_secs(10)).await;
  Json(json!({ "status": 200, "message": "ok", "data": [] })).into_response()
}

async fn create_statement(State(mock): State<Mock>, Json(body): Json<Value>) -> StatusCode {
  *mock.statement_body.lock().unwrap() = Some(body);
  StatusCode::CREATED
}

async fn wbs_items(Path(number): Path<String>) -> Response {
  if number != "C-1" {
    return fail(StatusCode::NOT_FOUND, "قرارداد یافت نشد");
  }
  Json(json!({
    "status": 200,
    "message": "ok",
    "data": [
      { "description": "بتن", "unit": "m3", "quantity": "10.0000", "unit_price": "500.0000" }
    ]
  }))
  .into_response()
}

async fn sign_in(Json(body): Json<Value>) -> Response {
  if body["password"] != "secret" {
    return fail(StatusCode::UNAUTHORIZED, "invalid credentials");
  }
  Json(json!({ "status": 200, "message": "ok", "data": { "token": "tok", "role": "admin" } }))
    .into_response()
}

async fn serve(mock: Mock) -> String {
  let app = Router::new()
    .route(
      "/management/contractors/",
      get(list_contractors).post(create_contractor_locked),
    )
    .route("/management/contractors/{id}", delete(delete_contractor))
    .route("/management/projects/", get(projects_not_an_array))
    .route(
      "/management/contracts/",
      get(contracts_unavailable).post(upload_contract),
    )
    .route(
      "/management/contracts/status-statement/",
      get(slow_statements).post(create_statement),
    )
    .route("/management/contracts/wbs/{number}", get(wbs_items))
    .route("/users/signin", post(sign_in))
    .with_state(mock);

  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
  format!("http://{addr}/")
}

async fn signed_in(mock: &Mock) -> ApiClient {
  let base = serve(mock.clone()).await;
  let session = Session::establish("test-token", None, Utc::now()).unwrap();
  ApiClient::new(&base).unwrap().with_session(session)
}

fn seeded() -> Mock {
  let mock = Mock::default();
  *mock.contractors.lock().unwrap() = vec![
    contractor_json("1", "Ali", "Rezaei"),
    contractor_json("2", "Sara", "Ahmadi"),
  ];
  mock
}

// ─── Remote fetcher ──────────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_sends_bearer_and_unwraps_data() {
  let mock = seeded();
  let client = signed_in(&mock).await;

  let contractors: Vec<Contractor> = client.fetch_all().await.unwrap();
  assert_eq!(contractors.len(), 2);
  assert_eq!(contractors[1].display_name(), "Sara Ahmadi");
  assert_eq!(
    mock.authorization.lock().unwrap().as_deref(),
    Some("bearer test-token")
  );
}

#[tokio::test]
async fn no_session_means_no_request() {
  let mock = seeded();
  let base = serve(mock.clone()).await;
  let client = ApiClient::new(&base).unwrap();

  let result = client.fetch_all::<Contractor>().await;
  assert_eq!(result, Err(ClientError::Unauthorized));
  assert_eq!(mock.contractor_gets.load(SeqCst), 0);
}

#[tokio::test]
async fn data_must_be_an_array() {
  let client = signed_in(&Mock::default()).await;
  let err = client.fetch_all::<Project>().await.unwrap_err();
  assert_eq!(
    err,
    ClientError::Format("Invalid response format: data is not an array".into())
  );
}

#[tokio::test]
async fn missing_message_falls_back_per_resource() {
  let client = signed_in(&Mock::default()).await;
  let err = client
    .fetch_all::<paystruct_core::entity::Contract>()
    .await
    .unwrap_err();
  assert_eq!(err, ClientError::Http {
    status:  503,
    message: "failure in getting contracts".into(),
  });
}

#[tokio::test]
async fn wbs_lookup_by_contract_number() {
  let client = signed_in(&Mock::default()).await;
  let items = client.wbs_for("C-1").await.unwrap();
  assert_eq!(items.len(), 1);
  assert_eq!(items[0].total_price(), 5000.0);

  let err = client.wbs_for("C-404").await.unwrap_err();
  assert_eq!(err.to_string(), "قرارداد یافت نشد");
}

// ─── Cache ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_refreshes_share_one_request() {
  let mock = seeded();
  let cache = QueryCache::<Contractor>::new(signed_in(&mock).await);
  let cancel = CancellationToken::new();

  let (a, b) = tokio::join!(cache.refresh(&cancel), cache.refresh(&cancel));
  assert_eq!(a.unwrap().len(), 2);
  assert_eq!(b.unwrap().len(), 2);
  assert_eq!(mock.contractor_gets.load(SeqCst), 1);
  assert_eq!(cache.version(), 1);
}

#[tokio::test]
async fn refresh_after_invalidate_does_not_reuse_older_fetch() {
  let mock = seeded();
  mock.hold.store(true, SeqCst);
  let cache = QueryCache::<Contractor>::new(signed_in(&mock).await);
  let cancel = CancellationToken::new();

  let first = {
    let cache = cache.clone();
    let cancel = cancel.clone();
    tokio::spawn(async move { cache.refresh(&cancel).await })
  };
  while mock.contractor_gets.load(SeqCst) == 0 {
    tokio::time::sleep(Duration::from_millis(5)).await;
  }

  cache.invalidate();
  mock
    .contractors
    .lock()
    .unwrap()
    .push(contractor_json("3", "Reza", "Karimi"));
  let second = {
    let cache = cache.clone();
    let cancel = cancel.clone();
    tokio::spawn(async move { cache.refresh(&cancel).await })
  };
  tokio::time::sleep(Duration::from_millis(20)).await;
  mock.release.notify_one();

  assert_eq!(first.await.unwrap().unwrap().len(), 2);
  assert_eq!(second.await.unwrap().unwrap().len(), 3);
  assert_eq!(mock.contractor_gets.load(SeqCst), 2);

  let snapshot = cache.snapshot();
  assert_eq!(snapshot.data.map(|d| d.len()), Some(3));
  assert_eq!(snapshot.version, 2);
  assert!(!snapshot.stale);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_data() {
  let mock = seeded();
  let cache = QueryCache::<Contractor>::new(signed_in(&mock).await);
  let cancel = CancellationToken::new();
  cache.refresh(&cancel).await.unwrap();

  mock.failing.store(true, SeqCst);
  let err = cache.refresh(&cancel).await.unwrap_err();
  assert_eq!(err, ClientError::Http {
    status:  500,
    message: "boom".into(),
  });

  let snapshot = cache.snapshot();
  assert_eq!(snapshot.data.map(|d| d.len()), Some(2));
  assert_eq!(snapshot.error, Some(err));
  assert_eq!(snapshot.version, 1);
  assert!(!snapshot.is_loading);

  mock.failing.store(false, SeqCst);
  cache.refresh(&cancel).await.unwrap();
  assert_eq!(cache.snapshot().error, None);
}

#[tokio::test]
async fn cancelled_fetch_is_discarded() {
  let cache = QueryCache::<StatusStatement>::new(signed_in(&Mock::default()).await);
  let cancel = CancellationToken::new();

  let task = {
    let cache = cache.clone();
    let cancel = cancel.clone();
    tokio::spawn(async move { cache.refresh(&cancel).await })
  };
  tokio::time::sleep(Duration::from_millis(50)).await;
  assert!(cache.snapshot().is_loading);

  cancel.cancel();
  assert_eq!(task.await.unwrap().unwrap_err(), ClientError::Cancelled);

  let snapshot = cache.snapshot();
  assert!(snapshot.data.is_none());
  assert!(snapshot.error.is_none());
  assert!(!snapshot.is_fetching);
  assert_eq!(snapshot.version, 0);
}

// ─── Mutations ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_delete_reports_message_and_keeps_cache() {
  let mock = seeded();
  let cache = QueryCache::<Contractor>::new(signed_in(&mock).await);
  let cancel = CancellationToken::new();
  cache.refresh(&cancel).await.unwrap();

  let err = delete_and_invalidate(&cache, "locked", &cancel)
    .await
    .unwrap_err();
  assert_eq!(err.to_string(), "db locked");

  let snapshot = cache.snapshot();
  assert_eq!(snapshot.data.map(|d| d.len()), Some(2));
  assert_eq!(snapshot.version, 1);
  assert!(!snapshot.stale);
  assert_eq!(mock.contractor_gets.load(SeqCst), 1);
}

#[tokio::test]
async fn delete_invalidates_and_refetches() {
  let mock = seeded();
  let cache = QueryCache::<Contractor>::new(signed_in(&mock).await);
  let cancel = CancellationToken::new();
  cache.refresh(&cancel).await.unwrap();

  delete_and_invalidate(&cache, "1", &cancel).await.unwrap();

  let snapshot = cache.snapshot();
  let data = snapshot.data.unwrap();
  assert_eq!(data.len(), 1);
  assert_eq!(data[0].id, "2");
  assert_eq!(snapshot.version, 2);
  assert!(!snapshot.stale);
}

#[tokio::test]
async fn contract_without_file_never_reaches_the_server() {
  let mock = Mock::default();
  let client = signed_in(&mock).await;

  let err = create_contract(&client, NewContract::default())
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    ClientError::Validation(paystruct_core::Error::MissingField {
      field: "scanned_file",
      ..
    })
  ));
  assert_eq!(err.to_string(), "فایل قرارداد الزامی است");
  assert_eq!(mock.contract_posts.load(SeqCst), 0);
}

#[tokio::test]
async fn contract_is_uploaded_as_multipart() {
  let mock = Mock::default();
  let client = signed_in(&mock).await;

  let form = NewContract {
    contractor_id:    "c1".into(),
    project_id:       "p1".into(),
    contract_number:  "C-9".into(),
    gross_budget:     "2500000".into(),
    insurance_rate:   "5".into(),
    performance_bond: "10".into(),
    added_value_tax:  "9".into(),
    start_date:       NaiveDate::from_ymd_opt(2024, 3, 20),
    end_date:         NaiveDate::from_ymd_opt(2025, 3, 20),
    scanned_file:     Some(ScannedFile {
      file_name: "scan.pdf".into(),
      content:   b"%PDF-1.4 test".to_vec(),
    }),
  };
  create_contract(&client, form).await.unwrap();

  let (content_type, body) = mock.upload.lock().unwrap().clone().unwrap();
  let body = String::from_utf8_lossy(&body);
  assert!(content_type.starts_with("multipart/form-data"));
  assert!(body.contains(r#"name="contract_number""#));
  assert!(body.contains("2024-03-20T00:00:00Z"));
  assert!(body.contains(r#"name="scanned_file"; filename="scan.pdf""#));
  assert!(body.contains("%PDF-1.4 test"));
}

#[tokio::test]
async fn create_failure_toast_carries_status() {
  let client = signed_in(&Mock::default()).await;
  let form = NewContractor::natural("Ali", "Rezaei", "0012345678");

  let err = create_contractor(&client, &form).await.unwrap_err();
  assert_eq!(err.toast(), "500 | db locked");
}

#[tokio::test]
async fn status_statement_dates_are_sent_verbatim() {
  let mock = Mock::default();
  let client = signed_in(&mock).await;
  let form = NewStatusStatement {
    contract_id: "c1".into(),
    from:        Some(PersianDate { year: 1403, month: 1, day: 1 }),
    to:          Some(PersianDate { year: 1403, month: 1, day: 31 }),
  };

  create_status_statement(&client, &form).await.unwrap();

  let body = mock.statement_body.lock().unwrap().clone().unwrap();
  assert_eq!(body["statement_date_from"], "1403-01-01T00:00:00Z");
  assert_eq!(body["statement_date_to"], "1403-01-31T00:00:00Z");
}

// ─── Session ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sign_in_persists_token_and_role() {
  let base = serve(Mock::default()).await;
  let client = ApiClient::new(&base).unwrap();
  let store = MemoryTokenStore::new();

  let credentials = Credentials::sign_in("a@b.c", "secret").unwrap();
  let session = Session::sign_in(&client, &store, &credentials).await.unwrap();
  assert_eq!(session.role(), Some("admin"));
  assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("tok"));
  assert_eq!(store.get(ROLE_KEY).unwrap().as_deref(), Some("admin"));

  let wrong = Credentials::sign_in("a@b.c", "nope").unwrap();
  let err = Session::sign_in(&client, &store, &wrong).await.unwrap_err();
  assert_eq!(err.to_string(), "invalid credentials");
}
