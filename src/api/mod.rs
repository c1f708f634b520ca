mod cli;
mod coerce;

use axum::{
    Router,
    body::Bytes,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    AccountBook, AccountId, AccountProjection, BookProjection, GoalProjection, GrandTotal,
    describe_goal, format_currency,
};
use crate::error::InputError;

pub use cli::{CalcArgs, Cli, Command, ServeArgs, render_text, run_calc};
pub use coerce::{FieldValue, MAX_PERIOD_MONTHS, RawAccount, parse_account_spec};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

/// 100 years of monthly compounding.
pub const DEFAULT_HORIZON_MONTHS: u32 = 1200;

#[derive(Copy, Clone, Debug)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub horizon_months: u32,
}

#[derive(Copy, Clone, Debug)]
struct AppState {
    horizon_months: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CalculatePayload {
    accounts: Vec<RawAccount>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SingleAccountQuery {
    initial_amount: Option<String>,
    annual_rate: Option<String>,
    months: Option<String>,
    monthly_contribution: Option<String>,
    goal_amount: Option<String>,
}

impl From<SingleAccountQuery> for RawAccount {
    fn from(query: SingleAccountQuery) -> Self {
        RawAccount {
            id: Some(AccountId(1)),
            initial_amount: FieldValue::from_text(query.initial_amount),
            annual_rate: FieldValue::from_text(query.annual_rate),
            months: FieldValue::from_text(query.months),
            monthly_contribution: FieldValue::from_text(query.monthly_contribution),
            goal_amount: FieldValue::from_text(query.goal_amount),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDisplay {
    pub ending_balance: String,
    pub interest_earned: String,
    pub goal: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: AccountId,
    pub months: u32,
    pub ending_balance: f64,
    pub interest_earned: f64,
    pub total_contributions: f64,
    pub goal_months: Option<u32>,
    pub goal_years: Option<f64>,
    pub goal_beyond_horizon: bool,
    pub display: AccountDisplay,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalDisplay {
    pub ending_balance: String,
    pub interest_earned: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrandTotalResponse {
    pub ending_balance: f64,
    pub initial_amount: f64,
    pub total_contributions: f64,
    pub interest_earned: f64,
    pub display: TotalDisplay,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateResponse {
    pub accounts: Vec<AccountResponse>,
    pub grand_total: GrandTotalResponse,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Coerces every account and files it under its id, keeping request order.
/// Accounts without an id get the lowest ids no other account in the request
/// asked for.
pub fn build_book(accounts: &[RawAccount]) -> Result<AccountBook, InputError> {
    let mut supplied = HashSet::new();
    for id in accounts.iter().filter_map(|raw| raw.id) {
        if !supplied.insert(id) {
            return Err(InputError::DuplicateAccount(id));
        }
    }

    let mut book = AccountBook::new();
    let mut next = 1u64;
    for raw in accounts {
        let id = match raw.id {
            Some(id) => id,
            None => {
                while supplied.contains(&AccountId(next)) {
                    next = next.wrapping_add(1);
                }
                let id = AccountId(next);
                next = next.wrapping_add(1);
                id
            }
        };
        book.insert_with_id(id, raw.to_snapshot())?;
    }
    Ok(book)
}

pub fn calculate(
    accounts: &[RawAccount],
    horizon_months: u32,
) -> Result<CalculateResponse, InputError> {
    let book = build_book(accounts)?;
    let projection = book.project(Some(horizon_months));
    Ok(build_calculate_response(&book, &projection))
}

fn build_account_response(
    id: AccountId,
    months: u32,
    projection: &AccountProjection,
) -> AccountResponse {
    AccountResponse {
        id,
        months,
        ending_balance: projection.ending_balance.to_major(),
        interest_earned: projection.interest_earned.to_major(),
        total_contributions: projection.total_contributions.to_major(),
        goal_months: projection.goal.months(),
        goal_years: projection.goal.months().map(|months| months as f64 / 12.0),
        goal_beyond_horizon: matches!(projection.goal, GoalProjection::BeyondHorizon { .. }),
        display: AccountDisplay {
            ending_balance: format_currency(projection.ending_balance),
            interest_earned: format_currency(projection.interest_earned),
            goal: describe_goal(projection.goal),
        },
    }
}

fn build_total_response(total: &GrandTotal) -> GrandTotalResponse {
    GrandTotalResponse {
        ending_balance: total.ending_balance.to_major(),
        initial_amount: total.initial_amount.to_major(),
        total_contributions: total.total_contributions.to_major(),
        interest_earned: total.interest_earned.to_major(),
        display: TotalDisplay {
            ending_balance: format_currency(total.ending_balance),
            interest_earned: format_currency(total.interest_earned),
        },
    }
}

fn build_calculate_response(book: &AccountBook, projection: &BookProjection) -> CalculateResponse {
    let accounts = projection
        .accounts
        .iter()
        .map(|(id, account)| {
            let months = book.get(*id).map_or(0, |snapshot| snapshot.months);
            build_account_response(*id, months, account)
        })
        .collect();

    CalculateResponse {
        accounts,
        grand_total: build_total_response(&projection.total),
    }
}

pub fn router(horizon_months: u32) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route("/healthz", get(health_handler))
        .route(
            "/api/calculate",
            get(calculate_get_handler).post(calculate_post_handler),
        )
        .fallback(not_found_handler)
        .with_state(AppState { horizon_months })
}

pub async fn run_http_server(config: ServerConfig) -> std::io::Result<()> {
    let app = router(config.horizon_months);

    let listener = TcpListener::bind(config.addr).await?;
    tracing::info!(
        addr = %config.addr,
        horizon_months = config.horizon_months,
        "savings calculator listening"
    );
    tracing::info!("local access: http://127.0.0.1:{}/", config.addr.port());

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn calculate_get_handler(
    State(state): State<AppState>,
    Query(query): Query<SingleAccountQuery>,
) -> Response {
    calculate_handler_impl(state, vec![query.into()])
}

async fn calculate_post_handler(State(state): State<AppState>, body: Bytes) -> Response {
    match calculate_payload_from_json(&body) {
        Ok(payload) => calculate_handler_impl(state, payload.accounts),
        Err(err) => {
            tracing::warn!(error = %err, "rejected calculate payload");
            error_response(StatusCode::BAD_REQUEST, &err.to_string())
        }
    }
}

fn calculate_handler_impl(state: AppState, accounts: Vec<RawAccount>) -> Response {
    match calculate(&accounts, state.horizon_months) {
        Ok(response) => {
            tracing::debug!(accounts = response.accounts.len(), "calculated projection");
            json_response(StatusCode::OK, response)
        }
        Err(err) => {
            tracing::warn!(error = %err, "rejected calculate request");
            error_response(StatusCode::BAD_REQUEST, &err.to_string())
        }
    }
}

fn calculate_payload_from_json(body: &[u8]) -> Result<CalculatePayload, InputError> {
    Ok(serde_json::from_slice::<CalculatePayload>(body)?)
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use std::fs;
    use std::path::Path;
    use tower::ServiceExt;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_golden_snapshot(path: &str, actual: &str) {
        let update = matches!(
            std::env::var("UPDATE_GOLDEN").as_deref(),
            Ok("1") | Ok("true") | Ok("TRUE")
        );
        let snapshot_path = Path::new(path);

        if update {
            if let Some(parent) = snapshot_path.parent() {
                fs::create_dir_all(parent).expect("failed to create snapshot directory");
            }
            fs::write(snapshot_path, actual).expect("failed to write golden snapshot");
            return;
        }

        let expected = fs::read_to_string(snapshot_path).unwrap_or_else(|_| {
            panic!("missing golden snapshot at {path}; run with UPDATE_GOLDEN=1 to generate")
        });
        assert_eq!(
            actual, expected,
            "snapshot mismatch for {path}; run with UPDATE_GOLDEN=1 to refresh if expected"
        );
    }

    fn two_account_json() -> &'static str {
        r#"{
          "accounts": [
            {
              "id": 1,
              "initialAmount": "1000",
              "annualRate": 12,
              "months": 12,
              "monthlyContribution": "",
              "goalAmount": 2000
            },
            {
              "id": 4,
              "initialAmount": 100,
              "annualRate": "0",
              "months": "8",
              "monthlyContribution": 50,
              "goalAmount": "500"
            }
          ]
        }"#
    }

    async fn send(request: Request<Body>) -> (StatusCode, Option<String>, String) {
        let response = router(DEFAULT_HORIZON_MONTHS)
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let cache_control = response
            .headers()
            .get(header::CACHE_CONTROL)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let body = String::from_utf8(body.to_vec()).expect("body should be utf-8");
        (status, cache_control, body)
    }

    fn post_json(uri: &str, json: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("valid request")
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("valid request")
    }

    #[test]
    fn calculate_projects_each_account_and_the_total() {
        let payload =
            calculate_payload_from_json(two_account_json().as_bytes()).expect("json should parse");
        let response =
            calculate(&payload.accounts, DEFAULT_HORIZON_MONTHS).expect("valid accounts");

        assert_eq!(response.accounts.len(), 2);
        let first = &response.accounts[0];
        assert_eq!(first.id, AccountId(1));
        assert_approx(first.ending_balance, 1126.83);
        assert_approx(first.interest_earned, 126.83);
        assert_eq!(first.goal_months, Some(70));
        assert_approx(first.goal_years.expect("goal reached"), 70.0 / 12.0);
        assert_eq!(first.display.ending_balance, "$1126.83");

        let second = &response.accounts[1];
        assert_eq!(second.id, AccountId(4));
        assert_eq!(second.months, 8);
        assert_approx(second.ending_balance, 500.0);
        assert_eq!(second.goal_months, Some(8));
        assert_approx(second.goal_years.expect("goal reached"), 8.0 / 12.0);
        assert_eq!(second.display.goal.as_deref(), Some("8 months (0.67 years)"));

        assert_approx(response.grand_total.ending_balance, 1626.83);
        assert_approx(response.grand_total.interest_earned, 126.83);
    }

    #[test]
    fn calculate_rejects_duplicate_ids() {
        let accounts = vec![
            RawAccount {
                id: Some(AccountId(2)),
                ..RawAccount::default()
            },
            RawAccount {
                id: Some(AccountId(2)),
                ..RawAccount::default()
            },
        ];
        let err = calculate(&accounts, DEFAULT_HORIZON_MONTHS)
            .err()
            .expect("duplicate ids must be rejected");
        assert_eq!(err, InputError::DuplicateAccount(AccountId(2)));
    }

    #[test]
    fn accounts_without_ids_avoid_ids_supplied_later() {
        let accounts = vec![
            RawAccount {
                initial_amount: FieldValue::Number(1.0),
                ..RawAccount::default()
            },
            RawAccount {
                id: Some(AccountId(1)),
                ..RawAccount::default()
            },
            RawAccount::default(),
        ];
        let response = calculate(&accounts, DEFAULT_HORIZON_MONTHS).expect("valid accounts");
        let ids: Vec<AccountId> = response.accounts.iter().map(|account| account.id).collect();

        assert_eq!(ids, vec![AccountId(2), AccountId(1), AccountId(3)]);
        assert_approx(response.accounts[0].ending_balance, 1.0);
    }

    #[test]
    fn periods_longer_than_horizon_still_accumulate() {
        let accounts = vec![RawAccount {
            initial_amount: FieldValue::Number(1000.0),
            months: FieldValue::Number(1500.0),
            monthly_contribution: FieldValue::Number(1.0),
            ..RawAccount::default()
        }];
        let response = calculate(&accounts, DEFAULT_HORIZON_MONTHS).expect("valid accounts");
        let account = &response.accounts[0];

        assert_eq!(account.months, 1500);
        assert_approx(account.ending_balance, 2500.0);
        assert_approx(account.total_contributions, 1500.0);
        assert_eq!(account.display.goal, None);
    }

    #[test]
    fn unreachable_goal_is_reported_beyond_horizon() {
        let accounts = vec![RawAccount {
            monthly_contribution: FieldValue::Number(0.01),
            goal_amount: FieldValue::Number(1_000_000.0),
            ..RawAccount::default()
        }];
        let response = calculate(&accounts, 24).expect("valid accounts");
        let account = &response.accounts[0];

        assert_eq!(account.goal_months, None);
        assert_eq!(account.goal_years, None);
        assert!(account.goal_beyond_horizon);
        assert_eq!(
            account.display.goal.as_deref(),
            Some("more than 24 months (2.00 years)")
        );
    }

    #[test]
    fn missing_goal_hides_goal_projection() {
        let accounts = vec![RawAccount {
            initial_amount: FieldValue::Number(1000.0),
            goal_amount: FieldValue::Text(String::new()),
            ..RawAccount::default()
        }];
        let response = calculate(&accounts, DEFAULT_HORIZON_MONTHS).expect("valid accounts");
        let account = &response.accounts[0];

        assert_eq!(account.goal_months, None);
        assert!(!account.goal_beyond_horizon);
        assert_eq!(account.display.goal, None);
    }

    #[test]
    fn empty_payload_yields_zero_total() {
        let payload = calculate_payload_from_json(b"{}").expect("json should parse");
        let response = calculate(&payload.accounts, DEFAULT_HORIZON_MONTHS).expect("no accounts");

        assert!(response.accounts.is_empty());
        assert_approx(response.grand_total.ending_balance, 0.0);
        assert_eq!(response.grand_total.display.ending_balance, "$0.00");
    }

    #[test]
    fn malformed_payload_is_a_payload_error() {
        let err = calculate_payload_from_json(b"{\"accounts\": 3}")
            .err()
            .expect("accounts must be a list");
        assert!(matches!(err, InputError::Payload(_)));
    }

    #[test]
    fn golden_snapshot_two_accounts_json() {
        let payload =
            calculate_payload_from_json(two_account_json().as_bytes()).expect("json should parse");
        let response =
            calculate(&payload.accounts, DEFAULT_HORIZON_MONTHS).expect("valid accounts");
        let json = format!(
            "{}\n",
            serde_json::to_string(&response).expect("response should serialize")
        );

        assert_golden_snapshot("tests/golden/calculate_two_accounts.json", &json);
    }

    #[tokio::test]
    async fn post_calculate_returns_json_projection() {
        let (status, cache_control, body) =
            send(post_json("/api/calculate", two_account_json())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache_control.as_deref(), Some("no-store"));
        let value: serde_json::Value = serde_json::from_str(&body).expect("json body");
        assert_eq!(value["accounts"][0]["goalMonths"], 70);
        assert!(value["accounts"][0]["goalYears"].is_f64());
        assert_eq!(value["grandTotal"]["display"]["endingBalance"], "$1626.83");
    }

    #[tokio::test]
    async fn post_calculate_rejects_bad_json_with_400() {
        let (status, _, body) = send(post_json("/api/calculate", "{not json")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let value: serde_json::Value = serde_json::from_str(&body).expect("json body");
        assert!(
            value["error"]
                .as_str()
                .is_some_and(|msg| msg.starts_with("invalid request payload"))
        );
    }

    #[tokio::test]
    async fn get_calculate_reads_single_account_from_query() {
        let (status, _, body) = send(get_request(
            "/api/calculate?initialAmount=100&annualRate=0&months=10&monthlyContribution=50&goalAmount=500",
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).expect("json body");
        assert_eq!(value["accounts"][0]["id"], 1);
        assert_eq!(value["accounts"][0]["endingBalance"], 600.0);
        assert_eq!(value["accounts"][0]["goalMonths"], 8);
    }

    #[tokio::test]
    async fn static_assets_are_served_uncached() {
        let (status, cache_control, body) = send(get_request("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache_control.as_deref(), Some("no-store"));
        assert!(body.contains("Savings Calculator"));

        let (status, _, body) = send(get_request("/app.js")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("/api/calculate"));
    }

    #[tokio::test]
    async fn health_check_and_unknown_routes() {
        let (status, _, body) = send(get_request("/healthz")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");

        let (status, _, body) = send(get_request("/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, r#"{"error":"Not found"}"#);
    }
}
