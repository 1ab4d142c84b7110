use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::core::{
    DEFAULT_CUSTOM_SPENDING, Inputs, ProjectionSummary, SpecialYear, format_currency,
    format_percent, natural_spending, parse_money_or_default, run_projection,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

/// Highest year the special-event inputs accept.
const MAX_SPECIAL_YEAR: u32 = 50;

#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("--years-to-live must be >= 1")]
    YearsToLive,
    #[error("{name} must be a finite number")]
    NotFinite { name: &'static str },
    #[error("{name} must be > -100")]
    RateTooLow { name: &'static str },
    #[error("{name} must be >= -100")]
    GrowthTooLow { name: &'static str },
    #[error("{name} must be between 1 and {max}")]
    SpecialYearOutOfRange { name: &'static str, max: u32 },
    #[error("event must be 1 or 2, got {0}")]
    UnknownEvent(u32),
}

/// Projection parameters shared by the `project` command and the HTTP API.
/// Rates are in percent.
#[derive(Args, Debug, Clone)]
pub struct ProjectionArgs {
    #[arg(long, default_value_t = 4_000_000.0, help = "Initial total assets")]
    pub current_total_asset: f64,
    #[arg(
        long,
        default_value_t = 100_000.0,
        help = "Annual expense in the first year, grown with inflation afterwards"
    )]
    pub annual_expense: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        allow_negative_numbers = true,
        help = "Annual inflation in percent"
    )]
    pub inflation_rate: f64,
    #[arg(
        long,
        default_value_t = 7.0,
        allow_negative_numbers = true,
        help = "Annual investment growth in percent"
    )]
    pub growth_rate: f64,
    #[arg(long, default_value_t = 35, help = "Number of yearly points to project")]
    pub years_to_live: u32,

    #[arg(long, help = "Year index of the first special event")]
    pub special_year_1: Option<u32>,
    #[arg(long, default_value_t = 7.0, allow_negative_numbers = true)]
    pub custom_growth_rate_1: f64,
    #[arg(
        long,
        default_value = "100000",
        help = "Spending in special year 1; thousands separators allowed"
    )]
    pub custom_spending_1: String,
    #[arg(long, default_value_t = 5.0, allow_negative_numbers = true)]
    pub custom_inflation_rate_1: f64,

    #[arg(long, help = "Year index of the second special event")]
    pub special_year_2: Option<u32>,
    #[arg(long, default_value_t = 7.0, allow_negative_numbers = true)]
    pub custom_growth_rate_2: f64,
    #[arg(
        long,
        default_value = "100000",
        help = "Spending in special year 2; thousands separators allowed"
    )]
    pub custom_spending_2: String,
    #[arg(long, default_value_t = 5.0, allow_negative_numbers = true)]
    pub custom_inflation_rate_2: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum SpecialEvent {
    First,
    Second,
}

impl TryFrom<u32> for SpecialEvent {
    type Error = RequestError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(SpecialEvent::First),
            2 => Ok(SpecialEvent::Second),
            other => Err(RequestError::UnknownEvent(other)),
        }
    }
}

/// Free-text money field; the page sends strings, scripts may send numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum MoneyField {
    Number(f64),
    Text(String),
}

impl MoneyField {
    fn into_text(self) -> String {
        match self {
            MoneyField::Number(v) => v.to_string(),
            MoneyField::Text(s) => s,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DashboardPayload {
    current_total_asset: Option<f64>,
    annual_expense: Option<f64>,
    inflation_rate: Option<f64>,
    growth_rate: Option<f64>,
    years_to_live: Option<u32>,

    special_year_1: Option<u32>,
    custom_growth_rate_1: Option<f64>,
    custom_spending_1: Option<MoneyField>,
    custom_inflation_rate_1: Option<f64>,

    special_year_2: Option<u32>,
    custom_growth_rate_2: Option<f64>,
    custom_spending_2: Option<MoneyField>,
    custom_inflation_rate_2: Option<f64>,

    event: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DisplayValues {
    total_asset: String,
    inflation_rate: String,
    growth_rate: String,
    annual_expense: String,
    years_to_live: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    display: DisplayValues,
    chart: ProjectionSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NaturalSpendingResponse {
    event: u32,
    special_year: Option<u32>,
    natural_spending: Option<f64>,
    suggested_spending: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn check_finite(name: &'static str, value: f64) -> Result<(), RequestError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(RequestError::NotFinite { name })
    }
}

fn check_inflation(name: &'static str, percent: f64) -> Result<(), RequestError> {
    check_finite(name, percent)?;
    if percent <= -100.0 {
        return Err(RequestError::RateTooLow { name });
    }
    Ok(())
}

fn check_growth(name: &'static str, percent: f64) -> Result<(), RequestError> {
    check_finite(name, percent)?;
    if percent < -100.0 {
        return Err(RequestError::GrowthTooLow { name });
    }
    Ok(())
}

fn check_special_year(name: &'static str, year: u32) -> Result<(), RequestError> {
    if !(1..=MAX_SPECIAL_YEAR).contains(&year) {
        return Err(RequestError::SpecialYearOutOfRange {
            name,
            max: MAX_SPECIAL_YEAR,
        });
    }
    Ok(())
}

pub fn build_inputs(args: &ProjectionArgs) -> Result<Inputs, RequestError> {
    if args.years_to_live == 0 {
        return Err(RequestError::YearsToLive);
    }
    check_finite("--current-total-asset", args.current_total_asset)?;
    check_finite("--annual-expense", args.annual_expense)?;
    check_inflation("--inflation-rate", args.inflation_rate)?;
    check_growth("--growth-rate", args.growth_rate)?;

    let special_year_1 = match args.special_year_1 {
        Some(year) => {
            check_special_year("--special-year-1", year)?;
            check_growth("--custom-growth-rate-1", args.custom_growth_rate_1)?;
            check_inflation("--custom-inflation-rate-1", args.custom_inflation_rate_1)?;
            Some(SpecialYear {
                year,
                growth_rate: args.custom_growth_rate_1 / 100.0,
                spending: parse_money_or_default(&args.custom_spending_1),
                inflation_rate: args.custom_inflation_rate_1 / 100.0,
            })
        }
        None => None,
    };
    let special_year_2 = match args.special_year_2 {
        Some(year) => {
            check_special_year("--special-year-2", year)?;
            check_growth("--custom-growth-rate-2", args.custom_growth_rate_2)?;
            check_inflation("--custom-inflation-rate-2", args.custom_inflation_rate_2)?;
            Some(SpecialYear {
                year,
                growth_rate: args.custom_growth_rate_2 / 100.0,
                spending: parse_money_or_default(&args.custom_spending_2),
                inflation_rate: args.custom_inflation_rate_2 / 100.0,
            })
        }
        None => None,
    };

    Ok(Inputs {
        current_total_asset: args.current_total_asset,
        initial_expense: args.annual_expense,
        inflation_rate: args.inflation_rate / 100.0,
        investment_growth_rate: args.growth_rate / 100.0,
        years_to_live: args.years_to_live,
        special_year_1,
        special_year_2,
    })
}

/// Spending to pre-fill for a special event. Without a chosen year the
/// suggestion is the default amount.
fn suggest_spending(
    args: &ProjectionArgs,
    event: SpecialEvent,
) -> Result<NaturalSpendingResponse, RequestError> {
    check_finite("--annual-expense", args.annual_expense)?;
    check_inflation("--inflation-rate", args.inflation_rate)?;
    if let Some(year) = args.special_year_1 {
        check_special_year("--special-year-1", year)?;
        check_inflation("--custom-inflation-rate-1", args.custom_inflation_rate_1)?;
    }
    if let Some(year) = args.special_year_2 {
        check_special_year("--special-year-2", year)?;
        check_inflation("--custom-inflation-rate-2", args.custom_inflation_rate_2)?;
    }

    let (event_number, target_year) = match event {
        SpecialEvent::First => (1, args.special_year_1),
        SpecialEvent::Second => (2, args.special_year_2),
    };

    let Some(year) = target_year else {
        return Ok(NaturalSpendingResponse {
            event: event_number,
            special_year: None,
            natural_spending: None,
            suggested_spending: format!("{DEFAULT_CUSTOM_SPENDING:.0}"),
        });
    };

    let spending = natural_spending(
        args.annual_expense,
        args.inflation_rate / 100.0,
        year,
        args.special_year_1,
        args.custom_inflation_rate_1 / 100.0,
        args.special_year_2,
        args.custom_inflation_rate_2 / 100.0,
    );

    Ok(NaturalSpendingResponse {
        event: event_number,
        special_year: Some(year),
        natural_spending: Some(spending),
        suggested_spending: format!("{spending:.0}"),
    })
}

fn build_project_response(args: &ProjectionArgs, inputs: &Inputs) -> ProjectResponse {
    ProjectResponse {
        display: DisplayValues {
            total_asset: format_currency(args.current_total_asset),
            inflation_rate: format_percent(inputs.inflation_rate),
            growth_rate: format_percent(inputs.investment_growth_rate),
            annual_expense: format_currency(args.annual_expense),
            years_to_live: args.years_to_live.to_string(),
        },
        chart: run_projection(inputs),
    }
}

/// Plain-text table for the `project` command.
pub fn render_projection_table(args: &ProjectionArgs) -> Result<String, RequestError> {
    let inputs = build_inputs(args)?;
    let summary = run_projection(&inputs);

    let mut out = String::new();
    out.push_str(&format!("{:>5} {:>18}\n", "Year", "Total Assets"));
    out.push_str(&format!("{}\n", "-".repeat(24)));
    for (year, total) in summary.years.iter().zip(&summary.total_assets) {
        out.push_str(&format!("{:>5} {:>18}\n", year, format_currency(*total)));
    }
    out.push('\n');
    out.push_str(&format!(
        "Remaining: {}\nReal Value: {}\n",
        format_currency(summary.remaining_total_asset),
        format_currency(summary.remaining_real_value)
    ));
    Ok(out)
}

fn build_router() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route(
            "/api/natural-spending",
            get(natural_spending_get_handler).post(natural_spending_post_handler),
        )
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = build_router();

    let listener = TcpListener::bind(addr).await?;
    log::info!("Retirement dashboard listening on http://{addr}");
    log::info!("Local access: http://127.0.0.1:{port}/");

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

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(
    payload: Result<Query<DashboardPayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => project_handler_impl(payload),
        Err(rejection) => payload_rejected(&rejection.body_text()),
    }
}

async fn project_post_handler(payload: Result<Json<DashboardPayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => project_handler_impl(payload),
        Err(rejection) => payload_rejected(&rejection.body_text()),
    }
}

async fn natural_spending_get_handler(
    payload: Result<Query<DashboardPayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => natural_spending_handler_impl(payload),
        Err(rejection) => payload_rejected(&rejection.body_text()),
    }
}

async fn natural_spending_post_handler(
    payload: Result<Json<DashboardPayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => natural_spending_handler_impl(payload),
        Err(rejection) => payload_rejected(&rejection.body_text()),
    }
}

fn payload_rejected(msg: &str) -> Response {
    log::warn!("rejected malformed payload: {msg}");
    error_response(StatusCode::BAD_REQUEST, msg)
}

fn project_handler_impl(payload: DashboardPayload) -> Response {
    let args = args_from_payload(payload);
    let inputs = match build_inputs(&args) {
        Ok(inputs) => inputs,
        Err(e) => {
            log::warn!("rejected projection request: {e}");
            return error_response(StatusCode::BAD_REQUEST, &e.to_string());
        }
    };

    log::debug!(
        "projecting {} years from {} (special years {:?}, {:?})",
        inputs.years_to_live,
        inputs.current_total_asset,
        args.special_year_1,
        args.special_year_2
    );
    json_response(StatusCode::OK, build_project_response(&args, &inputs))
}

fn natural_spending_handler_impl(payload: DashboardPayload) -> Response {
    let event = payload.event.unwrap_or(1);
    let args = args_from_payload(payload);
    let result = SpecialEvent::try_from(event).and_then(|event| suggest_spending(&args, event));
    match result {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(e) => {
            log::warn!("rejected natural spending request: {e}");
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
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
fn args_from_json(json: &str) -> Result<ProjectionArgs, String> {
    let payload = serde_json::from_str::<DashboardPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    Ok(args_from_payload(payload))
}

fn args_from_payload(payload: DashboardPayload) -> ProjectionArgs {
    let mut args = default_args_for_api();

    if let Some(v) = payload.current_total_asset {
        args.current_total_asset = v;
    }
    if let Some(v) = payload.annual_expense {
        args.annual_expense = v;
    }
    if let Some(v) = payload.inflation_rate {
        args.inflation_rate = v;
    }
    if let Some(v) = payload.growth_rate {
        args.growth_rate = v;
    }
    if let Some(v) = payload.years_to_live {
        args.years_to_live = v;
    }

    args.special_year_1 = payload.special_year_1;
    if let Some(v) = payload.custom_growth_rate_1 {
        args.custom_growth_rate_1 = v;
    }
    if let Some(v) = payload.custom_spending_1 {
        args.custom_spending_1 = v.into_text();
    }
    if let Some(v) = payload.custom_inflation_rate_1 {
        args.custom_inflation_rate_1 = v;
    }

    args.special_year_2 = payload.special_year_2;
    if let Some(v) = payload.custom_growth_rate_2 {
        args.custom_growth_rate_2 = v;
    }
    if let Some(v) = payload.custom_spending_2 {
        args.custom_spending_2 = v.into_text();
    }
    if let Some(v) = payload.custom_inflation_rate_2 {
        args.custom_inflation_rate_2 = v;
    }

    args
}

fn default_args_for_api() -> ProjectionArgs {
    ProjectionArgs {
        current_total_asset: 4_000_000.0,
        annual_expense: 100_000.0,
        inflation_rate: 5.0,
        growth_rate: 7.0,
        years_to_live: 35,
        special_year_1: None,
        custom_growth_rate_1: 7.0,
        custom_spending_1: "100000".to_string(),
        custom_inflation_rate_1: 5.0,
        special_year_2: None,
        custom_growth_rate_2: 7.0,
        custom_spending_2: "100000".to_string(),
        custom_inflation_rate_2: 5.0,
    }
}
