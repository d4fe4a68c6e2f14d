use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{DepreciationRate, Inputs, ProjectionResult, YearCosts, run_projection};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliDepreciationModel {
    Flat,
    TwoStage,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
enum ApiDepreciationModel {
    Flat,
    #[serde(alias = "twoStage", alias = "two_stage")]
    TwoStage,
}

impl From<ApiDepreciationModel> for CliDepreciationModel {
    fn from(value: ApiDepreciationModel) -> Self {
        match value {
            ApiDepreciationModel::Flat => CliDepreciationModel::Flat,
            ApiDepreciationModel::TwoStage => CliDepreciationModel::TwoStage,
        }
    }
}

impl From<DepreciationRate> for ApiDepreciationModel {
    fn from(value: DepreciationRate) -> Self {
        match value {
            DepreciationRate::Flat { .. } => ApiDepreciationModel::Flat,
            DepreciationRate::TwoStage { .. } => ApiDepreciationModel::TwoStage,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectionPayload {
    initial_vehicle_value: Option<f64>,
    initial_vehicle_age: Option<u32>,
    depreciation_model: Option<ApiDepreciationModel>,
    depreciation_rate: Option<f64>,
    early_depreciation_rate: Option<f64>,
    late_depreciation_rate: Option<f64>,
    depreciation_breakpoint_age: Option<u32>,
    years: Option<u32>,
    km_per_year: Option<f64>,
    litres_per_100km: Option<f64>,
    inflation_rate: Option<f64>,
    initial_fuel_price: Option<f64>,
    initial_service_cost: Option<f64>,
    service_interval_km: Option<f64>,
    service_interval_years: Option<f64>,
    tyre_replacement_interval: Option<f64>,
    initial_cost_per_tyre: Option<f64>,
    insurance_per_year: Option<f64>,
    registration_per_year: Option<f64>,
    roadside_assist_per_year: Option<f64>,
    detailing_per_year: Option<f64>,
}

#[derive(Parser, Debug)]
#[command(
    name = "carcost",
    about = "Vehicle total cost of ownership projector (depreciation + fuel + tyres + servicing + standing fees)"
)]
struct Cli {
    #[arg(
        long,
        default_value_t = 40_000.0,
        help = "Vehicle purchase value at the start of the projection"
    )]
    initial_vehicle_value: f64,
    #[arg(
        long,
        default_value_t = 0,
        help = "Vehicle age in whole years at the start of the projection"
    )]
    initial_vehicle_age: u32,
    #[arg(
        long,
        value_enum,
        default_value_t = CliDepreciationModel::Flat,
        help = "Depreciation model: flat rate, or two-stage with a breakpoint age"
    )]
    depreciation_model: CliDepreciationModel,
    #[arg(
        long,
        default_value_t = 10.0,
        help = "Flat depreciation rate in percent per year of age"
    )]
    depreciation_rate: f64,
    #[arg(
        long,
        default_value_t = 15.0,
        help = "Two-stage: depreciation rate in percent before the breakpoint age"
    )]
    early_depreciation_rate: f64,
    #[arg(
        long,
        default_value_t = 10.0,
        help = "Two-stage: depreciation rate in percent at and after the breakpoint age"
    )]
    late_depreciation_rate: f64,
    #[arg(
        long,
        default_value_t = 3,
        help = "Two-stage: vehicle age where the rate switches"
    )]
    depreciation_breakpoint_age: u32,
    #[arg(long, default_value_t = 10, help = "Number of years to project")]
    years: u32,
    #[arg(long, default_value_t = 15_000.0)]
    km_per_year: f64,
    #[arg(
        long,
        default_value_t = 10.0,
        help = "Fuel consumption in litres per 100 km"
    )]
    litres_per_100km: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        help = "Annual inflation applied to all prices, in percent"
    )]
    inflation_rate: f64,
    #[arg(
        long,
        default_value_t = 1.50,
        help = "Fuel price per litre in the first year"
    )]
    initial_fuel_price: f64,
    #[arg(
        long,
        default_value_t = 400.0,
        help = "Cost of one scheduled service in the first year"
    )]
    initial_service_cost: f64,
    #[arg(
        long,
        default_value_t = 15_000.0,
        help = "Distance between scheduled services in km"
    )]
    service_interval_km: f64,
    #[arg(
        long,
        default_value_t = 1.0,
        help = "Elapsed time between scheduled services in years"
    )]
    service_interval_years: f64,
    #[arg(
        long,
        default_value_t = 15_000.0,
        help = "Distance between tyre set replacements in km"
    )]
    tyre_replacement_interval: f64,
    #[arg(
        long,
        default_value_t = 300.0,
        help = "Cost of one tyre in the first year"
    )]
    initial_cost_per_tyre: f64,
    #[arg(long, default_value_t = 500.0)]
    insurance_per_year: f64,
    #[arg(long, default_value_t = 500.0)]
    registration_per_year: f64,
    #[arg(long, default_value_t = 200.0)]
    roadside_assist_per_year: f64,
    #[arg(
        long,
        default_value_t = 120.0,
        help = "Detailing and car washes in the first year"
    )]
    detailing_per_year: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionResponse {
    years: u32,
    km_per_year: f64,
    inflation_rate: f64,
    depreciation_model: ApiDepreciationModel,
    yearly_costs: Vec<YearCosts>,
    depreciated_value: Vec<f64>,
    cumulative_distance: Vec<f64>,
    running_cost_total: f64,
    standing_cost_total: f64,
    total_cost: f64,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: Cli) -> Result<Inputs, String> {
    if cli.years < 1 {
        return Err("--years must be >= 1".to_string());
    }

    if !cli.initial_vehicle_value.is_finite() || cli.initial_vehicle_value < 0.0 {
        return Err("--initial-vehicle-value must be >= 0".to_string());
    }

    if !cli.km_per_year.is_finite() || cli.km_per_year <= 0.0 {
        return Err("--km-per-year must be > 0".to_string());
    }

    if !cli.litres_per_100km.is_finite() || cli.litres_per_100km < 0.0 {
        return Err("--litres-per-100km must be >= 0".to_string());
    }

    if !(0.0..=100.0).contains(&cli.inflation_rate) {
        return Err("--inflation-rate must be between 0 and 100".to_string());
    }

    for (name, rate) in [
        ("--depreciation-rate", cli.depreciation_rate),
        ("--early-depreciation-rate", cli.early_depreciation_rate),
        ("--late-depreciation-rate", cli.late_depreciation_rate),
    ] {
        if !(0.0..=100.0).contains(&rate) {
            return Err(format!("{name} must be between 0 and 100"));
        }
    }

    for (name, price) in [
        ("--initial-fuel-price", cli.initial_fuel_price),
        ("--initial-service-cost", cli.initial_service_cost),
        ("--initial-cost-per-tyre", cli.initial_cost_per_tyre),
    ] {
        if !price.is_finite() || price < 0.0 {
            return Err(format!("{name} must be >= 0"));
        }
    }

    for (name, interval) in [
        ("--service-interval-km", cli.service_interval_km),
        ("--service-interval-years", cli.service_interval_years),
        ("--tyre-replacement-interval", cli.tyre_replacement_interval),
    ] {
        if !interval.is_finite() || interval <= 0.0 {
            return Err(format!("{name} must be > 0"));
        }
    }

    for (name, fee) in [
        ("--insurance-per-year", cli.insurance_per_year),
        ("--registration-per-year", cli.registration_per_year),
        ("--roadside-assist-per-year", cli.roadside_assist_per_year),
        ("--detailing-per-year", cli.detailing_per_year),
    ] {
        if !fee.is_finite() || fee < 0.0 {
            return Err(format!("{name} must be >= 0"));
        }
    }

    let depreciation_rate = match cli.depreciation_model {
        CliDepreciationModel::Flat => DepreciationRate::Flat {
            rate: cli.depreciation_rate / 100.0,
        },
        CliDepreciationModel::TwoStage => DepreciationRate::TwoStage {
            initial_rate: cli.early_depreciation_rate / 100.0,
            later_rate: cli.late_depreciation_rate / 100.0,
            breakpoint_age: cli.depreciation_breakpoint_age,
        },
    };

    Ok(Inputs {
        initial_vehicle_value: cli.initial_vehicle_value,
        initial_vehicle_age: cli.initial_vehicle_age,
        depreciation_rate,
        years: cli.years,
        km_per_year: cli.km_per_year,
        litres_per_100km: cli.litres_per_100km,
        inflation: cli.inflation_rate / 100.0,
        initial_fuel_price: cli.initial_fuel_price,
        initial_service_cost: cli.initial_service_cost,
        service_interval_km: cli.service_interval_km,
        service_interval_years: cli.service_interval_years,
        tyre_replacement_interval: cli.tyre_replacement_interval,
        initial_cost_per_tyre: cli.initial_cost_per_tyre,
        insurance_per_year: cli.insurance_per_year,
        registration_per_year: cli.registration_per_year,
        roadside_assist_per_year: cli.roadside_assist_per_year,
        detailing_per_year: cli.detailing_per_year,
    })
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("carcost HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/api/project");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<ProjectionPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_post_handler(Json(payload): Json<ProjectionPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_handler_impl(payload: ProjectionPayload) -> Response {
    let inputs = match inputs_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match run_projection(&inputs) {
        Ok(projection) => {
            json_response(StatusCode::OK, build_projection_response(&inputs, projection))
        }
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

fn build_projection_response(inputs: &Inputs, projection: ProjectionResult) -> ProjectionResponse {
    ProjectionResponse {
        years: inputs.years,
        km_per_year: inputs.km_per_year,
        inflation_rate: inputs.inflation * 100.0,
        depreciation_model: inputs.depreciation_rate.into(),
        yearly_costs: projection.yearly_costs,
        depreciated_value: projection.depreciated_value,
        cumulative_distance: projection.cumulative_distance,
        running_cost_total: projection.running_cost_total,
        standing_cost_total: projection.standing_cost_total,
        total_cost: projection.total_cost,
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
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
fn inputs_from_json(json: &str) -> Result<Inputs, String> {
    let payload = serde_json::from_str::<ProjectionPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    inputs_from_payload(payload)
}

fn inputs_from_payload(payload: ProjectionPayload) -> Result<Inputs, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.initial_vehicle_value {
        cli.initial_vehicle_value = v;
    }
    if let Some(v) = payload.initial_vehicle_age {
        cli.initial_vehicle_age = v;
    }
    if let Some(v) = payload.depreciation_model {
        cli.depreciation_model = v.into();
    }
    if let Some(v) = payload.depreciation_rate {
        cli.depreciation_rate = v;
    }
    if let Some(v) = payload.early_depreciation_rate {
        cli.early_depreciation_rate = v;
    }
    if let Some(v) = payload.late_depreciation_rate {
        cli.late_depreciation_rate = v;
    }
    if let Some(v) = payload.depreciation_breakpoint_age {
        cli.depreciation_breakpoint_age = v;
    }
    if let Some(v) = payload.years {
        cli.years = v;
    }
    if let Some(v) = payload.km_per_year {
        cli.km_per_year = v;
    }
    if let Some(v) = payload.litres_per_100km {
        cli.litres_per_100km = v;
    }
    if let Some(v) = payload.inflation_rate {
        cli.inflation_rate = v;
    }
    if let Some(v) = payload.initial_fuel_price {
        cli.initial_fuel_price = v;
    }
    if let Some(v) = payload.initial_service_cost {
        cli.initial_service_cost = v;
    }
    if let Some(v) = payload.service_interval_km {
        cli.service_interval_km = v;
    }
    if let Some(v) = payload.service_interval_years {
        cli.service_interval_years = v;
    }
    if let Some(v) = payload.tyre_replacement_interval {
        cli.tyre_replacement_interval = v;
    }
    if let Some(v) = payload.initial_cost_per_tyre {
        cli.initial_cost_per_tyre = v;
    }
    if let Some(v) = payload.insurance_per_year {
        cli.insurance_per_year = v;
    }
    if let Some(v) = payload.registration_per_year {
        cli.registration_per_year = v;
    }
    if let Some(v) = payload.roadside_assist_per_year {
        cli.roadside_assist_per_year = v;
    }
    if let Some(v) = payload.detailing_per_year {
        cli.detailing_per_year = v;
    }

    build_inputs(cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        initial_vehicle_value: 40_000.0,
        initial_vehicle_age: 0,
        depreciation_model: CliDepreciationModel::Flat,
        depreciation_rate: 10.0,
        early_depreciation_rate: 15.0,
        late_depreciation_rate: 10.0,
        depreciation_breakpoint_age: 3,
        years: 10,
        km_per_year: 15_000.0,
        litres_per_100km: 10.0,
        inflation_rate: 2.0,
        initial_fuel_price: 1.50,
        initial_service_cost: 400.0,
        service_interval_km: 15_000.0,
        service_interval_years: 1.0,
        tyre_replacement_interval: 15_000.0,
        initial_cost_per_tyre: 300.0,
        insurance_per_year: 500.0,
        registration_per_year: 500.0,
        roadside_assist_per_year: 200.0,
        detailing_per_year: 120.0,
    }
}
