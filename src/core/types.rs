use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the projection engine. Every component validates its
/// arguments at the call boundary and fails fast; there is no recovery path.
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Maps a vehicle age in whole years to the fractional value lost over that
/// year of ownership.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum DepreciationRate {
    Flat {
        rate: f64,
    },
    TwoStage {
        initial_rate: f64,
        later_rate: f64,
        breakpoint_age: u32,
    },
}

impl DepreciationRate {
    pub fn rate_for_age(self, age: u32) -> f64 {
        match self {
            DepreciationRate::Flat { rate } => rate,
            DepreciationRate::TwoStage {
                initial_rate,
                later_rate,
                breakpoint_age,
            } => {
                if age < breakpoint_age {
                    initial_rate
                } else {
                    later_rate
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Inputs {
    pub initial_vehicle_value: f64,
    pub initial_vehicle_age: u32,
    pub depreciation_rate: DepreciationRate,
    pub years: u32,
    pub km_per_year: f64,
    pub litres_per_100km: f64,
    pub inflation: f64,
    pub initial_fuel_price: f64,
    pub initial_service_cost: f64,
    pub service_interval_km: f64,
    pub service_interval_years: f64,
    pub tyre_replacement_interval: f64,
    pub initial_cost_per_tyre: f64,
    pub insurance_per_year: f64,
    pub registration_per_year: f64,
    pub roadside_assist_per_year: f64,
    pub detailing_per_year: f64,
}

/// Vehicle value at the start of each year and the loss attributed to it.
#[derive(Debug, Clone)]
pub struct DepreciationSchedule {
    pub value_at_start: Vec<f64>,
    pub loss_in_year: Vec<f64>,
}

/// Per-year costs that depend on distance travelled.
#[derive(Debug, Clone)]
pub struct RunningCosts {
    pub cumulative_distance: Vec<f64>,
    pub depreciated_value: Vec<f64>,
    pub depreciation_loss: Vec<f64>,
    pub fuel_cost: Vec<f64>,
    pub tyre_cost: Vec<f64>,
    pub service_cost: Vec<f64>,
}

/// Per-year flat fees that accrue whether or not the vehicle moves.
#[derive(Debug, Clone)]
pub struct StandingCosts {
    pub insurance_cost: Vec<f64>,
    pub registration_cost: Vec<f64>,
    pub roadside_assist_cost: Vec<f64>,
    pub detailing_cost: Vec<f64>,
}

/// One row of the yearly cost table: every category attributable to the year
/// plus the category-group subtotals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearCosts {
    pub year: u32,
    pub insurance: f64,
    pub registration: f64,
    pub roadside_assist: f64,
    pub detailing: f64,
    pub depreciation: f64,
    pub fuel: f64,
    pub tyres: f64,
    pub service: f64,
    pub running_total: f64,
    pub standing_total: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub yearly_costs: Vec<YearCosts>,
    pub depreciated_value: Vec<f64>,
    pub cumulative_distance: Vec<f64>,
    pub running_cost_total: f64,
    pub standing_cost_total: f64,
    pub total_cost: f64,
}
