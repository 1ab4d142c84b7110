use serde::Serialize;

/// Override applied for exactly one year of the projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecialYear {
    pub year: u32,
    pub growth_rate: f64,
    /// Absolute spending for that year, not inflation adjusted.
    pub spending: f64,
    pub inflation_rate: f64,
}

#[derive(Debug, Clone)]
pub struct Inputs {
    pub current_total_asset: f64,
    pub initial_expense: f64,
    pub inflation_rate: f64,
    pub investment_growth_rate: f64,
    pub years_to_live: u32,
    pub special_year_1: Option<SpecialYear>,
    pub special_year_2: Option<SpecialYear>,
}

/// Chart-ready view of one projection run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub years: Vec<u32>,
    pub total_assets: Vec<f64>,
    pub remaining_total_asset: f64,
    pub remaining_real_value: f64,
    pub annotation: String,
    pub y_axis_max: f64,
}
