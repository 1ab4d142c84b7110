use super::money::format_currency;
use super::types::{Inputs, ProjectionSummary, SpecialYear};

/// Which rule drives a single year's transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    First,
    Second,
    Standard,
}

// First match wins when both special years point at the same year.
fn select_branch(year: u32, special_year_1: Option<u32>, special_year_2: Option<u32>) -> Branch {
    if special_year_1 == Some(year) {
        Branch::First
    } else if special_year_2 == Some(year) {
        Branch::Second
    } else {
        Branch::Standard
    }
}

#[derive(Debug, Clone, Copy)]
struct YearRule {
    inflation_rate: f64,
    growth_rate: f64,
    /// `None` means the inflation-adjusted initial expense.
    spending_override: Option<f64>,
}

impl YearRule {
    fn standard(inputs: &Inputs) -> Self {
        Self {
            inflation_rate: inputs.inflation_rate,
            growth_rate: inputs.investment_growth_rate,
            spending_override: None,
        }
    }

    fn special(special: &SpecialYear) -> Self {
        Self {
            inflation_rate: special.inflation_rate,
            growth_rate: special.growth_rate,
            spending_override: Some(special.spending),
        }
    }
}

// Same precedence as `select_branch`: the first special year is checked first.
fn rule_for_year(inputs: &Inputs, year: u32) -> YearRule {
    inputs
        .special_year_1
        .filter(|special| special.year == year)
        .or(inputs.special_year_2.filter(|special| special.year == year))
        .map_or_else(|| YearRule::standard(inputs), |special| YearRule::special(&special))
}

/// Yearly total assets, index 0 being today. Once the balance would go
/// negative the remaining years are reported as exactly zero.
pub fn project(inputs: &Inputs) -> Vec<f64> {
    let years_to_live = inputs.years_to_live.max(1) as usize;
    let mut total_assets = Vec::with_capacity(years_to_live);
    total_assets.push(inputs.current_total_asset);

    let mut compound_inflation = 1.0;
    let mut balance = inputs.current_total_asset;

    for year in 1..inputs.years_to_live {
        let rule = rule_for_year(inputs, year);
        compound_inflation *= 1.0 + rule.inflation_rate;
        let expense = rule
            .spending_override
            .unwrap_or(inputs.initial_expense * compound_inflation);

        balance = balance * (1.0 + rule.growth_rate) - expense;

        if balance < 0.0 {
            total_assets.resize(years_to_live, 0.0);
            break;
        }
        total_assets.push(balance);
    }

    total_assets
}

/// Expense that inflation alone would produce by `target_year`, honouring the
/// custom inflation of any special year passed on the way.
pub fn natural_spending(
    initial_expense: f64,
    inflation_rate: f64,
    target_year: u32,
    special_year_1: Option<u32>,
    custom_inflation_rate_1: f64,
    special_year_2: Option<u32>,
    custom_inflation_rate_2: f64,
) -> f64 {
    let mut compound_inflation = 1.0;
    for year in 1..=target_year {
        let rate = match select_branch(year, special_year_1, special_year_2) {
            Branch::First => custom_inflation_rate_1,
            Branch::Second => custom_inflation_rate_2,
            Branch::Standard => inflation_rate,
        };
        compound_inflation *= 1.0 + rate;
    }
    initial_expense * compound_inflation
}

/// Buying power of a final balance in first-year dollars, discounted at the
/// standard inflation rate.
pub fn real_value(balance: f64, inflation_rate: f64, years_to_live: u32) -> f64 {
    let elapsed = years_to_live.saturating_sub(1);
    balance / (1.0 + inflation_rate).powf(f64::from(elapsed))
}

pub fn summarize(inputs: &Inputs, total_assets: Vec<f64>) -> ProjectionSummary {
    let remaining_total_asset = total_assets.last().copied().unwrap_or(0.0);
    let remaining_real_value =
        real_value(remaining_total_asset, inputs.inflation_rate, inputs.years_to_live);
    let peak = total_assets.iter().copied().fold(0.0_f64, f64::max);

    ProjectionSummary {
        years: (0..total_assets.len() as u32).collect(),
        annotation: format!(
            "Remaining: {}<br>Real Value: {}",
            format_currency(remaining_total_asset),
            format_currency(remaining_real_value)
        ),
        y_axis_max: peak * 1.1,
        remaining_total_asset,
        remaining_real_value,
        total_assets,
    }
}

pub fn run_projection(inputs: &Inputs) -> ProjectionSummary {
    summarize(inputs, project(inputs))
}
