mod engine;
mod money;
mod types;

pub use engine::{natural_spending, project, real_value, run_projection, summarize};
pub use money::{
    DEFAULT_CUSTOM_SPENDING, MoneyParseError, format_currency, format_percent, parse_money,
    parse_money_or_default,
};
pub use types::{Inputs, ProjectionSummary, SpecialYear};
