//! Output formatting

use crate::bootstrap::LaunchPlan;
use crate::output::human::format_human;
use crate::output::json::format_json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

pub fn format_plan(plan: &LaunchPlan, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Human => format_human(plan),
        OutputFormat::Json => format_json(plan),
    }
}
