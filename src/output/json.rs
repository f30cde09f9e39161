//! JSON output formatting

use crate::bootstrap::LaunchPlan;
use serde_json::{json, Value};

pub fn format_json(plan: &LaunchPlan) -> String {
    let mut data: Value = serde_json::to_value(plan).unwrap_or(json!(null));
    if let Some(fields) = data.as_object_mut() {
        fields.insert("search_path".to_string(), json!(plan.search_path()));
    }

    serde_json::to_string_pretty(&data).unwrap_or_else(|_| "{}".to_string())
}
