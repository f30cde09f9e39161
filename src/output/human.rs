//! Human-readable output formatting

use crate::bootstrap::LaunchPlan;

pub fn format_human(plan: &LaunchPlan) -> String {
    let mut output = format!(
        "Container: {}\n\
         {}\n\
         Entry point: {}\n",
        plan.container,
        "-".repeat(plan.container.len() + 11),
        plan.entry_point.as_deref().unwrap_or("(none)")
    );

    output.push_str("\nSearch path\n-----------\n");
    let search_path = plan.search_path();
    if search_path.is_empty() {
        output.push_str("  (empty, parent only)\n");
    }
    for (i, uri) in search_path.iter().enumerate() {
        output.push_str(&format!("  {}. {}\n", i + 1, uri));
    }

    if !plan.attributes.is_empty() {
        output.push_str("\nAttributes\n----------\n");
        let width = plan.attributes.keys().map(|k| k.len()).max().unwrap_or(0);
        for (name, value) in &plan.attributes {
            output.push_str(&format!("  {:<width$}  {}\n", name, truncate(value, 60), width = width));
        }
    }

    output
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
