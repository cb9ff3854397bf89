// Colored terminal output for the daily cohort run.

use colored::Colorize;

use crate::cohort::CohortSummary;

/// Display a completed cohort run's per-category qualified/empathy counts.
pub fn display_cohort_summary(summary: &CohortSummary) {
    println!("\n{}", "=== Daily Cohort Run ===".bold());

    for (category, cohort) in summary {
        let qualified = cohort.qualified.len();
        let empathy = cohort.empathy.len();

        let qualified_str = if qualified > 0 {
            qualified.to_string().green()
        } else {
            qualified.to_string().dimmed()
        };
        let empathy_str = if empathy > 0 {
            empathy.to_string().yellow()
        } else {
            empathy.to_string().dimmed()
        };

        println!(
            "  {:<10} qualified: {:>5}   empathy: {:>5}",
            category.as_str(),
            qualified_str,
            empathy_str,
        );
    }
}
