//! Console progress and summary output

use crate::migration::{MigrationReport, MigrationStep, StepError, StepObserver};
use colored::*;
use std::path::Path;

/// Prints one line per step as the migration advances
#[derive(Default)]
pub struct ConsoleObserver;

impl StepObserver for ConsoleObserver {
    fn step_started(&mut self, step: MigrationStep) {
        println!(
            "  {} {}",
            format!("[{}/{}]", step.number(), MigrationStep::ALL.len()).dimmed(),
            step.name().bright_white()
        );
    }

    fn step_finished(&mut self, _step: MigrationStep, summary: &str) {
        println!("      {} {}", "✓".bright_green(), summary.dimmed());
    }
}

pub fn print_header(source_tenant: &str, destination_tenant: &str, questionnaire: &str) {
    println!();
    println!("  {}", "Resource cloner".bright_blue().bold());
    println!("  {}", "═══════════════".bright_blue());
    println!("    {}: {}", "Source".dimmed(), source_tenant.cyan());
    println!("    {}: {}", "Destination".dimmed(), destination_tenant.cyan());
    println!("    {}: {}", "Questionnaire".dimmed(), questionnaire.bright_yellow());
    println!();
}

pub fn print_report(report: &MigrationReport, artifacts_dir: &Path) {
    println!();
    println!("  {}", "✓ Migration complete".bright_green().bold());
    println!(
        "    {}: {}",
        "Questionnaire".dimmed(),
        report.destination_questionnaire_id.bright_green()
    );
    println!(
        "    {}: {} sections, {} questions",
        "Structure".dimmed(),
        report.sections,
        report.questions
    );
    for (label, stats) in [
        ("Custom fields", &report.custom_fields),
        ("Triggers", &report.triggers),
        ("Actions", &report.actions),
    ] {
        println!(
            "    {}: {} created, {} skipped",
            label.dimmed(),
            stats.created.to_string().white(),
            stats.skipped
        );
    }
    println!("    {}: {}", "Artifacts".dimmed(), artifacts_dir.display().to_string().cyan());
    println!("    {}: {}ms", "Elapsed".dimmed(), report.elapsed_ms);
}

pub fn print_failure(error: &StepError) {
    eprintln!();
    eprintln!(
        "  {} {} {}",
        "✗".bright_red(),
        format!("{} failed:", error.step.name()).red().bold(),
        error.message
    );
    eprintln!("  {}", "Resources created by earlier steps were not rolled back.".yellow());
}
