//! Output formatting for the CLI.

use crate::config::{AppConfig, OutputFormat};
use crate::error::Result;
use colored::*;
use lethe_janitor::{ItemReport, Outcome, PassReport, StagedEntry};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the report of one pass.
    pub fn format_report(&self, report: &PassReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_report_json(report),
            OutputFormat::Table => Ok(self.format_report_table(report)),
            OutputFormat::Quiet => Ok(self.format_report_quiet(report)),
        }
    }

    fn format_report_json(&self, report: &PassReport) -> Result<String> {
        let items = |reports: &[ItemReport]| -> Vec<serde_json::Value> {
            reports.iter().map(item_json).collect()
        };

        let json = serde_json::json!({
            "started_at": report.started_at.to_rfc3339(),
            "dry_run": report.dry_run,
            "runtime_secs": report.runtime_secs,
            "reconciled": items(&report.reconciled),
            "swept": items(&report.swept),
            "scope_failures": report
                .scope_failures
                .iter()
                .map(|f| serde_json::json!({ "scope": f.scope, "message": f.message }))
                .collect::<Vec<_>>(),
        });

        Ok(serde_json::to_string_pretty(&json)?)
    }

    fn format_report_table(&self, report: &PassReport) -> String {
        let mut sections = Vec::new();

        // Stable items would drown the table
        let rows: Vec<(&str, &ItemReport)> = report
            .reconciled
            .iter()
            .map(|item| ("reconcile", item))
            .chain(report.swept.iter().map(|item| ("sweep", item)))
            .filter(|(_, item)| {
                !item.is_clean()
                    || !matches!(
                        item.outcome,
                        Outcome::Unchanged | Outcome::Excluded | Outcome::Pending { .. }
                    )
            })
            .collect();

        if rows.is_empty() {
            sections.push(self.info("Nothing changed."));
        } else {
            let mut builder = Builder::default();
            builder.push_record(["Phase", "Name", "Kind", "Outcome", "Expires", "Failures"]);
            for (phase, item) in rows {
                let failures: Vec<String> = item.failures.iter().map(|f| f.to_string()).collect();
                builder.push_record([
                    phase.to_string(),
                    item.item.name.clone(),
                    item.item.kind.to_string(),
                    item.outcome.label().to_string(),
                    item.outcome
                        .expires_on()
                        .map(|date| date.to_string())
                        .unwrap_or_default(),
                    failures.join("; "),
                ]);
            }
            sections.push(self.table(builder));
        }

        for failure in &report.scope_failures {
            sections.push(self.error(&format!("{}: {}", failure.scope, failure.message)));
        }

        let summary = format!(
            "{} staged, {} unstaged, {} deleted, {} pending, {} with failures ({:.1}s)",
            report.count(|o| matches!(o, Outcome::Staged { .. })),
            report.count(|o| matches!(o, Outcome::Unstaged { .. })),
            report.count(|o| matches!(o, Outcome::Deleted { .. })),
            report.count(|o| matches!(o, Outcome::Pending { .. })),
            report.failed_items(),
            report.runtime_secs
        );
        sections.push(if report.is_clean() {
            self.success(&summary)
        } else {
            self.warning(&summary)
        });

        if report.dry_run {
            sections.push(self.info("Dry run: nothing was changed."));
        }

        sections.join("\n")
    }

    /// Quiet mode: one `outcome<TAB>name` line per item that changed.
    fn format_report_quiet(&self, report: &PassReport) -> String {
        report
            .items()
            .filter(|item| {
                matches!(
                    item.outcome,
                    Outcome::Staged { .. }
                        | Outcome::Unstaged { .. }
                        | Outcome::Repaired
                        | Outcome::Deleted { .. }
                        | Outcome::Failed
                )
            })
            .map(|item| format!("{}\t{}", item.outcome.label(), item.item.name))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Format the staging collection listing.
    pub fn format_staged(&self, entries: &[StagedEntry]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = entries
                    .iter()
                    .map(|entry| {
                        serde_json::json!({
                            "id": entry.item.id.as_str(),
                            "name": entry.item.name,
                            "kind": entry.item.kind.as_str(),
                            "external_id": entry.item.external_id,
                            "expires_on": entry.expires_on.map(|date| date.to_string()),
                            "markers": entry.markers,
                            "read_error": entry.read_error,
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Table => {
                if entries.is_empty() {
                    return Ok(self.colorize("Nothing is staged.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["Name", "Kind", "Expires", "Markers"]);
                for entry in entries {
                    let (expires, markers) = match &entry.read_error {
                        Some(_) => ("unreadable".to_string(), "?".to_string()),
                        None => (
                            entry
                                .expires_on
                                .map(|date| date.to_string())
                                .unwrap_or_else(|| "-".to_string()),
                            entry.markers.to_string(),
                        ),
                    };
                    builder.push_record([
                        entry.item.name.clone(),
                        entry.item.kind.to_string(),
                        expires,
                        markers,
                    ]);
                }
                Ok(self.table(builder))
            }
            OutputFormat::Quiet => Ok(entries
                .iter()
                .map(|entry| entry.item.name.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    /// Format a validated configuration.
    pub fn format_config(&self, config: &AppConfig) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(config)?),
            OutputFormat::Quiet => Ok("ok".to_string()),
            OutputFormat::Table => {
                let janitor = &config.janitor;
                let mut builder = Builder::default();
                builder.push_record(["Setting", "Value"]);
                for (name, url) in config.endpoints() {
                    builder.push_record([name.to_string(), url.to_string()]);
                }
                builder.push_record(["staging collection".to_string(), janitor.staging_collection.clone()]);
                builder.push_record([
                    "deletion delay".to_string(),
                    format!("{} days", janitor.deletion_delay_days),
                ]);
                builder.push_record([
                    "check interval".to_string(),
                    format!("{} hours", janitor.check_interval_hours),
                ]);
                builder.push_record(["marker prefix".to_string(), janitor.marker_prefix.clone()]);
                builder.push_record(["dry run".to_string(), janitor.dry_run.to_string()]);
                for library in &janitor.libraries {
                    let mut rules = Vec::new();
                    if library.delete_if_watched_by_all {
                        rules.push("watched by all".to_string());
                    }
                    if library.max_age_days > 0 {
                        rules.push(format!("older than {} days", library.max_age_days));
                    }
                    if rules.is_empty() {
                        rules.push("no rule".to_string());
                    }
                    let mut value = rules.join(" or ");
                    if !library.exclusions.is_empty() {
                        value.push_str(&format!(", {} excluded", library.exclusions.len()));
                    }
                    builder.push_record([format!("library '{}'", library.name), value]);
                }

                Ok(format!(
                    "{}\n{}",
                    self.table(builder),
                    self.success("Configuration is valid")
                ))
            }
        }
    }

    fn table(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn item_json(report: &ItemReport) -> serde_json::Value {
    serde_json::json!({
        "id": report.item.id.as_str(),
        "name": report.item.name,
        "kind": report.item.kind.as_str(),
        "outcome": report.outcome.label(),
        "expires_on": report.outcome.expires_on().map(|date| date.to_string()),
        "failures": report
            .failures
            .iter()
            .map(|f| serde_json::json!({ "step": f.step.as_str(), "message": f.message }))
            .collect::<Vec<_>>(),
    })
}
