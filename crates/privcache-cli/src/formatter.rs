//! Output formatters for privilege snapshots.

use clap::ValueEnum;
use comfy_table::Table;
use privcache_core::{PrivilegeBits, ReloadReport, Snapshot};

/// Output format for snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter: Send + Sync {
    /// Format a published snapshot.
    fn format_snapshot(&self, snapshot: &Snapshot) -> String;

    /// Format the summary of a successful reload.
    fn format_report(&self, report: &ReloadReport) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_snapshot(&self, snapshot: &Snapshot) -> String {
        let mut sections = vec![format!(
            "generation {} loaded at {}",
            snapshot.generation(),
            snapshot.loaded_at().format("%Y-%m-%d %H:%M:%S UTC")
        )];

        let mut users = Table::new();
        users.set_header(vec!["Host", "User", "Privileges"]);
        for record in snapshot.users() {
            users.add_row(vec![
                record.host.clone(),
                record.user.clone(),
                privileges(record.privileges),
            ]);
        }
        sections.push(format!("user ({})\n{}", snapshot.users().len(), users));

        let mut dbs = Table::new();
        dbs.set_header(vec!["Host", "Db", "User", "Privileges"]);
        for record in snapshot.dbs() {
            dbs.add_row(vec![
                record.host.clone(),
                record.db.clone(),
                record.user.clone(),
                privileges(record.privileges),
            ]);
        }
        sections.push(format!("db ({})\n{}", snapshot.dbs().len(), dbs));

        let mut tables = Table::new();
        tables.set_header(vec![
            "Host",
            "Db",
            "User",
            "Table",
            "Grantor",
            "Granted",
            "Table privileges",
            "Column privileges",
        ]);
        for record in snapshot.tables_privs() {
            tables.add_row(vec![
                record.host.clone(),
                record.db.clone(),
                record.user.clone(),
                record.table.clone(),
                record.grantor.clone(),
                record.granted_at.to_string(),
                privileges(record.table_privileges),
                privileges(record.column_privileges),
            ]);
        }
        sections.push(format!(
            "tables_priv ({})\n{}",
            snapshot.tables_privs().len(),
            tables
        ));

        let mut columns = Table::new();
        columns.set_header(vec![
            "Host",
            "Db",
            "User",
            "Table",
            "Column",
            "Granted",
            "Privileges",
        ]);
        for record in snapshot.columns_privs() {
            columns.add_row(vec![
                record.host.clone(),
                record.db.clone(),
                record.user.clone(),
                record.table.clone(),
                record.column.clone(),
                record.granted_at.to_string(),
                privileges(record.privileges),
            ]);
        }
        sections.push(format!(
            "columns_priv ({})\n{}",
            snapshot.columns_privs().len(),
            columns
        ));

        sections.join("\n\n")
    }

    fn format_report(&self, report: &ReloadReport) -> String {
        let mut output = format!(
            "generation {} loaded {} record(s) in {:.2?}",
            report.generation,
            report.counts.total(),
            report.elapsed
        );
        for warning in &report.warnings {
            output.push_str(&format!("\nwarning: {}", warning));
        }
        output
    }
}

fn privileges(bits: PrivilegeBits) -> String {
    if bits.is_empty() {
        "-".to_string()
    } else {
        bits.iter_names()
            .map(|(name, _)| name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_snapshot(&self, snapshot: &Snapshot) -> String {
        serde_json::to_string_pretty(snapshot)
            .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }

    fn format_report(&self, report: &ReloadReport) -> String {
        let warnings: Vec<String> = report.warnings.iter().map(|w| w.to_string()).collect();
        serde_json::json!({
            "generation": report.generation,
            "counts": report.counts,
            "warnings": warnings,
            "elapsed_ms": report.elapsed.as_millis() as u64,
        })
        .to_string()
    }
}
