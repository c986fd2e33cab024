//! Output formatting helpers for human-readable and JSON output.

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// How one background sync unit ended.
pub struct UnitReport {
    pub id: String,
    pub operation: String,
    pub succeeded: bool,
    pub detail: String,
}

impl UnitReport {
    fn status(&self) -> &'static str {
        if self.succeeded { "ok" } else { "failed" }
    }
}

/// Print one line per unit with the id, operation and status columns aligned.
pub fn print_reports(reports: &[UnitReport]) {
    if reports.is_empty() {
        println!("No events replayed.");
        return;
    }

    let id_width = reports.iter().map(|r| r.id.len()).max().unwrap_or(0);
    let op_width = reports
        .iter()
        .map(|r| r.operation.len())
        .max()
        .unwrap_or(0)
        .max("OPERATION".len());

    println!("{:<id_width$}  {:<op_width$}  {:<6}  DETAIL", "ID", "OPERATION", "STATUS");
    for report in reports {
        println!(
            "{:<id_width$}  {:<op_width$}  {:<6}  {}",
            report.id,
            report.operation,
            report.status(),
            report.detail
        );
    }
}
