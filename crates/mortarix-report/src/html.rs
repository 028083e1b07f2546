//! HTML report rendering via minijinja.

use std::io::Write;
use std::path::Path;

use minijinja::{context, Environment};
use mortarix_common::MaterialRecord;
use serde::Serialize;
use tracing::info;

const TEMPLATE: &str = include_str!("../templates/report.html");

#[derive(Serialize)]
struct RowContext {
    serial: u32,
    material: String,
    reference_lines: Vec<String>,
    definition: String,
    other_info: String,
}

impl From<&MaterialRecord> for RowContext {
    fn from(record: &MaterialRecord) -> Self {
        Self {
            serial: record.serial,
            material: record.material.clone(),
            reference_lines: record.references.lines().map(str::to_string).collect(),
            definition: record.definition.clone(),
            other_info: record.other_info.clone(),
        }
    }
}

/// Render the report page. Multi-line reference cells become `<br>`
/// separated lines; everything else is escaped by the template engine.
pub fn render_html(records: &[MaterialRecord], title: &str) -> anyhow::Result<String> {
    let mut env = Environment::new();
    // The .html name turns on minijinja's auto-escaping for field values.
    env.add_template("report.html", TEMPLATE)?;
    let rows: Vec<RowContext> = records.iter().map(RowContext::from).collect();
    let html = env.get_template("report.html")?.render(context! { title, rows })?;
    Ok(html)
}

/// Write the HTML report to disk.
pub fn write_html(records: &[MaterialRecord], title: &str, path: &Path) -> anyhow::Result<()> {
    let html = render_html(records, title)?;
    let mut file = std::fs::File::create(path)?;
    file.write_all(html.as_bytes())?;
    info!("HTML report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mortarix_common::NO_INFORMATION;

    fn record() -> MaterialRecord {
        MaterialRecord {
            serial: 2,
            material: "Fine Aggregate".to_string(),
            references: "1. IS 383 grading (Page 2)\n2. TABLE 3.1 (Page 2)".to_string(),
            definition: "sand passing a 4.75 mm sieve".to_string(),
            other_info: NO_INFORMATION.to_string(),
        }
    }

    #[test]
    fn report_contains_rows_and_title() {
        let html = render_html(&[record()], "Material Extraction Report").unwrap();
        assert!(html.contains("<h1>Material Extraction Report</h1>"));
        assert!(html.contains("Fine Aggregate"));
        assert!(html.contains("sand passing a 4.75 mm sieve"));
    }

    #[test]
    fn reference_lines_are_br_separated() {
        let html = render_html(&[record()], "Report").unwrap();
        assert!(html.contains("1. IS 383 grading (Page 2)<br>2. TABLE 3.1 (Page 2)"));
    }

    #[test]
    fn markup_in_fields_is_escaped() {
        let mut rec = record();
        rec.definition = "<script>alert(1)</script>".to_string();
        let html = render_html(&[rec], "Report").unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
