//! CSV rendering with RFC-4180 quoting.

use std::io::Write;
use std::path::Path;

use mortarix_common::MaterialRecord;
use tracing::info;

/// Column headers, in output order. These match the record's serde names
/// so CSV and JSON views of a row agree.
pub const COLUMNS: [&str; 5] = [
    "Sl. No",
    "Material Name",
    "Test Name/Reference Code/Standard as per the given document (with reference page number)",
    "Specific Material Type/Material Definition",
    "Any other relevant information",
];

/// Quote a field when it carries a comma, quote, or line break; double
/// embedded quotes.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn row(record: &MaterialRecord) -> String {
    [
        record.serial.to_string(),
        record.material.clone(),
        record.references.clone(),
        record.definition.clone(),
        record.other_info.clone(),
    ]
    .iter()
    .map(|field| escape(field))
    .collect::<Vec<_>>()
    .join(",")
}

/// Render the full CSV document, header first.
pub fn render_csv(records: &[MaterialRecord]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(COLUMNS.map(escape).join(","));
    lines.extend(records.iter().map(row));
    let mut out = lines.join("\r\n");
    out.push_str("\r\n");
    out
}

/// Write the CSV report to disk.
pub fn write_csv(records: &[MaterialRecord], path: &Path) -> anyhow::Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(render_csv(records).as_bytes())?;
    info!("CSV report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mortarix_common::NO_INFORMATION;

    fn record() -> MaterialRecord {
        MaterialRecord {
            serial: 1,
            material: "Cement".to_string(),
            references: "1. IS 269 standard (Page 2)\n2. 4.1 Cement – IS 4031 (Page 3)".to_string(),
            definition: "43 Grade \"OPC\", grey".to_string(),
            other_info: NO_INFORMATION.to_string(),
        }
    }

    #[test]
    fn header_row_uses_canonical_columns() {
        let csv = render_csv(&[]);
        let header = csv.lines().next().unwrap();
        assert!(header.starts_with("Sl. No,Material Name,"));
        assert!(header.contains("Specific Material Type/Material Definition"));
    }

    #[test]
    fn multiline_and_quoted_fields_are_escaped() {
        let csv = render_csv(&[record()]);
        // References span two lines inside one quoted field
        assert!(csv.contains("\"1. IS 269 standard (Page 2)\n2. 4.1 Cement – IS 4031 (Page 3)\""));
        // Embedded quotes are doubled
        assert!(csv.contains("\"43 Grade \"\"OPC\"\", grey\""));
    }

    #[test]
    fn plain_fields_stay_unquoted() {
        let csv = render_csv(&[record()]);
        assert!(csv.contains("1,Cement,"));
        assert!(csv.contains(NO_INFORMATION));
        assert!(!csv.contains(&format!("\"{NO_INFORMATION}\"")));
    }
}
