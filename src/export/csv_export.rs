use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use csv::WriterBuilder;

use crate::error::ExportError;
use crate::ingest::NameTable;
use crate::models::MatchReport;
use crate::summary::RunSummary;

// Sibling outputs hang off the absentee path: "out/absentees.csv" ->
// "out/absentees_allocations.csv" and friends.
fn sibling_path(base_path: &str, suffix: &str, ext: &str) -> String {
    let path = Path::new(base_path);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let parent = path.parent().and_then(|p| p.to_str()).unwrap_or("");

    if parent.is_empty() {
        format!("{stem}_{suffix}.{ext}")
    } else {
        format!("{parent}/{stem}_{suffix}.{ext}")
    }
}

pub fn allocations_output_path(base_path: &str) -> String {
    sibling_path(base_path, "allocations", "csv")
}

pub fn summary_output_path(base_path: &str) -> String {
    sibling_path(base_path, "summary", "csv")
}

pub fn report_json_output_path(base_path: &str) -> String {
    sibling_path(base_path, "report", "json")
}

/// Write the never-allocated roster rows, every original column intact,
/// in roster order.
pub fn export_absentees_csv(
    path: &str,
    table: &NameTable,
    report: &MatchReport,
) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let buf_writer = BufWriter::with_capacity(512 * 1024, file);
    // Source rows may be ragged; pass them through as they came in.
    let mut w = WriterBuilder::new().flexible(true).from_writer(buf_writer);
    w.write_record(&table.headers)?;
    for record in &report.unmatched_total {
        if let Some(row) = table.rows.get(record.source_index) {
            w.write_record(row)?;
        }
    }
    w.flush()?;
    Ok(())
}

/// One row per allocation: both sides plus the method label.
pub fn export_allocations_csv(path: &str, report: &MatchReport) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let buf_writer = BufWriter::with_capacity(512 * 1024, file);
    let mut w = WriterBuilder::new().from_writer(buf_writer);
    w.write_record([
        "Present_Index",
        "Present_Name",
        "Present_Normalized",
        "Roster_Index",
        "Roster_Name",
        "Roster_Normalized",
        "Method",
    ])?;
    for a in &report.allocations {
        w.write_record([
            a.present.source_index.to_string().as_str(),
            a.present.original.as_str(),
            a.present.normalized.as_str(),
            a.roster.source_index.to_string().as_str(),
            a.roster.original.as_str(),
            a.roster.normalized.as_str(),
            a.method.to_string().as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

pub fn export_summary_csv(path: &str, summary: &RunSummary) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let buf_writer = BufWriter::with_capacity(512 * 1024, file);
    let mut w = WriterBuilder::new().from_writer(buf_writer);
    w.write_record(["Key", "Value"])?;

    let mut write_kv = |k: &str, v: String| -> Result<(), ExportError> {
        w.write_record([k, v.as_str()])?;
        Ok(())
    };

    write_kv("Roster file", summary.total_path.clone())?;
    write_kv("Sign-in file", summary.present_path.clone())?;
    write_kv("Roster name column", summary.total_name_column.clone())?;
    write_kv("Sign-in name column", summary.present_name_column.clone())?;

    write_kv("Roster records", summary.total_records.to_string())?;
    write_kv("Sign-in records", summary.present_records.to_string())?;
    write_kv("Allocated", summary.allocated.to_string())?;
    write_kv("Absentees", summary.absentees.to_string())?;
    write_kv("Unmatched sign-ins", summary.unmatched_present.to_string())?;

    write_kv("Matches (exact)", summary.exact.to_string())?;
    write_kv("Matches (token)", summary.token.to_string())?;
    write_kv("Matches (fuzzy)", summary.fuzzy.to_string())?;
    write_kv("Matches (close-match)", summary.close_match.to_string())?;

    write_kv("Fuzzy cutoff", format!("{:.2}", summary.fuzzy_cutoff))?;
    write_kv("Token cutoff", format!("{:.2}", summary.token_cutoff))?;
    write_kv(
        "Close-match floor",
        format!("{:.2}", summary.close_match_cutoff),
    )?;

    let fmt_time = |dt: &chrono::DateTime<chrono::Utc>| -> String {
        format!("{} UTC", dt.format("%Y-%m-%d %H:%M:%S"))
    };
    // Human-readable HH:MM:SS (hours may exceed 23)
    let fmt_duration = |secs: f64| -> String {
        let total = secs.floor() as u64;
        let h = total / 3600;
        let m = (total % 3600) / 60;
        let s = total % 60;
        format!("{h:02}:{m:02}:{s:02}")
    };
    write_kv("Started", fmt_time(&summary.started_utc))?;
    write_kv("Ended", fmt_time(&summary.ended_utc))?;
    write_kv("Duration", fmt_duration(summary.duration_secs))?;

    write_kv("Memory total (MB)", summary.mem_total_mb.to_string())?;
    write_kv(
        "Memory used start (MB)",
        summary.mem_used_start_mb.to_string(),
    )?;
    write_kv("Memory used end (MB)", summary.mem_used_end_mb.to_string())?;

    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::{MatchThresholds, reconcile};
    use crate::models::build_records;

    fn temp_path(tag: &str) -> String {
        std::env::temp_dir()
            .join(format!(
                "am_export_{}_{}.csv",
                tag,
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap()
                    .as_nanos()
            ))
            .display()
            .to_string()
    }

    fn sample_table() -> NameTable {
        NameTable {
            path: "total.csv".into(),
            headers: vec!["RollNo".into(), "StudentName".into(), "Section".into()],
            rows: vec![
                vec!["1".into(), "Alice Kumar".into(), "A".into()],
                vec!["2".into(), "Bob Singh".into(), "B".into()],
                vec!["3".into(), "Meera Rao".into(), "A".into()],
            ],
            name_idx: 1,
        }
    }

    #[test]
    fn sibling_paths_keep_parent() {
        assert_eq!(
            allocations_output_path("out/absentees.csv"),
            "out/absentees_allocations.csv"
        );
        assert_eq!(summary_output_path("absentees.csv"), "absentees_summary.csv");
        assert_eq!(
            report_json_output_path("out/absentees.csv"),
            "out/absentees_report.json"
        );
    }

    #[test]
    fn absentee_rows_round_trip_original_columns() {
        let table = sample_table();
        let total = table.records();
        let present = build_records(["alice kumar"]);
        let report = reconcile(&total, &present, MatchThresholds::default()).unwrap();

        let path = temp_path("absent");
        export_absentees_csv(&path, &table, &report).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        assert_eq!(
            rdr.headers().unwrap().iter().collect::<Vec<_>>(),
            ["RollNo", "StudentName", "Section"]
        );
        let rows: Vec<Vec<String>> = rdr
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ["2", "Bob Singh", "B"]);
        assert_eq!(rows[1], ["3", "Meera Rao", "A"]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn allocations_csv_carries_method_labels() {
        let table = sample_table();
        let total = table.records();
        let present = build_records(["alice kumar", "bob"]);
        let report = reconcile(&total, &present, MatchThresholds::default()).unwrap();

        let path = temp_path("alloc");
        export_allocations_csv(&path, &report).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<Vec<String>> = rdr
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][6], "exact");
        assert_eq!(rows[1][1], "bob");
        assert_eq!(rows[1][6], "token:1.00");
        std::fs::remove_file(&path).ok();
    }
}
