use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};

mod cli;
mod config;
mod error;
mod export;
mod ingest;
mod matching;
mod metrics;
mod models;
mod normalize;
mod summary;
mod util;

use crate::cli::Cli;
use crate::config::AppConfig;
use crate::export::csv_export::{
    allocations_output_path, export_absentees_csv, export_allocations_csv, export_summary_csv,
    report_json_output_path, summary_output_path,
};
use crate::export::json_export::export_report_json;
use crate::ingest::load_name_table;
use crate::matching::{ProgressConfig, nearest_candidates, reconcile_with_progress};
use crate::metrics::memory_stats_mb;
use crate::summary::SummaryBuilder;
use crate::util::envfile::{load_dotenv_if_present, write_env_template};

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    load_dotenv_if_present()?;

    let args: Vec<String> = std::env::args().collect();
    // Utility subcommand: generate .env.template
    if args.get(1).map(|s| s.as_str()) == Some("env-template") {
        let path = args
            .get(2)
            .cloned()
            .unwrap_or_else(|| ".env.template".to_string());
        write_env_template(&path)?;
        println!("Wrote {}. Copy to .env and edit values as needed.", path);
        return Ok(());
    }

    let cli = Cli::parse();
    let cfg: AppConfig = match cli.to_app_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };

    let started = chrono::Utc::now();
    let run_timer = std::time::Instant::now();
    let mem_start = memory_stats_mb();

    let total_table = load_name_table(
        &cfg.input.total_path,
        cfg.input.total_name_column.as_deref(),
    )
    .with_context(|| format!("loading roster {}", cfg.input.total_path))?;
    let present_table = load_name_table(
        &cfg.input.present_path,
        cfg.input.present_name_column.as_deref(),
    )
    .with_context(|| format!("loading sign-in list {}", cfg.input.present_path))?;

    let total = total_table.records();
    let present = present_table.records();
    info!(
        "reconciling {} roster records against {} sign-ins",
        total.len(),
        present.len()
    );

    let progress_cfg = ProgressConfig {
        update_every: cli.progress_every,
    };
    let report = reconcile_with_progress(
        &total,
        &present,
        cfg.matching.thresholds(),
        progress_cfg,
        |u| {
            info!(
                "[{}] Progress: {:.1}% | ETA: {}s | Mem used: {} MB | Avail: {} MB ({} / {})",
                u.stage, u.percent, u.eta_secs, u.mem_used_mb, u.mem_avail_mb, u.processed, u.total
            );
        },
    )?;

    export_absentees_csv(&cfg.export.out_path, &total_table, &report)
        .with_context(|| format!("writing {}", cfg.export.out_path))?;
    info!(
        "wrote {} absentees to {}",
        report.counts.absent, cfg.export.out_path
    );

    if cli.format.wants_csv() {
        let alloc_path = allocations_output_path(&cfg.export.out_path);
        export_allocations_csv(&alloc_path, &report)
            .with_context(|| format!("writing {}", alloc_path))?;
        info!(
            "wrote {} allocations to {}",
            report.counts.allocated, alloc_path
        );
    }

    if cli.explain {
        for record in &report.unmatched_present {
            let near = nearest_candidates(record, &report.unmatched_total, 3);
            if near.is_empty() {
                warn!(
                    "unmatched sign-in '{}' (row {}): no unallocated roster entries remain",
                    record.original,
                    record.source_index + 1
                );
            } else {
                let ranked = near
                    .iter()
                    .map(|(c, s)| format!("'{}' ({:.2})", c.original, s))
                    .collect::<Vec<_>>()
                    .join(", ");
                warn!(
                    "unmatched sign-in '{}' (row {}): nearest unallocated: {}",
                    record.original,
                    record.source_index + 1,
                    ranked
                );
            }
        }
    }

    let mem_end = memory_stats_mb();
    let ended = chrono::Utc::now();
    let run_summary = SummaryBuilder::new(&cfg.input.total_path, &cfg.input.present_path)
        .with_columns(total_table.name_header(), present_table.name_header())
        .with_counts(report.counts)
        .with_thresholds(cfg.matching.thresholds())
        .with_timestamps(started, ended)
        .with_memory(mem_start, mem_end)
        .build();

    if cli.format.wants_csv() {
        let sum_path = summary_output_path(&cfg.export.out_path);
        export_summary_csv(&sum_path, &run_summary)
            .with_context(|| format!("writing {}", sum_path))?;
        info!("wrote run summary to {}", sum_path);
    }
    if cli.format.wants_json() {
        let json_path = report_json_output_path(&cfg.export.out_path);
        export_report_json(&json_path, &report, &run_summary)
            .with_context(|| format!("writing {}", json_path))?;
        info!("wrote JSON report to {}", json_path);
    }

    info!(
        "done in {:.2}s: {} allocated ({} exact, {} token, {} fuzzy, {} close-match), {} absentees, {} unmatched sign-ins",
        run_timer.elapsed().as_secs_f64(),
        report.counts.allocated,
        report.counts.exact,
        report.counts.token,
        report.counts.fuzzy,
        report.counts.close_match,
        report.counts.absent,
        report.counts.unmatched_present
    );
    Ok(())
}
