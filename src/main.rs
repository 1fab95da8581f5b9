//! Energy insights entry point: CLI wiring, config loading, and report output.

mod cli;

use std::path::Path;
use std::process;

use serde::Serialize;

use energy_insights::analytics::pipeline::{self, Dashboard};
use energy_insights::analytics::relations::{self, CorrelationMatrix, RelationView};
use energy_insights::config::PipelineConfig;
use energy_insights::error::PipelineError;
use energy_insights::ingest::{LoadCache, RawDataset};
use energy_insights::io::export::{export_anomalies, export_daily};
use energy_insights::logging;

/// Shown when upload mode is selected without a file.
const UPLOAD_PROMPT: &str = "Please upload a CSV file to continue.";

/// JSON document printed with `--json`.
#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    dashboard: &'a Dashboard,
    correlation: Option<CorrelationMatrix>,
}

fn main() {
    let opts = match cli::parse_args() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(1);
        }
    };

    let mut config = match opts.config.as_deref() {
        Some(path) => PipelineConfig::from_toml_file(path).unwrap_or_else(|e| {
            eprintln!("{e}");
            process::exit(1);
        }),
        None => PipelineConfig::default(),
    };
    opts.apply(&mut config);

    logging::init(&config.logging);

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let (raw, dashboard) = match pipeline::run(&config, LoadCache::global()) {
        Ok(out) => out,
        Err(PipelineError::MissingInput) => {
            println!("{UPLOAD_PROMPT}");
            process::exit(0);
        }
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    let correlation = correlation_view(&raw, opts.columns.as_deref());

    if opts.json {
        let report = JsonReport {
            dashboard: &dashboard,
            correlation,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: failed to serialize dashboard: {e}");
                process::exit(1);
            }
        }
    } else {
        print_report(&dashboard, correlation.as_ref(), opts.top);
    }

    if let Some(path) = opts.anomalies_out.as_deref() {
        write_or_exit("anomaly report", path, export_anomalies(&dashboard.daily, path));
    }
    if let Some(path) = opts.daily_out.as_deref() {
        write_or_exit("daily view", path, export_daily(&dashboard.daily, path));
    }
}

/// Correlation over the requested columns, or the default heatmap set.
///
/// An unusable selection is reported and skipped; it never aborts the run.
fn correlation_view(raw: &RawDataset, columns: Option<&[String]>) -> Option<CorrelationMatrix> {
    let result = match columns {
        Some(cols) => {
            let names: Vec<&str> = cols.iter().map(String::as_str).collect();
            RelationView::select(raw, &names).map(|v| v.correlation())
        }
        None => relations::default_heatmap(raw),
    };
    result
        .inspect_err(|e| tracing::warn!(error = %e, "correlation view skipped"))
        .ok()
}

fn write_or_exit(what: &str, path: &Path, result: std::io::Result<()>) {
    if let Err(e) = result {
        eprintln!("error: failed to write {what}: {e}");
        process::exit(1);
    }
    eprintln!("{what} written to {}", path.display());
}

fn print_report(dash: &Dashboard, correlation: Option<&CorrelationMatrix>, top: usize) {
    println!("{}", dash.kpi);
    if dash.excluded_rows > 0 {
        println!(
            "\n{} row(s) excluded for unparseable timestamps; {} used.",
            dash.excluded_rows, dash.records_used
        );
    }
    if !dash.kpi.has_data() {
        return;
    }

    println!("\n--- Daily Energy (kWh) ---");
    if let Some(s) = dash.daily_energy_stats {
        println!(
            "count {}  mean {:.3}  std {:.3}  min {:.3}  \
             25% {:.3}  50% {:.3}  75% {:.3}  max {:.3}",
            s.count, s.mean, s.std, s.min, s.q25, s.median, s.q75, s.max
        );
    }
    if let Some(s) = dash.daily_carbon_stats {
        println!("CO2 per day: mean {:.3} kg  max {:.3} kg", s.mean, s.max);
    }
    match dash.daily_z_stats {
        Some(s) => println!("z-score: min {:.3}  median {:.3}  max {:.3}", s.min, s.median, s.max),
        None => println!("z-score: undefined (fewer than two days or no spread)"),
    }

    println!("\nTop {top} days:");
    for d in dash.top_days(top) {
        println!("  {}  {:>10.3} kWh", d.day, d.energy_kwh_sum);
    }
    println!("Bottom {top} days:");
    for d in dash.bottom_days(top) {
        println!("  {}  {:>10.3} kWh", d.day, d.energy_kwh_sum);
    }

    println!("\n--- Hourly Profile (mean kWh) ---");
    for h in &dash.hourly {
        match h.energy_kwh_mean {
            Some(m) => println!("  {:02}:00  {m:.4}", h.hour),
            None => println!("  {:02}:00  no data", h.hour),
        }
    }

    println!("\n--- Weekday Profile (mean kWh) ---");
    for w in &dash.weekday {
        match w.energy_kwh_mean {
            Some(m) => println!("  {:<9}  {m:.4}", w.name),
            None => println!("  {:<9}  no data", w.name),
        }
    }

    let anomalies = dash.anomalies();
    println!("\n--- Anomalies ---");
    if anomalies.is_empty() {
        println!("No anomalous days.");
    }
    for d in anomalies {
        println!("  {}  {:>10.3} kWh  z = {}", d.day, d.energy_kwh_sum, d.z_score);
    }

    if let Some(corr) = correlation {
        println!("\n--- Correlation ---");
        print!("{:>16}", "");
        for c in &corr.columns {
            print!("{c:>16}");
        }
        println!();
        for (name, row) in corr.columns.iter().zip(&corr.coefficients) {
            print!("{name:>16}");
            for v in row {
                match v {
                    Some(r) => print!("{r:>16.3}"),
                    None => print!("{:>16}", "-"),
                }
            }
            println!();
        }
    }
}
