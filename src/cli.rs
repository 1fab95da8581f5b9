use std::env;
use std::path::PathBuf;

use energy_insights::config::{PipelineConfig, SourceMode};

/// Number of top and bottom days listed by default.
const DEFAULT_TOP_DAYS: usize = 5;

pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub source: Option<SourceMode>,
    pub upload: Option<PathBuf>,
    pub url: Option<String>,
    pub carbon_intensity: Option<f64>,
    pub z_threshold: Option<f64>,
    pub anomalies_out: Option<PathBuf>,
    pub daily_out: Option<PathBuf>,
    pub columns: Option<Vec<String>>,
    pub top: usize,
    pub json: bool,
}

impl CliOptions {
    /// Overrides `cfg` with every flag given on the command line.
    ///
    /// `--upload` implies upload mode unless `--source` says otherwise.
    pub fn apply(&self, cfg: &mut PipelineConfig) {
        if let Some(path) = &self.upload {
            cfg.source.path = Some(path.clone());
            cfg.source.mode = SourceMode::Upload;
        }
        if let Some(mode) = self.source {
            cfg.source.mode = mode;
        }
        if let Some(url) = &self.url {
            cfg.source.url = url.clone();
        }
        if let Some(c) = self.carbon_intensity {
            cfg.analysis.carbon_intensity = c;
        }
        if let Some(z) = self.z_threshold {
            cfg.analysis.z_threshold = z;
        }
    }
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    if args.len() == 1 && (args[0] == "--help" || args[0] == "-h") {
        print_usage();
        std::process::exit(0);
    }
    parse_options(&args)
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut opts = CliOptions {
        config: None,
        source: None,
        upload: None,
        url: None,
        carbon_intensity: None,
        z_threshold: None,
        anomalies_out: None,
        daily_out: None,
        columns: None,
        top: DEFAULT_TOP_DAYS,
        json: false,
    };

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --config (expected a TOML file path)")?;
                if opts.config.replace(PathBuf::from(path)).is_some() {
                    return Err("--config provided more than once".to_string());
                }
            }
            "--source" => {
                i += 1;
                let value =
                    args.next_or_err(i, "missing value for --source (expected remote or upload)")?;
                let mode = match value {
                    "remote" => SourceMode::Remote,
                    "upload" => SourceMode::Upload,
                    other => {
                        return Err(format!(
                            "invalid --source \"{other}\" (expected remote or upload)"
                        ));
                    }
                };
                opts.source = Some(mode);
            }
            "--upload" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --upload (expected a CSV file path)")?;
                if opts.upload.replace(PathBuf::from(path)).is_some() {
                    return Err("--upload provided more than once".to_string());
                }
            }
            "--url" => {
                i += 1;
                let url = args.next_or_err(i, "missing value for --url")?;
                opts.url = Some(url.to_string());
            }
            "--carbon-intensity" => {
                i += 1;
                let value =
                    args.next_or_err(i, "missing value for --carbon-intensity (expected kg/kWh)")?;
                opts.carbon_intensity = Some(parse_number(value, "--carbon-intensity")?);
            }
            "--z-threshold" => {
                i += 1;
                let value = args.next_or_err(i, "missing value for --z-threshold")?;
                opts.z_threshold = Some(parse_number(value, "--z-threshold")?);
            }
            "--anomalies-out" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --anomalies-out (expected a path)")?;
                if opts.anomalies_out.replace(PathBuf::from(path)).is_some() {
                    return Err("--anomalies-out provided more than once".to_string());
                }
            }
            "--daily-out" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --daily-out (expected a file path)")?;
                if opts.daily_out.replace(PathBuf::from(path)).is_some() {
                    return Err("--daily-out provided more than once".to_string());
                }
            }
            "--columns" => {
                i += 1;
                let list = args.next_or_err(i, "missing value for --columns (expected a,b,...)")?;
                let columns = list
                    .split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(String::from)
                    .collect();
                opts.columns = Some(columns);
            }
            "--top" => {
                i += 1;
                let value = args.next_or_err(i, "missing value for --top (expected a count)")?;
                opts.top = value
                    .parse()
                    .map_err(|_| format!("--top value \"{value}\" is not a valid count"))?;
            }
            "--json" => opts.json = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if opts.source == Some(SourceMode::Remote) && opts.upload.is_some() {
        return Err(
            "arguments `--source remote` and `--upload` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    Ok(opts)
}

fn parse_number(value: &str, flag: &str) -> Result<f64, String> {
    value
        .parse::<f64>()
        .map_err(|_| format!("{flag} value \"{value}\" is not a number"))
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("energy-insights: daily, hourly and weekday energy views with anomaly flags");
    eprintln!();
    eprintln!("Usage: energy-insights [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>             Load settings from a TOML file");
    eprintln!("  --source <remote|upload>    Select the data source (default: remote)");
    eprintln!("  --upload <path>             Analyze a local CSV (implies --source upload)");
    eprintln!("  --url <url>                 Override the remote CSV location");
    eprintln!("  --carbon-intensity <kg>     kg CO2 per kWh (default: 0.45)");
    eprintln!("  --z-threshold <z>           Anomaly z-score threshold (default: 2.5)");
    eprintln!("  --anomalies-out <path>      Write flagged days to CSV");
    eprintln!("  --daily-out <path>          Write the daily view to CSV");
    eprintln!("  --columns <a,b,...>         Columns for the correlation view");
    eprintln!("  --top <n>                   Top/bottom days to list (default: 5)");
    eprintln!("  --json                      Print the dashboard as JSON");
    eprintln!("  --help                      Show this help message");
    eprintln!();
    eprintln!("Log verbosity follows RUST_LOG, then [logging] level in the config file.");
}
