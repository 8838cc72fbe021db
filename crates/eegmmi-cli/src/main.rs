use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use csv::WriterBuilder;
use eegmmi_lib::{
    dataset::{feet_code_remap, EventCode, SESSION},
    remap_marker_codes, DatasetConfig, PhysionetMI, Raw, RunSelectionPolicy, RunSpec,
};
use env_logger::Env;
use log::info;
use serde::Serialize;
use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "eegmmi",
    version,
    about = "PhysioNet EEG motor movement/imagery dataset tools"
)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// TOML file with cache_dir, base_url, timeout_secs, force_update
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Cache root (default: $MNE_DATASETS_EEGBCI_PATH or ~/mne_data)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Download again even if the file is cached
    #[arg(long, global = true)]
    force_update: bool,
}

#[derive(Args, Clone, Copy)]
struct PolicyArgs {
    /// Include motor imagery runs
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    imagined: bool,
    /// Include motor execution runs
    #[arg(long)]
    executed: bool,
}

impl From<PolicyArgs> for RunSelectionPolicy {
    fn from(args: PolicyArgs) -> Self {
        RunSelectionPolicy {
            imagined: args.imagined,
            executed: args.executed,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the runs fetched per subject, one JSON object per line
    Runs {
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Print dataset metadata as JSON
    Info,
    /// Download missing runs of a subject and print their local paths
    Paths {
        #[arg(long)]
        subject: u32,
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Load a subject and print a JSON summary per run
    Fetch {
        #[arg(long)]
        subject: u32,
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Write the marker events of one run as TSV (stdout unless --out)
    Events {
        #[arg(long)]
        subject: u32,
        #[arg(long)]
        run: u8,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct RunRow {
    index: u8,
    role: String,
    label: String,
}

#[derive(Serialize)]
struct RunSummary {
    label: String,
    run: u8,
    n_channels: usize,
    n_times: usize,
    sfreq: f64,
    duration_s: f64,
    events: BTreeMap<String, usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();
    match cli.command {
        Commands::Runs { policy } => cmd_runs(policy.into())?,
        Commands::Info => cmd_info()?,
        Commands::Paths { subject, policy } => {
            cmd_paths(&cli.source, policy.into(), subject)?
        }
        Commands::Fetch { subject, policy } => {
            cmd_fetch(&cli.source, policy.into(), subject)?
        }
        Commands::Events { subject, run, out } => {
            cmd_events(&cli.source, subject, run, out.as_deref())?
        }
    }
    Ok(())
}

fn dataset_config(args: &SourceArgs) -> Result<DatasetConfig> {
    let mut config = match &args.config {
        Some(path) => DatasetConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DatasetConfig::from_env(),
    };
    if let Some(dir) = &args.cache_dir {
        config.cache_dir = dir.clone();
    }
    if let Some(url) = &args.base_url {
        config.base_url = url.clone();
    }
    if args.force_update {
        config.force_update = true;
    }
    Ok(config)
}

fn dataset(args: &SourceArgs, policy: RunSelectionPolicy) -> Result<PhysionetMI> {
    let config = dataset_config(args)?;
    info!("cache root {}", config.cache_dir.display());
    Ok(PhysionetMI::new(policy, config))
}

fn cmd_runs(policy: RunSelectionPolicy) -> Result<()> {
    for run in eegmmi_lib::dataset::resolve_run_set(&policy) {
        let row = RunRow {
            index: run.index,
            role: run.role.to_string(),
            label: run.label(),
        };
        println!("{}", serde_json::to_string(&row)?);
    }
    Ok(())
}

fn cmd_info() -> Result<()> {
    let dataset = PhysionetMI::new(RunSelectionPolicy::default(), DatasetConfig::default());
    println!("{}", serde_json::to_string_pretty(&dataset.metadata())?);
    Ok(())
}

fn cmd_paths(args: &SourceArgs, policy: RunSelectionPolicy, subject: u32) -> Result<()> {
    let dataset = dataset(args, policy)?;
    let paths = dataset
        .data_path(subject)
        .with_context(|| format!("resolving paths for subject {subject}"))?;
    for path in paths {
        println!("{}", path.display());
    }
    Ok(())
}

fn event_counts(raw: &Raw) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for event in raw.find_events() {
        let name = EventCode::from_code(event.code)
            .map(|code| code.name().to_string())
            .unwrap_or_else(|| event.code.to_string());
        *counts.entry(name).or_insert(0) += 1;
    }
    counts
}

fn cmd_fetch(args: &SourceArgs, policy: RunSelectionPolicy, subject: u32) -> Result<()> {
    let dataset = dataset(args, policy)?;
    let data = dataset
        .fetch_subject(subject)
        .with_context(|| format!("loading subject {subject}"))?;
    let session = &data[SESSION];
    for run in dataset.runs() {
        let label = run.label();
        let Some(raw) = session.get(&label) else {
            continue;
        };
        let summary = RunSummary {
            label,
            run: run.index,
            n_channels: raw.n_channels(),
            n_times: raw.n_times(),
            sfreq: raw.sfreq(),
            duration_s: raw.duration(),
            events: event_counts(raw),
        };
        println!("{}", serde_json::to_string(&summary)?);
    }
    Ok(())
}

fn cmd_events(args: &SourceArgs, subject: u32, run: u8, out: Option<&Path>) -> Result<()> {
    let run = RunSpec::from_index(run)?;
    let dataset = dataset(args, RunSelectionPolicy::default())?;
    let mut raw = dataset
        .fetch_run(subject, run)
        .with_context(|| format!("loading subject {subject} run {}", run.index))?;
    if run.role.is_feet() {
        raw = remap_marker_codes(&raw, &feet_code_remap());
    }
    let sink: Box<dyn Write> = match out {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };
    write_events_tsv(sink, &raw)
}

fn write_events_tsv<W: Write>(sink: W, raw: &Raw) -> Result<()> {
    let mut writer = WriterBuilder::new().delimiter(b'\t').from_writer(sink);
    writer.write_record(["onset", "sample", "code", "label"])?;
    for event in raw.find_events() {
        let label = EventCode::from_code(event.code)
            .map(|code| code.name().to_string())
            .unwrap_or_default();
        writer.write_record(&[
            (event.sample as f64 / raw.sfreq()).to_string(),
            event.sample.to_string(),
            event.code.to_string(),
            label,
        ])?;
    }
    writer.flush()?;
    Ok(())
}
