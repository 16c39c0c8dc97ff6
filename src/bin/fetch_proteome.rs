use std::fs::File;
use std::process::ExitCode;
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use fetch_proteome::classify;
use fetch_proteome::config::{ConfigLoader, RunConfig, RunOverrides};
use fetch_proteome::domain::{LineageGroup, TaxId};
use fetch_proteome::download::{DownloadOptions, NcbiGenomeDownload};
use fetch_proteome::error::ProteomeError;
use fetch_proteome::fs_util;
use fetch_proteome::ncbi::NcbiTaxdumpClient;
use fetch_proteome::output::{JsonOutput, OutputMode, TextOutput};
use fetch_proteome::pipeline::{Pipeline, TracingSink};
use fetch_proteome::store::TaxonomyStore;

#[derive(Parser)]
#[command(name = "fetch-proteome")]
#[command(about = "Expand taxids, download protein FASTA per NCBI group and build one proteome")]
#[command(version, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the download stage described by a config file")]
    Run(RunArgs),
    #[command(about = "Manage the local taxonomy snapshot")]
    Taxonomy(TaxonomyArgs),
}

#[derive(Args)]
struct RunArgs {
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    update_db: bool,

    #[arg(long)]
    threads: Option<usize>,

    #[arg(long)]
    groups: Option<LineageGroup>,

    #[arg(long)]
    section: Option<String>,

    #[arg(long)]
    log: Option<Utf8PathBuf>,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct TaxonomyArgs {
    #[command(subcommand)]
    command: TaxonomyCommand,
}

#[derive(Subcommand)]
enum TaxonomyCommand {
    #[command(about = "Download and rebuild the taxonomy snapshot")]
    Update(SnapshotArgs),
    #[command(about = "Show the lineage and download group of a taxid")]
    Lineage(LineageArgs),
}

#[derive(Args)]
struct SnapshotArgs {
    #[arg(long)]
    dir: Option<Utf8PathBuf>,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct LineageArgs {
    taxid: String,

    #[arg(long)]
    dir: Option<Utf8PathBuf>,

    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<ProteomeError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &ProteomeError) -> u8 {
    match error {
        ProteomeError::MissingConfig
        | ProteomeError::ConfigRead(_)
        | ProteomeError::ConfigParse(_)
        | ProteomeError::ConfigValue(_)
        | ProteomeError::InputTable(_)
        | ProteomeError::InvalidTaxId(_)
        | ProteomeError::InvalidGroup(_)
        | ProteomeError::UnknownTaxId(_)
        | ProteomeError::TaxonomyMissing(_) => 2,
        ProteomeError::TaxonomyHttp(_)
        | ProteomeError::TaxonomyStatus { .. }
        | ProteomeError::MissingTool(_)
        | ProteomeError::ToolLaunch { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run_pipeline(args),
        Commands::Taxonomy(args) => {
            init_tracing(None)?;
            match args.command {
                TaxonomyCommand::Update(args) => run_update(args),
                TaxonomyCommand::Lineage(args) => run_lineage(args),
            }
        }
    }
}

fn init_tracing(log: Option<&Utf8Path>) -> miette::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match log {
        Some(path) => {
            fs_util::ensure_parent(path.as_std_path())?;
            let file = File::options()
                .create(true)
                .append(true)
                .open(path.as_std_path())
                .into_diagnostic()?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn output_mode(json: bool) -> OutputMode {
    if json { OutputMode::Json } else { OutputMode::Text }
}

fn open_store(dir: Option<Utf8PathBuf>) -> Result<TaxonomyStore, ProteomeError> {
    match dir {
        Some(dir) => Ok(TaxonomyStore::new_with_dir(dir)),
        None => TaxonomyStore::new(),
    }
}

fn run_pipeline(args: RunArgs) -> miette::Result<()> {
    let overrides = RunOverrides {
        update_db: args.update_db,
        threads: args.threads,
        groups: args.groups,
        section: args.section,
        log: args.log,
    };
    let config = ConfigLoader::resolve(args.config.as_deref(), overrides)?;
    init_tracing(config.log.as_deref())?;
    tracing::info!(input = %config.input, default_group = %config.default_group, "starting run");

    let store = open_store(config.taxonomy_dir.clone())?;
    let client = NcbiTaxdumpClient::new()?;
    store.ensure(&client, config.update_db)?;
    let taxonomy = store.load()?;
    tracing::info!(taxa = taxonomy.len(), dir = %store.dir(), "taxonomy loaded");

    let downloader = build_downloader(&config)?;
    match downloader.version() {
        Some(version) => {
            tracing::info!(program = %downloader.program().display(), %version, "download tool")
        }
        None => tracing::info!(program = %downloader.program().display(), "download tool"),
    }

    let pipeline = Pipeline::new(taxonomy, downloader);
    let summary = pipeline.run(&config, &TracingSink)?;
    match output_mode(args.json) {
        OutputMode::Json => JsonOutput::print_summary(&summary).into_diagnostic()?,
        OutputMode::Text => TextOutput::print_summary(&summary),
    }
    Ok(())
}

fn build_downloader(config: &RunConfig) -> Result<NcbiGenomeDownload, ProteomeError> {
    let options = DownloadOptions {
        section: config.section.clone(),
        assembly_levels: config.assembly_levels.clone(),
        refseq_categories: config.refseq_categories.clone(),
        parallel: config.threads,
        output_dir: config.output_dir.clone(),
        metadata_table: config.metadata_path(),
    };
    Ok(NcbiGenomeDownload::new(&config.program, options)?
        .with_log(config.log.clone()))
}

fn run_update(args: SnapshotArgs) -> miette::Result<()> {
    let store = open_store(args.dir)?;
    let client = NcbiTaxdumpClient::new()?;
    store.ensure(&client, true)?;
    let metadata = store.read_metadata()?;
    match output_mode(args.json) {
        OutputMode::Json => JsonOutput::print_snapshot(&metadata).into_diagnostic()?,
        OutputMode::Text => TextOutput::print_snapshot(&metadata),
    }
    Ok(())
}

fn run_lineage(args: LineageArgs) -> miette::Result<()> {
    let taxid = args.taxid.parse::<TaxId>()?;
    let store = open_store(args.dir)?;
    let taxonomy = store.load()?;
    let report = classify::lineage_report(&taxonomy, taxid)?;
    match output_mode(args.json) {
        OutputMode::Json => JsonOutput::print_lineage(&report).into_diagnostic()?,
        OutputMode::Text => TextOutput::print_lineage(&report),
    }
    Ok(())
}
