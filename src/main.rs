use banner_carbon::config::{self, DEFAULT_CONFIG_FILE};
use banner_carbon::estimate::Estimator;
use banner_carbon::output;
use banner_carbon::pipeline::{self, AnalysisOptions};
use banner_carbon::recovery::MetricSet;
use banner_carbon::types::UploadedFile;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

fn version_string() -> &'static str {
    let on_tag = env!("BANNER_CARBON_ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("BANNER_CARBON_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "banner-carbon")]
#[command(about = "Carbon footprint estimates for ad-banner images")]
#[command(long_about = "\
Carbon footprint estimates for ad-banner images

Compares generating a banner with AI against producing it by hand, over a
campaign of N views, and converts the result into offset figures.

Only container metadata is read: width, height, byte size and format.

Estimates come from a chat-completions service when
BANNER_CARBON_OPENAI_API_KEY is set (model override:
BANNER_CARBON_OPENAI_MODEL). Without a key, or when the service fails or
answers implausibly, offline formulas are used and reported with low
confidence.

Set RUST_LOG=info to see which estimates came from the service.

Run 'banner-carbon gen-config' to generate a documented banner-carbon.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct EstimateArgs {
    /// Image files or directories of images
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Campaign view count (default from config)
    #[arg(long)]
    views: Option<u64>,

    /// Recovery metric set (default from config)
    #[arg(long, value_enum)]
    metrics: Option<MetricsArg>,

    /// Also estimate the traditional design job in detail
    #[arg(long)]
    detailed: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricsArg {
    Offsets,
    Equivalents,
}

impl From<MetricsArg> for MetricSet {
    fn from(arg: MetricsArg) -> Self {
        match arg {
            MetricsArg::Offsets => MetricSet::Offsets,
            MetricsArg::Equivalents => MetricSet::Equivalents,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Estimate and compare emissions for each banner
    Estimate(EstimateArgs),
    /// Validate banners and show their metadata without estimating
    Check {
        /// Image files or directories of images
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print a stock banner-carbon.toml with all options documented
    GenConfig,
}

#[derive(Debug, thiserror::Error)]
#[error("{failed} of {total} banners failed")]
struct RunFailed {
    failed: usize,
    total: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("warn"));
    let cli = Cli::parse();

    match cli.command {
        Command::Estimate(args) => {
            let mut app_config = config::load_config(&cli.config)?;
            app_config.estimator.apply_env();

            let options = AnalysisOptions {
                views: args.views.unwrap_or(app_config.report.views),
                metrics: args
                    .metrics
                    .map_or(app_config.report.metrics, MetricSet::from),
                detailed_traditional: args.detailed || app_config.report.detailed_traditional,
                max_size_mb: app_config.upload.max_size_mb,
            };
            let estimator = Estimator::new(app_config.estimator);
            let files = pipeline::collect_images(&args.paths)?;

            let mut analyses = Vec::new();
            let mut failed = 0;
            for (i, path) in files.iter().enumerate() {
                let result = match UploadedFile::from_path(path) {
                    Ok(file) => pipeline::analyze(&file, &estimator, &options)
                        .await
                        .map_err(Box::<dyn std::error::Error>::from),
                    Err(e) => Err(e.into()),
                };
                match result {
                    Ok(analysis) if args.json => analyses.push(analysis),
                    Ok(analysis) => output::print_analysis(i + 1, path, &analysis),
                    Err(e) => {
                        failed += 1;
                        if args.json {
                            log::error!("{}: {}", path.display(), e);
                        } else {
                            output::print_failure(i + 1, path, e.as_ref());
                        }
                    }
                }
            }

            if args.json {
                println!("{}", serde_json::to_string_pretty(&analyses)?);
            } else {
                println!("{}", output::format_summary(files.len(), failed));
            }
            finish(failed, files.len())?;
        }
        Command::Check { paths } => {
            let app_config = config::load_config(&cli.config)?;
            let files = pipeline::collect_images(&paths)?;

            let mut failed = 0;
            for (i, path) in files.iter().enumerate() {
                let result = match UploadedFile::from_path(path) {
                    Ok(file) => pipeline::inspect(&file, app_config.upload.max_size_mb)
                        .await
                        .map_err(Box::<dyn std::error::Error>::from),
                    Err(e) => Err(e.into()),
                };
                match result {
                    Ok(metadata) => output::print_check(i + 1, path, &metadata),
                    Err(e) => {
                        failed += 1;
                        output::print_failure(i + 1, path, e.as_ref());
                    }
                }
            }

            println!("{}", output::format_summary(files.len(), failed));
            finish(failed, files.len())?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn finish(failed: usize, total: usize) -> Result<(), RunFailed> {
    if failed == 0 {
        Ok(())
    } else {
        Err(RunFailed { failed, total })
    }
}
