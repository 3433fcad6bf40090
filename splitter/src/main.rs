use clap::{crate_version, Parser};
use lumisplit_splitter::{catalog::Catalogs, config::SplitConfig, replay::ReplayStores, split};
use std::{fs, path::PathBuf, process::exit};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_unwrap::ResultExt;

#[derive(Parser, Debug)]
#[command(
    name = "lumisplit",
    version = crate_version!(),
    about = "Compute a job partition for one subscription snapshot"
)]
struct Cli {
    /// path to the split config
    config: PathBuf,

    /// write the computed partition to this path instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match SplitConfig::load(&cli.config) {
        Ok(config) => config,
        Err(error) => {
            error!(error = ?error, "Failed to load config from {}: {error}", cli.config.to_string_lossy());

            exit(1)
        }
    };

    if config.preflight_checks() {
        error!("Config did not pass the preflight checks, see above");

        exit(1)
    }

    let catalog = match Catalogs::load(&config.catalog) {
        Ok(catalog) => catalog,
        Err(error) => {
            error!(error = ?error, "Failed to load the file catalog: {error}");

            exit(1)
        }
    };

    let replay = match config.replay.as_ref().map(ReplayStores::load).transpose() {
        Ok(replay) => replay,
        Err(error) => {
            error!(error = ?error, "Failed to load the replay store: {error}");

            exit(1)
        }
    };

    let partition = match split::split_once(&catalog, replay.as_ref(), &config) {
        Ok(partition) => partition,
        Err(error) => {
            error!(error = ?error, "Split failed: {error}");

            exit(1)
        }
    };

    // serializing our own partition values cannot fail
    let rendered = serde_yaml::to_string(&partition).unwrap_or_log();

    match cli.output {
        Some(path) => match fs::write(&path, rendered) {
            Ok(()) => info!("Wrote partition to {}", path.to_string_lossy()),
            Err(error) => {
                error!(error = ?error, "Failed to write partition to {}: {error}", path.to_string_lossy());

                exit(1)
            }
        },
        None => print!("{rendered}"),
    }
}
