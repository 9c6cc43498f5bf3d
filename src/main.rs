use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use geojson::FeatureCollection;
use roadtsp::{AppError, NetworkFormat, Overrides, SessionService, load_config};
use roadtsp_core::{
    config::{LengthMetric, TourKind},
    export::{IntegrationReport, NetworkSummary},
};
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "roadtsp", version, about = "Compare TSP strategies over a road network")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write the result here instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG wins
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Annealing seed for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[arg(long, value_enum, global = true)]
    tour_kind: Option<TourKindArg>,

    #[arg(long, value_enum, global = true)]
    metric: Option<MetricArg>,

    /// Maximum distance between a point and the network
    #[arg(long, global = true)]
    max_snap_distance: Option<f64>,

    #[arg(long, global = true)]
    brute_force_max_points: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a network and print its summary or re-export it
    Network {
        /// GeoJSON FeatureCollection of lines, or WKT for .wkt/.txt files
        network: PathBuf,
        #[arg(long, value_enum, default_value_t = NetworkOutput::Summary)]
        export: NetworkOutput,
    },
    /// Snap a CSV point table onto a network
    Points { network: PathBuf, points: PathBuf },
    /// Run all three solvers over the points
    Evaluate { network: PathBuf, points: PathBuf },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum NetworkOutput {
    Summary,
    Geojson,
    Wkt,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum TourKindArg {
    Cycle,
    Path,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum MetricArg {
    Haversine,
    Euclidean,
}

#[derive(Serialize)]
struct PointsOutput {
    network: NetworkSummary,
    upload: IntegrationReport,
    points: FeatureCollection,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = load_config(cli.config.as_deref())?;
    Overrides {
        seed: cli.seed,
        tour_kind: cli.tour_kind.map(|kind| match kind {
            TourKindArg::Cycle => TourKind::Cycle,
            TourKindArg::Path => TourKind::Path,
        }),
        metric: cli.metric.map(|metric| match metric {
            MetricArg::Haversine => LengthMetric::Haversine,
            MetricArg::Euclidean => LengthMetric::Euclidean,
        }),
        max_snap_distance: cli.max_snap_distance,
        brute_force_max_points: cli.brute_force_max_points,
    }
    .apply(&mut config);

    let service = SessionService::new(config);
    let output = cli.output.as_deref();

    match cli.command {
        Command::Network { network, export } => {
            let summary = load_network(&service, &network).await?;
            match export {
                NetworkOutput::Summary => emit_json(&summary, output),
                NetworkOutput::Geojson => emit_json(&service.network_geojson().await?, output),
                NetworkOutput::Wkt => emit_text(&service.network_wkt().await?, output),
            }
        }
        Command::Points { network, points } => {
            let network = load_network(&service, &network).await?;
            let upload = upload_points(&service, &points).await?;
            let points = service.points_geojson().await?;
            emit_json(
                &PointsOutput {
                    network,
                    upload,
                    points,
                },
                output,
            )
        }
        Command::Evaluate { network, points } => {
            load_network(&service, &network).await?;
            upload_points(&service, &points).await?;

            // Dropping the evaluation future on Ctrl-C cancels the solvers
            let report = tokio::select! {
                report = service.evaluate() => report?,
                _ = tokio::signal::ctrl_c() => {
                    warn!("Interrupted, cancelling evaluation");
                    return Err(roadtsp_core::Error::Cancelled.into());
                }
            };
            emit_json(&report, output)
        }
    }
}

async fn load_network(service: &SessionService, path: &Path) -> Result<NetworkSummary, AppError> {
    let text = read_file(path)?;
    let summary = service
        .load_network(text, NetworkFormat::from_path(path))
        .await?;
    info!(
        "Loaded {} lines into {} nodes and {} edges",
        summary.lines, summary.nodes, summary.edges
    );
    Ok(summary)
}

async fn upload_points(service: &SessionService, path: &Path) -> Result<IntegrationReport, AppError> {
    let report = service.upload_points(read_file(path)?).await?;
    info!(
        "Integrated {} of {} points",
        report.points_integrated, report.total_rows
    );
    for rejected in &report.rejected {
        warn!("Point {} rejected: {}", rejected.id, rejected.reason);
    }
    Ok(report)
}

fn read_file(path: &Path) -> Result<String, AppError> {
    std::fs::read_to_string(path).map_err(|source| AppError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

fn emit_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<(), AppError> {
    emit_text(&serde_json::to_string_pretty(value)?, output)
}

fn emit_text(text: &str, output: Option<&Path>) -> Result<(), AppError> {
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            info!("Wrote {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}
