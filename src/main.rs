use clap::Parser;
use colored::Colorize;
use kwyk2nidm::cli::{self, ConvertOptions, ConvertSummary};
use kwyk2nidm::Kwyk2NidmConfig;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "kwyk2nidm")]
#[command(version, about = "Convert KWYK brain segmentation stats to NIDM", long_about = None)]
struct Cli {
    /// KWYK stats file to convert
    #[arg(short = 'f', long = "kwyk_stats", visible_alias = "kwyk-stats")]
    kwyk_stats: PathBuf,

    /// Also write the CDE graph
    #[arg(short = 'g', long = "gen-nidm")]
    gen_nidm: bool,

    /// Output Turtle file (default: <stats file name>.ttl)
    #[arg(short, long)]
    outfile: Option<PathBuf>,

    /// Register unknown structures instead of failing
    #[arg(long)]
    no_strict: bool,

    /// Merge the ontology mapping into the registry before converting
    #[arg(long)]
    merge_mapping: bool,

    /// Limit the CDE graph to elements used by this stats file
    #[arg(long, requires = "gen_nidm")]
    restrict: bool,

    /// Configuration file (default: ./kwyk2nidm.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// CDE registry file
    #[arg(long)]
    cde_file: Option<PathBuf>,

    /// Ontology mapping file
    #[arg(long)]
    map_file: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Initialize tracing
    let filter_layer = if args.debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else if args.verbose {
        tracing_subscriber::EnvFilter::new("info")
    } else {
        tracing_subscriber::EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("kwyk2nidm v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Kwyk2NidmConfig::load_or_default(args.config.as_deref(), Path::new("."))?;
    if let Some(path) = args.cde_file {
        config.registry.cde_file = path;
    }
    if let Some(path) = args.map_file {
        config.registry.map_file = path;
    }

    let options = ConvertOptions {
        stats_file: args.kwyk_stats,
        outfile: args.outfile,
        gen_nidm: args.gen_nidm,
        strict: config.registry.strict && !args.no_strict,
        merge_mapping: args.merge_mapping,
        restrict: args.restrict,
    };

    info!("Converting {:?}", options.stats_file);
    let summary = cli::run_conversion(&config, &options)?;
    display_summary(&summary);
    Ok(())
}

fn display_summary(summary: &ConvertSummary) {
    if let Some(report) = &summary.merge {
        println!(
            "{} Merged mapping: {} structures added, {} measures added, {} CDEs updated",
            "✓".bright_green(),
            report.structures_added,
            report.measures_added,
            report.records_updated
        );
    }
    if summary.registry_saved {
        println!("{} Registered new data elements", "✓".bright_green());
    }
    println!(
        "{} Wrote {} measurements to {}",
        "✓".bright_green(),
        summary.measurements,
        summary.outfile.display().to_string().cyan()
    );
    if let Some(path) = &summary.cde_graph {
        println!(
            "{} Wrote CDE graph to {}",
            "✓".bright_green(),
            path.display().to_string().cyan()
        );
    }
}
