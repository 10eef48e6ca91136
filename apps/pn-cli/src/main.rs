use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Instant;

use pn_project::{CaseFile, Format, ProjectResult, load, run_case, write_report};
use tracing::Level;

#[derive(Parser)]
#[command(name = "pn-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pore network transport solver", long_about = None)]
struct Cli {
    /// Log resolver and assembly details
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate case file syntax and structure
    Validate {
        /// Path to the case file (YAML, or JSON by extension)
        case_path: PathBuf,
    },
    /// Describe the network, phases and algorithms of a case
    Summary {
        /// Path to the case file
        case_path: PathBuf,
    },
    /// Run every algorithm of a case in order
    Run {
        /// Path to the case file
        case_path: PathBuf,
        /// Write the full report here instead of printing a summary only
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Report format
        #[arg(long, value_enum, default_value_t = ReportFormat::Json)]
        format: ReportFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Json,
    Yaml,
}

impl From<ReportFormat> for Format {
    fn from(format: ReportFormat) -> Self {
        match format {
            ReportFormat::Json => Format::Json,
            ReportFormat::Yaml => Format::Yaml,
        }
    }
}

fn main() -> ProjectResult<()> {
    let cli = Cli::parse();

    let level = match (cli.verbose, cli.quiet) {
        (true, _) => Level::DEBUG,
        (_, true) => Level::WARN,
        _ => Level::INFO,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Validate { case_path } => cmd_validate(&case_path),
        Commands::Summary { case_path } => cmd_summary(&case_path),
        Commands::Run {
            case_path,
            output,
            format,
        } => cmd_run(&case_path, output.as_deref(), format.into()),
    }
}

fn cmd_validate(case_path: &Path) -> ProjectResult<()> {
    println!("Validating case: {}", case_path.display());
    // Loading validates.
    load(case_path)?;
    println!("✓ Case is valid");
    Ok(())
}

fn cmd_summary(case_path: &Path) -> ProjectResult<()> {
    let case = load(case_path)?;
    print_case(&case);
    Ok(())
}

fn print_case(case: &CaseFile) {
    let network = &case.network;
    println!("Case: {} (version {})", case.name, case.version);
    println!(
        "  Network: {} pores, {} throats",
        network.pores,
        network.throats.len()
    );
    let labels: Vec<&str> = network.pore_labels.keys().map(String::as_str).collect();
    if !labels.is_empty() {
        println!("  Pore labels: {}", labels.join(", "));
    }

    for phase in &case.phases {
        println!(
            "  Phase {}: {} properties, {} physics",
            phase.name,
            phase.properties.len(),
            phase.physics.len()
        );
        for physics in &phase.physics {
            let keys: Vec<&str> = physics.properties.keys().map(String::as_str).collect();
            println!("    Physics {}: {}", physics.name, keys.join(", "));
        }
    }

    for algorithm in &case.algorithms {
        println!(
            "  Algorithm {} ({}) on {}: {} boundary conditions{}",
            algorithm.name,
            algorithm.kind,
            algorithm.phase,
            algorithm.bcs.len(),
            if algorithm.update_phase {
                ", updates phase"
            } else {
                ""
            }
        );
    }
}

fn cmd_run(case_path: &Path, output: Option<&Path>, format: Format) -> ProjectResult<()> {
    let case = load(case_path)?;
    println!("Running case: {}", case.name);

    let start = Instant::now();
    let report = run_case(&case)?;
    let elapsed = start.elapsed();

    print!("{report}");
    println!("✓ Completed in {:.3} s", elapsed.as_secs_f64());

    if let Some(path) = output {
        write_report(path, &report, format)?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}
