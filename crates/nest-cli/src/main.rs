use anyhow::Result;
use clap::{Args, Parser, Subcommand};

mod commands;

use commands::{optimize, recommend};

#[derive(Parser)]
#[command(name = "nest")]
#[command(about = "Nest fund allocation CLI", long_about = None)]
struct Cli {
    /// Config overlays layered over the embedded defaults, in merge order
    #[arg(long = "config", global = true)]
    config_paths: Vec<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Extra overlay paths, applied after any --config
        paths: Vec<String>,
    },

    /// Turn a target vector into per-class slot counts
    Apportion {
        /// e.g. equity=0.4,debt=0.3,hybrid=0.3
        #[arg(long)]
        target: String,

        #[arg(long)]
        slots: usize,
    },

    /// Blend persona allocations by weight
    Blend {
        /// e.g. capital-guardian=0.3,balanced-voyager=0.45,accelerated-builder=0.25
        #[arg(long)]
        weights: String,
    },

    /// Recommend funds against a blended target
    Recommend {
        #[command(flatten)]
        catalog: CatalogArgs,

        /// Explicit target vector
        #[arg(long, conflicts_with = "weights", required_unless_present = "weights")]
        target: Option<String>,

        /// Persona weights to blend into a target
        #[arg(long)]
        weights: Option<String>,

        #[arg(long, default_value_t = 10)]
        top_n: usize,

        /// Investment amount split across the lines
        #[arg(long)]
        amount: Option<f64>,
    },

    /// Recommend funds for a single persona
    RecommendPersona {
        #[command(flatten)]
        catalog: CatalogArgs,

        /// capital-guardian | balanced-voyager | accelerated-builder
        #[arg(long)]
        persona: String,

        #[arg(long, default_value_t = 10)]
        top_n: usize,
    },

    /// Persona-direct optimizer over equity/debt/hybrid sleeves
    Optimize {
        #[command(flatten)]
        catalog: CatalogArgs,

        #[arg(long)]
        persona: String,

        #[command(flatten)]
        constraints: optimize::ConstraintArgs,

        #[command(flatten)]
        profile: optimize::ProfileArgs,
    },
}

/// Where candidates come from and how they are filtered.
#[derive(Args, Debug, Clone)]
pub struct CatalogArgs {
    /// JSON array of instruments; defaults to catalog.snapshot_path from config
    #[arg(long)]
    pub catalog: Option<String>,

    /// Restrict candidates to these category labels (repeatable)
    #[arg(long = "category")]
    pub categories: Vec<String>,

    /// Instrument ids to leave out (repeatable)
    #[arg(long = "exclude")]
    pub exclude: Vec<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env.local if present; silent otherwise.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();
    let config_paths = cli.config_paths;

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let mut all = config_paths;
            all.extend(paths);
            commands::config_hash(&all)?;
        }

        Commands::Apportion { target, slots } => {
            commands::apportion(&target, slots)?;
        }

        Commands::Blend { weights } => {
            let cfg = commands::load_engine(&config_paths)?;
            commands::blend(&cfg, &weights)?;
        }

        Commands::Recommend {
            catalog,
            target,
            weights,
            top_n,
            amount,
        } => {
            let cfg = commands::load_engine(&config_paths)?;
            let basis = match (target, weights) {
                (Some(t), _) => recommend::TargetBasis::Vector(t),
                (None, Some(w)) => recommend::TargetBasis::Weights(w),
                (None, None) => anyhow::bail!("provide --target or --weights"),
            };
            recommend::blended(&cfg, &catalog, basis, top_n, amount).await?;
        }

        Commands::RecommendPersona {
            catalog,
            persona,
            top_n,
        } => {
            let cfg = commands::load_engine(&config_paths)?;
            recommend::persona(&cfg, &catalog, &persona, top_n).await?;
        }

        Commands::Optimize {
            catalog,
            persona,
            constraints,
            profile,
        } => {
            let cfg = commands::load_engine(&config_paths)?;
            optimize::run(&cfg, &catalog, &persona, &constraints, &profile).await?;
        }
    }

    Ok(())
}

/// Logs go to stderr; stdout carries the JSON result only.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
