//! chartkit - Helm and kubectl helpers for cluster bootstrapping
//!
//! Fetches and renders Helm charts with the helm binary vendored under
//! `~/.k3sup/.bin`, manages chart repositories and runs kubectl.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chartkit::{ExecEnv, HelmClient, Kubectl, Settings, SystemExecutor};

#[derive(Parser)]
#[command(name = "chartkit")]
#[command(about = "Fetch, render and install Helm charts with vendored tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Download and unpack a chart
    Fetch {
        /// Chart reference, e.g. stable/nginx
        chart: String,

        /// Directory to unpack into
        #[arg(long)]
        dest: PathBuf,
    },

    /// Render a fetched chart to manifests
    Template {
        /// Chart directory name under --base
        chart: String,

        /// Directory containing fetched charts
        #[arg(long)]
        base: PathBuf,

        /// Target namespace
        #[arg(long, default_value = "default")]
        namespace: String,

        /// Directory for rendered manifests
        #[arg(long)]
        output: PathBuf,

        /// Values file, relative to the chart directory
        #[arg(long, default_value = "values.yaml")]
        values: String,
    },

    /// Manage chart repositories
    #[command(subcommand)]
    Repo(RepoCommands),

    /// Initialise helm client state (helm 2)
    HelmInit,

    /// Run kubectl with the given arguments
    Kubectl {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Print the CPU architecture of the first cluster node
    Arch,

    /// Generate example settings file
    GenConfig,
}

#[derive(Subcommand)]
enum RepoCommands {
    /// Add a chart repository
    Add { name: String, url: String },

    /// Update all chart repositories
    Update,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("chartkit={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let result = run(&cli).await;

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let env = || load_env(cli);

    match &cli.command {
        Commands::Fetch { chart, dest } => {
            info!("Fetching {} into {}", chart, dest.display());
            HelmClient::new(SystemExecutor, env()?)
                .fetch_chart(dest, chart)
                .await
                .with_context(|| format!("Failed to fetch chart {}", chart))?;
        }
        Commands::Template {
            chart,
            base,
            namespace,
            output,
            values,
        } => {
            info!("Rendering {} to {}", chart, output.display());
            HelmClient::new(SystemExecutor, env()?)
                .template_chart(base, chart, namespace, output, values)
                .await
                .with_context(|| format!("Failed to template chart {}", chart))?;
        }
        Commands::Repo(RepoCommands::Add { name, url }) => {
            info!("Adding Helm repository {} ({})", name, url);
            HelmClient::new(SystemExecutor, env()?)
                .add_repo(name, url)
                .await
                .with_context(|| format!("Failed to add Helm repo {}", name))?;
        }
        Commands::Repo(RepoCommands::Update) => {
            info!("Updating Helm repositories...");
            HelmClient::new(SystemExecutor, env()?)
                .update_repos()
                .await
                .context("Failed to update Helm repos")?;
        }
        Commands::HelmInit => {
            HelmClient::new(SystemExecutor, env()?)
                .init_client()
                .await
                .context("Failed to initialise helm client")?;
        }
        Commands::Kubectl { args } => {
            Kubectl::new(SystemExecutor, env()?)
                .run(args.iter().cloned())
                .await
                .context("kubectl failed")?;
        }
        Commands::Arch => {
            let arch = Kubectl::new(SystemExecutor, env()?).architecture().await;
            println!("{}", arch);
        }
        Commands::GenConfig => gen_config(cli).await?,
    }

    Ok(())
}

/// Build the child environment from the process and the optional settings file
fn load_env(cli: &Cli) -> Result<ExecEnv> {
    let settings = match &cli.config {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };

    Ok(settings.exec_env(ExecEnv::from_process()))
}

/// Write an example settings file
async fn gen_config(cli: &Cli) -> Result<()> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("chartkit.yaml"));

    if path.exists() {
        anyhow::bail!("Settings file already exists: {}", path.display());
    }

    let yaml = serde_yaml::to_string(&Settings::example())?;

    tokio::fs::write(&path, yaml)
        .await
        .context("Failed to write settings file")?;

    info!("Example settings created: {}", path.display());

    Ok(())
}
