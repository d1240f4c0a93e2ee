use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "dlv")]
#[command(about = "Delivery dashboard CLI", long_about = None)]
struct Cli {
    /// Layered YAML config paths in merge order (environment still wins)
    #[arg(long = "config", global = true)]
    config_paths: Vec<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the notification feed once and print the parsed orders
    Notifications,

    /// List orders from the order service
    Orders {
        /// Only orders placed by this client
        #[arg(long)]
        client: Option<i64>,
    },

    /// Request a status change for one order
    SetStatus {
        /// Order id
        id: i64,

        /// New status label (free text, e.g. delivered)
        status: String,
    },

    /// Run the polling loop and print every reconciled snapshot
    Watch {
        /// Stop after this many finished polls (default: until ctrl-c)
        #[arg(long)]
        cycles: Option<u64>,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> local...)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Silent if the file does not exist.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = dlv_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Notifications => {
            let cfg = commands::resolve_config(&cli.config_paths)?;
            commands::feed::notifications(&cfg).await?;
        }

        Commands::Orders { client } => {
            let cfg = commands::resolve_config(&cli.config_paths)?;
            commands::orders::list(&cfg, client).await?;
        }

        Commands::SetStatus { id, status } => {
            let cfg = commands::resolve_config(&cli.config_paths)?;
            commands::feed::set_status(&cfg, id, &status).await?;
        }

        Commands::Watch { cycles } => {
            let cfg = commands::resolve_config(&cli.config_paths)?;
            commands::watch::run(&cfg, cycles).await?;
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
