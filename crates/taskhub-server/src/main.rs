use clap::Parser;
use taskhub_server::ServerBuilder;
use taskhub_server::config::loader::load_config;

#[derive(Debug, Parser)]
#[command(name = "taskhub-server", version, about = "TaskHub accounts and todo lists over HTTP")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, env = "TASKHUB_CONFIG", default_value = "taskhub.toml")]
    config: String,
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before anything else)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist - it's optional
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound) {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    let cli = Cli::parse();

    let cfg = match load_config(Some(&cli.config)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    taskhub_server::observability::init_tracing_with(&cfg.logging.format, &cfg.logging.level);

    tracing::info!(
        path = %cli.config,
        addr = %cfg.addr(),
        storage = %cfg.storage.backend,
        algorithm = %cfg.auth.algorithm,
        "Configuration loaded"
    );
    tracing::debug!(auth = ?cfg.auth, postgres = ?cfg.storage.postgres, "Effective configuration");

    let server = match ServerBuilder::new().with_config(cfg).build().await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Server initialization failed");
            eprintln!("Server initialization failed: {e}");
            std::process::exit(2);
        }
    };

    if let Err(err) = server.run().await {
        tracing::error!(error = %err, "Server error");
        eprintln!("Server error: {err}");
        std::process::exit(1);
    }
}
