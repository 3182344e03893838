use std::error::Error;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fsic_registry::pdf::{render_certificate, render_expiry_report};
use fsic_registry::{CertificateStore, RegistryError};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod error;

use config::Config;

/// Fire Safety Inspection Certificate registry.
///
/// Serves the admin certificate page and renders certificates from the
/// command line. The Roboto font files must be present under `assets/fonts`
/// or in the directory named by `FSIC_FONTS_DIR` for any PDF output.
#[derive(Parser)]
#[command(author, version, about = "Fire safety certificate registry")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the certificate management page.
    Serve {
        /// Address to listen on.
        #[arg(long, env = "FSIC_BIND", default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },

    /// Create the database schema if it does not exist yet.
    #[command(name = "init-db", aliases = ["init_db"])]
    InitDb,

    /// Render one certificate to a PDF file.
    Render {
        /// Certificate id.
        id: i64,

        /// Output path, defaults to `Certificate_<number>.pdf`.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Render the report of expired and soon-to-expire certificates.
    #[command(name = "expiry-report", aliases = ["expiry_report"])]
    ExpiryReport {
        #[arg(long, default_value = "expiry_report.pdf")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { bind } => app::serve(cli.config, bind).await,
        Commands::InitDb => init_db(&cli.config),
        Commands::Render { id, output } => render(&cli.config, id, output),
        Commands::ExpiryReport { output } => expiry_report(&cli.config, output),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn init_db(config: &Config) -> Result<(), Box<dyn Error>> {
    CertificateStore::open(&config.database)?;
    info!(database = %config.database.display(), "database ready");
    Ok(())
}

fn render(config: &Config, id: i64, output: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let store = CertificateStore::open(&config.database)?;
    let detail = store.detail(id)?.ok_or(RegistryError::NotFound(id))?;

    let pdf = render_certificate(&detail, config.fonts_dir.clone())?;
    let path = output.unwrap_or_else(|| PathBuf::from(&pdf.file_name));
    fs::write(&path, &pdf.bytes)?;
    info!(certificate_id = id, path = %path.display(), "certificate written");
    Ok(())
}

fn expiry_report(config: &Config, output: PathBuf) -> Result<(), Box<dyn Error>> {
    let store = CertificateStore::open(&config.database)?;
    let today = config.today();
    let rows = store.expiry_report(today)?;

    let bytes = render_expiry_report(&rows, today, config.fonts_dir.clone())?;
    fs::write(&output, bytes)?;
    info!(rows = rows.len(), path = %output.display(), "expiry report written");
    Ok(())
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
