//! pasvd - Entry Point
//!
//! A passive-mode FTP server serving one directory tree.

use clap::Parser;
use env_logger::{Builder, Env};
use log::info;
use std::io::Write;
use std::path::PathBuf;

use pasvd::error::handlers::handle_error;
use pasvd::{ConfigOverrides, FtpServerError, Server, ServerConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file, without or with its extension
    #[arg(short, long, default_value = "pasvd")]
    config: String,

    /// Control port, overrides the configuration file
    #[arg(short, long)]
    port: Option<u16>,

    /// Home directory every session starts in
    #[arg(long)]
    home: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            writeln!(
                buf,
                "[{}] [{}] {}",
                timestamp,
                record.level(),
                record.args()
            )
        })
        .init();

    if let Err(e) = run(cli).await {
        handle_error(&e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), FtpServerError> {
    let overrides = ConfigOverrides {
        control_port: cli.port,
        home_dir: cli.home,
    };
    let config = ServerConfig::load(&cli.config, &overrides)?;

    info!("Launching FTP server...");
    let server = Server::bind(config).await?;
    server.start().await;
    Ok(())
}
