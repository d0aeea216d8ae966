use clap::{Parser, Subcommand};
use std::path::PathBuf;

const HELP_EPILOG: &str = r#"Server options can also be provided via environment variables:
  CONFIG_PATH (default: ./config.yaml)
  DB_PATH     (default: data/app.db)
  PORT        (default: 5151 or config.listen_port)

Command-line flags take precedence over environment variables.
"#;

#[derive(Debug, Parser)]
#[command(
    name = "voltmap-server",
    version,
    about = "VoltMap charging station server",
    long_about = None,
    after_long_help = HELP_EPILOG,
)]
pub struct Cli {
    /// Path to the YAML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Path to the SQLite database
    #[arg(long, global = true)]
    pub db_path: Option<String>,
    /// Port to listen on
    #[arg(long)]
    pub port: Option<u16>,
    /// Optional subcommand. Without one, runs the server.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply pending migrations, seed the reward catalog, then exit
    Migrate,
}

impl Cli {
    pub fn db_path(&self) -> String {
        self.db_path
            .clone()
            .or_else(|| std::env::var("DB_PATH").ok())
            .unwrap_or_else(|| "data/app.db".into())
    }

    /// Flag, then `PORT`, then the config file, then 5151.
    pub fn port(&self, configured: Option<u16>) -> u16 {
        self.port
            .or_else(|| {
                std::env::var("PORT")
                    .ok()
                    .and_then(|s| s.parse::<u16>().ok())
            })
            .or(configured)
            .unwrap_or(5151)
    }
}
