pub mod init;
pub mod migrate;
pub mod serve;
pub mod user;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "A blog backend with a JSON API", long_about = None)]
pub struct Cli {
    #[arg(short, long, env = "FOLIO_CONFIG", default_value = "folio.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter config with a fresh JWT secret
    Init {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Run migrations and start the HTTP server
    Serve {
        #[arg(short = 'H', long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    Migrate,
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
}

#[derive(Subcommand)]
pub enum UserCommand {
    Add {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long)]
        staff: bool,
        #[arg(long)]
        superuser: bool,
        #[arg(long)]
        password: Option<String>,
    },
    List,
    Deactivate {
        email: String,
    },
    Remove {
        email: String,
    },
    Passwd {
        email: String,
    },
}
