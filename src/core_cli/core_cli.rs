use clap::Parser;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "ferroftpd", about = "An FTP server written in Rust.")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "")]
    pub config: String,

    /// Override the control port from the configuration file
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Print a bcrypt hash for the given password and exit
    #[arg(long)]
    pub hash_password: Option<String>,

    /// Enable verbose mode
    #[arg(short, long)]
    pub verbose: bool,
}
