use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "specula", version, about = "Best-effort web reconnaissance mission orchestrator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a reconnaissance mission against a target URL
    Scan(ScanArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[derive(Args, Clone)]
pub struct ScanArgs {
    /// Target URL or hostname
    #[arg(short, long)]
    pub target: String,

    /// Mission intensity: fast, standard, deep
    #[arg(long, default_value = "standard")]
    pub intensity: String,

    /// Reasoning engine API key (or use SPECULA_API_KEY / GEMINI_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Reasoning model identifier
    #[arg(long)]
    pub model: Option<String>,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output directory for the report
    #[arg(short, long, default_value = "./results")]
    pub output: String,

    /// Report language
    #[arg(long, default_value = "en")]
    pub language: String,

    /// Free-text authentication context forwarded to the engine
    #[arg(long)]
    pub auth_context: Option<String>,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// YAML configuration file to check
    #[arg(short, long)]
    pub config: String,
}
