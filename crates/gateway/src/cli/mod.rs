pub mod browse;
pub mod config;
pub mod simulate;

use clap::{Parser, Subcommand};

/// dialoga: simulated psychologist/patient conversations between two LLMs.
#[derive(Debug, Parser)]
#[command(name = "dialoga", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP API (default when no subcommand is given).
    Serve,
    /// Run one or more simulated conversations and store them.
    Simulate(SimulateArgs),
    /// List the stored patient profiles.
    Patients {
        /// Output as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// List stored conversations, newest first.
    Conversations {
        /// Only conversations with this patient.
        #[arg(long)]
        patient: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Print a stored conversation transcript.
    Show {
        conversation_id: String,
        /// Include the models' internal reasoning.
        #[arg(long)]
        thoughts: bool,
        #[arg(long)]
        json: bool,
    },
    /// List the models the configured provider serves.
    Models {
        /// Provider id from config.toml (default provider when omitted).
        #[arg(long)]
        provider: Option<String>,
    },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, clap::Args)]
pub struct SimulateArgs {
    /// Patient id to simulate.
    #[arg(long, conflicts_with = "all")]
    pub patient: Option<String>,
    /// Simulate every stored patient concurrently.
    #[arg(long)]
    pub all: bool,
    /// Patient/psychologist round trips.
    #[arg(long)]
    pub turns: Option<u32>,
    #[arg(long)]
    pub patient_model: Option<String>,
    #[arg(long)]
    pub psychologist_model: Option<String>,
    /// Insert a "new day" episode before this round (repeatable).
    #[arg(long = "new-day-at")]
    pub new_day_at: Vec<u32>,
    /// Ground the psychologist on these indexed documents (repeatable).
    #[arg(long = "document")]
    pub documents: Vec<String>,
    /// Text files to index before running; the file stem becomes the
    /// document name.
    #[arg(long = "index")]
    pub index: Vec<std::path::PathBuf>,
    /// Provider id from config.toml.
    #[arg(long)]
    pub provider: Option<String>,
    /// Print the full reports as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path in `DG_CONFIG` (or `config.toml`
/// by default). A missing file yields the defaults. Returns the parsed
/// [`Config`] and the path that was used.
///
/// [`Config`]: dg_domain::config::Config
pub fn load_config() -> anyhow::Result<(dg_domain::config::Config, String)> {
    let config_path = std::env::var("DG_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let config = parse_config_file(&config_path)?;
    Ok((config, config_path))
}

fn parse_config_file(config_path: &str) -> anyhow::Result<dg_domain::config::Config> {
    if !std::path::Path::new(config_path).exists() {
        return Ok(dg_domain::config::Config::default());
    }
    let raw = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))
}
