use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use ei_coverage::{DEFAULT_COVERAGE_LABEL, DEFAULT_EXPORT_DIR, DEFAULT_LAYER_TYPE, DEFAULT_QUERY_NAME};

#[derive(Parser, Debug)]
#[command(
    name = "ei-coverage",
    version,
    about = "Check which IBM Environmental Intelligence data layers return data at a point",
    allow_negative_numbers = true
)]
pub struct Cli {
    /// Secrets file with an [EI] section (default: ./auth/secrets.ini, then ~/.ei/secrets.ini)
    #[arg(long, global = true)]
    pub secrets: Option<PathBuf>,

    /// Read the catalog from a JSON snapshot instead of the catalog service
    #[arg(long, global = true)]
    pub catalog_file: Option<PathBuf>,

    /// Coverage label whose layers are planned and probed
    #[arg(long, global = true, default_value = DEFAULT_COVERAGE_LABEL)]
    pub label: String,

    /// HTTP request timeout in seconds
    #[arg(long, global = true, default_value_t = 60)]
    pub timeout: u64,

    /// More log output (-v info, -vv debug); RUST_LOG applies otherwise
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// EI organization id (overrides EI_ORG_ID and the secrets file)
    #[arg(long, global = true)]
    pub org_id: Option<String>,

    /// EI tenant id (overrides EI_TENANT_ID and the secrets file)
    #[arg(long, global = true)]
    pub tenant_id: Option<String>,

    /// EI API key (overrides EI_API_KEY and the secrets file)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every data layer in the catalog
    Layers {
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },
    /// List coverage labels and how many layers carry each
    Coverage,
    /// Show how the label's layers split into batches
    Plan {
        #[arg(short = 's', long, default_value_t = 3, allow_negative_numbers = true)]
        batch_size: i64,
    },
    /// Probe one batch and export the summary
    Probe {
        #[arg(short = 's', long, default_value_t = 3, allow_negative_numbers = true)]
        batch_size: i64,

        /// 1-based batch number
        #[arg(short, long, default_value_t = 1)]
        batch: usize,

        #[command(flatten)]
        probe: ProbeArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Choose batch size and batch at prompts, then probe
    Interactive {
        #[command(flatten)]
        probe: ProbeArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Probe coordinate as `<lat>,<lon>`
    #[arg(long, default_value = "-6.2087634,106.845599", allow_hyphen_values = true)]
    pub at: String,

    /// Start of the time window, `YYYY-MM-DD HH:MM:SS`
    #[arg(long, default_value = "2023-12-31 00:00:00")]
    pub start: String,

    /// End of the time window, `YYYY-MM-DD HH:MM:SS`
    #[arg(long, default_value = "2024-01-01 01:00:00")]
    pub end: String,

    #[arg(long, default_value = DEFAULT_QUERY_NAME)]
    pub query_name: String,

    #[arg(long, default_value = DEFAULT_LAYER_TYPE)]
    pub layer_type: String,
}

#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Directory receiving batch_<N>.json
    #[arg(short, long, default_value = DEFAULT_EXPORT_DIR)]
    pub out_dir: PathBuf,

    /// Print the summary to stdout instead of writing a file
    #[arg(long)]
    pub stdout: bool,
}
