mod analyze;
mod endpoints;
mod input;
mod stats;

pub use input::load_units;

use chainscope_api::CallTree;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "chainscope",
    version,
    about = "Deep call-chain analysis for Java projects",
    long_about = "Chainscope resolves every call reachable from an entry method, through generic \
                  base classes, interface dispatch and framework methods, and reports the result \
                  as a JSON call tree."
)]
pub struct Cli {
    /// Directory for log files; defaults to $CHAINSCOPE_LOG_DIR, then ~/.chainscope/logs
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the call tree of one or more entry methods
    #[command(
        long_about = "Indexes the normalized sources under INPUT and prints the call tree of each \
                      entry as pretty JSON. Java/Spring defaults are applied unless --no-preset is given."
    )]
    Analyze {
        /// A normalized JSON document, an array of them, or a directory of *.json files
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Entry method, `Type#method` with an optional `/N` arity
        #[arg(short, long = "entry", value_name = "ENTRY")]
        entries: Vec<String>,

        /// Configuration document layered over the preset
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        max_depth: Option<usize>,

        /// Do not apply the Java/Spring defaults
        #[arg(long)]
        no_preset: bool,

        /// Analyze every discovered Spring endpoint handler
        #[arg(long)]
        all_endpoints: bool,

        /// Write the JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List Spring endpoints discovered in the project
    Endpoints {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
    /// Show index statistics and diagnostics
    Stats {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
    /// Print the JSON Schema of the call tree output
    Schema,
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let log_dir = chainscope_core::logging::log_dir(cli.log_dir.as_deref());
    let _guard = chainscope_core::logging::init_logging_in(&log_dir, "cli", true);

    match cli.command {
        Commands::Analyze {
            input,
            entries,
            config,
            max_depth,
            no_preset,
            all_endpoints,
            output,
        } => analyze::run(analyze::AnalyzeArgs {
            input,
            entries,
            config,
            max_depth,
            no_preset,
            all_endpoints,
            output,
        }),
        Commands::Endpoints { input } => endpoints::run(&input),
        Commands::Stats { input } => stats::run(&input),
        Commands::Schema => {
            let schema = schemars::schema_for!(CallTree);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
    }
}
