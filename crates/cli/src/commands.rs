use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Poll every channel of the source once and store the new watermarks
    Run {
        #[arg(long, help = "Configuration tree file, defaults to ~/.sqlpoll/tree.json")]
        tree: Option<PathBuf>,

        /// Database driver: "mysql" or "postgres"
        #[arg(long, default_value = "mysql")]
        driver: String,

        #[arg(
            long,
            help = "Append records as JSON lines to this file instead of stdout"
        )]
        output: Option<PathBuf>,

        #[arg(long, help = "If specified, writes the JSON run report to this file")]
        report: Option<PathBuf>,
    },
    /// List the channels, data points and variables of a tree
    Channels {
        #[arg(long, help = "Configuration tree file, defaults to ~/.sqlpoll/tree.json")]
        tree: Option<PathBuf>,

        #[arg(long, help = "If set, prints the listing as JSON instead of a table")]
        json: bool,
    },
}
