use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_SOURCE: &str = "slurm";

#[derive(Parser, Debug)]
#[command(
    name = "group-report",
    version,
    about = "Generate a cluster resource usage report for a Linux group"
)]
pub struct Cli {
    #[arg(help = "Name of the Linux group to create the report for")]
    pub groupname: String,
    #[arg(
        short = 'S',
        value_name = "YYYY-MM-DD",
        help = "Beginning of the report period"
    )]
    pub start: String,
    #[arg(short = 'E', value_name = "YYYY-MM-DD", help = "End of the report period")]
    pub end: String,
    #[arg(
        short,
        long,
        help = "PDF output path (default: <output_dir>/<group>_<start>_<end>.pdf)"
    )]
    pub output: Option<PathBuf>,
    #[arg(
        long,
        default_value = DEFAULT_SOURCE,
        help = "Data source (`slurm`, or a snapshot.json file / directory containing one)"
    )]
    pub source: String,
    #[arg(long, help = "Config file (default: ~/.config/group-report/config.toml)")]
    pub config: Option<PathBuf>,
    #[arg(long, help = "Email the rendered report to the group owner")]
    pub mail: bool,
    #[arg(long, value_name = "ADDR", help = "Override the configured mail recipient")]
    pub mail_to: Option<String>,
    #[arg(long, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase log verbosity")]
    pub verbose: u8,
}
