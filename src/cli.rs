use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "map-reminders",
    version,
    about = "Place dated event reminders on a terminal world map"
)]
pub struct Args {
    /// Config file (defaults to <config dir>/map-reminders/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory holding the stored reminders and the log file
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Print stored reminders with their countdown and exit
    #[arg(long, conflicts_with = "clear")]
    pub list: bool,

    /// Delete every stored reminder and exit
    #[arg(long)]
    pub clear: bool,
}
