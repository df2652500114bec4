use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "tunepane")]
#[command(about = "Dual-pane terminal music browser with a playback queue")]
struct Args {
    /// Folder to start browsing in
    root: Option<PathBuf>,

    /// Run without opening an audio device
    #[arg(long)]
    null_audio: bool,

    /// Log filter directive, overridden by RUST_LOG
    #[arg(long, value_name = "FILTER")]
    log_filter: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = tunepane::config::load_settings()?;

    let filter = args.log_filter.as_deref().unwrap_or(&settings.log_filter);
    let _guard = tunepane::logging::init(&tunepane::config::log_dir()?, filter)?;
    info!(version = env!("CARGO_PKG_VERSION"), "tunepane starting");

    tunepane::app::run(tunepane::app::RunOptions {
        root: args.root,
        null_audio: args.null_audio,
        settings,
    })
}
