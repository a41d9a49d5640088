use clap::Parser;
use koko::core::config;
use koko::tui;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::File;

#[derive(Parser)]
#[command(name = "koko", about = "Terminal chat client for the Koko assistant")]
struct Args {
    /// Backend base URL (overrides KOKO_API_BASE and the config file)
    #[arg(long)]
    api_base: Option<String>,

    /// Log level written to koko.log (off, error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let file_config = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            std::process::exit(1);
        }
    };
    let resolved = config::resolve(
        &file_config,
        args.api_base.as_deref(),
        args.log_level.as_deref(),
    );

    // File logger: the terminal belongs to the UI
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create("koko.log") {
        let _ = WriteLogger::init(resolved.log_level, log_config, log_file);
    }

    log::info!("Koko starting up against {}", resolved.api_base);

    tui::run(resolved)
}
