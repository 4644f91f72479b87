use anyhow::Result;
use clap::Parser;
use echoscribe::app::run_listen_command;
use echoscribe::cli::Cli;
use echoscribe::config::Config;
use owo_colors::OwoColorize;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;

    // Apply CLI overrides
    if let Some(model) = cli.model {
        config.recognition.model = model;
    }
    if let Some(language) = cli.language {
        config.recognition.language = language;
    }
    if let Some(segment_secs) = cli.segment {
        config.segmenter.segment_secs = segment_secs;
    }
    if let Some(precision) = cli.precision {
        config.recognition.precision = precision;
    }
    if let Some(temperature) = cli.temperature {
        config.recognition.temperature = temperature;
    }

    if let Err(e) = run_listen_command(config, cli.quiet, cli.verbose).await {
        eprintln!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/echoscribe/config.toml)
/// 3. Built-in defaults
///
/// Environment variable overrides apply last.
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    Ok(config.with_env_overrides())
}
