use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use image_marker::config::MarkerConfig;
use image_marker::watermark::{ImageMarker, MarkOutput, RawMarkOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MarkMode {
    /// Text when `watermarkTexts` is present, images otherwise
    Auto,
    Text,
    Image,
}

/// Image Marker - draw text and image watermarks onto a background image
#[derive(Parser, Debug)]
#[command(name = "image-marker")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Mark request as a JSON file, or `-` for stdin
    #[arg(short, long, default_value = "-")]
    options: PathBuf,

    /// Which request kind to validate against
    #[arg(short, long, value_enum, default_value_t = MarkMode::Auto)]
    mode: MarkMode,

    /// Override the configured output directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,
}

fn load_config(args: &Args) -> anyhow::Result<MarkerConfig> {
    let mut config = match &args.config {
        Some(path) => MarkerConfig::from_file(path)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => MarkerConfig::default(),
    };
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid configuration")?;
    Ok(config)
}

fn read_options(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut json = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut json)
            .context("Failed to read mark options from stdin")?;
        return Ok(json);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read mark options from {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    image_marker::logging::init_subscriber(config.logging.format, &config.logging.level)
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to initialize logging subsystem")?;

    tracing::info!(
        config_file = ?args.config,
        output_dir = %config.output_dir.display(),
        assets_dir = %config.assets_dir.display(),
        anchor_strategy = ?config.anchor_strategy,
        "Configuration loaded successfully"
    );

    if args.test {
        println!("configuration ok");
        return Ok(());
    }

    let json = read_options(&args.options)?;
    let marker = ImageMarker::from_config(config).context("Failed to create image marker")?;

    let result = match args.mode {
        MarkMode::Auto => marker.mark_json(&json).await,
        MarkMode::Text => {
            let raw = RawMarkOptions::from_json(&json)?;
            marker.mark_with_text(&raw).await
        }
        MarkMode::Image => {
            let raw = RawMarkOptions::from_json(&json)?;
            marker.mark_with_image(&raw).await
        }
    };

    match result {
        Ok(MarkOutput::File(path)) => println!("{}", path.display()),
        Ok(MarkOutput::DataUri(uri)) => println!("{}", uri),
        Err(e) => {
            if e.is_validation() {
                tracing::warn!(code = e.code(), error = %e, "Mark request rejected");
            } else {
                tracing::error!(code = e.code(), error = %e, "Mark request failed");
            }
            bail!("{} ({})", e, e.code());
        }
    }

    Ok(())
}
