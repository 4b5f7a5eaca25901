mod cli;

use mediavault::{config, locator::LocatorClassifier, playback, server};
use mediavault_common::{MediaId, MediaKind};
use mediavault_db::{init_pool, queries::media, DbPool};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

fn open_catalog(config: &config::Config) -> Result<DbPool> {
    let db_path = &config.storage.db_path;
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
    }
    let db_path_str = db_path.to_string_lossy();
    tracing::info!("Opening catalog at {}", db_path_str);
    Ok(init_pool(&db_path_str)?)
}

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config::validate_config(&config)?;

    tracing::info!("Starting Mediavault server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    let db_pool = open_catalog(&config)?;
    server::start_server(config, db_pool).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mediavault=trace,mediavault_av=trace,mediavault_db=debug,mediavault_common=debug,tower_http=debug".to_string()
        } else {
            "mediavault=debug,mediavault_av=debug,mediavault_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("mediavault {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::AddMedia {
            kind,
            locator,
            title,
            thumbnail,
        } => add_media(
            cli.config.as_deref(),
            &kind,
            &locator,
            title.as_deref(),
            thumbnail.as_deref(),
        ),
        Commands::Classify { locator, kind } => classify(cli.config.as_deref(), &locator, &kind),
    }
}

fn parse_kind(kind: &str) -> Result<MediaKind> {
    kind.parse::<MediaKind>().map_err(anyhow::Error::msg)
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    println!("Checking external tools...\n");

    let tools = playback::tool_registry(&config).check_all();
    let mut ffmpeg_ok = false;

    for tool in &tools {
        let status = if tool.available { "✓" } else { "✗" };
        if tool.name == "ffmpeg" {
            ffmpeg_ok = tool.available;
        }

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if ffmpeg_ok {
        println!("ffmpeg is available; HLS and thumbnails are enabled.");
    } else {
        println!("ffmpeg is missing. Direct streaming works, HLS and thumbnails will fail.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Storage root: {}", config.storage.root.display());
            println!("  Audio root: {}", config.audio_root().display());
            println!("  Video root: {}", config.video_root().display());
            println!(
                "  Partial name fallback: {}",
                config.sandbox.partial_name_fallback
            );
            println!(
                "  Concurrent encodes: {}",
                config.transcode.max_concurrent
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Storage root: {}", config.storage.root.display());
        }
    }

    Ok(())
}

fn add_media(
    config_path: Option<&Path>,
    kind: &str,
    locator: &str,
    title: Option<&str>,
    thumbnail: Option<&str>,
) -> Result<()> {
    let kind = parse_kind(kind)?;
    if locator.trim().is_empty() {
        anyhow::bail!("Locator cannot be empty");
    }

    let config = config::load_config_or_default(config_path)?;
    let pool = open_catalog(&config)?;
    let conn = mediavault_db::get_conn(&pool)?;
    let record = media::create_media(
        &conn,
        kind,
        title.unwrap_or(locator),
        locator.trim(),
        thumbnail,
    )?;

    println!("Added {} {}: {}", record.kind, record.id, record.title);
    Ok(())
}

fn classify(config_path: Option<&Path>, locator: &str, kind: &str) -> Result<()> {
    let kind = parse_kind(kind)?;
    let config = config::load_config_or_default(config_path)?;
    let classifier = LocatorClassifier::new(&config.remote)?;

    let rt = tokio::runtime::Runtime::new()?;
    let descriptor = rt.block_on(classifier.describe(kind, MediaId::new(0), locator, None))?;

    println!("{}", serde_json::to_string_pretty(&descriptor)?);
    Ok(())
}
