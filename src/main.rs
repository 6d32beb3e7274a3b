mod cli;

use hlsrelay::{config, playlist, server};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::io::Read;
use std::path::Path;

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

    tracing::info!("Starting hlsrelay");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    server::start_server(config).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "hlsrelay=trace,tower_http=debug".to_string()
        } else {
            "hlsrelay=debug,tower_http=info".to_string()
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
        Commands::Rewrite {
            input,
            base,
            attribute_uris,
        } => rewrite_file(&input, &base, attribute_uris, cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("hlsrelay {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn rewrite_file(
    input: &Path,
    base: &str,
    attribute_uris: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    let playlist_url =
        url::Url::parse(base).with_context(|| format!("Invalid base URL: {}", base))?;

    let text = if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read playlist from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read playlist: {:?}", input))?
    };

    let options = playlist::RewriteOptions {
        relay_prefix: &config.relay.public_base_url,
        attribute_uris: attribute_uris || config.relay.rewrite_attribute_uris,
    };
    let rewritten = playlist::rewrite(&text, &playlist::base_url(&playlist_url), &options);

    print!("{}", rewritten);
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  User-Agent: {}", config.upstream.user_agent);
    println!(
        "  Upstream timeout: {}s (connect {}s), retries: {}",
        config.upstream.timeout_secs, config.upstream.connect_timeout_secs, config.upstream.retries
    );
    println!("  Catalog: {}", config.catalog.kind());
    if !config.relay.public_base_url.is_empty() {
        println!("  Public base URL: {}", config.relay.public_base_url);
    }

    Ok(())
}
