use anyhow::Context;
use std::path::Path;
use tickerwise::{
    api,
    cli::{
        commands::{self, GenerateOptions},
        output::Output,
        Cli, Commands,
    },
    utils::toml_config::{ServerConfig, TickerwiseConfig},
    AppState, ReportService, Settings,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    let (config_path, explicit) = cli.config_path();
    let settings = Settings::load(&config_path, explicit);

    let server = settings
        .as_ref()
        .map(|s| s.config.server.clone())
        .unwrap_or_else(|_| TickerwiseConfig::default().server);
    init_tracing(&server, cli.verbose);

    if let Err(e) = run(cli, settings, &config_path, &output).await {
        output.error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// RUST_LOG wins over the configured level; `--verbose` forces debug
fn init_tracing(server: &ServerConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("tickerwise=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "tickerwise={level},tower_http={level}",
                level = server.log_level
            ))
        })
    };

    let (json, text) = if server.json_logs {
        (Some(fmt::layer().json().with_writer(std::io::stderr)), None)
    } else {
        (None, Some(fmt::layer().with_writer(std::io::stderr)))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .init();
}

async fn run(
    cli: Cli,
    settings: Result<Settings, tickerwise::utils::toml_config::ConfigError>,
    config_path: &Path,
    output: &Output,
) -> anyhow::Result<()> {
    // Listing steps needs neither a config file nor credentials
    let load = || {
        settings.with_context(|| {
            format!("failed to load configuration from {}", config_path.display())
        })
    };

    match cli.command {
        Commands::Steps => commands::steps(output)?,
        Commands::Generate {
            company,
            email,
            trace,
            no_document,
        } => {
            let options = GenerateOptions {
                company,
                email,
                trace,
                no_document,
            };
            commands::generate(&load()?, options, output).await?;
        }
        Commands::Email {
            company,
            to,
            document,
        } => commands::email(&load()?, &company, &to, &document, output).await?,
        Commands::Config { validate } => {
            commands::config(&load()?, config_path, validate, output)?
        }
        Commands::Serve => serve(&load()?, output).await?,
    }

    Ok(())
}

async fn serve(settings: &Settings, output: &Output) -> anyhow::Result<()> {
    let service = ReportService::from_settings(settings)?;
    let server = &settings.config.server;

    let app = api::routes::app(AppState::new(service))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    output.banner();
    output.success(&format!("Listening on http://{}", addr));
    output.kv("model", &settings.model);
    tracing::info!(%addr, "server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
