use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;

use lookup_cli::api::{ApiClient, LookupService};
use lookup_cli::cli::{Args, Commands};
use lookup_cli::config::Config;
use lookup_cli::dispatch::run_command;
use lookup_cli::export::export_rows_to_csv;
use lookup_cli::logging;
use lookup_cli::render::{html, text, OutputFormat};
use lookup_cli::search::{
    ApiEvent, ColumnSelector, Command, ResultsView, SearchController, SearchSettings,
};
use lookup_cli::tui_app;

fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => Config::get_config_path()?,
    };

    if let Some(Commands::GenerateConfig { force }) = &args.command {
        return generate_config(&config_path, *force);
    }

    let mut config = Config::load_from(&config_path)?;
    config.apply_env();
    config.apply_overrides(args.url.clone(), args.password.clone());

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let client = ApiClient::new(
        &config.server.base_url,
        config.server.password.clone(),
        config.server.request_timeout(),
    )?;

    match args.command {
        None => {
            let log_dir = config.logging.log_to_file.then(logging::log_dir);
            let logs = logging::init_tracing(&config.logging.level, log_dir.as_deref());
            if let Some(path) = &logs.log_path {
                eprintln!("Debug logs will be written to: {}", path.display());
            }
            tui_app::run_tui_app(runtime.handle().clone(), Arc::new(client), &config, logs)
        }
        Some(command) => {
            logging::init_stderr_tracing("warn");
            runtime.block_on(run_once(command, &client, &config))
        }
    }
}

fn generate_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Error creating config directory {}", parent.display()))?;
    }
    std::fs::write(path, Config::create_default_with_comments())?;
    println!("Configuration file created at: {}", path.display());
    Ok(())
}

async fn run_once(command: Commands, client: &ApiClient, config: &Config) -> Result<()> {
    let settings = SearchSettings::from(config);

    match command {
        Commands::Meta { format } => {
            let meta = client.meta().await?;
            let out = match format {
                OutputFormat::Text => text::render_meta(&meta),
                OutputFormat::Html => {
                    html::render_column_selector(&ColumnSelector::from_meta(&meta), &meta)
                }
                OutputFormat::Json => serde_json::to_string_pretty(&meta)?,
            };
            println!("{out}");
        }

        Commands::Suggest {
            query,
            limit,
            format,
        } => {
            let mut controller = SearchController::new(settings);
            controller.on_input(&query, Instant::now());
            let Some(mut command) = controller.suggest_now() else {
                bail!(
                    "Query must be at least {} characters",
                    controller.settings().min_query_chars
                );
            };
            if let (Command::Suggest { limit: sent, .. }, Some(limit)) = (&mut command, limit) {
                *sent = limit;
            }

            match run_command(client, command).await {
                ApiEvent::Suggestions { result: Err(e), .. } => return Err(e.into()),
                event => {
                    controller.apply(event);
                }
            }

            let options = controller.suggestions().options();
            let out = match format {
                OutputFormat::Text => text::render_suggestions(options),
                OutputFormat::Html => html::render_suggestions(controller.suggestions()),
                OutputFormat::Json => serde_json::to_string_pretty(options)?,
            };
            println!("{out}");
        }

        Commands::Lookup {
            name,
            format,
            name_col,
            csv,
        } => {
            let mut controller = SearchController::new(settings);
            let startup = controller.startup();
            let meta = run_command(client, startup).await;
            controller.apply(meta);

            if let Some(column) = name_col {
                if !controller.columns().options().contains(&column) {
                    bail!(
                        "Unknown name column {:?}; available: {}",
                        column,
                        controller.columns().options().join(", ")
                    );
                }
                controller.set_name_column(&column);
            }

            let lookup = controller.choose(&name);
            let event = run_command(client, lookup).await;
            controller.apply(event);

            let view = controller.results();
            let out = match format {
                OutputFormat::Text => {
                    text::render_results(view, controller.name_col(), controller.settings())
                }
                OutputFormat::Html => {
                    html::render_results(view, controller.name_col(), controller.settings())
                }
                OutputFormat::Json => match view {
                    ResultsView::Rows(rows) => serde_json::to_string_pretty(rows)?,
                    ResultsView::Failed { message } => bail!("{message}"),
                    _ => "[]".to_string(),
                },
            };
            println!("{out}");

            if let (Some(path), ResultsView::Rows(rows)) = (csv, view) {
                let written = export_rows_to_csv(rows, &path, controller.settings())?;
                eprintln!("{} row(s) exported to {}", written, path.display());
            }

            if let ResultsView::Failed { message } = view {
                bail!("Lookup failed: {message}");
            }
        }

        Commands::Reload => {
            let reloaded = client.reload().await?;
            println!(
                "Reloaded {} rows (name column {:?})",
                reloaded.total_rows, reloaded.name_col
            );
        }

        Commands::GenerateConfig { .. } => unreachable!("handled before the runtime starts"),
    }

    Ok(())
}
