mod cli;

use std::path::PathBuf;

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fixbot::config::Settings;
use fixbot::model::{load_or_train, retrain};
use fixbot::server::AppState;
use fixbot::session::SessionStore;
use fixbot::users::CredentialStore;
use fixbot::Chatbot;

#[derive(Parser)]
#[command(name = "fixbot", about = "Computer troubleshooting chatbot", version)]
struct Args {
    /// Settings file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<CommandKind>,
}

#[derive(Subcommand)]
enum CommandKind {
    /// Serve the JSON API
    Serve {
        /// Overrides the configured bind address
        #[arg(long)]
        bind: Option<String>,
    },
    /// Rebuild the cached model from the dataset
    Train,
    /// Answer a single question and exit
    Ask {
        #[arg(long)]
        explain: bool,
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Interactive session (default)
    Repl,
}

fn load_chatbot(settings: &Settings) -> Result<Chatbot> {
    let (rows, model) = load_or_train(&settings.dataset_path, &settings.model_path, settings.weighting)
        .with_context(|| format!(
            "failed to prepare model from '{}' (cache '{}')",
            settings.dataset_path.display(),
            settings.model_path.display()
        ))?;

    Chatbot::new(rows, model, settings.threshold)
        .context("cached model does not match the dataset")
}

async fn serve(settings: Settings, bind: Option<String>) -> Result<()> {
    let chatbot = load_chatbot(&settings)?;
    let users = CredentialStore::open(&settings.database_path)
        .await
        .with_context(|| format!("failed to open user store '{}'", settings.database_path.display()))?;

    let state = web::Data::new(AppState {
        chatbot,
        users,
        sessions: SessionStore::new(),
    });

    let bind = bind.unwrap_or(settings.bind);
    tracing::info!(%bind, "starting server");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(fixbot::server::config)
    })
    .bind(&bind)
    .with_context(|| format!("failed to bind {}", bind))?
    .run()
    .await?;

    Ok(())
}

#[actix_web::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref()).context("failed to load settings")?;
    fixbot::logging::init(&settings.log_level);

    match args.command.unwrap_or(CommandKind::Repl) {
        CommandKind::Serve { bind } => serve(settings, bind).await?,

        CommandKind::Train => {
            let (rows, model) = retrain(&settings.dataset_path, &settings.model_path, settings.weighting)
                .context("training failed")?;
            println!(
                "Model trained and saved to '{}' ({} rows, {} terms)",
                settings.model_path.display(),
                rows.len(),
                model.index().vocabulary().len()
            );
        }

        CommandKind::Ask { explain, query } => {
            let bot = load_chatbot(&settings)?;
            let query = query.join(" ");
            if explain {
                cli::explain(&bot, &query, 3);
            } else {
                println!("{}", bot.respond(&query));
            }
        }

        CommandKind::Repl => {
            let bot = load_chatbot(&settings)?;
            cli::run_repl(&bot);
        }
    }

    Ok(())
}
