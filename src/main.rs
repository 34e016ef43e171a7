use std::{
    io::{self, Write},
    process,
    sync::Arc,
};

use leafdoc::{
    application::{
        documents::{DocumentOutcome, DocumentService},
        error::AppError,
        loader::FsDocumentSource,
        render::{ComrakRenderService, RenderPipelineConfig},
    },
    cache::DocumentCache,
    client::enhance_html,
    config::{self, RenderArgs, Settings},
    infra::{
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
};
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

/// Exit code used when the requested document does not exist.
const EXIT_NOT_FOUND: i32 = 2;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(()) => {}
        Err(AppError::NotFound(slug)) => {
            report_not_found(&slug);
            process::exit(EXIT_NOT_FOUND);
        }
        Err(error) => {
            report_application_error(&error);
            process::exit(1);
        }
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

fn report_not_found(slug: &str) {
    if dispatcher::has_been_set() {
        warn!(target = "leafdoc::cli", slug, "document not found");
    } else {
        eprintln!("document `{slug}` not found");
    }
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Render(args) => run_render(settings, args).await,
    }
}

fn build_document_service(settings: &Settings) -> DocumentService {
    let source = FsDocumentSource::new(
        settings.documents.root.clone(),
        settings.documents.extension.clone(),
    );
    let renderer = ComrakRenderService::new(RenderPipelineConfig::from(&settings.render));
    let cache = settings
        .cache
        .enabled
        .then(|| DocumentCache::new(settings.cache.capacity));

    DocumentService::new(Arc::new(source), Arc::new(renderer), cache)
}

async fn run_serve(settings: Settings) -> Result<(), AppError> {
    if !settings.documents.root.is_dir() {
        return Err(AppError::from(InfraError::configuration(format!(
            "document root `{}` is not a directory",
            settings.documents.root.display()
        ))));
    }

    let state = HttpState::new(build_document_service(&settings));
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "leafdoc::serve",
        addr = %settings.server.addr,
        docs_root = %settings.documents.root.display(),
        cache = settings.cache.enabled,
        "listening"
    );

    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(Arc::clone(&shutdown)))
        .into_future();

    let grace = settings.server.graceful_shutdown;
    let drain_deadline = async move {
        shutdown.notified().await;
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = drain_deadline => {
            warn!(
                target = "leafdoc::serve",
                grace_secs = grace.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
        }
    }

    info!(target = "leafdoc::serve", "server stopped");
    Ok(())
}

async fn shutdown_signal(notify: Arc<Notify>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(target = "leafdoc::serve", error = %err, "failed to listen for shutdown signal");
        return;
    }
    info!(target = "leafdoc::serve", "shutdown signal received");
    notify.notify_one();
}

async fn run_render(settings: Settings, args: RenderArgs) -> Result<(), AppError> {
    let service = build_document_service(&settings);
    let slug = args.slug.clone();

    let outcome = tokio::task::spawn_blocking(move || service.render_document(&slug))
        .await
        .map_err(|err| AppError::unexpected(format!("render task failed: {err}")))??;

    let document = match outcome {
        DocumentOutcome::Found(document) => document,
        DocumentOutcome::NotFound => return Err(AppError::NotFound(args.slug)),
    };

    let output = if args.outline {
        serde_json::to_string_pretty(&document.outline)
            .map_err(|err| AppError::unexpected(format!("failed to encode outline: {err}")))?
    } else if args.enhance {
        enhance_html(&document.html)
            .map_err(|err| AppError::unexpected(format!("failed to enhance code blocks: {err}")))?
    } else {
        document.html.clone()
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{output}").map_err(|err| AppError::from(InfraError::from(err)))?;
    Ok(())
}
