use std::{process, sync::Arc};

use folio::{
    application::{
        bridge::ContentBridge,
        client::{CachedRead, ContentClient},
        error::AppError,
        media::MediaService,
        repos::{ArticlesRepo, BlobStore, ContentSource},
        storage::StorageBridge,
    },
    cache::{TtlCache, spawn_sweeper},
    config,
    infra::{
        content_dir::ContentDirectory,
        error::InfraError,
        http::{self, HttpState},
        memory::{InMemoryArticles, InMemoryBlobStore},
        supabase::SupabaseClient,
        telemetry,
    },
};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
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

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;
    let app = build_application_context(&settings)?;

    match command {
        config::Command::Serve(_) => run_serve(&settings, app).await,
        config::Command::Import(args) => match args.slug {
            Some(slug) => print_json(&app.content.import(&slug).await?),
            None => print_json(&app.content.import_all().await?),
        },
        config::Command::Export(args) => match args.slug {
            Some(slug) => print_json(&app.content.export(&slug).await?),
            None => print_json(&app.content.export_all().await?),
        },
        config::Command::Sync(_) => print_json(&app.content.sync().await?),
        config::Command::Migrate(args) => {
            if args.files {
                let entries = app
                    .content
                    .content_source()
                    .list_entries()
                    .await
                    .map_err(AppError::from_repo("content directory", "*"))?;
                print_json(
                    &app.storage
                        .migrate_files(&entries, OffsetDateTime::now_utc())
                        .await,
                )
            } else if let Some(slug) = args.slug {
                print_json(&app.storage.migrate_one(&slug).await?)
            } else {
                print_json(&app.storage.migrate_all().await?)
            }
        }
        config::Command::InitStorage(_) => print_json(&app.storage.init().await?),
        config::Command::Mapping(_) => print_json(&app.content.content_mapping().await?),
    }
}

struct ApplicationContext {
    cache: Arc<TtlCache<CachedRead>>,
    content: Arc<ContentBridge>,
    storage: Arc<StorageBridge>,
    media: Arc<MediaService>,
}

fn build_application_context(
    settings: &config::Settings,
) -> Result<ApplicationContext, AppError> {
    let (articles, blobs) = init_backends(settings)?;

    let cache = Arc::new(TtlCache::new(settings.cache.ttl));
    let client = Arc::new(ContentClient::new(
        articles,
        blobs,
        cache.clone(),
        settings.remote.degrade_reads,
    ));

    let content_source: Arc<dyn ContentSource> =
        Arc::new(ContentDirectory::new(&settings.content.directory));
    let content = Arc::new(ContentBridge::new(client.clone(), content_source));
    let storage = Arc::new(StorageBridge::new(
        client.clone(),
        settings.remote.content_bucket.clone(),
        settings.remote.media_bucket.clone(),
    ));
    let media = Arc::new(MediaService::new(
        client,
        settings.remote.media_bucket.clone(),
    ));

    Ok(ApplicationContext {
        cache,
        content,
        storage,
        media,
    })
}

type Backends = (Arc<dyn ArticlesRepo>, Arc<dyn BlobStore>);

fn init_backends(settings: &config::Settings) -> Result<Backends, AppError> {
    match settings.remote.credentials() {
        Some(credentials) => {
            let client = Arc::new(SupabaseClient::new(&credentials, settings.remote.timeout)?);
            info!(
                target: "folio::bootstrap",
                url = %credentials.url,
                "using remote article store"
            );
            let articles: Arc<dyn ArticlesRepo> = client.clone();
            let blobs: Arc<dyn BlobStore> = client;
            Ok((articles, blobs))
        }
        None => {
            warn!(
                target: "folio::bootstrap",
                "remote credentials missing; using in-memory store seeded with sample articles"
            );
            let articles: Arc<dyn ArticlesRepo> = Arc::new(InMemoryArticles::seeded());
            let blobs: Arc<dyn BlobStore> = Arc::new(InMemoryBlobStore::default());
            Ok((articles, blobs))
        }
    }
}

async fn run_serve(settings: &config::Settings, app: ApplicationContext) -> Result<(), AppError> {
    let sweeper = spawn_sweeper(app.cache.clone());

    let state = HttpState {
        content: app.content,
        storage: app.storage,
        media: app.media,
    };
    let router = http::build_router(state, &settings.uploads);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target: "folio::serve",
        addr = %settings.server.addr,
        "listening"
    );

    let result = axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")));

    sweeper.abort();
    let _ = sweeper.await;

    result
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to encode output: {err}")))?;
    println!("{rendered}");
    Ok(())
}
