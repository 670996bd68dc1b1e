use std::{process, sync::Arc};

use content_digest::{
    application::{
        counts::CountAggregator,
        digest::DigestService,
        error::AppError,
        listing::{FilteredListCache, ListingCacheConfig},
        repos::Catalog,
    },
    cache::{CacheConfig, CacheStore, InMemoryCacheStore},
    config::{self, RenderArgs, Settings},
    domain::types::ItemId,
    infra::{memory::InMemoryCatalog, telemetry},
};
use tracing::{Dispatch, Level, dispatcher, error, info};
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
        error!(
            error = %error,
            catalog_unavailable = error.is_catalog_unavailable(),
            "application error"
        );
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    match cli_args.command {
        config::Command::Render(args) => run_render(settings, *args).await,
    }
}

async fn run_render(settings: Settings, args: RenderArgs) -> Result<(), AppError> {
    let catalog: Arc<dyn Catalog> =
        Arc::new(InMemoryCatalog::load(&args.catalog, settings.listing.timezone).await?);
    let store: Arc<dyn CacheStore> =
        Arc::new(InMemoryCacheStore::new(&CacheConfig::from(&settings.cache)));

    let service = DigestService::new(
        CountAggregator::new(catalog.clone()),
        FilteredListCache::new(
            catalog,
            store,
            ListingCacheConfig::from(&settings.listing),
        ),
        settings.listing.filter.clone(),
    );

    let current = ItemId::new(args.current_id);
    info!(
        target = "content_digest::render",
        current_id = %current,
        repeat = args.repeat,
        cache_key = %settings.listing.cache_key,
        "Rendering digest"
    );

    for _ in 0..args.repeat {
        let context = service.render(&current).await?;
        let json = serde_json::to_string_pretty(&context)
            .map_err(|err| AppError::unexpected(format!("failed to encode digest: {err}")))?;
        println!("{json}");
    }

    Ok(())
}
