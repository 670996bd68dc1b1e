//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{num::NonZeroUsize, path::PathBuf, str::FromStr, time::Duration};

use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::listing::{DEFAULT_CACHE_KEY, DEFAULT_TTL, HitPolicy};
use crate::cache::CacheKey;
use crate::domain::listing::{HourRange, ListFilter};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "digest";
const ENV_PREFIX: &str = "DIGEST";
const DEFAULT_PAGE_SIZE: usize = 5;
const DEFAULT_KINDS: [&str; 2] = ["post", "event"];
const DEFAULT_HOUR_START: u8 = 0;
const DEFAULT_HOUR_END: u8 = 23;
const DEFAULT_CACHE_MAX_ENTRIES: usize = 64;

/// Command-line arguments for the content-digest binary.
#[derive(Debug, Parser)]
#[command(
    name = "content-digest",
    version,
    about = "Published counts and cached self-excluding listings over a content catalog"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "DIGEST_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render the digest for one catalog item and print it as JSON.
    Render(Box<RenderArgs>),
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// Catalog fixture (TOML) to read content types and items from.
    #[arg(
        long = "catalog",
        env = "DIGEST_CATALOG_FILE",
        value_name = "FILE",
        value_hint = ValueHint::FilePath
    )]
    pub catalog: PathBuf,

    /// Identifier of the item being rendered; it never appears in the listing.
    #[arg(long = "current-id", value_name = "ID")]
    pub current_id: u64,

    /// Render this many times in a row; later renders exercise the cache.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub repeat: u32,

    #[command(flatten)]
    pub overrides: RenderOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RenderOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the number of items shown in the listing.
    #[arg(long = "listing-page-size", value_name = "COUNT")]
    pub listing_page_size: Option<usize>,

    /// Override the listing cache time-to-live.
    #[arg(long = "listing-ttl-seconds", value_name = "SECONDS")]
    pub listing_ttl_seconds: Option<u64>,

    /// Override the listing cache key.
    #[arg(long = "listing-cache-key", value_name = "KEY")]
    pub listing_cache_key: Option<String>,

    /// Override how cached ids are re-checked (require_published|trust_cached).
    #[arg(long = "listing-hit-policy", value_name = "POLICY")]
    pub listing_hit_policy: Option<String>,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub listing: ListingSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct ListingSettings {
    pub cache_key: CacheKey,
    pub ttl: Duration,
    pub hit_policy: HitPolicy,
    /// Site timezone used for the hour-of-day window.
    pub timezone: Tz,
    pub filter: ListFilter,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub max_entries: NonZeroUsize,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("listing.kinds")
            .try_parsing(true),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match &cli.command {
        Command::Render(args) => raw.apply_render_overrides(&args.overrides),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    listing: RawListingSettings,
    cache: RawCacheSettings,
}

impl RawSettings {
    fn apply_render_overrides(&mut self, overrides: &RenderOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(size) = overrides.listing_page_size {
            self.listing.page_size = Some(size);
        }
        if let Some(seconds) = overrides.listing_ttl_seconds {
            self.listing.ttl_seconds = Some(seconds);
        }
        if let Some(key) = overrides.listing_cache_key.as_ref() {
            self.listing.cache_key = Some(key.clone());
        }
        if let Some(policy) = overrides.listing_hit_policy.as_ref() {
            self.listing.hit_policy = Some(policy.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            listing,
            cache,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            listing: build_listing_settings(listing)?,
            cache: build_cache_settings(cache),
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_listing_settings(listing: RawListingSettings) -> Result<ListingSettings, LoadError> {
    let cache_key = listing
        .cache_key
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| DEFAULT_CACHE_KEY.to_string());
    if cache_key.is_empty() {
        return Err(LoadError::invalid("listing.cache_key", "must not be empty"));
    }

    let ttl = match listing.ttl_seconds {
        Some(0) => {
            return Err(LoadError::invalid(
                "listing.ttl_seconds",
                "must be greater than zero",
            ));
        }
        Some(seconds) => Duration::from_secs(seconds),
        None => DEFAULT_TTL,
    };

    let hit_policy = match listing.hit_policy.as_deref().map(str::trim) {
        None => HitPolicy::default(),
        Some("require_published") => HitPolicy::RequirePublished,
        Some("trust_cached") => HitPolicy::TrustCached,
        Some(other) => {
            return Err(LoadError::invalid(
                "listing.hit_policy",
                format!("expected `require_published` or `trust_cached`, got `{other}`"),
            ));
        }
    };

    let timezone = match listing.timezone.as_deref().map(str::trim) {
        None | Some("") => Tz::UTC,
        Some(name) => Tz::from_str(name).map_err(|err| {
            LoadError::invalid("listing.timezone", format!("unknown timezone `{name}`: {err}"))
        })?,
    };

    let tag = listing
        .tag
        .map(|value| slug::slugify(value.trim()))
        .filter(|value| !value.is_empty())
        .ok_or_else(|| LoadError::invalid("listing.tag", "a tag slug is required"))?;

    let category = listing
        .category
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| LoadError::invalid("listing.category", "a category name is required"))?;

    let hour_range = HourRange::new(
        listing.hour_start.unwrap_or(DEFAULT_HOUR_START),
        listing.hour_end.unwrap_or(DEFAULT_HOUR_END),
    )
    .map_err(|err| LoadError::invalid("listing.hour_range", err.to_string()))?;

    let kinds = listing
        .kinds
        .unwrap_or_else(|| DEFAULT_KINDS.iter().map(|kind| kind.to_string()).collect());

    let page_size = listing.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

    let filter = ListFilter::new(kinds, hour_range, tag, category, page_size)
        .map_err(|err| LoadError::invalid("listing", err.to_string()))?;

    Ok(ListingSettings {
        cache_key: CacheKey::from(cache_key),
        ttl,
        hit_policy,
        timezone,
        filter,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> CacheSettings {
    let max_entries = cache.max_entries.unwrap_or(DEFAULT_CACHE_MAX_ENTRIES);
    CacheSettings {
        max_entries: NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN),
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawListingSettings {
    cache_key: Option<String>,
    ttl_seconds: Option<u64>,
    page_size: Option<usize>,
    kinds: Option<Vec<String>>,
    hour_start: Option<u8>,
    hour_end: Option<u8>,
    tag: Option<String>,
    category: Option<String>,
    timezone: Option<String>,
    hit_policy: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    max_entries: Option<usize>,
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
