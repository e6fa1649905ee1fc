use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use humansize::{format_size, DECIMAL};
use s3_version_pruner::{
    adapters::outbound::storage::s3::DEFAULT_REGION,
    app::{AppBuilder, AppConfig, StorageBackend},
    BucketTarget, PruneRequest, RetentionPolicy, RunReport, S3Config,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "s3-version-pruner", version)]
#[command(
    about = "Delete all but the most recent versions of every object in versioned S3 buckets",
    long_about = None
)]
struct Cli {
    /// Bucket to prune, or `*` for every bucket in the account
    #[arg(short, long, env = "PRUNE_BUCKET", value_parser = parse_target)]
    bucket: BucketTarget,

    /// Only prune keys starting with this prefix
    #[arg(short, long, env = "PRUNE_PREFIX")]
    prefix: Option<String>,

    /// Number of most recent versions to keep per key
    #[arg(short = 'n', long, env = "PRUNE_KEEP_COUNT")]
    count: usize,

    /// Actually delete; without this flag only the plan is reported
    #[arg(long)]
    confirm: bool,

    /// Storage backend type
    #[arg(long, env = "STORAGE_BACKEND", value_enum, default_value_t = Backend::S3)]
    backend: Backend,

    /// S3 region
    #[arg(short = 'r', long, env = "S3_REGION", default_value = DEFAULT_REGION)]
    s3_region: String,

    /// S3 endpoint URL, for MinIO or other S3 compatible services
    #[arg(short = 'e', long, env = "S3_ENDPOINT")]
    s3_endpoint: Option<String>,

    /// Talk plain http to the endpoint
    #[arg(short = 's', long, env = "S3_DISABLE_SSL")]
    s3_disable_ssl: bool,

    /// S3 access key; the default AWS credential chain is used when absent
    #[arg(long, env = "S3_ACCESS_KEY")]
    s3_access_key: Option<String>,

    /// S3 secret key
    #[arg(long, env = "S3_SECRET_KEY", hide_env_values = true)]
    s3_secret_key: Option<String>,

    /// Format of the final report
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Log level, overridden by RUST_LOG
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    S3,
    Memory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_target(value: &str) -> Result<BucketTarget, String> {
    value.parse().map_err(|e| format!("{e}"))
}

impl Cli {
    fn to_app_config(&self) -> AppConfig {
        let storage_backend = match self.backend {
            Backend::Memory => StorageBackend::InMemory,
            Backend::S3 => StorageBackend::S3(
                S3Config::builder()
                    .region(self.s3_region.clone())
                    .maybe_endpoint(self.s3_endpoint.clone())
                    .disable_ssl(self.s3_disable_ssl)
                    .maybe_access_key(self.s3_access_key.clone())
                    .maybe_secret_key(self.s3_secret_key.clone())
                    .build(),
            ),
        };

        let mut prune = PruneRequest::dry_run(
            self.bucket.clone(),
            RetentionPolicy::keep_latest(self.count),
        );
        if let Some(prefix) = self.prefix.as_deref().filter(|p| !p.is_empty()) {
            prune = prune.with_prefix(prefix);
        }
        if self.confirm {
            prune = prune.confirmed();
        }

        AppConfig {
            storage_backend,
            prune,
        }
    }

    fn init_logging(&self) {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.log_level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .with(env_filter)
            .init();
    }
}

fn render_text(report: &RunReport) -> String {
    let mut out = String::new();

    for bucket in &report.buckets {
        out.push_str(&format!(
            "{}: {} versions of {} keys in {} pages, {} versions to delete ({})\n",
            bucket.bucket,
            bucket.records_scanned,
            bucket.keys_scanned,
            bucket.pages,
            bucket.versions_to_delete,
            format_size(bucket.reclaimable_bytes, DECIMAL),
        ));
        if let Some(purge) = &bucket.purge {
            out.push_str(&format!(
                "  deleted {} of {} in {} batches, {} failures\n",
                purge.deleted,
                purge.requested,
                purge.batches,
                purge.failures.len()
            ));
        }
    }

    let verb = if report.dry_run { "would delete" } else { "deleted" };
    let count = if report.dry_run {
        report.versions_to_delete()
    } else {
        report.versions_deleted()
    };
    out.push_str(&format!(
        "{} buckets, {} {} versions, {} reclaimable\n",
        report.buckets.len(),
        verb,
        count,
        format_size(report.reclaimable_bytes(), DECIMAL)
    ));
    if report.dry_run && count > 0 {
        out.push_str("dry run: pass --confirm to delete\n");
    }

    out
}

async fn run(config: AppConfig, format: OutputFormat) -> Result<()> {
    let app = AppBuilder::new()
        .with_config(config)
        .build()
        .await
        .context("Failed to build application")?;

    info!(
        bucket = %app.request.target,
        prefix = app.request.prefix_display(),
        keep = app.request.policy.keep,
        confirm = app.request.confirm,
        "Starting pruning run"
    );

    let report = app.run().await.context("Pruning run failed")?;

    match format {
        OutputFormat::Text => print!("{}", render_text(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}

fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.init_logging();

    let config = cli.to_app_config();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run(config, cli.format)).inspect_err(|e| {
        error!("{e:#}");
    })
}
