//! Core application

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use serde::Serialize;

use crate::core::cli::{self, CliConfig, Commands, Repository};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME, APP_NAME_LOWER, ENV_LOG};
use crate::data::history::{HistoryService, MetricStoreKey};
use crate::data::types::Metrics;
use crate::domain::drift::{EmptyReportPolicy, build_reports, resolve_period};
use crate::domain::{KpiReport, ReportDocument, render_report};
use crate::utils::url::{metric_cohort_url, path_escape, report_diff_base_url, report_diff_url};

pub struct CoreApp {
    pub config: AppConfig,
    pub history: HistoryService,
}

/// One rendered slice as written to stdout or the output directory
#[derive(Debug, Serialize)]
struct RenderedReport<'a> {
    /// Raw report, only in debug mode
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a KpiReport>,
    document: &'a ReportDocument,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!(app = APP_NAME, "Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Commands::Classify { period_key } => Self::classify(&period_key),
            Commands::Import {
                installation,
                metric,
                repo,
                file,
            } => {
                let app = Self::init(&cli_config).await?;
                let key = app
                    .import_metrics(&installation, &metric, &file, repo.as_ref())
                    .await?;
                println!("Stored {} under {}", file.display(), key);
                Ok(())
            }
            Commands::Report {
                installation,
                metric,
                ..
            } => {
                let app = Self::init(&cli_config).await?;
                let rendered = app.generate_reports(&installation, &metric).await?;
                app.write_reports(&rendered).await
            }
        }
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        Self::with_config(config).await
    }

    /// Open the history store described by `config`
    pub async fn with_config(config: AppConfig) -> Result<Self> {
        let history = HistoryService::new(&config.store)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to initialize history store: {}", e))?;

        tracing::debug!(backend = history.backend_name(), "History store initialized");

        Ok(Self { config, history })
    }

    fn classify(period_key: &str) -> Result<()> {
        let period = resolve_period(period_key)?;
        println!(
            "{}\t{}",
            period.grain,
            period.cutoff.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        Ok(())
    }

    /// Validate a metric history file and store it
    pub async fn import_metrics(
        &self,
        installation_id: &str,
        metric_name: &str,
        file: &Path,
        repo: Option<&Repository>,
    ) -> Result<MetricStoreKey> {
        let content = tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("Failed to read metric history: {}", file.display()))?;
        let mut metrics: Metrics = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse metric history: {}", file.display()))?;

        // Reject unusable period keys now rather than at report time
        for (slice_key, metric) in &metrics {
            resolve_period(&metric.period).with_context(|| {
                format!(
                    "Invalid period '{}' in slice '{}' of {}",
                    metric.period,
                    slice_key,
                    file.display()
                )
            })?;
        }

        if let Some(repo) = repo {
            let base_url = report_diff_base_url(installation_id, &repo.owner, &repo.name);
            let filled = fill_commit_urls(&mut metrics, &base_url);
            tracing::debug!(filled, base_url = %base_url, "Filled missing commit URLs");
        }

        let key = self
            .history
            .store_metrics(installation_id, metric_name, &metrics)
            .await?;

        tracing::info!(
            installation = installation_id,
            metric = metric_name,
            slices = metrics.len(),
            key = %key,
            "Metric history imported"
        );
        Ok(key)
    }

    /// Build and render the report of every slice of a metric
    pub async fn generate_reports(
        &self,
        installation_id: &str,
        metric_name: &str,
    ) -> Result<Vec<(KpiReport, ReportDocument)>> {
        let metrics = self
            .history
            .load_metrics(installation_id, metric_name)
            .await?;

        let policy = if self.config.report.require_events {
            EmptyReportPolicy::Reject
        } else {
            EmptyReportPolicy::Allow
        };

        let reports = build_reports(metric_name, &metrics, policy, |metric| {
            metric_cohort_url(installation_id, metric_name, metric.time_grain)
        })
        .with_context(|| format!("Failed to build reports for metric '{}'", metric_name))?;

        let rendered = reports
            .into_iter()
            .map(|report| -> Result<(KpiReport, ReportDocument)> {
                let document = render_report(&report)?;
                Ok((report, document))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            installation = installation_id,
            metric = metric_name,
            reports = rendered.len(),
            "Reports generated"
        );
        Ok(rendered)
    }

    /// Write rendered reports to the output directory, or stdout if none is set
    pub async fn write_reports(&self, rendered: &[(KpiReport, ReportDocument)]) -> Result<()> {
        let entries: Vec<RenderedReport<'_>> = rendered
            .iter()
            .map(|(report, document)| RenderedReport {
                report: self.config.debug.then_some(report),
                document,
            })
            .collect();

        let Some(dir) = &self.config.report.output_dir else {
            println!("{}", serde_json::to_string_pretty(&entries)?);
            return Ok(());
        };

        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

        for (entry, (report, _)) in entries.iter().zip(rendered) {
            let path = dir.join(document_file_name(report));
            let json = serde_json::to_vec_pretty(entry)?;
            tokio::fs::write(&path, json)
                .await
                .with_context(|| format!("Failed to write report: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "Report written");
        }

        println!("Wrote {} reports to {}", entries.len(), dir.display());
        Ok(())
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .compact()
            .with_env_filter(filter)
            .init();
    }
}

/// Point every commit without a URL at its diff page. Returns how many were filled.
fn fill_commit_urls(metrics: &mut Metrics, base_url: &str) -> usize {
    let mut filled = 0;
    for metric in metrics.values_mut() {
        for (sha, record) in metric.history.iter_mut() {
            if record.commit_url.is_empty() {
                record.commit_url = report_diff_url(base_url, sha);
                filled += 1;
            }
        }
    }
    filled
}

/// `{period}.json`, or `{period}_{dimension value}.json` for dimensioned slices
fn document_file_name(report: &KpiReport) -> PathBuf {
    let stem = if report.dimension_value.is_empty() {
        path_escape(&report.period_id)
    } else {
        format!(
            "{}_{}",
            path_escape(&report.period_id),
            path_escape(&report.dimension_value)
        )
    };
    PathBuf::from(format!("{stem}.json"))
}
