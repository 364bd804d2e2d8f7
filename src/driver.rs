use anyhow::{Context, Result};
use chrono::NaiveDate;
use futures::{stream, StreamExt};
use log::{debug, error, info, warn};
use tokio::fs::create_dir_all;

use crate::{
    config::DriverConfig,
    fetch::{FetchResult, Fetcher},
    io::{file_exists, save_new_file, WriteOutcome},
    target::{targets, ResourceTarget},
};

/// What happened to one resource target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Written,
    Skipped,
    Failed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub attempted: usize,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    fn record(mut self, outcome: Outcome) -> Self {
        self.attempted += 1;
        match outcome {
            Outcome::Written => self.written += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Failed => self.failed += 1,
        }
        self
    }
}

#[derive(Debug)]
pub struct Driver {
    config: DriverConfig,
    fetcher: Fetcher,
}

impl Driver {
    pub fn new(config: DriverConfig) -> Result<Self> {
        let fetcher = Fetcher::new(&config.fetch).context("building HTTP client")?;
        Ok(Self::with_fetcher(config, fetcher))
    }

    pub fn with_fetcher(config: DriverConfig, fetcher: Fetcher) -> Self {
        Self { config, fetcher }
    }

    /// Create the root directory. Failing here aborts the run.
    pub async fn prepare(&self) -> Result<()> {
        create_dir_all(&self.config.root_dir)
            .await
            .with_context(|| {
                format!(
                    "creating root directory {}",
                    self.config.root_dir.display()
                )
            })
    }

    pub fn targets(&self, date: NaiveDate) -> Vec<ResourceTarget> {
        targets(
            &self.config.countries,
            &self.config.lists,
            date,
            self.config.limit,
        )
    }

    /// Fetch and save every target of `date`, `jobs` at a time.
    pub async fn run(&self, date: NaiveDate) -> RunSummary {
        let targets = self.targets(date);
        let jobs = self.config.jobs.max(1);
        debug!("{} targets for {date}, {jobs} at a time.", targets.len());
        let summary = stream::iter(targets)
            .map(|target| async move { self.process(&target).await })
            .buffered(jobs)
            .fold(RunSummary::default(), |summary, outcome| async move {
                summary.record(outcome)
            })
            .await;
        info!(
            "Written {} files today ({} skipped, {} failed).",
            summary.written, summary.skipped, summary.failed
        );
        summary
    }

    pub async fn process(&self, target: &ResourceTarget) -> Outcome {
        let url = target.url(&self.config.base_url);
        let path = target.path(&self.config.root_dir);
        match file_exists(&path).await {
            Ok(true) => {
                info!("Skipping existing file: {}", path.display());
                return Outcome::Skipped;
            }
            Ok(false) => {}
            Err(err) => {
                error!("Cannot save resource at {url}: {err:#}");
                return Outcome::Failed;
            }
        }
        let bytes = match self.fetcher.get(&url).await {
            FetchResult::Success { bytes } => bytes,
            FetchResult::Failure {
                kind,
                status,
                message,
            } => {
                warn!("Failed to fetch {url} ({kind:?}, response code was {status}): {message}");
                return Outcome::Failed;
            }
        };
        match save_new_file(&path, Some(&bytes[..])).await {
            Ok(WriteOutcome::Written) => {
                info!("Successfully saved file: {}", path.display());
                Outcome::Written
            }
            Ok(WriteOutcome::Skipped) => {
                info!("Skipping existing file: {}", path.display());
                Outcome::Skipped
            }
            Ok(WriteOutcome::Failed { reason }) => {
                error!(
                    "Failed to save resource at {url} to file {}: {reason}",
                    path.display()
                );
                Outcome::Failed
            }
            Err(err) => {
                error!(
                    "Failed to save resource at {url} to file {}: {err:#}",
                    path.display()
                );
                Outcome::Failed
            }
        }
    }
}
