//! Batch runner: selection, per-record processing and outcome accounting.
//!
//! Records are processed strictly one after another in selection order.
//! Per record the runner applies, in order:
//!
//! 1. unpublished records (`state = 0`) are skipped;
//! 2. the body is extracted, and records without text are skipped;
//! 3. metadata is generated;
//! 4. metadata is written back.
//!
//! Every record ends in exactly one [`RecordOutcome`]. Failures never leave
//! the record they happened in, and writes that already committed stay
//! committed. Between records (after every record except the last, whatever
//! its outcome) the runner pauses for the configured delay.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::Result;
use crate::extract::{HtmlTextExtractor, TextExtractor};
use crate::generate::MetaGenerator;
use crate::pacing::{Pacer, TokioPacer};
use crate::record::{ContentRecord, GeneratedMeta};
use crate::store::{ContentStore, MetaWriter};

/// Selection and pacing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Maximum number of records selected; `None` selects all.
    pub limit: Option<u64>,
    /// Pause between consecutive records.
    pub delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { limit: None, delay: Duration::from_secs(1) }
    }
}

/// Terminal state of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    Success,
    SkippedState,
    SkippedEmpty,
    SkippedApiError,
    SkippedDbError,
}

impl RecordOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordOutcome::Success => "success",
            RecordOutcome::SkippedState => "skipped_state",
            RecordOutcome::SkippedEmpty => "skipped_empty",
            RecordOutcome::SkippedApiError => "skipped_api_errors",
            RecordOutcome::SkippedDbError => "skipped_db_errors",
        }
    }
}

impl fmt::Display for RecordOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate counts for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub success: usize,
    pub skipped_empty: usize,
    pub skipped_api_errors: usize,
    pub skipped_db_errors: usize,
    pub skipped_state: usize,
    #[serde(skip)]
    outcomes: Vec<(i64, RecordOutcome)>,
}

impl BatchReport {
    fn with_total(total: usize) -> Self {
        Self { total, ..Default::default() }
    }

    fn record(&mut self, id: i64, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Success => self.success += 1,
            RecordOutcome::SkippedState => self.skipped_state += 1,
            RecordOutcome::SkippedEmpty => self.skipped_empty += 1,
            RecordOutcome::SkippedApiError => self.skipped_api_errors += 1,
            RecordOutcome::SkippedDbError => self.skipped_db_errors += 1,
        }
        self.outcomes.push((id, outcome));
    }

    /// Sum of all outcome counters. Equals `total` once the batch has finished.
    pub fn processed(&self) -> usize {
        self.success + self.skipped_empty + self.skipped_api_errors + self.skipped_db_errors + self.skipped_state
    }

    /// Count for a single outcome.
    pub fn count(&self, outcome: RecordOutcome) -> usize {
        match outcome {
            RecordOutcome::Success => self.success,
            RecordOutcome::SkippedState => self.skipped_state,
            RecordOutcome::SkippedEmpty => self.skipped_empty,
            RecordOutcome::SkippedApiError => self.skipped_api_errors,
            RecordOutcome::SkippedDbError => self.skipped_db_errors,
        }
    }

    /// `(id, outcome)` pairs in processing order.
    pub fn outcomes(&self) -> &[(i64, RecordOutcome)] {
        &self.outcomes
    }
}

/// Progress callbacks. All methods default to doing nothing.
pub trait BatchObserver: Send + Sync {
    fn batch_started(&self, _total: usize) {}

    /// `index` is 1-based.
    fn record_started(&self, _index: usize, _total: usize, _record: &ContentRecord) {}

    fn generating(&self, _record: &ContentRecord) {}

    fn metadata_generated(&self, _record: &ContentRecord, _meta: &GeneratedMeta) {}

    /// `detail` carries the error message for failed outcomes.
    fn record_finished(&self, _record: &ContentRecord, _outcome: RecordOutcome, _detail: Option<&str>) {}

    fn batch_finished(&self, _report: &BatchReport) {}
}

struct SilentObserver;

impl BatchObserver for SilentObserver {}

/// Drives a batch over a [`ContentStore`].
pub struct BatchRunner {
    extractor: Box<dyn TextExtractor>,
    generator: Box<dyn MetaGenerator>,
    pacer: Box<dyn Pacer>,
    observer: Box<dyn BatchObserver>,
    config: BatchConfig,
}

impl BatchRunner {
    /// Runner with HTML extraction, wall-clock pacing and no progress output.
    pub fn new(generator: Box<dyn MetaGenerator>, config: BatchConfig) -> Self {
        Self {
            extractor: Box::new(HtmlTextExtractor),
            generator,
            pacer: Box::new(TokioPacer),
            observer: Box::new(SilentObserver),
            config,
        }
    }

    pub fn with_extractor(mut self, extractor: Box<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_pacer(mut self, pacer: Box<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn BatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Selects records once and processes all of them.
    ///
    /// # Errors
    ///
    /// Only a selection failure is returned; it aborts before any record is
    /// touched. Per-record failures are counted in the report.
    pub async fn run<S>(&self, store: &mut S) -> Result<BatchReport>
    where
        S: ContentStore + ?Sized,
    {
        let records = store.fetch_records(self.config.limit).await?;
        Ok(self.process(&records, store).await)
    }

    /// Processes already selected records.
    pub async fn process<W>(&self, records: &[ContentRecord], writer: &mut W) -> BatchReport
    where
        W: MetaWriter + ?Sized,
    {
        let total = records.len();
        let mut report = BatchReport::with_total(total);
        self.observer.batch_started(total);

        for (i, record) in records.iter().enumerate() {
            self.observer.record_started(i + 1, total, record);

            let (outcome, detail) = self.process_record(record, writer).await;
            debug!(id = record.id, %outcome, "record processed");
            self.observer.record_finished(record, outcome, detail.as_deref());
            report.record(record.id, outcome);

            if i + 1 < total {
                self.pacer.pause(self.config.delay).await;
            }
        }

        info!(
            total = report.total,
            success = report.success,
            skipped_state = report.skipped_state,
            skipped_empty = report.skipped_empty,
            skipped_api_errors = report.skipped_api_errors,
            skipped_db_errors = report.skipped_db_errors,
            "batch finished"
        );
        self.observer.batch_finished(&report);
        report
    }

    async fn process_record<W>(&self, record: &ContentRecord, writer: &mut W) -> (RecordOutcome, Option<String>)
    where
        W: MetaWriter + ?Sized,
    {
        if !record.is_published() {
            return (RecordOutcome::SkippedState, None);
        }

        let text = self.extractor.extract(record);
        if text.trim().is_empty() {
            return (RecordOutcome::SkippedEmpty, None);
        }

        self.observer.generating(record);
        let meta = match self.generator.generate(&record.title, &text).await {
            Ok(meta) => meta,
            Err(e) => {
                warn!(id = record.id, error = %e, "metadata generation failed");
                return (RecordOutcome::SkippedApiError, Some(e.to_string()));
            }
        };
        self.observer.metadata_generated(record, &meta);

        if writer.write_meta(record.id, &meta.meta_keywords, &meta.meta_description).await {
            (RecordOutcome::Success, None)
        } else {
            (
                RecordOutcome::SkippedDbError,
                Some(format!("update of record {} failed", record.id)),
            )
        }
    }
}
