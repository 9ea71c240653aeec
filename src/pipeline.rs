use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use rayon::prelude::*;

use crate::{
    annotate::{Label, annotate, placement_for},
    codec::{self, MismatchPolicy, resolve_output_format},
    core::Point,
    error::{LabelError, LabelResult},
    event::NotificationRecord,
    format::classify,
    store::ObjectStore,
};

/// Prefix under which labeled copies are written.
pub const OUTPUT_PREFIX: &str = "labeled-images/";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure, record it in the report, keep going.
    #[default]
    ContinueOnError,
    /// Stop starting new records after the first failure and return it.
    FailFast,
}

#[derive(Clone, Debug)]
pub struct BatchOptions {
    /// Worker thread count. `None` uses rayon's default (one per CPU).
    pub concurrency: Option<usize>,
    pub failure_policy: FailurePolicy,
    pub mismatch_policy: MismatchPolicy,
    /// Records not started within this window report [`LabelError::Cancelled`].
    pub timeout: Option<Duration>,
    pub label: Label,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: None,
            failure_policy: FailurePolicy::default(),
            mismatch_policy: MismatchPolicy::default(),
            timeout: None,
            label: Label::watermark(),
        }
    }
}

/// Cloneable cancellation signal. Once set, records that have not started are
/// skipped; records already in flight run to completion.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    Written {
        output_key: String,
        content_type: String,
        anchor: Point,
        bytes: usize,
    },
    /// Key does not name a supported image; nothing was fetched.
    Skipped,
}

#[derive(Debug)]
pub struct RecordReport {
    pub record: NotificationRecord,
    pub result: LabelResult<RecordOutcome>,
}

/// Per-record results, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub entries: Vec<RecordReport>,
}

impl BatchReport {
    pub fn written(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.result, Ok(RecordOutcome::Written { .. })))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.result, Ok(RecordOutcome::Skipped)))
            .count()
    }

    pub fn cancelled(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.result, Err(LabelError::Cancelled)))
            .count()
    }

    /// Failed records, excluding cancelled ones.
    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&NotificationRecord, &LabelError)> {
        self.entries.iter().filter_map(|e| match &e.result {
            Err(LabelError::Cancelled) | Ok(_) => None,
            Err(err) => Some((&e.record, err)),
        })
    }

    pub fn is_clean(&self) -> bool {
        self.failed() == 0 && self.cancelled() == 0
    }
}

/// Last path segment of `key`, with path-basename semantics: trailing
/// slashes are ignored and an empty key yields `"."`.
pub fn basename(key: &str) -> &str {
    if key.is_empty() {
        return ".";
    }
    let trimmed = key.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/";
    }
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

pub fn output_key(key: &str) -> String {
    format!("{OUTPUT_PREFIX}{}", basename(key))
}

/// Run the full fetch, decode, label, encode, store sequence for one record.
#[tracing::instrument(skip_all, fields(bucket = %record.bucket, key = %record.key))]
pub fn process_record(
    store: &dyn ObjectStore,
    record: &NotificationRecord,
    options: &BatchOptions,
) -> LabelResult<RecordOutcome> {
    tracing::debug!("start processing");
    let Some(ext) = classify(&record.key) else {
        tracing::debug!("not a supported image key, skipping");
        return Ok(RecordOutcome::Skipped);
    };

    let bytes = store
        .get(&record.bucket, &record.key)
        .map_err(|e| LabelError::fetch(&record.key, e))?;
    let decoded = codec::decode(&bytes)?;
    let output = resolve_output_format(ext, decoded.codec, options.mismatch_policy)?;

    let anchor = placement_for(decoded.width(), decoded.height());
    tracing::debug!(
        width = decoded.width(),
        height = decoded.height(),
        %anchor,
        "adding label"
    );
    let labeled = annotate(&decoded.image, anchor, &options.label);
    let body = codec::encode(&labeled, output.codec)?;

    let output_key = output_key(&record.key);
    let len = body.len();
    store
        .put(&record.bucket, &output_key, body, &output.content_type)
        .map_err(|e| LabelError::store(&output_key, e))?;
    tracing::info!(
        output_key = %output_key,
        content_type = %output.content_type,
        bytes = len,
        "saved labeled image"
    );

    Ok(RecordOutcome::Written {
        output_key,
        content_type: output.content_type,
        anchor,
        bytes: len,
    })
}

/// Fans a batch of records out over a bounded worker pool and waits for all of them.
pub struct BatchProcessor {
    store: Arc<dyn ObjectStore>,
    options: BatchOptions,
}

impl BatchProcessor {
    pub fn new(store: Arc<dyn ObjectStore>, options: BatchOptions) -> Self {
        Self { store, options }
    }

    pub fn process(&self, records: &[NotificationRecord]) -> LabelResult<BatchReport> {
        self.process_with_cancel(records, &CancelFlag::new())
    }

    /// Like [`process`](Self::process), but stops starting new records once
    /// `cancel` is set.
    ///
    /// With [`FailurePolicy::FailFast`] the first failure (in input order)
    /// is returned as the error once every worker has settled.
    pub fn process_with_cancel(
        &self,
        records: &[NotificationRecord],
        cancel: &CancelFlag,
    ) -> LabelResult<BatchReport> {
        if records.is_empty() {
            return Ok(BatchReport::default());
        }

        let pool = build_thread_pool(self.options.concurrency)?;
        let deadline = self.options.timeout.map(|t| Instant::now() + t);
        let abort = CancelFlag::new();
        let fail_fast = self.options.failure_policy == FailurePolicy::FailFast;

        tracing::info!(
            records = records.len(),
            threads = pool.current_num_threads(),
            "processing batch"
        );

        let entries = pool.install(|| {
            records
                .par_iter()
                .map(|record| {
                    let stopped = cancel.is_cancelled()
                        || abort.is_cancelled()
                        || deadline.is_some_and(|d| Instant::now() >= d);
                    let result = if stopped {
                        Err(LabelError::Cancelled)
                    } else {
                        process_record(self.store.as_ref(), record, &self.options)
                    };

                    if let Err(err) = &result
                        && !matches!(err, LabelError::Cancelled)
                    {
                        tracing::error!(
                            bucket = %record.bucket,
                            key = %record.key,
                            stage = err.stage(),
                            error = %err,
                            "record failed"
                        );
                        if fail_fast {
                            abort.cancel();
                        }
                    }

                    RecordReport {
                        record: record.clone(),
                        result,
                    }
                })
                .collect::<Vec<_>>()
        });

        let mut report = BatchReport { entries };
        tracing::info!(
            written = report.written(),
            skipped = report.skipped(),
            failed = report.failed(),
            cancelled = report.cancelled(),
            "batch finished"
        );

        if fail_fast
            && let Some(pos) = report.entries.iter().position(|e| {
                matches!(&e.result, Err(err) if !matches!(err, LabelError::Cancelled))
            })
            && let Err(err) = report.entries.swap_remove(pos).result
        {
            return Err(err);
        }

        Ok(report)
    }
}

fn build_thread_pool(threads: Option<usize>) -> LabelResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(LabelError::validation(
            "batch concurrency must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("imglabel-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| LabelError::validation(format!("failed to build worker pool: {e}")))
}
