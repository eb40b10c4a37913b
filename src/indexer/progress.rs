use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// Counters for the batch currently (or last) run by a pipeline.
///
/// Cheap to clone; all clones observe the same counters.
#[derive(Clone, Default)]
pub struct BatchProgress {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    files_total: AtomicUsize,
    files_processed: AtomicUsize,
    cache_hits: AtomicUsize,
    parsed: AtomicUsize,
    passthrough: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    is_active: AtomicBool,
    started_at: Mutex<Option<Instant>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub is_active: bool,
    pub files_total: usize,
    pub files_processed: usize,
    /// Files whose stored fingerprint matched
    pub cache_hits: usize,
    /// Files that went through the parser
    pub parsed: usize,
    /// Unparseable files with changed or unknown content
    pub passthrough: usize,
    /// Highest number of file tasks running at once
    pub peak_in_flight: usize,
    pub elapsed_ms: u64,
}

impl BatchProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, total_files: usize) {
        let inner = &self.inner;
        inner.files_total.store(total_files, Ordering::Release);
        inner.files_processed.store(0, Ordering::Release);
        inner.cache_hits.store(0, Ordering::Release);
        inner.parsed.store(0, Ordering::Release);
        inner.passthrough.store(0, Ordering::Release);
        inner.in_flight.store(0, Ordering::Release);
        inner.peak_in_flight.store(0, Ordering::Release);
        inner.is_active.store(true, Ordering::Release);
        *inner
            .started_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
    }

    pub fn task_started(&self) {
        let now = self.inner.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.inner.peak_in_flight.fetch_max(now, Ordering::AcqRel);
    }

    pub fn task_finished(&self) {
        self.inner.in_flight.fetch_sub(1, Ordering::AcqRel);
        self.inner.files_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cache_hit(&self) {
        self.inner.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_parsed(&self) {
        self.inner.parsed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_passthrough(&self) {
        self.inner.passthrough.fetch_add(1, Ordering::Relaxed);
    }

    pub fn finish(&self) {
        self.inner.is_active.store(false, Ordering::Release);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let inner = &self.inner;
        let elapsed_ms = inner
            .started_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0);

        ProgressSnapshot {
            is_active: inner.is_active.load(Ordering::Acquire),
            files_total: inner.files_total.load(Ordering::Acquire),
            files_processed: inner.files_processed.load(Ordering::Acquire),
            cache_hits: inner.cache_hits.load(Ordering::Acquire),
            parsed: inner.parsed.load(Ordering::Acquire),
            passthrough: inner.passthrough.load(Ordering::Acquire),
            peak_in_flight: inner.peak_in_flight.load(Ordering::Acquire),
            elapsed_ms,
        }
    }
}
