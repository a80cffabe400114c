//! Batched, cancellable filtering over loaded lexicons.
//!
//! A [`FilterScan`] tests a bounded number of entries per [`FilterScan::step`]
//! so a host can interleave a long scan with other work. The scan holds no
//! state besides its cursor and the hits so far; a [`CancelToken`] checked
//! before every batch abandons it. [`QueryBoard`] owns the result set a host
//! displays and only ever replaces it with a finished scan or an explicitly
//! empty set.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use connlex_lexicon::{Entry, Lexicon};
use tracing::debug;

use crate::predicate::matches;
use crate::selection::Selection;

/// Entries tested per step unless the caller says otherwise.
pub const DEFAULT_BATCH: usize = 20;

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Hits of a finished scan plus the number of hits per lexicon name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanResults<'a> {
    pub hits: Vec<&'a Entry>,
    pub counts: BTreeMap<String, usize>,
}

impl<'a> ScanResults<'a> {
    fn record(&mut self, entry: &'a Entry) {
        self.hits.push(entry);
        *self.counts.entry(entry.lex_name.clone()).or_default() += 1;
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

pub enum ScanStep<'a> {
    Pending(FilterScan<'a>),
    Finished(ScanResults<'a>),
    Cancelled,
}

pub struct FilterScan<'a> {
    lexicons: &'a [&'a Lexicon],
    selection: &'a Selection,
    token: CancelToken,
    lexicon: usize,
    entry: usize,
    processed: usize,
    results: ScanResults<'a>,
}

impl<'a> FilterScan<'a> {
    pub fn new(lexicons: &'a [&'a Lexicon], selection: &'a Selection, token: CancelToken) -> Self {
        Self {
            lexicons,
            selection,
            token,
            lexicon: 0,
            entry: 0,
            processed: 0,
            results: ScanResults::default(),
        }
    }

    pub fn total(&self) -> usize {
        self.lexicons.iter().map(|lexicon| lexicon.entry.len()).sum()
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Move the cursor past exhausted lexicons; the next entry to test, if any.
    fn current(&mut self) -> Option<&'a Entry> {
        loop {
            let lexicon = self.lexicons.get(self.lexicon)?;
            match lexicon.entry.get(self.entry) {
                Some(entry) => return Some(entry),
                None => {
                    self.lexicon += 1;
                    self.entry = 0;
                }
            }
        }
    }

    /// Test up to `batch` entries (at least one).
    pub fn step(mut self, batch: usize) -> ScanStep<'a> {
        if self.token.is_cancelled() {
            debug!(processed = self.processed, "filter scan cancelled");
            return ScanStep::Cancelled;
        }
        for _ in 0..batch.max(1) {
            let Some(entry) = self.current() else {
                break;
            };
            if matches(entry, self.selection) {
                self.results.record(entry);
            }
            self.entry += 1;
            self.processed += 1;
        }
        if self.current().is_some() {
            ScanStep::Pending(self)
        } else {
            debug!(processed = self.processed, hits = self.results.len(), "filter scan finished");
            ScanStep::Finished(self.results)
        }
    }

    /// Drive the scan to completion in `batch`-sized steps. `None` if it was
    /// cancelled on the way.
    pub fn run(self, batch: usize) -> Option<ScanResults<'a>> {
        let mut scan = self;
        loop {
            match scan.step(batch) {
                ScanStep::Pending(next) => scan = next,
                ScanStep::Finished(results) => return Some(results),
                ScanStep::Cancelled => return None,
            }
        }
    }
}

/// Owner of the displayed result set.
///
/// Starting a query cancels the previous scan and shows an empty set until
/// the new scan publishes; results from superseded scans are rejected.
#[derive(Debug, Default)]
pub struct QueryBoard<T> {
    generation: u64,
    token: CancelToken,
    published: T,
}

impl<T: Default> QueryBoard<T> {
    pub fn new() -> Self {
        Self {
            generation: 0,
            token: CancelToken::new(),
            published: T::default(),
        }
    }

    /// Begin a new query: returns its generation and cancellation token.
    pub fn begin(&mut self) -> (u64, CancelToken) {
        self.token.cancel();
        self.token = CancelToken::new();
        self.generation += 1;
        self.published = T::default();
        (self.generation, self.token.clone())
    }

    /// Publish a finished result set. Returns `false` (and drops the
    /// results) if a newer query has started since `generation` began.
    pub fn publish(&mut self, generation: u64, results: T) -> bool {
        if generation != self.generation {
            return false;
        }
        self.published = results;
        true
    }

    pub fn current(&self) -> &T {
        &self.published
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
