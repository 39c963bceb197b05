//! Incremental, paced population of the catalog.
//!
//! The id range is split into an initial batch sized for the first page and
//! smaller follow-up batches. Each batch fans out one request per id, joins them
//! all, and is emitted as a single [`BatchLoaded`] event with its records in id
//! order. Batches never overlap, and follow-up batches are spaced by a pacing
//! delay so the remote API sees a predictable load.

use crate::api::PokeApi;
use crate::config::LoaderConfig;
use crate::{FetchError, Record, RecordId};
use futures::future::join_all;
use futures::stream::{self, Stream};
use log::{info, warn};
use std::ops::RangeInclusive;

/// Delay primitive awaited between batches.
#[allow(async_fn_in_trait)]
pub trait Pacer {
    async fn pause(&self, ms: u32);
}

/// Browser timer pacing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimerPacer;

impl Pacer for TimerPacer {
    async fn pause(&self, ms: u32) {
        gloo_timers::future::TimeoutFuture::new(ms).await;
    }
}

/// One catalog-growth event.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchLoaded {
    /// Zero-based position of the batch; batch 0 is the initial batch.
    pub index: usize,
    pub ids: RangeInclusive<RecordId>,
    /// Successfully fetched records, ascending by id.
    pub records: Vec<Record>,
    /// Fetches that failed; these ids are dropped for the session.
    pub failures: Vec<FetchError>,
    /// True for the last batch of the load.
    pub last: bool,
}

impl BatchLoaded {
    pub fn is_initial(&self) -> bool {
        self.index == 0
    }
}

/// Split `1..=max_id` into the initial batch followed by fixed-size batches.
pub fn plan_batches(config: &LoaderConfig) -> Vec<RangeInclusive<RecordId>> {
    let mut batches = Vec::new();
    if config.max_id == 0 {
        return batches;
    }
    let mut start: RecordId = 1;
    let mut size = config.initial_batch.max(1);
    while start <= config.max_id {
        let end = start.saturating_add(size - 1).min(config.max_id);
        batches.push(start..=end);
        start = end + 1;
        size = config.batch_size.max(1);
    }
    batches
}

pub struct CatalogLoader<A, P> {
    api: A,
    pacer: P,
    config: LoaderConfig,
}

impl<A: PokeApi, P: Pacer> CatalogLoader<A, P> {
    pub fn new(api: A, pacer: P, config: LoaderConfig) -> Self {
        Self { api, pacer, config }
    }

    /// Fetch every id of one batch concurrently and wait for all of them to settle.
    pub async fn load_batch(
        &self,
        index: usize,
        ids: RangeInclusive<RecordId>,
        last: bool,
    ) -> BatchLoaded {
        let results = join_all(ids.clone().map(|id| self.api.fetch_record(id))).await;

        let mut records = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("Error fetching record: {}", e);
                    failures.push(e);
                }
            }
        }
        records.sort_by_key(|r| r.id);

        info!(
            "Batch {} ({}..={}) loaded: {} records, {} failed",
            index,
            ids.start(),
            ids.end(),
            records.len(),
            failures.len()
        );
        BatchLoaded {
            index,
            ids,
            records,
            failures,
            last,
        }
    }

    /// Lazily load the whole catalog, one event per batch. Follow-up batches are
    /// separated from each other by the pacing delay; the stream ends after the
    /// batch containing the last id.
    pub fn load_all(&self) -> impl Stream<Item = BatchLoaded> + '_ {
        let batches = plan_batches(&self.config);
        let total = batches.len();
        info!("Loading {} records in {} batches", self.config.max_id, total);

        stream::unfold(batches.into_iter().enumerate(), move |mut pending| async move {
            let (index, ids) = pending.next()?;
            if index >= 2 {
                self.pacer.pause(self.config.pacing_ms).await;
            }
            let event = self.load_batch(index, ids, index + 1 == total).await;
            Some((event, pending))
        })
    }
}
