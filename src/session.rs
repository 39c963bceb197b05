//! Page-session state: the catalog plus the view over it.

use crate::catalog::Catalog;
use crate::derive::DetailData;
use crate::loader::BatchLoaded;
use crate::store::{Favorites, KeyValueStore};
use crate::view::ViewStateManager;
use crate::RecordId;
use log::{debug, info};

/// Load progress as seen by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// The initial batch has not landed yet.
    Loading,
    /// The first page can be shown; more batches are on their way.
    Ready,
    Complete,
}

/// Owns everything that lives for one page session.
pub struct Session<S> {
    pub catalog: Catalog,
    pub view: ViewStateManager<S>,
    phase: LoadPhase,
}

impl<S: KeyValueStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self {
            catalog: Catalog::new(),
            view: ViewStateManager::new(Favorites::load(store)),
            phase: LoadPhase::Loading,
        }
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    /// Fold one loader event into the catalog. The projection is refreshed after
    /// the initial batch, and after later batches only while no search is active.
    /// Returns whether the projection changed.
    pub fn apply_batch(&mut self, event: BatchLoaded) -> bool {
        let initial = event.is_initial();
        let last = event.last;
        let added = self.catalog.append_batch(event.records);

        if last {
            self.phase = LoadPhase::Complete;
            info!("Catalog complete with {} records", self.catalog.len());
        } else if initial {
            self.phase = LoadPhase::Ready;
        }

        if initial || self.view.active_query().is_none() {
            self.view.refresh(&self.catalog);
            return added > 0 || initial;
        }
        false
    }
}

/// The record open in the detail panel and its derivations once they land.
///
/// Detail requests are not cancelled, so results may arrive after the panel
/// moved on to another record; only the open record's result is kept.
#[derive(Debug, Default)]
pub struct DetailSlot {
    open: Option<RecordId>,
    data: Option<DetailData>,
}

impl DetailSlot {
    pub fn open(&mut self, id: RecordId) {
        self.open = Some(id);
        self.data = None;
    }

    pub fn close(&mut self) {
        self.open = None;
        self.data = None;
    }

    pub fn open_id(&self) -> Option<RecordId> {
        self.open
    }

    pub fn data(&self) -> Option<&DetailData> {
        self.data.as_ref()
    }

    /// Store a finished detail result. Returns `false`, dropping it, when its
    /// record is no longer open.
    pub fn complete(&mut self, data: DetailData) -> bool {
        if self.open != Some(data.id) {
            debug!("Dropping detail result for {}", data.id);
            return false;
        }
        self.data = Some(data);
        true
    }
}
