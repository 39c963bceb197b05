//! View state over the catalog: search, type filter, favorites view, and
//! pagination.
//!
//! The projection is recomputed only at explicit points (a new selection, or a
//! [`ViewStateManager::refresh`] after the catalog grows), never on read, so an
//! active search keeps showing the results it produced until the user searches
//! again.

use crate::catalog::Catalog;
use crate::config::PAGE_SIZE;
use crate::store::{Favorites, KeyValueStore};
use crate::{PokeType, Record, RecordId};
use log::debug;

/// Shown when the favorites view is requested with no favorites.
pub const NO_FAVORITES_NOTICE: &str = "No favorite Pokémon yet!";

/// Which subset of the catalog is shown. Query and type filter are mutually
/// exclusive: choosing one clears the other.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    /// Trimmed, lowercased, non-empty search text.
    Query(String),
    Type(PokeType),
    Favorites,
}

impl Selection {
    fn matches(&self, record: &Record, is_favorite: impl Fn(RecordId) -> bool) -> bool {
        match self {
            Selection::All => true,
            Selection::Query(q) => {
                record.name.to_lowercase().contains(q.as_str())
                    || record.id.to_string().contains(q.as_str())
            }
            Selection::Type(ty) => record.has_type(*ty),
            Selection::Favorites => is_favorite(record.id),
        }
    }
}

/// Type filter as offered by the filter bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFilter {
    All,
    Only(PokeType),
}

/// A record on the current page with its favorite flag resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Card<'a> {
    pub record: &'a Record,
    pub favorite: bool,
}

/// Read-only snapshot of the current page for the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView<'a> {
    pub cards: Vec<Card<'a>>,
    pub current_page: usize,
    pub total_pages: usize,
    /// Size of the whole projection.
    pub matches: usize,
}

impl PageView<'_> {
    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// Catalog summary shown in the statistics panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogStats {
    pub total: usize,
    pub favorites: usize,
    pub top_types: Vec<(PokeType, usize)>,
}

/// Owns the selection, page, projection and favorites. Every UI-affecting query
/// goes through here.
pub struct ViewStateManager<S> {
    selection: Selection,
    current_page: usize,
    projection: Vec<RecordId>,
    favorites: Favorites<S>,
    notice: Option<&'static str>,
}

pub fn total_pages(len: usize) -> usize {
    len.div_ceil(PAGE_SIZE).max(1)
}

impl<S: KeyValueStore> ViewStateManager<S> {
    pub fn new(favorites: Favorites<S>) -> Self {
        Self {
            selection: Selection::All,
            current_page: 1,
            projection: Vec::new(),
            favorites,
            notice: None,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn active_query(&self) -> Option<&str> {
        match &self.selection {
            Selection::Query(q) => Some(q.as_str()),
            _ => None,
        }
    }

    pub fn active_type_filter(&self) -> TypeFilter {
        match self.selection {
            Selection::Type(ty) => TypeFilter::Only(ty),
            _ => TypeFilter::All,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.projection.len())
    }

    pub fn favorites(&self) -> &Favorites<S> {
        &self.favorites
    }

    pub fn is_favorite(&self, id: RecordId) -> bool {
        self.favorites.contains(id)
    }

    /// Message for the user about the last refused request, cleared by the
    /// next selection change.
    pub fn notice(&self) -> Option<&'static str> {
        self.notice
    }

    fn select(&mut self, selection: Selection, catalog: &Catalog) {
        self.notice = None;
        self.selection = selection;
        self.current_page = 1;
        self.recompute(catalog);
    }

    fn recompute(&mut self, catalog: &Catalog) {
        let favorites = &self.favorites;
        self.projection = catalog
            .iter()
            .filter(|r| self.selection.matches(r, |id| favorites.contains(id)))
            .map(|r| r.id)
            .collect();
        self.current_page = self.current_page.clamp(1, self.total_pages());
        debug!(
            "Projection {:?}: {} matches, page {}/{}",
            self.selection,
            self.projection.len(),
            self.current_page,
            self.total_pages()
        );
    }

    /// Search by name or id. Clears any type filter and returns to page 1.
    pub fn set_query(&mut self, text: &str, catalog: &Catalog) {
        let query = text.trim().to_lowercase();
        let selection = if query.is_empty() {
            Selection::All
        } else {
            Selection::Query(query)
        };
        self.select(selection, catalog);
    }

    /// Filter by type. Clears any query and returns to page 1.
    pub fn set_type_filter(&mut self, filter: TypeFilter, catalog: &Catalog) {
        let selection = match filter {
            TypeFilter::All => Selection::All,
            TypeFilter::Only(ty) => Selection::Type(ty),
        };
        self.select(selection, catalog);
    }

    pub fn show_all(&mut self, catalog: &Catalog) {
        self.select(Selection::All, catalog);
    }

    /// Show only favorites. Refused (returns `false`, selection unchanged,
    /// notice raised) when there are none.
    pub fn show_favorites(&mut self, catalog: &Catalog) -> bool {
        if self.favorites.is_empty() {
            self.notice = Some(NO_FAVORITES_NOTICE);
            return false;
        }
        self.select(Selection::Favorites, catalog);
        true
    }

    /// Re-apply the current selection after the catalog grew, keeping the page.
    pub fn refresh(&mut self, catalog: &Catalog) {
        self.recompute(catalog);
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.current_page = page.clamp(1, self.total_pages());
    }

    pub fn next_page(&mut self) -> bool {
        if self.current_page < self.total_pages() {
            self.current_page += 1;
            true
        } else {
            false
        }
    }

    pub fn previous_page(&mut self) -> bool {
        if self.current_page > 1 {
            self.current_page -= 1;
            true
        } else {
            false
        }
    }

    /// Flip favorite membership and persist. Selection, page and projection are
    /// left untouched.
    pub fn toggle_favorite(&mut self, id: RecordId) -> bool {
        self.favorites.toggle(id)
    }

    pub fn current_projection_page<'a>(&self, catalog: &'a Catalog) -> PageView<'a> {
        let start = (self.current_page - 1) * PAGE_SIZE;
        let cards = self
            .projection
            .iter()
            .skip(start)
            .take(PAGE_SIZE)
            .filter_map(|id| catalog.get(*id))
            .map(|record| Card {
                record,
                favorite: self.favorites.contains(record.id),
            })
            .collect();
        PageView {
            cards,
            current_page: self.current_page,
            total_pages: self.total_pages(),
            matches: self.projection.len(),
        }
    }

    pub fn stats(&self, catalog: &Catalog) -> CatalogStats {
        CatalogStats {
            total: catalog.len(),
            favorites: self.favorites.len(),
            top_types: catalog.top_types(),
        }
    }
}
