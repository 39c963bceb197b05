//! Session cache for per-type damage relations.
//!
//! Entries are keyed by [`PokeType`] and never invalidated: the remote data is
//! treated as static for the lifetime of the page. A lookup for a type that is
//! already being fetched joins the in-flight request instead of issuing another,
//! so a dual-type record, or several records opened in quick succession, cost at
//! most one request per type.
//!
//! # Entry states
//! - `Pending`: a request is in flight; its shared future is handed to every caller.
//! - `Ready`: the relations arrived and are served without touching the network.
//!
//! Failed requests leave no entry behind, so a later lookup retries.

use crate::api::{PokeApi, TypeRelations};
use crate::{FetchError, PokeType};
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use log::{debug, warn};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

type InFlight = Shared<LocalBoxFuture<'static, Result<Rc<TypeRelations>, FetchError>>>;

enum Entry {
    Pending(InFlight),
    Ready(Rc<TypeRelations>),
}

/// Memoizing, request-coalescing front of [`PokeApi::fetch_type_relations`].
pub struct TypeRelationCache<A> {
    api: Rc<A>,
    entries: RefCell<HashMap<PokeType, Entry>>,
    requests: Cell<usize>,
}

impl<A: PokeApi + 'static> TypeRelationCache<A> {
    pub fn new(api: Rc<A>) -> Self {
        Self {
            api,
            entries: RefCell::new(HashMap::with_capacity(PokeType::ALL.len())),
            requests: Cell::new(0),
        }
    }

    /// Number of remote requests issued so far.
    pub fn requests_issued(&self) -> usize {
        self.requests.get()
    }

    pub fn is_cached(&self, ty: PokeType) -> bool {
        matches!(self.entries.borrow().get(&ty), Some(Entry::Ready(_)))
    }

    pub async fn get_or_fetch(&self, ty: PokeType) -> Result<Rc<TypeRelations>, FetchError> {
        // Check-and-insert happens under one borrow, before any await point.
        let in_flight = {
            let mut entries = self.entries.borrow_mut();
            match entries.get(&ty) {
                Some(Entry::Ready(relations)) => {
                    debug!("Type cache hit for {}", ty);
                    return Ok(Rc::clone(relations));
                }
                Some(Entry::Pending(in_flight)) => {
                    debug!("Joining in-flight request for type {}", ty);
                    in_flight.clone()
                }
                None => {
                    debug!("Type cache miss for {}", ty);
                    let api = Rc::clone(&self.api);
                    let request = async move { api.fetch_type_relations(ty).await.map(Rc::new) }
                        .boxed_local()
                        .shared();
                    entries.insert(ty, Entry::Pending(request.clone()));
                    self.requests.set(self.requests.get() + 1);
                    request
                }
            }
        };

        let result = in_flight.clone().await;

        let mut entries = self.entries.borrow_mut();
        let still_ours = matches!(
            entries.get(&ty),
            Some(Entry::Pending(current)) if current.ptr_eq(&in_flight)
        );
        if still_ours {
            match &result {
                Ok(relations) => {
                    entries.insert(ty, Entry::Ready(Rc::clone(relations)));
                }
                Err(e) => {
                    warn!("Type relations for {} unavailable: {}", ty, e);
                    entries.remove(&ty);
                }
            }
        }
        result
    }
}
