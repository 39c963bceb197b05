//! Main module for the Pokédex viewer using Yew.
//! Wires the session, the background catalog load and detail derivations into
//! the UI components.

use futures::StreamExt;
use gloo_timers::callback::Timeout;
use pokedex::api::{ApiClient, ReqwestTransport};
use pokedex::cache::TypeRelationCache;
use pokedex::catalog::Catalog;
use pokedex::config::{LoaderConfig, DEBOUNCE_MS};
use pokedex::derive::{load_detail, DetailBundle, EvolutionView};
use pokedex::loader::{CatalogLoader, TimerPacer};
use pokedex::session::{DetailSlot, LoadPhase, Session};
use pokedex::store::LocalStorage;
use pokedex::view::{TypeFilter, ViewStateManager};
use pokedex::{Record, RecordId};
use std::cell::RefCell;
use std::rc::Rc;
use web_sys::HtmlInputElement;
use yew::prelude::*;

mod components;

use components::{DetailModal, PaginationBar, Pending, RecordCard, StatsPanel, TypeFilterBar};

type Api = ApiClient<ReqwestTransport>;
type AppSession = Session<LocalStorage>;

/// Remote services shared for the lifetime of the page.
struct Services {
    api: Rc<Api>,
    types: TypeRelationCache<Api>,
}

impl Services {
    fn new() -> Self {
        let api = Rc::new(ApiClient::new(ReqwestTransport::new()));
        Self {
            types: TypeRelationCache::new(Rc::clone(&api)),
            api,
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Helper functions

/// Apply a view-state change against the current catalog.
fn update_view(
    session: &RefCell<AppSession>,
    change: impl FnOnce(&mut ViewStateManager<LocalStorage>, &Catalog),
) {
    let mut guard = session.borrow_mut();
    let session = &mut *guard;
    change(&mut session.view, &session.catalog);
}

fn scroll_to_top() {
    if let Some(window) = web_sys::window() {
        window.scroll_to_with_x_and_y(0.0, 0.0);
    }
}

/// Records of the loaded evolution stages, in chain order.
fn stage_records(evolution: &EvolutionView, catalog: &Catalog) -> Vec<Record> {
    match evolution {
        EvolutionView::Stages(ids) => ids
            .iter()
            .filter_map(|id| catalog.get(*id).cloned())
            .collect(),
        _ => Vec::new(),
    }
}

// ──────────────────────────────────────────────────────────────────────────────

#[function_component(App)]
fn app() -> Html {
    let session = use_mut_ref(|| AppSession::new(LocalStorage));
    let services = use_memo((), |_| Services::new());
    let redraw = use_force_update();

    let search_text = use_state(String::new);
    let search_timer = use_mut_ref(|| None::<Timeout>);
    let detail = use_mut_ref(DetailSlot::default);
    let stats_visible = use_state(|| false);

    // Background load: one redraw per batch that changes the projection.
    {
        let session = session.clone();
        let services = services.clone();
        let redraw = redraw.clone();
        use_effect_with((), move |_| {
            wasm_bindgen_futures::spawn_local(async move {
                let loader = CatalogLoader::new(
                    Rc::clone(&services.api),
                    TimerPacer,
                    LoaderConfig::default(),
                );
                let mut events = std::pin::pin!(loader.load_all());
                while let Some(event) = events.next().await {
                    let changed = session.borrow_mut().apply_batch(event);
                    if changed || session.borrow().phase() == LoadPhase::Complete {
                        redraw.force_update();
                    }
                }
            });
            || ()
        });
    }

    let on_search_input = {
        let session = session.clone();
        let search_text = search_text.clone();
        let search_timer = search_timer.clone();
        let redraw = redraw.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let text = input.value();
            search_text.set(text.clone());

            let session = session.clone();
            let redraw = redraw.clone();
            // Replacing the handle drops, and so cancels, any pending search.
            *search_timer.borrow_mut() = Some(Timeout::new(DEBOUNCE_MS, move || {
                update_view(&session, |view, catalog| view.set_query(&text, catalog));
                redraw.force_update();
            }));
        })
    };

    let on_filter = {
        let session = session.clone();
        let search_text = search_text.clone();
        let search_timer = search_timer.clone();
        let redraw = redraw.clone();
        Callback::from(move |filter: TypeFilter| {
            search_timer.borrow_mut().take();
            search_text.set(String::new());
            update_view(&session, |view, catalog| view.set_type_filter(filter, catalog));
            redraw.force_update();
        })
    };

    let on_show_all = {
        let session = session.clone();
        let search_text = search_text.clone();
        let search_timer = search_timer.clone();
        let redraw = redraw.clone();
        Callback::from(move |_: MouseEvent| {
            search_timer.borrow_mut().take();
            search_text.set(String::new());
            update_view(&session, |view, catalog| view.show_all(catalog));
            redraw.force_update();
        })
    };

    let on_show_favorites = {
        let session = session.clone();
        let search_text = search_text.clone();
        let search_timer = search_timer.clone();
        let redraw = redraw.clone();
        Callback::from(move |_: MouseEvent| {
            let mut shown = false;
            update_view(&session, |view, catalog| shown = view.show_favorites(catalog));
            if shown {
                search_timer.borrow_mut().take();
                search_text.set(String::new());
            }
            redraw.force_update();
        })
    };

    let on_toggle_stats = {
        let stats_visible = stats_visible.clone();
        Callback::from(move |_: ()| stats_visible.set(!*stats_visible))
    };

    let on_previous = {
        let session = session.clone();
        let redraw = redraw.clone();
        Callback::from(move |_: ()| {
            if session.borrow_mut().view.previous_page() {
                scroll_to_top();
                redraw.force_update();
            }
        })
    };

    let on_next = {
        let session = session.clone();
        let redraw = redraw.clone();
        Callback::from(move |_: ()| {
            if session.borrow_mut().view.next_page() {
                scroll_to_top();
                redraw.force_update();
            }
        })
    };

    let on_toggle_favorite = {
        let session = session.clone();
        let redraw = redraw.clone();
        Callback::from(move |id: RecordId| {
            session.borrow_mut().view.toggle_favorite(id);
            redraw.force_update();
        })
    };

    let on_open = {
        let session = session.clone();
        let services = services.clone();
        let detail = detail.clone();
        let redraw = redraw.clone();
        Callback::from(move |id: RecordId| {
            let Some(record) = session.borrow().catalog.get(id).cloned() else {
                return;
            };
            detail.borrow_mut().open(id);
            redraw.force_update();

            let services = services.clone();
            let detail = detail.clone();
            let redraw = redraw.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let data = load_detail(services.api.as_ref(), &services.types, &record).await;
                if detail.borrow_mut().complete(data) {
                    redraw.force_update();
                }
            });
        })
    };

    let on_close = {
        let detail = detail.clone();
        let redraw = redraw.clone();
        Callback::from(move |_: ()| {
            detail.borrow_mut().close();
            redraw.force_update();
        })
    };

    let state = session.borrow();
    let catalog = &state.catalog;
    let view = &state.view;
    let page = view.current_projection_page(catalog);

    let grid = if state.phase() == LoadPhase::Loading {
        html! {
            <div class="loading">
                <div class="spinner"></div>
                <p>{ "Loading Pokémon..." }</p>
            </div>
        }
    } else if page.cards.is_empty() && !catalog.is_empty() {
        html! { <p class="no-results-message">{ "No Pokémon found." }</p> }
    } else {
        html! {
            <div class="pokemon-grid">
                { for page.cards.iter().map(|card| html! {
                    <RecordCard
                        key={card.record.id}
                        record={card.record.clone()}
                        favorite={card.favorite}
                        on_open={on_open.clone()}
                        on_toggle_favorite={on_toggle_favorite.clone()}
                    />
                }) }
            </div>
        }
    };

    let slot = detail.borrow();
    let modal = slot.open_id().and_then(|id| catalog.get(id)).map(|record| {
        let favorite = view.is_favorite(record.id);
        let (evolution, matchups) = match slot.data() {
            None => (Pending::Loading, Pending::Loading),
            Some(data) => {
                let bundle = DetailBundle::assemble(record, favorite, data, catalog);
                let stages = stage_records(&bundle.evolution, catalog);
                (
                    Pending::Done((bundle.evolution, stages)),
                    Pending::Done(bundle.matchups),
                )
            }
        };
        html! {
            <DetailModal
                key={record.id}
                record={record.clone()}
                {favorite}
                {evolution}
                {matchups}
                on_close={on_close.clone()}
                on_select={on_open.clone()}
                on_toggle_favorite={on_toggle_favorite.clone()}
            />
        }
    });

    html! {
        <div class="container">
            <header>
                <h1>{ "Pokédex" }</h1>
                <input
                    type="text"
                    id="searchInput"
                    placeholder="Search by name or number..."
                    value={(*search_text).clone()}
                    oninput={on_search_input}
                />
                <div class="actions">
                    <button class="btn-secondary" onclick={on_show_all}>{ "All Pokémon" }</button>
                    <button class="btn-secondary" onclick={on_show_favorites}>{ "Favorites" }</button>
                    <button class="btn-secondary" onclick={on_toggle_stats.reform(|_: MouseEvent| ())}>
                        { "Stats" }
                    </button>
                </div>
                <TypeFilterBar active={view.active_type_filter()} on_select={on_filter} />
            </header>

            if let Some(message) = view.notice() {
                <div class="notice">{ message }</div>
            }
            if *stats_visible {
                <StatsPanel stats={view.stats(catalog)} on_close={on_toggle_stats.clone()} />
            }

            { grid }

            if state.phase() != LoadPhase::Loading {
                <PaginationBar
                    current={page.current_page}
                    total={page.total_pages}
                    {on_previous}
                    {on_next}
                />
            }

            { for modal }
        </div>
    }
}

/// Entry point: installs the panic hook and mounts the App component.
fn main() {
    console_error_panic_hook::set_once();
    yew::Renderer::<App>::new().render();
}
