//! Pure Yew view components for the Pokédex UI.
//!
//! Every component renders from props only; all state lives in the session
//! owned by the `App` component.

use pokedex::config::STAT_BAR_MAX;
use pokedex::derive::{Effectiveness, EvolutionView, Matchup, TRANSITION_MARKER};
use pokedex::view::{CatalogStats, TypeFilter};
use pokedex::{PokeType, Record, RecordId};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::HtmlAudioElement;
use yew::prelude::*;

/// A value still being computed in the background.
#[derive(Clone, PartialEq)]
pub enum Pending<T> {
    Loading,
    Done(T),
}

fn type_badge(ty: PokeType) -> Html {
    html! {
        <span class={classes!("type-badge", format!("type-{}", ty))}>{ ty.as_str() }</span>
    }
}

fn image_or_placeholder(url: Option<&str>, alt: &str, class: &'static str) -> Html {
    match url {
        Some(src) => html! { <img class={class} src={src.to_string()} alt={alt.to_string()} loading="lazy" /> },
        None => html! { <div class={classes!(class, "no-image")}>{ "?" }</div> },
    }
}

#[derive(Properties, PartialEq)]
pub struct RecordCardProps {
    pub record: Record,
    pub favorite: bool,
    pub on_open: Callback<RecordId>,
    pub on_toggle_favorite: Callback<RecordId>,
}

#[function_component(RecordCard)]
pub fn record_card(props: &RecordCardProps) -> Html {
    let record = &props.record;
    let id = record.id;
    let onclick = props.on_open.reform(move |_: MouseEvent| id);
    let on_favorite = {
        let toggle = props.on_toggle_favorite.clone();
        Callback::from(move |e: MouseEvent| {
            e.stop_propagation();
            toggle.emit(id);
        })
    };
    let hp = record
        .stat("hp")
        .map(|v| v.to_string())
        .unwrap_or_else(|| "N/A".to_string());

    html! {
        <div class="pokemon-card" {onclick}>
            <button class="favorite-btn" onclick={on_favorite}
                aria-label={if props.favorite { "Remove from favorites" } else { "Add to favorites" }}>
                { if props.favorite { "❤️" } else { "🤍" } }
            </button>
            <div class="pokemon-id">{ record.display_number() }</div>
            <div class="pokemon-image">
                { image_or_placeholder(record.images.default.as_deref(), &record.name, "card-image") }
            </div>
            <h3 class="pokemon-name">{ record.name.clone() }</h3>
            <div class="pokemon-types">
                { for record.types.iter().map(|t| type_badge(*t)) }
            </div>
            <div class="pokemon-stats">
                <div class="stat-row"><span>{ "Height:" }</span><span>{ format!("{:.1} m", record.height_m()) }</span></div>
                <div class="stat-row"><span>{ "Weight:" }</span><span>{ format!("{:.1} kg", record.weight_kg()) }</span></div>
                <div class="stat-row"><span>{ "Base HP:" }</span><span>{ hp }</span></div>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct TypeFilterBarProps {
    pub active: TypeFilter,
    pub on_select: Callback<TypeFilter>,
}

#[function_component(TypeFilterBar)]
pub fn type_filter_bar(props: &TypeFilterBarProps) -> Html {
    let button = |filter: TypeFilter, label: &'static str| {
        let onclick = props.on_select.reform(move |_: MouseEvent| filter);
        let class = classes!("filter-btn", (props.active == filter).then_some("active"));
        html! { <button {class} {onclick}>{ label }</button> }
    };

    html! {
        <div class="filter-buttons">
            { button(TypeFilter::All, "All") }
            { for PokeType::ALL.iter().map(|t| button(TypeFilter::Only(*t), t.as_str())) }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct PaginationBarProps {
    pub current: usize,
    pub total: usize,
    pub on_previous: Callback<()>,
    pub on_next: Callback<()>,
}

#[function_component(PaginationBar)]
pub fn pagination_bar(props: &PaginationBarProps) -> Html {
    html! {
        <div class="pagination">
            <button disabled={props.current <= 1} onclick={props.on_previous.reform(|_: MouseEvent| ())}>
                { "Previous" }
            </button>
            <span class="page-info">{ format!("Page {} of {}", props.current, props.total) }</span>
            <button disabled={props.current >= props.total} onclick={props.on_next.reform(|_: MouseEvent| ())}>
                { "Next" }
            </button>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct StatsPanelProps {
    pub stats: CatalogStats,
    pub on_close: Callback<()>,
}

#[function_component(StatsPanel)]
pub fn stats_panel(props: &StatsPanelProps) -> Html {
    let stats = &props.stats;
    html! {
        <div class="stats-panel">
            <h3>{ "📊 Pokédex Statistics" }</h3>
            <p>{ format!("Total Pokémon: {}", stats.total) }</p>
            <p>{ format!("Favorites: {}", stats.favorites) }</p>
            <h4>{ "Top 5 Types:" }</h4>
            <ul>
                { for stats.top_types.iter().map(|(ty, n)| html! {
                    <li>{ type_badge(*ty) }{ format!(" {} Pokémon", n) }</li>
                }) }
            </ul>
            <button class="btn-secondary small" onclick={props.on_close.reform(|_: MouseEvent| ())}>
                { "Close" }
            </button>
        </div>
    }
}

fn matchup_group(title: &str, matchups: &[Matchup]) -> Html {
    if matchups.is_empty() {
        return html! {};
    }
    html! {
        <div class="matchup-group">
            <strong>{ title }</strong><br />
            { for matchups.iter().map(|(ty, m)| html! {
                <span class="matchup" title={format!("{}x", m)}>{ type_badge(*ty) }</span>
            }) }
        </div>
    }
}

fn render_matchups(matchups: &Pending<Option<Effectiveness>>) -> Html {
    match matchups {
        Pending::Loading => html! { { "Loading matchups..." } },
        Pending::Done(None) => html! { { "Could not load type matchups." } },
        Pending::Done(Some(eff)) if eff.is_neutral() => {
            html! { { "This Pokémon has no special type matchups." } }
        }
        Pending::Done(Some(eff)) => html! {
            <>
                { matchup_group("Weak Against (2x/4x):", &eff.weaknesses) }
                { matchup_group("Resistant To (0.5x/0.25x):", &eff.resistances) }
                { matchup_group("Immune To (0x):", &eff.immunities) }
            </>
        },
    }
}

fn render_evolution(
    subject: &Record,
    evolution: &Pending<(EvolutionView, Vec<Record>)>,
    on_select: &Callback<RecordId>,
) -> Html {
    let (view, stages) = match evolution {
        Pending::Loading => return html! { { "Loading evolution..." } },
        Pending::Done(done) => done,
    };
    match view {
        EvolutionView::DoesNotEvolve => html! { <p>{ format!("{} does not evolve.", subject.name) }</p> },
        EvolutionView::Unavailable => html! { { "Could not load evolution data." } },
        EvolutionView::Stages(_) => {
            let mut nodes: Vec<Html> = Vec::with_capacity(stages.len() * 2);
            for (i, stage) in stages.iter().enumerate() {
                if i > 0 {
                    nodes.push(html! { <span class="evolution-arrow">{ TRANSITION_MARKER.trim() }</span> });
                }
                let id = stage.id;
                let onclick = on_select.reform(move |_: MouseEvent| id);
                nodes.push(html! {
                    <div class="evolution-stage" {onclick}>
                        { image_or_placeholder(stage.images.default.as_deref(), &stage.name, "evolution-image") }
                        <p>{ stage.name.clone() }</p>
                    </div>
                });
            }
            nodes.into_iter().collect::<Html>()
        }
    }
}

fn closes_modal(key: &str) -> bool {
    key == "Escape"
}

/// Close on Escape anywhere in the document while the modal is mounted.
#[hook]
fn use_escape_to_close(on_close: Callback<()>) {
    use_effect_with((), move |_| {
        let listener = Closure::<dyn Fn(KeyboardEvent)>::new(move |e: KeyboardEvent| {
            if closes_modal(&e.key()) {
                on_close.emit(());
            }
        });
        let document = web_sys::window().and_then(|w| w.document());
        if let Some(document) = &document {
            if let Err(e) = document
                .add_event_listener_with_callback("keydown", listener.as_ref().unchecked_ref())
            {
                log::warn!("Could not listen for Escape: {:?}", e);
            }
        }
        move || {
            if let Some(document) = document {
                let _ = document.remove_event_listener_with_callback(
                    "keydown",
                    listener.as_ref().unchecked_ref(),
                );
            }
        }
    });
}

#[derive(Properties, PartialEq)]
pub struct DetailModalProps {
    pub record: Record,
    pub favorite: bool,
    /// Resolved chain plus the records of its loaded stages.
    pub evolution: Pending<(EvolutionView, Vec<Record>)>,
    /// `Done(None)` when the type lookups failed.
    pub matchups: Pending<Option<Effectiveness>>,
    pub on_close: Callback<()>,
    pub on_select: Callback<RecordId>,
    pub on_toggle_favorite: Callback<RecordId>,
}

#[function_component(DetailModal)]
pub fn detail_modal(props: &DetailModalProps) -> Html {
    let record = &props.record;
    let shiny = use_state(|| false);

    let image = if *shiny {
        record.images.shiny.as_deref().or(record.images.default.as_deref())
    } else {
        record.images.default.as_deref()
    };

    let cry_button = record.cry.clone().map(|url| {
        let onclick = Callback::from(move |_: MouseEvent| {
            match HtmlAudioElement::new_with_src(&url) {
                Ok(audio) => {
                    if let Err(e) = audio.play() {
                        log::warn!("Could not play cry: {:?}", e);
                    }
                }
                Err(e) => log::warn!("Could not create audio element: {:?}", e),
            }
        });
        html! { <button class="cry-btn" {onclick} aria-label="Play Pokémon cry">{ "🔊" }</button> }
    });

    let shiny_button = record.images.shiny.is_some().then(|| {
        let shiny = shiny.clone();
        let onclick = Callback::from(move |_: MouseEvent| shiny.set(!*shiny));
        html! { <button class="shiny-btn" {onclick} aria-label="Toggle shiny version">{ "✨" }</button> }
    });

    use_escape_to_close(props.on_close.clone());

    let on_backdrop = props.on_close.reform(|_: MouseEvent| ());
    let id = record.id;
    let on_favorite = props.on_toggle_favorite.reform(move |_: MouseEvent| id);

    html! {
        <div class="modal" onclick={on_backdrop}>
            <div class="modal-content" onclick={Callback::from(|e: MouseEvent| e.stop_propagation())}>
                <span class="close" onclick={props.on_close.reform(|_: MouseEvent| ())}>{ "×" }</span>
                <div class="detail-header">
                    <h2>{ record.name.clone() }</h2>
                    { for cry_button }
                    <button class="favorite-btn" onclick={on_favorite}>
                        { if props.favorite { "❤️" } else { "🤍" } }
                    </button>
                </div>
                <div class="detail-image">
                    { image_or_placeholder(image, &record.name, "detail-image") }
                    <div class="detail-id">{ format!("#{}", record.id) }</div>
                    { for shiny_button }
                </div>
                <div class="detail-columns">
                    <div>
                        <h3>{ "Basic Info" }</h3>
                        <p><strong>{ "Height: " }</strong>{ format!("{:.1} m", record.height_m()) }</p>
                        <p><strong>{ "Weight: " }</strong>{ format!("{:.1} kg", record.weight_kg()) }</p>
                        <p><strong>{ "Abilities:" }</strong><br /><i>{ record.abilities.join(", ") }</i></p>
                        <div class="pokemon-types">
                            { for record.types.iter().map(|t| type_badge(*t)) }
                        </div>
                    </div>
                    <div>
                        <h3>{ "Base Stats" }</h3>
                        { for record.stats.iter().map(|stat| {
                            let width = (stat.value.min(STAT_BAR_MAX) as f64 / STAT_BAR_MAX as f64) * 100.0;
                            html! {
                                <div class="stat">
                                    <div class="stat-label">
                                        <span>{ stat.name.replace('-', " ") }</span>
                                        <span>{ stat.value }</span>
                                    </div>
                                    <div class="stat-bar">
                                        <div class="stat-fill" style={format!("width: {:.0}%;", width)}></div>
                                    </div>
                                </div>
                            }
                        }) }
                    </div>
                </div>
                <div class="type-effectiveness">
                    <h3>{ "Type Matchups" }</h3>
                    { render_matchups(&props.matchups) }
                </div>
                <div class="evolution">
                    <h3>{ "Evolution Chain" }</h3>
                    { render_evolution(record, &props.evolution, &props.on_select) }
                </div>
            </div>
        </div>
    }
}
