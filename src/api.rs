//! Remote data client for the PokéAPI.
//!
//! All request shaping and error normalization lives here: callers only ever see
//! fully-defaulted domain values or a [`FetchError`] naming the resource that failed.
//! HTTP itself goes through the [`Transport`] seam so the client can be driven by
//! canned responses in tests.

use crate::config::API_BASE_URL;
use crate::{FetchError, Images, PokeType, Record, RecordId, Resource, Stat};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::rc::Rc;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Minimal GET-only HTTP seam. `Err` carries a transport-level description.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn get(&self, url: &str) -> Result<HttpResponse, String>;
}

/// Browser `fetch` (or native HTTP) through `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| e.to_string())?;
        Ok(HttpResponse { status, body })
    }
}

/// Damage taken by one type, grouped by multiplier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeRelations {
    pub double_damage_from: BTreeSet<PokeType>,
    pub half_damage_from: BTreeSet<PokeType>,
    pub no_damage_from: BTreeSet<PokeType>,
}

/// Typed operations over the remote catalog.
#[allow(async_fn_in_trait)]
pub trait PokeApi {
    async fn fetch_record(&self, id: RecordId) -> Result<Record, FetchError>;

    /// Species names of the evolution chain containing `id`, following only the
    /// first branch at every fork.
    async fn fetch_species_evolution_chain(&self, id: RecordId)
        -> Result<Vec<String>, FetchError>;

    async fn fetch_type_relations(&self, ty: PokeType) -> Result<TypeRelations, FetchError>;
}

impl<A: PokeApi> PokeApi for &A {
    async fn fetch_record(&self, id: RecordId) -> Result<Record, FetchError> {
        (**self).fetch_record(id).await
    }

    async fn fetch_species_evolution_chain(
        &self,
        id: RecordId,
    ) -> Result<Vec<String>, FetchError> {
        (**self).fetch_species_evolution_chain(id).await
    }

    async fn fetch_type_relations(&self, ty: PokeType) -> Result<TypeRelations, FetchError> {
        (**self).fetch_type_relations(ty).await
    }
}

impl<A: PokeApi> PokeApi for Rc<A> {
    async fn fetch_record(&self, id: RecordId) -> Result<Record, FetchError> {
        (**self).fetch_record(id).await
    }

    async fn fetch_species_evolution_chain(
        &self,
        id: RecordId,
    ) -> Result<Vec<String>, FetchError> {
        (**self).fetch_species_evolution_chain(id).await
    }

    async fn fetch_type_relations(&self, ty: PokeType) -> Result<TypeRelations, FetchError> {
        (**self).fetch_type_relations(ty).await
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Wire shapes

#[derive(Deserialize)]
struct NamedRef {
    name: String,
}

#[derive(Deserialize)]
struct UrlRef {
    url: String,
}

#[derive(Deserialize)]
struct TypeSlot {
    #[serde(rename = "type")]
    kind: NamedRef,
}

#[derive(Deserialize)]
struct Artwork {
    front_default: Option<String>,
    front_shiny: Option<String>,
}

#[derive(Deserialize)]
struct OtherSprites {
    #[serde(rename = "official-artwork")]
    official_artwork: Option<Artwork>,
}

#[derive(Deserialize)]
struct Sprites {
    front_default: Option<String>,
    front_shiny: Option<String>,
    other: Option<OtherSprites>,
}

#[derive(Deserialize)]
struct Cries {
    latest: Option<String>,
}

#[derive(Deserialize)]
struct StatSlot {
    base_stat: u32,
    stat: NamedRef,
}

#[derive(Deserialize)]
struct AbilitySlot {
    ability: NamedRef,
}

#[derive(Deserialize)]
struct PokemonDto {
    id: RecordId,
    name: String,
    types: Vec<TypeSlot>,
    sprites: Option<Sprites>,
    cries: Option<Cries>,
    stats: Option<Vec<StatSlot>>,
    height: Option<u32>,
    weight: Option<u32>,
    abilities: Option<Vec<AbilitySlot>>,
}

#[derive(Deserialize)]
struct SpeciesDto {
    evolution_chain: Option<UrlRef>,
}

#[derive(Deserialize)]
struct ChainLink {
    species: NamedRef,
    #[serde(default)]
    evolves_to: Vec<ChainLink>,
}

#[derive(Deserialize)]
struct EvolutionChainDto {
    chain: ChainLink,
}

#[derive(Deserialize)]
struct DamageRelationsDto {
    #[serde(default)]
    double_damage_from: Vec<NamedRef>,
    #[serde(default)]
    half_damage_from: Vec<NamedRef>,
    #[serde(default)]
    no_damage_from: Vec<NamedRef>,
}

#[derive(Deserialize)]
struct TypeDto {
    damage_relations: DamageRelationsDto,
}

fn non_empty(url: Option<String>) -> Option<String> {
    url.filter(|u| !u.is_empty())
}

impl PokemonDto {
    /// Validate and default the payload into a [`Record`].
    fn into_record(self) -> Result<Record, String> {
        if self.types.is_empty() || self.types.len() > 2 {
            return Err(format!("expected 1 or 2 types, found {}", self.types.len()));
        }
        let types = self
            .types
            .iter()
            .map(|slot| slot.kind.name.parse::<PokeType>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.to_string())?;

        let images = match self.sprites {
            Some(sprites) => {
                let artwork = sprites.other.and_then(|o| o.official_artwork);
                let (art_default, art_shiny) = match artwork {
                    Some(a) => (non_empty(a.front_default), non_empty(a.front_shiny)),
                    None => (None, None),
                };
                Images {
                    default: art_default.or_else(|| non_empty(sprites.front_default)),
                    shiny: art_shiny.or_else(|| non_empty(sprites.front_shiny)),
                }
            }
            None => Images::default(),
        };

        Ok(Record {
            id: self.id,
            name: self.name,
            types,
            images,
            cry: non_empty(self.cries.and_then(|c| c.latest)),
            stats: self
                .stats
                .unwrap_or_default()
                .into_iter()
                .map(|s| Stat {
                    name: s.stat.name,
                    value: s.base_stat,
                })
                .collect(),
            height: self.height.unwrap_or(0),
            weight: self.weight.unwrap_or(0),
            abilities: self
                .abilities
                .unwrap_or_default()
                .into_iter()
                .map(|a| a.ability.name)
                .collect(),
        })
    }
}

/// Walk the chain taking only the first `evolves_to` entry at each node.
fn first_branch_names(root: &ChainLink) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = Some(root);
    while let Some(link) = current {
        names.push(link.species.name.clone());
        current = link.evolves_to.first();
    }
    names
}

fn type_set(refs: &[NamedRef]) -> BTreeSet<PokeType> {
    refs.iter()
        .filter_map(|r| match r.name.parse::<PokeType>() {
            Ok(ty) => Some(ty),
            Err(e) => {
                debug!("Ignoring damage relation: {}", e);
                None
            }
        })
        .collect()
}

// ──────────────────────────────────────────────────────────────────────────────

/// Client for the remote API, generic over the HTTP transport.
pub struct ApiClient<T> {
    transport: T,
    base_url: String,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        Self::with_base_url(transport, API_BASE_URL)
    }

    pub fn with_base_url(transport: T, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `url` and decode a 2xx body, classifying every other outcome.
    async fn get_json<D: DeserializeOwned>(
        &self,
        url: &str,
        resource: Resource,
    ) -> Result<D, FetchError> {
        debug!("GET {}", url);
        let response = match self.transport.get(url).await {
            Ok(response) => response,
            Err(detail) => return Err(FetchError::Network { resource, detail }),
        };
        match response.status {
            200..=299 => {}
            404 => return Err(FetchError::NotFound(resource)),
            status => {
                return Err(FetchError::Network {
                    resource,
                    detail: format!("HTTP status {}", status),
                })
            }
        }
        serde_json::from_str(&response.body).map_err(|e| FetchError::Malformed {
            resource,
            detail: e.to_string(),
        })
    }
}

impl<T: Transport> PokeApi for ApiClient<T> {
    async fn fetch_record(&self, id: RecordId) -> Result<Record, FetchError> {
        let url = format!("{}/pokemon/{}", self.base_url, id);
        let dto: PokemonDto = self.get_json(&url, Resource::Record(id)).await?;
        dto.into_record().map_err(|detail| FetchError::Malformed {
            resource: Resource::Record(id),
            detail,
        })
    }

    async fn fetch_species_evolution_chain(
        &self,
        id: RecordId,
    ) -> Result<Vec<String>, FetchError> {
        let url = format!("{}/pokemon-species/{}", self.base_url, id);
        let species: SpeciesDto = self.get_json(&url, Resource::Species(id)).await?;
        let chain_url = species
            .evolution_chain
            .ok_or_else(|| FetchError::Malformed {
                resource: Resource::Species(id),
                detail: "missing evolution_chain reference".to_string(),
            })?
            .url;
        let chain: EvolutionChainDto = self
            .get_json(&chain_url, Resource::EvolutionChain(id))
            .await?;
        Ok(first_branch_names(&chain.chain))
    }

    async fn fetch_type_relations(&self, ty: PokeType) -> Result<TypeRelations, FetchError> {
        let url = format!("{}/type/{}", self.base_url, ty);
        let dto: TypeDto = self.get_json(&url, Resource::Type(ty)).await?;
        let relations = dto.damage_relations;
        Ok(TypeRelations {
            double_damage_from: type_set(&relations.double_damage_from),
            half_damage_from: type_set(&relations.half_damage_from),
            no_damage_from: type_set(&relations.no_damage_from),
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Canned-response transport shared by the crate's tests.

    use super::{HttpResponse, Transport};
    use crate::PokeType;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::future::Future;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    pub const BASE: &str = "https://test.invalid/api";

    /// Future that stays pending for `remaining` polls, waking itself each time.
    struct YieldPolls {
        remaining: usize,
    }

    impl Future for YieldPolls {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.remaining == 0 {
                Poll::Ready(())
            } else {
                self.remaining -= 1;
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }

    /// One step of an exchange, in the order the transport saw it.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Exchange {
        Sent(String),
        Done(String),
    }

    enum Route {
        Respond { status: u16, body: String, delay: usize },
        Fail(String),
    }

    /// Routes keyed by absolute URL; unknown URLs answer 404.
    #[derive(Default)]
    pub struct MockTransport {
        routes: HashMap<String, Route>,
        calls: RefCell<Vec<String>>,
        exchanges: RefCell<Vec<Exchange>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(mut self, path: &str, status: u16, body: Value) -> Self {
            self.routes.insert(
                format!("{}{}", BASE, path),
                Route::Respond {
                    status,
                    body: body.to_string(),
                    delay: 0,
                },
            );
            self
        }

        pub fn respond_raw(mut self, path: &str, status: u16, body: &str) -> Self {
            self.routes.insert(
                format!("{}{}", BASE, path),
                Route::Respond {
                    status,
                    body: body.to_string(),
                    delay: 0,
                },
            );
            self
        }

        /// Like [`respond`](Self::respond) but the reply only lands after `delay` polls.
        pub fn respond_after(mut self, path: &str, delay: usize, body: Value) -> Self {
            self.routes.insert(
                format!("{}{}", BASE, path),
                Route::Respond {
                    status: 200,
                    body: body.to_string(),
                    delay,
                },
            );
            self
        }

        pub fn fail(mut self, path: &str, detail: &str) -> Self {
            self.routes
                .insert(format!("{}{}", BASE, path), Route::Fail(detail.to_string()));
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        pub fn exchanges(&self) -> Vec<Exchange> {
            self.exchanges.borrow().clone()
        }

        pub fn calls_to(&self, path: &str) -> usize {
            let url = format!("{}{}", BASE, path);
            self.calls.borrow().iter().filter(|c| **c == url).count()
        }
    }

    impl Transport for MockTransport {
        async fn get(&self, url: &str) -> Result<HttpResponse, String> {
            self.calls.borrow_mut().push(url.to_string());
            self.exchanges
                .borrow_mut()
                .push(Exchange::Sent(url.to_string()));
            let response = match self.routes.get(url) {
                Some(Route::Respond {
                    status,
                    body,
                    delay,
                }) => {
                    YieldPolls { remaining: *delay }.await;
                    Ok(HttpResponse {
                        status: *status,
                        body: body.clone(),
                    })
                }
                Some(Route::Fail(detail)) => Err(detail.clone()),
                None => Ok(HttpResponse {
                    status: 404,
                    body: "Not Found".to_string(),
                }),
            };
            self.exchanges
                .borrow_mut()
                .push(Exchange::Done(url.to_string()));
            response
        }
    }

    impl super::ApiClient<MockTransport> {
        pub fn transport_calls(&self, path: &str) -> usize {
            self.transport.calls_to(path)
        }

        pub fn transport_log(&self) -> Vec<String> {
            self.transport.calls()
        }

        pub fn transport_exchanges(&self) -> Vec<Exchange> {
            self.transport.exchanges()
        }
    }

    pub fn pokemon_json(id: u32, name: &str, types: &[PokeType]) -> Value {
        let types: Vec<Value> = types
            .iter()
            .enumerate()
            .map(|(i, t)| json!({ "slot": i + 1, "type": { "name": t.as_str() } }))
            .collect();
        json!({
            "id": id,
            "name": name,
            "types": types,
            "sprites": {
                "front_default": format!("https://img.invalid/{}.png", id),
                "front_shiny": null,
                "other": null
            },
            "stats": [{ "base_stat": 45, "stat": { "name": "hp" } }],
            "height": 7,
            "weight": 69,
            "abilities": []
        })
    }

    pub fn species_json(chain_id: u32) -> Value {
        json!({
            "evolution_chain": { "url": format!("{}/evolution-chain/{}/", BASE, chain_id) }
        })
    }

    /// Linear chain from a list of names.
    pub fn chain_json(names: &[&str]) -> Value {
        let mut link = json!({ "species": { "name": names[names.len() - 1] }, "evolves_to": [] });
        for name in names.iter().rev().skip(1) {
            link = json!({ "species": { "name": name }, "evolves_to": [link] });
        }
        json!({ "id": 1, "chain": link })
    }

    pub fn type_json(double: &[PokeType], half: &[PokeType], none: &[PokeType]) -> Value {
        let names = |ts: &[PokeType]| -> Vec<Value> {
            ts.iter().map(|t| json!({ "name": t.as_str() })).collect()
        };
        json!({
            "damage_relations": {
                "double_damage_from": names(double),
                "half_damage_from": names(half),
                "no_damage_from": names(none),
                "double_damage_to": [],
                "half_damage_to": [],
                "no_damage_to": []
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use futures::executor::block_on;
    use serde_json::json;

    fn client(transport: MockTransport) -> ApiClient<MockTransport> {
        ApiClient::with_base_url(transport, BASE)
    }

    #[test]
    fn record_prefers_official_artwork_and_defaults_missing_fields() {
        let body = json!({
            "id": 6,
            "name": "charizard",
            "types": [
                { "slot": 1, "type": { "name": "fire" } },
                { "slot": 2, "type": { "name": "flying" } }
            ],
            "sprites": {
                "front_default": "https://img.invalid/sprite.png",
                "front_shiny": "https://img.invalid/sprite-shiny.png",
                "other": { "official-artwork": { "front_default": "https://img.invalid/art.png", "front_shiny": null } }
            },
            "cries": { "latest": "https://audio.invalid/6.ogg" },
            "stats": [
                { "base_stat": 78, "stat": { "name": "hp" } },
                { "base_stat": 84, "stat": { "name": "attack" } }
            ]
        });
        let api = client(MockTransport::new().respond("/pokemon/6", 200, body));
        let record = block_on(api.fetch_record(6)).unwrap();

        assert_eq!(record.types, vec![PokeType::Fire, PokeType::Flying]);
        assert_eq!(record.images.default.as_deref(), Some("https://img.invalid/art.png"));
        assert_eq!(
            record.images.shiny.as_deref(),
            Some("https://img.invalid/sprite-shiny.png")
        );
        assert_eq!(record.cry.as_deref(), Some("https://audio.invalid/6.ogg"));
        assert_eq!(record.stat("attack"), Some(84));
        assert_eq!((record.height, record.weight), (0, 0));
        assert!(record.abilities.is_empty());
    }

    #[test]
    fn record_without_sprites_has_no_images() {
        let body = json!({
            "id": 1,
            "name": "bulbasaur",
            "types": [{ "slot": 1, "type": { "name": "grass" } }],
            "sprites": null,
            "cries": null,
            "abilities": [{ "ability": { "name": "overgrow" } }]
        });
        let api = client(MockTransport::new().respond("/pokemon/1", 200, body));
        let record = block_on(api.fetch_record(1)).unwrap();
        assert_eq!(record.images, Images::default());
        assert_eq!(record.cry, None);
        assert_eq!(record.abilities, vec!["overgrow".to_string()]);
    }

    #[test]
    fn failures_are_classified() {
        let api = client(
            MockTransport::new()
                .respond_raw("/pokemon/2", 500, "oops")
                .respond_raw("/pokemon/3", 200, "{ not json")
                .respond("/pokemon/4", 200, json!({ "id": 4, "name": "charmander", "types": [] }))
                .fail("/pokemon/5", "connection reset"),
        );

        assert_eq!(
            block_on(api.fetch_record(1)),
            Err(FetchError::NotFound(Resource::Record(1)))
        );
        assert!(matches!(
            block_on(api.fetch_record(2)),
            Err(FetchError::Network { resource: Resource::Record(2), .. })
        ));
        assert!(matches!(
            block_on(api.fetch_record(3)),
            Err(FetchError::Malformed { resource: Resource::Record(3), .. })
        ));
        assert!(matches!(
            block_on(api.fetch_record(4)),
            Err(FetchError::Malformed { resource: Resource::Record(4), .. })
        ));
        assert_eq!(
            block_on(api.fetch_record(5)),
            Err(FetchError::Network {
                resource: Resource::Record(5),
                detail: "connection reset".to_string()
            })
        );
    }

    #[test]
    fn evolution_chain_follows_first_branch_only() {
        let chain = json!({
            "chain": {
                "species": { "name": "oddish" },
                "evolves_to": [{
                    "species": { "name": "gloom" },
                    "evolves_to": [
                        { "species": { "name": "vileplume" }, "evolves_to": [] },
                        { "species": { "name": "bellossom" }, "evolves_to": [] }
                    ]
                }]
            }
        });
        let api = client(
            MockTransport::new()
                .respond("/pokemon-species/43", 200, species_json(18))
                .respond("/evolution-chain/18/", 200, chain),
        );
        let names = block_on(api.fetch_species_evolution_chain(43)).unwrap();
        assert_eq!(names, vec!["oddish", "gloom", "vileplume"]);
    }

    #[test]
    fn missing_chain_reference_is_malformed() {
        let api = client(MockTransport::new().respond(
            "/pokemon-species/132",
            200,
            json!({ "evolution_chain": null }),
        ));
        assert!(matches!(
            block_on(api.fetch_species_evolution_chain(132)),
            Err(FetchError::Malformed { resource: Resource::Species(132), .. })
        ));
    }

    #[test]
    fn broken_chain_link_reports_chain_resource() {
        let api = client(
            MockTransport::new().respond("/pokemon-species/25", 200, species_json(10)),
        );
        assert_eq!(
            block_on(api.fetch_species_evolution_chain(25)),
            Err(FetchError::NotFound(Resource::EvolutionChain(25)))
        );
    }

    #[test]
    fn type_relations_skip_unknown_type_names() {
        let mut body = type_json(&[PokeType::Water, PokeType::Ground], &[PokeType::Fire], &[]);
        body["damage_relations"]["half_damage_from"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "name": "stellar" }));
        let api = client(MockTransport::new().respond("/type/fire", 200, body));
        let relations = block_on(api.fetch_type_relations(PokeType::Fire)).unwrap();

        assert_eq!(
            relations.double_damage_from.into_iter().collect::<Vec<_>>(),
            vec![PokeType::Water, PokeType::Ground]
        );
        assert_eq!(
            relations.half_damage_from.into_iter().collect::<Vec<_>>(),
            vec![PokeType::Fire]
        );
        assert!(relations.no_damage_from.is_empty());
    }
}
