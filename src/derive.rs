//! Derived detail views: evolution chains and type matchups.
//!
//! Both derivations are computed per detail request and never cached across
//! records. Each one catches its own failure and turns it into a displayable
//! outcome, so one failing never blocks the other.

use crate::api::{PokeApi, TypeRelations};
use crate::cache::TypeRelationCache;
use crate::catalog::Catalog;
use crate::{FetchError, PokeType, Record, RecordId};
use futures::future::{join, try_join_all};
use log::warn;
use std::rc::Rc;

/// Marker placed between consecutive evolution stages.
pub const TRANSITION_MARKER: &str = " → ";

/// Resolved evolution chain for a detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvolutionView {
    /// The chain has a single member.
    DoesNotEvolve,
    /// Stages in chain order; species not present in the catalog are omitted.
    Stages(Vec<RecordId>),
    /// The species or chain lookup failed.
    Unavailable,
}

impl EvolutionView {
    /// Map chain species names onto loaded records by exact name.
    pub fn resolve(chain: &Result<Vec<String>, FetchError>, catalog: &Catalog) -> Self {
        match chain {
            Err(_) => EvolutionView::Unavailable,
            Ok(names) if names.len() <= 1 => EvolutionView::DoesNotEvolve,
            Ok(names) => EvolutionView::Stages(
                names
                    .iter()
                    .filter_map(|name| catalog.find_by_name(name))
                    .map(|r| r.id)
                    .collect(),
            ),
        }
    }

    /// Plain-text rendering used for summaries and the detail panel header.
    pub fn describe(&self, subject: &Record, catalog: &Catalog) -> String {
        match self {
            EvolutionView::DoesNotEvolve => format!("{} does not evolve.", subject.name),
            EvolutionView::Stages(ids) => ids
                .iter()
                .filter_map(|id| catalog.get(*id))
                .map(|r| r.name.as_str())
                .collect::<Vec<_>>()
                .join(TRANSITION_MARKER),
            EvolutionView::Unavailable => "Could not load evolution data.".to_string(),
        }
    }
}

/// Attacking type paired with its combined damage multiplier.
pub type Matchup = (PokeType, f32);

/// Non-neutral matchups of a defending type combination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effectiveness {
    /// Multiplier ≥ 2.
    pub weaknesses: Vec<Matchup>,
    /// 0 < multiplier < 1.
    pub resistances: Vec<Matchup>,
    /// Multiplier = 0.
    pub immunities: Vec<Matchup>,
}

impl Effectiveness {
    /// Combine the relations of every defending type multiplicatively over the
    /// canonical attacking types. Neutral (×1) matchups are dropped.
    pub fn combine<'a>(relations: impl IntoIterator<Item = &'a TypeRelations> + Clone) -> Self {
        let mut out = Effectiveness::default();
        for attacker in PokeType::ALL {
            let mut multiplier = 1.0_f32;
            for relation in relations.clone() {
                if relation.double_damage_from.contains(&attacker) {
                    multiplier *= 2.0;
                }
                if relation.half_damage_from.contains(&attacker) {
                    multiplier *= 0.5;
                }
                if relation.no_damage_from.contains(&attacker) {
                    multiplier *= 0.0;
                }
            }
            if multiplier == 0.0 {
                out.immunities.push((attacker, multiplier));
            } else if multiplier >= 2.0 {
                out.weaknesses.push((attacker, multiplier));
            } else if multiplier < 1.0 {
                out.resistances.push((attacker, multiplier));
            }
        }
        out
    }

    pub fn is_neutral(&self) -> bool {
        self.weaknesses.is_empty() && self.resistances.is_empty() && self.immunities.is_empty()
    }

    pub fn multiplier_against(&self, attacker: PokeType) -> f32 {
        self.weaknesses
            .iter()
            .chain(&self.resistances)
            .chain(&self.immunities)
            .find(|(ty, _)| *ty == attacker)
            .map(|(_, m)| *m)
            .unwrap_or(1.0)
    }
}

/// Fetch (through the cache) the relations of every defending type concurrently
/// and combine them.
pub async fn type_effectiveness<A: PokeApi + 'static>(
    cache: &TypeRelationCache<A>,
    types: &[PokeType],
) -> Result<Effectiveness, FetchError> {
    let relations: Vec<Rc<TypeRelations>> =
        try_join_all(types.iter().map(|ty| cache.get_or_fetch(*ty))).await?;
    Ok(Effectiveness::combine(relations.iter().map(|r| r.as_ref())))
}

/// Raw results of both derivations for one record, resolved against the
/// catalog at render time.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailData {
    pub id: RecordId,
    pub evolution: Result<Vec<String>, FetchError>,
    pub matchups: Result<Effectiveness, FetchError>,
}

/// Run both derivations for `record` concurrently. Failures are kept per
/// derivation.
pub async fn load_detail<A: PokeApi, C: PokeApi + 'static>(
    api: &A,
    cache: &TypeRelationCache<C>,
    record: &Record,
) -> DetailData {
    let (evolution, matchups) = join(
        api.fetch_species_evolution_chain(record.id),
        type_effectiveness(cache, &record.types),
    )
    .await;

    if let Err(e) = &evolution {
        warn!("Could not load evolution data for {}: {}", record.name, e);
    }
    if let Err(e) = &matchups {
        warn!("Could not load type matchups for {}: {}", record.name, e);
    }
    DetailData {
        id: record.id,
        evolution,
        matchups,
    }
}

/// Everything the renderer needs for the detail panel.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailBundle<'a> {
    pub record: &'a Record,
    pub favorite: bool,
    pub evolution: EvolutionView,
    pub matchups: Option<Effectiveness>,
}

impl<'a> DetailBundle<'a> {
    pub fn assemble(
        record: &'a Record,
        favorite: bool,
        data: &DetailData,
        catalog: &Catalog,
    ) -> Self {
        Self {
            record,
            favorite,
            evolution: EvolutionView::resolve(&data.evolution, catalog),
            matchups: data.matchups.as_ref().ok().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::*;
    use crate::api::ApiClient;
    use crate::fixtures::record;
    use futures::executor::block_on;
    use std::collections::BTreeSet;
    use PokeType::*;

    fn relations(double: &[PokeType], half: &[PokeType], none: &[PokeType]) -> TypeRelations {
        let set = |ts: &[PokeType]| ts.iter().copied().collect::<BTreeSet<_>>();
        TypeRelations {
            double_damage_from: set(double),
            half_damage_from: set(half),
            no_damage_from: set(none),
        }
    }

    fn fire() -> TypeRelations {
        relations(
            &[Ground, Rock, Water],
            &[Bug, Steel, Fire, Grass, Ice, Fairy],
            &[],
        )
    }

    fn flying() -> TypeRelations {
        relations(&[Rock, Electric, Ice], &[Fighting, Bug, Grass], &[Ground])
    }

    fn kanto_catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.append_batch(vec![
            record(1, "bulbasaur", &[Grass, Poison]),
            record(2, "ivysaur", &[Grass, Poison]),
            record(3, "venusaur", &[Grass, Poison]),
            record(6, "charizard", &[Fire, Flying]),
            record(115, "kangaskhan", &[Normal]),
        ]);
        catalog
    }

    #[test]
    fn dual_type_multipliers_compound() {
        let fire = fire();
        let flying = flying();
        let eff = Effectiveness::combine([&fire, &flying]);

        assert_eq!(eff.multiplier_against(Rock), 4.0);
        assert!(eff.weaknesses.contains(&(Rock, 4.0)));
        assert!(eff.weaknesses.contains(&(Water, 2.0)));
        assert_eq!(eff.multiplier_against(Bug), 0.25);
        assert!(eff.resistances.contains(&(Bug, 0.25)));
        // Ice is doubled by flying and halved by fire.
        assert_eq!(eff.multiplier_against(Ice), 1.0);
        assert!(!eff.weaknesses.iter().any(|(t, _)| *t == Ice));
        // Ground is doubled by fire but flying is immune.
        assert_eq!(eff.immunities, vec![(Ground, 0.0)]);
    }

    #[test]
    fn single_type_without_relations_is_neutral() {
        let empty = TypeRelations::default();
        let eff = Effectiveness::combine([&empty]);
        assert!(eff.is_neutral());
    }

    #[test]
    fn matchups_follow_canonical_type_order() {
        let fire = fire();
        let eff = Effectiveness::combine([&fire]);
        let weak: Vec<PokeType> = eff.weaknesses.iter().map(|(t, _)| *t).collect();
        assert_eq!(weak, vec![Water, Ground, Rock]);
    }

    #[test]
    fn three_stage_chain_is_resolved_in_order() {
        let catalog = kanto_catalog();
        let chain = Ok(vec![
            "bulbasaur".to_string(),
            "ivysaur".to_string(),
            "venusaur".to_string(),
        ]);
        let view = EvolutionView::resolve(&chain, &catalog);
        assert_eq!(view, EvolutionView::Stages(vec![1, 2, 3]));

        let subject = catalog.get(2).unwrap();
        assert_eq!(
            view.describe(subject, &catalog),
            "bulbasaur → ivysaur → venusaur"
        );
    }

    #[test]
    fn single_stage_does_not_evolve() {
        let catalog = kanto_catalog();
        let view = EvolutionView::resolve(&Ok(vec!["kangaskhan".to_string()]), &catalog);
        assert_eq!(view, EvolutionView::DoesNotEvolve);
        let subject = catalog.get(115).unwrap();
        assert_eq!(view.describe(subject, &catalog), "kangaskhan does not evolve.");
    }

    #[test]
    fn unloaded_stages_are_omitted() {
        let catalog = kanto_catalog();
        let chain = Ok(vec![
            "charmander".to_string(),
            "charmeleon".to_string(),
            "charizard".to_string(),
        ]);
        assert_eq!(
            EvolutionView::resolve(&chain, &catalog),
            EvolutionView::Stages(vec![6])
        );
    }

    #[test]
    fn failed_chain_is_unavailable() {
        let catalog = kanto_catalog();
        let chain = Err(FetchError::NotFound(crate::Resource::Species(6)));
        let view = EvolutionView::resolve(&chain, &catalog);
        assert_eq!(view, EvolutionView::Unavailable);
        assert_eq!(
            view.describe(catalog.get(6).unwrap(), &catalog),
            "Could not load evolution data."
        );
    }

    #[test]
    fn one_failed_derivation_does_not_block_the_other() {
        let transport = MockTransport::new()
            .respond("/type/fire", 200, type_json(&[Water, Ground, Rock], &[Grass], &[]))
            .respond(
                "/type/flying",
                200,
                type_json(&[Rock, Electric, Ice], &[Grass], &[Ground]),
            );
        let api = Rc::new(ApiClient::with_base_url(transport, BASE));
        let cache = TypeRelationCache::new(Rc::clone(&api));
        let charizard = record(6, "charizard", &[Fire, Flying]);

        let data = block_on(load_detail(&api, &cache, &charizard));
        assert!(data.evolution.is_err());
        let matchups = data.matchups.clone().unwrap();
        assert_eq!(matchups.multiplier_against(Rock), 4.0);
        assert_eq!(matchups.multiplier_against(Grass), 0.25);
        assert_eq!(matchups.immunities, vec![(Ground, 0.0)]);

        let catalog = kanto_catalog();
        let bundle = DetailBundle::assemble(catalog.get(6).unwrap(), true, &data, &catalog);
        assert_eq!(bundle.evolution, EvolutionView::Unavailable);
        assert!(bundle.matchups.is_some());
    }

    #[test]
    fn failed_type_lookup_leaves_evolution_intact() {
        let transport = MockTransport::new()
            .respond("/pokemon-species/1", 200, species_json(1))
            .respond(
                "/evolution-chain/1/",
                200,
                chain_json(&["bulbasaur", "ivysaur", "venusaur"]),
            )
            .respond("/type/grass", 200, type_json(&[Fire], &[Water], &[]))
            .fail("/type/poison", "offline");
        let api = Rc::new(ApiClient::with_base_url(transport, BASE));
        let cache = TypeRelationCache::new(Rc::clone(&api));
        let bulbasaur = record(1, "bulbasaur", &[Grass, Poison]);

        let data = block_on(load_detail(&api, &cache, &bulbasaur));
        assert!(data.matchups.is_err());
        assert_eq!(
            EvolutionView::resolve(&data.evolution, &kanto_catalog()),
            EvolutionView::Stages(vec![1, 2, 3])
        );
    }
}
