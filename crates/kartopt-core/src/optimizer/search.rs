//! Exhaustive combination search.
//!
//! The search space is the four-way cartesian product of the allowed
//! character, kart, wheel and glider groups. Every tuple whose summed stats
//! pass the filter is scored, and all tuples sharing the best score are
//! returned.

use crate::config::SearchConfig;
use crate::models::{ComponentGroup, GameData, Selection, StatBlock};
use crate::optimizer::filter::OptimizerFilter;
use std::collections::BTreeSet;
use tracing::debug;

/// One member of a category as the search sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub stats: StatBlock,
    pub allowed: bool,
}

/// Lazily iterate `a × b × c × d` in row-major order.
pub fn four_way_product<'a, A, B, C, D>(
    a: &'a [A],
    b: &'a [B],
    c: &'a [C],
    d: &'a [D],
) -> impl Iterator<Item = (&'a A, &'a B, &'a C, &'a D)> + 'a {
    a.iter().flat_map(move |a| {
        b.iter().flat_map(move |b| {
            c.iter()
                .flat_map(move |c| d.iter().map(move |d| (a, b, c, d)))
        })
    })
}

/// Every element with the highest key, in iteration order.
///
/// Keys are compared with `==`, so NaN keys never win and never tie.
pub fn max_all<T, I, F>(items: I, mut key: F) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    F: FnMut(&T) -> f32,
{
    let mut best = f32::NEG_INFINITY;
    let mut result = Vec::new();
    for item in items {
        let value = key(&item);
        if value > best {
            best = value;
            result.clear();
            result.push(item);
        } else if value == best {
            result.push(item);
        }
    }
    result
}

/// Filter and rank every combination of allowed candidates.
///
/// Returns indices into the original category lists. An empty category (or
/// one with nothing allowed) yields an empty result.
pub fn search(categories: [&[Candidate]; 4], filter: &OptimizerFilter) -> Vec<Selection> {
    let allowed: Vec<Vec<(usize, &StatBlock)>> = categories
        .iter()
        .map(|category| {
            category
                .iter()
                .enumerate()
                .filter(|(_, candidate)| candidate.allowed)
                .map(|(i, candidate)| (i, &candidate.stats))
                .collect()
        })
        .collect();

    if allowed.iter().any(Vec::is_empty) {
        debug!("A category has no allowed members, nothing to search");
        return Vec::new();
    }

    let scored = four_way_product(&allowed[0], &allowed[1], &allowed[2], &allowed[3]).filter_map(
        |(c, k, w, g)| {
            let total = *c.1 + *k.1 + *w.1 + *g.1;
            filter.accepts(&total).then(|| {
                let selection = Selection {
                    character: c.0,
                    kart: k.0,
                    wheel: w.0,
                    glider: g.0,
                };
                (selection, filter.score(&total))
            })
        },
    );

    let best: Vec<Selection> = max_all(scored, |(_, score)| *score)
        .into_iter()
        .map(|(selection, _)| selection)
        .collect();
    debug!("Search found {} best combinations", best.len());
    best
}

fn candidates<G: ComponentGroup>(groups: &[G], disallowed: &BTreeSet<String>) -> Vec<Candidate> {
    groups
        .iter()
        .map(|group| Candidate {
            stats: *group.stats(),
            allowed: group.names().iter().any(|name| !disallowed.contains(name)),
        })
        .collect()
}

/// Search a dataset, skipping groups whose every name is disallowed.
pub fn search_game_data(data: &GameData, filter: &OptimizerFilter, disallowed: &BTreeSet<String>) -> SearchResults {
    let characters = candidates(&data.characters, disallowed);
    let karts = candidates(&data.karts, disallowed);
    let wheels = candidates(&data.wheels, disallowed);
    let gliders = candidates(&data.gliders, disallowed);

    SearchResults {
        combinations: search([&characters, &karts, &wheels, &gliders], filter),
    }
}

/// All best combinations, with the display cap applied on request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub combinations: Vec<Selection>,
}

impl SearchResults {
    /// At most [`SearchConfig::DISPLAY_LIMIT`] combinations.
    pub fn displayed(&self) -> &[Selection] {
        let end = self.combinations.len().min(SearchConfig::DISPLAY_LIMIT);
        &self.combinations[..end]
    }

    /// Whether [`displayed`](Self::displayed) drops any combinations.
    pub fn is_truncated(&self) -> bool {
        self.combinations.len() > SearchConfig::DISPLAY_LIMIT
    }

    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }
}
