// Identifier disambiguation
//
// Multi-language videos reuse one format id for every dubbed variant
// ("139" for en and de). Such ids are rewritten to "{id}-{rank}", where the
// rank orders the languages by ascending language_preference.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::catalog::FormatDescriptor;

/// A format id shared by several languages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
    pub format_id: String,
    /// Languages in rank order
    pub languages: Vec<String>,
}

/// Rewrite colliding ids in place, returning the collisions found
pub fn disambiguate(descriptors: &mut [FormatDescriptor]) -> Vec<Collision> {
    // pass 1: id -> (language, preference) in catalog order, first entry per language
    let mut id_to_languages: IndexMap<String, Vec<(String, i64)>> = IndexMap::new();
    for descriptor in descriptors.iter() {
        let (Some(language), Some(preference)) =
            (descriptor.language.as_deref(), descriptor.language_preference)
        else {
            continue;
        };

        let languages = id_to_languages
            .entry(descriptor.format_id.clone())
            .or_default();
        if !languages.iter().any(|(l, _)| l == language) {
            languages.push((language.to_string(), preference));
        }
    }

    // pass 2: rank languages of every collided id
    let mut taken: HashSet<String> = descriptors.iter().map(|d| d.format_id.clone()).collect();
    let mut renames: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut collisions = Vec::new();

    for (format_id, mut languages) in id_to_languages {
        if languages.len() < 2 {
            continue;
        }

        languages.sort_by_key(|(_, preference)| *preference);

        let per_language = renames.entry(format_id.clone()).or_default();
        for (rank, (language, _)) in languages.iter().enumerate() {
            let key = unique_key(&mut taken, format!("{}-{}", format_id, rank));
            per_language.insert(language.clone(), key);
        }

        collisions.push(Collision {
            format_id,
            languages: languages.into_iter().map(|(l, _)| l).collect(),
        });
    }

    if renames.is_empty() {
        return collisions;
    }

    for descriptor in descriptors.iter_mut() {
        let Some(language) = descriptor.language.as_deref() else {
            continue;
        };
        let new_id = renames
            .get(&descriptor.format_id)
            .and_then(|per_language| per_language.get(language))
            .cloned();
        if let Some(new_id) = new_id {
            descriptor.format_id = new_id;
        }
    }

    collisions
}

/// `base`, or `base-N` when `base` is already used in the catalog
fn unique_key(taken: &mut HashSet<String>, base: String) -> String {
    let mut key = base.clone();
    let mut n = 1;
    while taken.contains(&key) {
        key = format!("{}-{}", base, n);
        n += 1;
    }
    taken.insert(key.clone());
    key
}
