//! Per-generation summaries for the timeline view.

use std::collections::BTreeMap;

use lineage_types::Person;
use serde::Serialize;

use crate::generation::generation_of;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSpan {
    /// Earliest known birth year.
    pub earliest: Option<i32>,
    /// Latest known death year (living members excluded).
    pub latest: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationStats {
    pub generation: u32,
    pub count: usize,
    pub time_span: TimeSpan,
    /// Mean recorded age at death, rounded.
    pub avg_lifespan: Option<i64>,
    pub notable_count: usize,
}

/// Group people by generation, ascending. Generations with no members
/// are left out rather than padded.
pub fn stats_by_generation(people: &[Person]) -> Vec<GenerationStats> {
    let mut groups: BTreeMap<u32, Vec<&Person>> = BTreeMap::new();
    for p in people {
        groups.entry(generation_of(&p.external_id)).or_default().push(p);
    }

    groups
        .into_iter()
        .map(|(generation, members)| summarize(generation, &members))
        .collect()
}

fn summarize(generation: u32, members: &[&Person]) -> GenerationStats {
    let earliest = members.iter().filter_map(|p| p.born).min();
    let latest = members.iter().filter_map(|p| p.death_year()).max();

    let ages: Vec<i64> = members
        .iter()
        .filter_map(|p| p.age_at_death)
        .map(i64::from)
        .collect();
    let avg_lifespan = if ages.is_empty() {
        None
    } else {
        let mean = ages.iter().sum::<i64>() as f64 / ages.len() as f64;
        Some(mean.round() as i64)
    };

    GenerationStats {
        generation,
        count: members.len(),
        time_span: TimeSpan { earliest, latest },
        avg_lifespan,
        notable_count: members.iter().filter(|p| p.notable).count(),
    }
}
