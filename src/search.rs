//! Lookups over the flat person collection.

use lineage_types::Person;

pub fn find_by_external_id<'a>(people: &'a [Person], external_id: &str) -> Option<&'a Person> {
    people.iter().find(|p| p.external_id == external_id)
}

/// Case-insensitive substring match on the name, in input order.
pub fn search_by_name<'a>(people: &'a [Person], query: &str) -> Vec<&'a Person> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    people
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&needle))
        .collect()
}

/// Persons linked to a monarch through `monarch_ids`.
pub fn people_under_monarch<'a>(people: &'a [Person], monarch_id: &str) -> Vec<&'a Person> {
    people
        .iter()
        .filter(|p| p.monarch_ids.iter().any(|id| id == monarch_id))
        .collect()
}

/// Direct children by father reference (external id, or name as fallback).
pub fn children_of<'a>(people: &'a [Person], external_id: &str) -> Vec<&'a Person> {
    let Some(parent) = find_by_external_id(people, external_id) else {
        return Vec::new();
    };
    people
        .iter()
        .filter(|p| {
            p.father_ref().is_some_and(|f| {
                f == parent.external_id
                    || (find_by_external_id(people, f).is_none() && f == parent.name)
            })
        })
        .collect()
}
