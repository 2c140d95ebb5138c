//! Migration from legacy monarch names to canonical monarch ids.
//!
//! Everything here is a pure function of the two collections except
//! `run_migration`, which drives a `LineageStore`: retrieve all, compute,
//! update each changed record.

use std::collections::HashSet;

use chrono::NaiveDate;
use lineage_types::{Monarch, Person};
use serde::Serialize;
use tracing::{info, warn};

use crate::reign::{reign_calendar, Lifespan, Reign};
use crate::resolve::NameResolver;
use crate::store::{LineageStore, StoreError};

// ── Single record ────────────────────────────────────────────────────

/// Resolve every legacy name of `person` and return a copy with
/// `monarch_ids` filled in. Records that already carry ids come back
/// unchanged, so applying this twice is the same as applying it once.
pub fn migrate_person(person: &Person, monarchs: &[Monarch]) -> Person {
    migrate_with(person, &NameResolver::new(monarchs))
}

fn migrate_with(person: &Person, resolver: &NameResolver) -> Person {
    if person.is_migrated() {
        return person.clone();
    }
    let (resolved, _) = resolve_names(&person.monarch_names, resolver);
    Person {
        monarch_ids: resolved,
        ..person.clone()
    }
}

/// Resolved ids (deduplicated, first-seen order) and unresolved names.
fn resolve_names(names: &[String], resolver: &NameResolver) -> (Vec<String>, Vec<String>) {
    let mut resolved = Vec::new();
    let mut unresolved = Vec::new();
    for name in names {
        match resolver.resolve_id(name) {
            Some(id) if resolved.contains(&id) => {}
            Some(id) => resolved.push(id),
            None => unresolved.push(name.clone()),
        }
    }
    (resolved, unresolved)
}

pub fn migrate_all(people: &[Person], monarchs: &[Monarch]) -> Vec<Person> {
    let resolver = NameResolver::new(monarchs);
    people.iter().map(|p| migrate_with(p, &resolver)).collect()
}

// ── Dry-run report ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MigrationStatus {
    AlreadyMigrated,
    NeedsMigration,
    NoMonarchData,
}

pub fn status_of(person: &Person) -> MigrationStatus {
    if person.is_migrated() {
        MigrationStatus::AlreadyMigrated
    } else if !person.monarch_names.is_empty() {
        MigrationStatus::NeedsMigration
    } else {
        MigrationStatus::NoMonarchData
    }
}

/// Outcome for one person that still needs migrating.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationEntry {
    pub external_id: String,
    pub name: String,
    pub legacy_names: Vec<String>,
    pub resolved_ids: Vec<String>,
    pub unresolved_names: Vec<String>,
    /// Resolved monarchs whose reign does not overlap the person's life.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub implausible_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub total_persons: usize,
    pub already_migrated: usize,
    pub needs_migration: usize,
    pub no_monarch_data: usize,
    pub resolved_names: usize,
    pub unresolved_names: usize,
    pub entries: Vec<MigrationEntry>,
}

impl MigrationReport {
    /// Every unresolved legacy name, as (external id, name).
    pub fn unresolved(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .flat_map(|e| {
                e.unresolved_names
                    .iter()
                    .map(move |n| (e.external_id.as_str(), n.as_str()))
            })
            .collect()
    }
}

/// Classify every person and preview what migration would produce.
pub fn build_migration_report(
    people: &[Person],
    monarchs: &[Monarch],
    today: NaiveDate,
) -> MigrationReport {
    let resolver = NameResolver::new(monarchs);
    let reigns = reign_calendar(monarchs, today);
    let mut report = MigrationReport {
        total_persons: people.len(),
        ..Default::default()
    };

    for person in people {
        match status_of(person) {
            MigrationStatus::AlreadyMigrated => report.already_migrated += 1,
            MigrationStatus::NoMonarchData => report.no_monarch_data += 1,
            MigrationStatus::NeedsMigration => {
                report.needs_migration += 1;
                let (resolved_ids, unresolved_names) =
                    resolve_names(&person.monarch_names, &resolver);
                for name in &unresolved_names {
                    warn!(external_id = %person.external_id, name = %name, "unresolved monarch name");
                }
                report.resolved_names += person.monarch_names.len() - unresolved_names.len();
                report.unresolved_names += unresolved_names.len();
                report.entries.push(MigrationEntry {
                    external_id: person.external_id.clone(),
                    name: person.name.clone(),
                    legacy_names: person.monarch_names.clone(),
                    implausible_ids: implausible(person, &resolved_ids, &reigns, today),
                    resolved_ids,
                    unresolved_names,
                });
            }
        }
    }
    report
}

fn implausible(person: &Person, ids: &[String], reigns: &[Reign], today: NaiveDate) -> Vec<String> {
    let Some(lifespan) = Lifespan::of(person, today) else {
        return Vec::new();
    };
    ids.iter()
        .filter(|id| {
            reigns
                .iter()
                .find(|r| &r.id == *id)
                .is_some_and(|r| !r.overlaps(&lifespan))
        })
        .cloned()
        .collect()
}

// ── Reference validation ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DanglingReference {
    pub external_id: String,
    pub name: String,
    pub missing_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceReport {
    pub checked_persons: usize,
    pub total_references: usize,
    pub dangling_references: usize,
    pub persons: Vec<DanglingReference>,
}

impl ReferenceReport {
    pub fn is_clean(&self) -> bool {
        self.persons.is_empty()
    }
}

/// Find `monarch_ids` entries that no longer exist in the registry,
/// e.g. after a monarch record was deleted or re-keyed.
pub fn validate_monarch_id_references(people: &[Person], monarchs: &[Monarch]) -> ReferenceReport {
    let known: HashSet<&str> = monarchs.iter().map(|m| m.id.as_str()).collect();
    let mut report = ReferenceReport {
        checked_persons: people.len(),
        ..Default::default()
    };

    for person in people {
        report.total_references += person.monarch_ids.len();
        let missing_ids: Vec<String> = person
            .monarch_ids
            .iter()
            .filter(|id| !known.contains(id.as_str()))
            .cloned()
            .collect();
        if missing_ids.is_empty() {
            continue;
        }
        report.dangling_references += missing_ids.len();
        report.persons.push(DanglingReference {
            external_id: person.external_id.clone(),
            name: person.name.clone(),
            missing_ids,
        });
    }
    report
}

// ── Batch workflow ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MigrationRun {
    pub applied: bool,
    pub updated: usize,
    pub report: MigrationReport,
}

/// Report on the whole collection and, unless `dry_run`, write back every
/// record that gained monarch ids. Unresolvable records never stop the run.
pub fn run_migration<S: LineageStore>(
    store: &mut S,
    dry_run: bool,
    today: NaiveDate,
) -> Result<MigrationRun, StoreError> {
    let people = store.persons()?;
    let monarchs = store.monarchs()?;
    let report = build_migration_report(&people, &monarchs, today);

    let mut updated = 0;
    if !dry_run {
        let resolver = NameResolver::new(&monarchs);
        for (index, person) in people.iter().enumerate() {
            let migrated = migrate_with(person, &resolver);
            if migrated.monarch_ids != person.monarch_ids {
                store.update_person(index, &migrated)?;
                updated += 1;
            }
        }
        store.flush()?;
    }

    info!(
        needs_migration = report.needs_migration,
        unresolved = report.unresolved_names,
        updated,
        dry_run,
        "migration finished"
    );
    Ok(MigrationRun {
        applied: !dry_run,
        updated,
        report,
    })
}
