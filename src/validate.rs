//! Biographical consistency checks.
//!
//! None of these are enforced by the tree or migration code; they are
//! reported so the records can be corrected at the source.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use lineage_types::Person;
use serde::Serialize;

use crate::generation::generation_of;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IssueKind {
    DeathBeforeBirth { born: i32, died: i32 },
    /// `age_at_death` disagrees with `died - born` beyond the tolerance
    AgeMismatch { recorded: i32, computed: i32 },
    DuplicateId,
    /// Child is not exactly one generation below the resolved father
    GenerationGap { father: String, expected: u32, actual: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub external_id: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: IssueKind,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BiographyReport {
    pub checked: usize,
    pub issues: Vec<Issue>,
}

pub fn check_biography(people: &[Person], age_tolerance: i32) -> BiographyReport {
    let mut by_id: HashMap<&str, &Person> = HashMap::new();
    let mut by_name: HashMap<&str, &Person> = HashMap::new();
    let mut issues = Vec::new();

    for p in people {
        match by_id.entry(p.external_id.as_str()) {
            Entry::Occupied(_) => issues.push(issue(p, IssueKind::DuplicateId)),
            Entry::Vacant(slot) => {
                slot.insert(p);
            }
        }
        by_name.entry(p.name.as_str()).or_insert(p);
    }

    for p in people {
        if let (Some(born), Some(died)) = (p.born, p.death_year()) {
            if died < born {
                issues.push(issue(p, IssueKind::DeathBeforeBirth { born, died }));
            } else if let Some(recorded) = p.age_at_death {
                let computed = died - born;
                if (recorded - computed).abs() > age_tolerance {
                    issues.push(issue(p, IssueKind::AgeMismatch { recorded, computed }));
                }
            }
        }

        let father = p
            .father_ref()
            .and_then(|f| by_id.get(f).or_else(|| by_name.get(f)));
        if let Some(father) = father.filter(|f| f.external_id != p.external_id) {
            let expected = generation_of(&father.external_id) + 1;
            let actual = generation_of(&p.external_id);
            if actual != expected {
                issues.push(issue(
                    p,
                    IssueKind::GenerationGap {
                        father: father.external_id.clone(),
                        expected,
                        actual,
                    },
                ));
            }
        }
    }

    BiographyReport {
        checked: people.len(),
        issues,
    }
}

fn issue(p: &Person, kind: IssueKind) -> Issue {
    Issue {
        external_id: p.external_id.clone(),
        name: p.name.clone(),
        kind,
    }
}
