//! Flat person records → a single rooted family tree.
//!
//! Each record names its father either by external id or, in older
//! records, by name. Records whose father cannot be found become root
//! candidates; one of them is chosen as the root and the rest are
//! reported as orphans instead of being silently dropped.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use lineage_types::{Person, ROOT_MARKER};
use serde::Serialize;
use tracing::{debug, warn};

use crate::generation::generation_of;

// ── Types ────────────────────────────────────────────────────────────

/// A person together with their children, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub person: Person,
    pub generation: u32,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Number of nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::node_count).sum::<usize>()
    }

    /// Number of levels in this subtree (a leaf has depth 1).
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(TreeNode::depth).max().unwrap_or(0)
    }

    /// Pre-order traversal.
    pub fn walk(&self) -> Vec<&TreeNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    pub fn find(&self, external_id: &str) -> Option<&TreeNode> {
        self.walk()
            .into_iter()
            .find(|n| n.person.external_id == external_id)
    }
}

/// The reconstructed tree plus the root candidates that lost out.
#[derive(Debug, Clone, Serialize)]
pub struct FamilyTree {
    pub root: TreeNode,
    /// Records with no resolvable father that were not chosen as root.
    /// Their descendants are not part of `root` either.
    pub orphans: Vec<Person>,
}

// ── Parent resolution ────────────────────────────────────────────────

/// Lookup tables for father references.
///
/// Older records point at the father by name rather than by id. Trying
/// the id first and the name second is a compatibility shim for that
/// data, not a feature to extend.
struct ParentIndex<'a> {
    by_id: HashMap<&'a str, usize>,
    by_name: HashMap<&'a str, usize>,
}

impl<'a> ParentIndex<'a> {
    fn new(people: &'a [Person]) -> Self {
        let mut by_id = HashMap::new();
        let mut by_name = HashMap::new();
        for (i, p) in people.iter().enumerate() {
            match by_id.entry(p.external_id.as_str()) {
                Entry::Occupied(_) => {
                    warn!(external_id = %p.external_id, "duplicate external id, keeping first record");
                }
                Entry::Vacant(slot) => {
                    slot.insert(i);
                }
            }
            by_name.entry(p.name.as_str()).or_insert(i);
        }
        ParentIndex { by_id, by_name }
    }

    fn resolve(&self, father: &str) -> Option<usize> {
        self.by_id
            .get(father)
            .or_else(|| self.by_name.get(father))
            .copied()
    }
}

// ── Builder ──────────────────────────────────────────────────────────

/// Build the family tree. Returns `None` for an empty collection.
///
/// The record with id "0" is the root whenever it is a root candidate;
/// otherwise the first candidate in input order is used.
pub fn build_tree(people: &[Person]) -> Option<FamilyTree> {
    if people.is_empty() {
        return None;
    }

    let index = ParentIndex::new(people);
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); people.len()];
    let mut candidates: Vec<usize> = Vec::new();

    for (i, person) in people.iter().enumerate() {
        match person.father_ref() {
            Some(father) => match index.resolve(father) {
                Some(parent) if parent != i => children[parent].push(i),
                _ => {
                    debug!(external_id = %person.external_id, father, "father not found");
                    candidates.push(i);
                }
            },
            None => candidates.push(i),
        }
    }

    let root = candidates
        .iter()
        .copied()
        .find(|&i| people[i].external_id == ROOT_MARKER)
        .or_else(|| candidates.first().copied());

    let Some(root) = root else {
        warn!("no root candidate: every record has a resolvable father");
        return None;
    };

    let orphans: Vec<Person> = candidates
        .iter()
        .filter(|&&i| i != root)
        .map(|&i| people[i].clone())
        .collect();
    if !orphans.is_empty() {
        warn!(count = orphans.len(), "records detached from the family tree");
    }

    Some(FamilyTree {
        root: assemble(root, people, &children),
        orphans,
    })
}

fn assemble(i: usize, people: &[Person], children: &[Vec<usize>]) -> TreeNode {
    let person = people[i].clone();
    TreeNode {
        generation: generation_of(&person.external_id),
        children: children[i]
            .iter()
            .map(|&c| assemble(c, people, children))
            .collect(),
        person,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::is_direct_extension;

    fn family() -> Vec<Person> {
        vec![
            Person::new("0", "Nils"),
            Person::new("0.1", "Erik").with_father("0"),
            Person::new("0.2", "Karl").with_father("0"),
            Person::new("0.1.1", "Gustaf").with_father("0.1"),
            Person::new("0.1.2", "Magnus").with_father("Erik"),
            Person::new("0.2.1", "Axel").with_father("0.2"),
        ]
    }

    fn ids(nodes: &[TreeNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.person.external_id.as_str()).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(build_tree(&[]).is_none());
    }

    #[test]
    fn test_builds_children_in_input_order() {
        let tree = build_tree(&family()).unwrap();
        assert_eq!(tree.root.person.external_id, "0");
        assert_eq!(ids(&tree.root.children), vec!["0.1", "0.2"]);
        let erik = tree.root.find("0.1").unwrap();
        assert_eq!(ids(&erik.children), vec!["0.1.1", "0.1.2"]);
        assert!(tree.orphans.is_empty());
    }

    #[test]
    fn test_father_by_name_fallback() {
        let tree = build_tree(&family()).unwrap();
        let magnus = tree.root.find("0.1.2").unwrap();
        assert_eq!(magnus.person.name, "Magnus");
        assert_eq!(tree.root.find("0.1").unwrap().children.len(), 2);
    }

    #[test]
    fn test_root_marker_wins_regardless_of_order() {
        let mut people = family();
        let progenitor = people.remove(0);
        people.push(progenitor);
        people.insert(0, Person::new("9", "Stranger"));
        // "9" is the first candidate seen, "0" the last record
        assert_eq!(people[0].external_id, "9");

        let tree = build_tree(&people).unwrap();
        assert_eq!(tree.root.person.external_id, "0");
        assert_eq!(tree.orphans.len(), 1);
        assert_eq!(tree.orphans[0].external_id, "9");
    }

    #[test]
    fn test_first_candidate_without_root_marker() {
        let people = vec![
            Person::new("1.1", "Child").with_father("1"),
            Person::new("1", "Founder"),
            Person::new("2", "Other"),
        ];
        let tree = build_tree(&people).unwrap();
        assert_eq!(tree.root.person.external_id, "1");
        assert_eq!(ids(&tree.root.children), vec!["1.1"]);
        assert_eq!(tree.orphans[0].external_id, "2");
    }

    #[test]
    fn test_dangling_father_becomes_orphan() {
        let mut people = family();
        people.push(Person::new("0.3", "Lost").with_father("Nobody"));
        let tree = build_tree(&people).unwrap();
        assert_eq!(tree.root.node_count(), 6);
        assert_eq!(tree.orphans.len(), 1);
        assert_eq!(tree.orphans[0].name, "Lost");
    }

    #[test]
    fn test_self_reference_is_not_a_parent() {
        let people = vec![Person::new("0", "Loop").with_father("0")];
        let tree = build_tree(&people).unwrap();
        assert_eq!(tree.root.person.external_id, "0");
        assert!(tree.root.children.is_empty());
    }

    #[test]
    fn test_tree_completeness() {
        let mut people = family();
        // A detached branch: its members never reach the root
        people.push(Person::new("5", "Elsewhere"));
        people.push(Person::new("5.1", "Elsewhere Jr").with_father("5"));
        let tree = build_tree(&people).unwrap();

        let walked = tree.root.walk();
        assert_eq!(walked.len(), tree.root.node_count());
        assert_eq!(tree.root.node_count(), family().len());

        let mut seen: Vec<&str> = walked.iter().map(|n| n.person.external_id.as_str()).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), walked.len());
        assert!(tree.root.find("5.1").is_none());
    }

    #[test]
    fn test_generation_monotonicity() {
        let tree = build_tree(&family()).unwrap();
        for node in tree.root.walk() {
            for child in &node.children {
                if is_direct_extension(&node.person.external_id, &child.person.external_id) {
                    assert_eq!(child.generation, node.generation + 1);
                }
            }
        }
        assert_eq!(tree.root.depth(), 3);
    }

    #[test]
    fn test_serializes_person_fields_flat() {
        let tree = build_tree(&family()).unwrap();
        let json = serde_json::to_value(&tree.root).unwrap();
        assert_eq!(json["externalId"], "0");
        assert_eq!(json["generation"], 1);
        assert_eq!(json["children"][0]["name"], "Erik");
    }
}
