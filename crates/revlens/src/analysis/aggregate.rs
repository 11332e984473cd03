//! Builds the two-level topic hierarchy from a flat result set.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::analysis::hierarchy::{Hierarchy, Level1Node, Level2Key, Level2Node, Percentage};
use crate::model::{ClassifiedItem, TopicLabel};

#[derive(Default)]
struct TopicTally {
    count: usize,
    children: BTreeMap<Level2Key, usize>,
}

/// Aggregates items into level-1/level-2 nodes, naming level-1 nodes by id.
pub fn aggregate(items: &[ClassifiedItem]) -> Hierarchy {
    aggregate_with_topics(items, &[])
}

/// Aggregates items, resolving level-1 display names from `topics`.
///
/// Pure and deterministic: identical input always yields an identical
/// hierarchy, ordering included.
pub fn aggregate_with_topics(items: &[ClassifiedItem], topics: &[TopicLabel]) -> Hierarchy {
    let total_items = items.len();
    let mut unassigned_items = 0;
    let mut tallies: BTreeMap<&str, TopicTally> = BTreeMap::new();

    for item in items {
        let assignment = &item.topic_assignment;
        let (Some(level1_id), Some(key)) = (assignment.level1_id(), assignment.level2_key())
        else {
            unassigned_items += 1;
            continue;
        };

        let tally = tallies.entry(level1_id).or_default();
        tally.count += 1;
        *tally.children.entry(key).or_default() += 1;
    }

    let names: HashMap<&str, &str> = topics
        .iter()
        .map(|t| (t.id.as_str(), t.name.as_str()))
        .collect();

    let mut nodes: Vec<Level1Node> = tallies
        .into_iter()
        .map(|(id, tally)| build_level1(id, names.get(id).copied(), tally, total_items))
        .collect();
    nodes.sort_by(|a, b| {
        by_count_then_name(a.count, &a.name, b.count, &b.name).then_with(|| a.id.cmp(&b.id))
    });

    let assigned_items = total_items - unassigned_items;
    debug_assert_eq!(assigned_items, nodes.iter().map(|n| n.count).sum::<usize>());

    Hierarchy {
        total_items,
        assigned_items,
        unassigned_items,
        nodes,
    }
}

fn build_level1(id: &str, name: Option<&str>, tally: TopicTally, total_items: usize) -> Level1Node {
    let mut children: Vec<Level2Node> = tally
        .children
        .into_iter()
        .map(|(key, count)| Level2Node {
            key,
            count,
            percentage_of_parent: Percentage::of(count, tally.count),
            percentage_of_total: Percentage::of(count, total_items),
        })
        .collect();
    children.sort_by(|a, b| {
        by_count_then_name(a.count, a.name(), b.count, b.name()).then_with(|| a.key.cmp(&b.key))
    });

    Level1Node {
        id: id.to_string(),
        name: name.unwrap_or(id).to_string(),
        count: tally.count,
        percentage_of_total: Percentage::of(tally.count, total_items),
        children,
    }
}

/// Descending count, ties broken by ascending name.
fn by_count_then_name(a_count: usize, a_name: &str, b_count: usize, b_name: &str) -> Ordering {
    b_count.cmp(&a_count).then_with(|| a_name.cmp(b_name))
}
