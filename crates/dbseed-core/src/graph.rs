use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::schema::Table;

/// Foreign-key dependency graph restricted to the seeding set.
///
/// Edge `T -> R` means `T` carries a foreign key into `R`, so `R` must be
/// seeded first. References to tables outside the set carry no edge; they
/// still need a resolvable value at insert time, which is the engine's
/// problem, not the graph's.
pub type DependencyGraph = BTreeMap<String, BTreeSet<String>>;

/// Build the dependency graph for a set of table descriptors.
///
/// Table names must be unique within the set. Self-references are legal and
/// kept as self-edges; the sequencer treats them as satisfied while the table
/// itself is being visited.
pub fn build_dependency_graph(tables: &[Table]) -> Result<DependencyGraph> {
    let mut graph: DependencyGraph = BTreeMap::new();

    for table in tables {
        if graph.insert(table.name.clone(), BTreeSet::new()).is_some() {
            return Err(Error::InvalidSchema(format!(
                "duplicate table '{}' in seeding set",
                table.name
            )));
        }
    }

    for table in tables {
        let Some(successors) = graph.get_mut(&table.name) else {
            continue;
        };
        for fk in table.foreign_keys.values() {
            if tables.iter().any(|t| t.name == fk.referenced_table) {
                successors.insert(fk.referenced_table.clone());
            }
        }
    }

    Ok(graph)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Order the graph's tables so every table follows everything it references.
///
/// Depth-first post-order with three-color marking: an in-progress neighbor
/// equal to the current node is a self-reference and is skipped; any other
/// in-progress neighbor closes a cycle among distinct tables, which no
/// insert order can satisfy, so it aborts with [`Error::Cycle`] carrying the
/// offending path.
pub fn seeding_order(graph: &DependencyGraph) -> Result<Vec<String>> {
    let mut marks: BTreeMap<&str, Mark> = BTreeMap::new();
    let mut order = Vec::with_capacity(graph.len());
    let mut path: Vec<&str> = Vec::new();

    for table in graph.keys() {
        if !marks.contains_key(table.as_str()) {
            visit(table, graph, &mut marks, &mut order, &mut path)?;
        }
    }

    Ok(order)
}

fn visit<'a>(
    node: &'a str,
    graph: &'a DependencyGraph,
    marks: &mut BTreeMap<&'a str, Mark>,
    order: &mut Vec<String>,
    path: &mut Vec<&'a str>,
) -> Result<()> {
    marks.insert(node, Mark::InProgress);
    path.push(node);

    if let Some(referenced) = graph.get(node) {
        for parent in referenced {
            if parent == node {
                continue;
            }
            match marks.get(parent.as_str()) {
                Some(Mark::Done) => {}
                Some(Mark::InProgress) => return Err(Error::Cycle(cycle_path(path, parent))),
                None => visit(parent, graph, marks, order, path)?,
            }
        }
    }

    path.pop();
    marks.insert(node, Mark::Done);
    order.push(node.to_string());
    Ok(())
}

fn cycle_path(path: &[&str], reentered: &str) -> Vec<String> {
    let start = path
        .iter()
        .position(|node| *node == reentered)
        .unwrap_or(0);
    let mut cycle: Vec<String> = path[start..].iter().map(|node| node.to_string()).collect();
    cycle.push(reentered.to_string());
    cycle
}
