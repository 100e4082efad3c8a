//! Block-to-block include graph.
//!
//! The graph is an arena of nodes addressed by `usize` index, one node per
//! parsed block, in block order. Flattening computes the transitive closure
//! used to gather every body needed to satisfy nested includes.

use std::collections::HashMap;

use crate::error::Error;
use crate::parser::Block;
use crate::preamble;

pub type NodeIdx = usize;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphNode {
    pub adjacent: Vec<NodeIdx>,
}

pub type Graph = Vec<GraphNode>;

const MAX_FLATTEN_DEPTH: usize = 1024;

/// Resolve every `include` name against the declared names of all blocks.
/// The name table spans the whole script before any edge is resolved, so
/// forward references are allowed.
pub fn build_direct_graph(blocks: &[Block]) -> Result<Graph, Error> {
    let mut names: HashMap<&str, NodeIdx> = HashMap::new();
    for (idx, block) in blocks.iter().enumerate() {
        if let Some(name) = preamble::find_declared_name(&block.preamble) {
            names.insert(name, idx);
        }
    }

    blocks
        .iter()
        .map(|block| {
            let mut node = GraphNode::default();
            for name in preamble::find_includes(&block.preamble) {
                let Some(&target) = names.get(name.as_str()) else {
                    return Err(Error::Resolution {
                        line: block.body.start,
                        name,
                    });
                };
                node.adjacent.push(target);
            }
            Ok(node)
        })
        .collect()
}

/// Transitive closure of the direct graph: for every node, the post-order
/// list of all reachable nodes excluding itself. Reachable indices are
/// appended once per reference path, NOT deduplicated across paths; the
/// downstream source concatenation relies on this exact ordering.
pub fn flatten_graph(graph: &Graph) -> Result<Graph, Error> {
    graph
        .iter()
        .enumerate()
        .map(|(idx, _)| {
            let mut node = GraphNode::default();
            flatten_node(graph, &mut node, idx, 0)?;
            Ok(node)
        })
        .collect()
}

fn flatten_node(
    graph: &Graph,
    dst: &mut GraphNode,
    curr: NodeIdx,
    depth: usize,
) -> Result<(), Error> {
    if depth > MAX_FLATTEN_DEPTH {
        return Err(Error::RecursionLimit);
    }
    for &adjacent in &graph[curr].adjacent {
        flatten_node(graph, dst, adjacent, depth + 1)?;
    }
    if depth != 0 {
        dst.adjacent.push(curr);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn graphs_for(source: &str) -> (Graph, Graph) {
        let script = parser::parse(source).unwrap();
        let direct = build_direct_graph(&script.blocks).unwrap();
        let flattened = flatten_graph(&direct).unwrap();
        (direct, flattened)
    }

    #[test]
    fn no_includes_means_empty_closure() {
        let (_, flattened) = graphs_for("[declaration: \"A\"]{{a}}\n{{b}}");
        assert!(flattened.iter().all(|node| node.adjacent.is_empty()));
    }

    #[test]
    fn forward_references_resolve() {
        let (direct, _) = graphs_for("[include: \"Late\"]{{a}}\n[declaration: \"Late\"]{{b}}");
        assert_eq!(direct[0].adjacent, [1]);
    }

    #[test]
    fn closure_keeps_one_entry_per_path() {
        // C includes A directly and again through B: A appears twice.
        let (_, flattened) = graphs_for(
            "[declaration: \"A\"]{{a}}\n\
             [declaration: \"B\"][include: \"A\"]{{b}}\n\
             [include: \"A\", \"B\"]{{c}}",
        );
        assert!(flattened[0].adjacent.is_empty());
        assert_eq!(flattened[1].adjacent, [0]);
        assert_eq!(flattened[2].adjacent, [0, 0, 1]);
    }

    #[test]
    fn unknown_include_reports_body_start_line() {
        let script = parser::parse("[declaration: \"A\"]{{a}}\n[include: \"Missing\"]\n{{b}}").unwrap();
        let err = build_direct_graph(&script.blocks).unwrap_err();
        assert_eq!(
            err,
            Error::Resolution {
                line: 3,
                name: "Missing".to_string()
            }
        );
    }

    #[test]
    fn self_include_hits_the_depth_cap() {
        let script = parser::parse("[declaration: \"A\"][include: \"A\"]{{a}}").unwrap();
        let direct = build_direct_graph(&script.blocks).unwrap();
        assert_eq!(flatten_graph(&direct).unwrap_err(), Error::RecursionLimit);
    }
}
