//! Tree-structure derivation for tree enums.
//!
//! Builds a maximal word-break tree from baked display values, collapses
//! implied single-child branches, synthesizes missing intermediate keys, and
//! records the parent chain. The build runs in two phases (maximal tree,
//! then reduction) because the final shape depends on which breaks sibling
//! keys later confirm.

use super::record::{EXPLICIT_DELIMITER, EnumRecord, NODE_DELIMITER};
use crate::error::{CodegenError, Result};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Past this many delimiter positions the masking search space is excessive;
/// the fully delimited form is kept.
const MAX_HEURISTIC_DELIMITERS: usize = 16;

#[derive(Debug)]
struct Node {
    name: String,
    children: Vec<usize>,
    /// Resulted from an explicit delimiter break rather than word splitting.
    manual: bool,
    /// Key whose display value terminates at this node.
    terminal: Option<String>,
}

#[derive(Debug)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn new() -> Self {
        Self {
            nodes: vec![Node {
                name: String::new(),
                children: Vec::new(),
                manual: true,
                terminal: None,
            }],
        }
    }

    /// Finds or inserts a child of `parent` named `word`. A manual break on
    /// any key marks the node manual for all keys.
    fn child(&mut self, parent: usize, word: &str, manual: bool) -> usize {
        let existing = self.nodes[parent]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c].name == word);
        if let Some(existing) = existing {
            if manual {
                self.nodes[existing].manual = true;
            }
            return existing;
        }

        let idx = self.nodes.len();
        self.nodes.push(Node {
            name: word.to_string(),
            children: Vec::new(),
            manual,
            terminal: None,
        });
        self.nodes[parent].children.push(idx);
        idx
    }
}

/// Converts a baked flat display mapping into tree structure, mutating the
/// record in place: synthesized keys, the parents map, and leaf-local
/// display values.
pub(crate) fn derive(record: &mut EnumRecord) -> Result<()> {
    let prefix = record.prefix.clone();

    let mut tree = build_word_tree(record, &prefix)?;
    reduce(&mut tree);

    let mut paths: HashMap<String, Vec<String>> = HashMap::new();
    collect_paths(&tree, 0, &mut Vec::new(), &mut paths);

    if paths.len() != record.keys.len() {
        return Err(CodegenError::tree_build(
            &prefix,
            format!(
                "reduced tree names {} keys but the enum has {}",
                paths.len(),
                record.keys.len()
            ),
        ));
    }

    synthesize_missing_parents(record, &prefix, &mut paths)?;
    compute_parents(record, &prefix, &paths)?;

    // Displays reduce to leaf-local names; the parent chain reconstructs the
    // full path at use.
    for (key, path) in &paths {
        record
            .display
            .insert(key.clone(), path.last().cloned().unwrap_or_default());
    }

    debug!(
        prefix = %prefix,
        synthesized = record.synthesized.len(),
        "Tree derivation complete"
    );

    Ok(())
}

fn build_word_tree(record: &EnumRecord, prefix: &str) -> Result<Tree> {
    let mut tree = Tree::new();

    for key in &record.keys {
        let display = record.display.get(key).cloned().unwrap_or_default();

        if display.is_empty() {
            if tree.nodes[0].terminal.is_some() {
                return Err(CodegenError::tree_build(
                    prefix,
                    "two keys bake to the empty display value",
                ));
            }
            tree.nodes[0].terminal = Some(key.clone());
            continue;
        }

        let mut cursor = 0;
        for (segment_index, segment) in display.split(NODE_DELIMITER).enumerate() {
            for (word_index, word) in segment.split_whitespace().enumerate() {
                let manual = segment_index > 0 && word_index == 0;
                cursor = tree.child(cursor, word, manual);
            }
        }

        if tree.nodes[cursor].terminal.is_some() {
            return Err(CodegenError::tree_build(
                prefix,
                format!("two keys terminate at `{display}`"),
            ));
        }
        tree.nodes[cursor].terminal = Some(key.clone());
    }

    Ok(tree)
}

/// Merges provisional single-child parents into their child until stable.
/// Manual children and nodes where a key terminates are never collapsed.
fn reduce(tree: &mut Tree) {
    loop {
        let mut changed = false;

        for idx in 1..tree.nodes.len() {
            if tree.nodes[idx].terminal.is_some() || tree.nodes[idx].children.len() != 1 {
                continue;
            }
            let child = tree.nodes[idx].children[0];
            if tree.nodes[child].manual {
                continue;
            }

            let child_name = tree.nodes[child].name.clone();
            let child_children = std::mem::take(&mut tree.nodes[child].children);
            let child_terminal = tree.nodes[child].terminal.take();

            let node = &mut tree.nodes[idx];
            node.name.push(' ');
            node.name.push_str(&child_name);
            node.children = child_children;
            node.terminal = child_terminal;

            trace!(merged = %tree.nodes[idx].name, "Collapsed provisional branch");
            changed = true;
        }

        if !changed {
            break;
        }
    }
}

fn collect_paths(
    tree: &Tree,
    idx: usize,
    path: &mut Vec<String>,
    paths: &mut HashMap<String, Vec<String>>,
) {
    if let Some(key) = &tree.nodes[idx].terminal {
        paths.insert(key.clone(), path.clone());
    }
    for &child in &tree.nodes[idx].children {
        path.push(tree.nodes[child].name.clone());
        collect_paths(tree, child, path, paths);
        path.pop();
    }
}

/// Synthesizes a key for every strict ancestor path no existing key names.
fn synthesize_missing_parents(
    record: &mut EnumRecord,
    prefix: &str,
    paths: &mut HashMap<String, Vec<String>>,
) -> Result<()> {
    let mut path_to_key: HashMap<Vec<String>, String> = paths
        .iter()
        .map(|(key, path)| (path.clone(), key.clone()))
        .collect();

    let author_keys = record.keys.clone();
    for key in &author_keys {
        let path = paths.get(key).cloned().unwrap_or_default();
        for ancestor_len in 1..path.len() {
            let ancestor = path[..ancestor_len].to_vec();
            if path_to_key.contains_key(&ancestor) {
                continue;
            }

            let ident = synthesize_ident(prefix, &ancestor, &record.keys);
            if record.keys.iter().any(|existing| existing == &ident) {
                return Err(CodegenError::synthesis_collision(prefix, ident));
            }

            trace!(key = %ident, path = ?ancestor, "Synthesized intermediate key");
            record.keys.push(ident.clone());
            record.synthesized.push(ident.clone());
            paths.insert(ident.clone(), ancestor.clone());
            path_to_key.insert(ancestor, ident);
        }
    }

    Ok(())
}

fn compute_parents(
    record: &mut EnumRecord,
    prefix: &str,
    paths: &HashMap<String, Vec<String>>,
) -> Result<()> {
    let path_to_key: HashMap<&[String], &String> = paths
        .iter()
        .map(|(key, path)| (path.as_slice(), key))
        .collect();

    for (key, path) in paths {
        let parent = match path.len() {
            0 => key.clone(),
            1 => prefix.to_string(),
            len => path_to_key
                .get(&path[..len - 1])
                .map(|parent| (*parent).clone())
                .ok_or_else(|| {
                    CodegenError::tree_build(
                        prefix,
                        format!("no key names the parent path of `{key}`"),
                    )
                })?,
        };
        record.parents.insert(key.clone(), parent);
    }

    Ok(())
}

/// Builds a synthesized identifier from the prefix and an ancestor path.
///
/// Every word boundary is a candidate delimiter position; maskings are tried
/// with fewer elisions first, and the first masking some existing key extends
/// wins. Authors who already committed to a compactness keep it.
fn synthesize_ident(prefix: &str, path: &[String], existing: &[String]) -> String {
    let words: Vec<&str> = path
        .iter()
        .flat_map(|segment| segment.split_whitespace())
        .collect();
    let boundaries = words.len().saturating_sub(1);

    if boundaries > MAX_HEURISTIC_DELIMITERS {
        return build_candidate(prefix, &words, 0);
    }

    let mut masks: Vec<u32> = (0..(1u32 << boundaries)).collect();
    masks.sort_by_key(|mask| (mask.count_ones(), *mask));

    for mask in masks {
        let candidate = build_candidate(prefix, &words, mask);
        if existing.iter().any(|key| key.starts_with(&candidate)) {
            return candidate;
        }
    }

    build_candidate(prefix, &words, 0)
}

/// A set bit elides the delimiter at that word boundary.
fn build_candidate(prefix: &str, words: &[&str], mask: u32) -> String {
    let mut out = String::from(prefix);
    for (index, word) in words.iter().enumerate() {
        if index > 0 && (mask >> (index - 1)) & 1 == 0 {
            out.push_str(EXPLICIT_DELIMITER);
        }
        out.push_str(word);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tree_record(members: &[&str]) -> EnumRecord {
        let mut record = EnumRecord::new();
        for (position, key) in members.iter().enumerate() {
            record.add_member(*key, position as i64).unwrap();
        }
        record.process().unwrap();
        record
    }

    #[test]
    fn test_synthesized_parent_and_leaf_local_displays() {
        let record = tree_record(&["Phase", "PhaseBlueGreenOne", "PhaseBlueGreenTwo"]);

        assert!(record.is_tree());
        assert_eq!(record.synthesized(), &["PhaseBlueGreen".to_string()]);

        assert_eq!(record.display_of("Phase"), Some(""));
        assert_eq!(record.display_of("PhaseBlueGreen"), Some("Blue Green"));
        assert_eq!(record.display_of("PhaseBlueGreenOne"), Some("One"));
        assert_eq!(record.display_of("PhaseBlueGreenTwo"), Some("Two"));

        assert_eq!(record.parents()["Phase"], "Phase");
        assert_eq!(record.parents()["PhaseBlueGreen"], "Phase");
        assert_eq!(record.parents()["PhaseBlueGreenOne"], "PhaseBlueGreen");
        assert_eq!(record.parents()["PhaseBlueGreenTwo"], "PhaseBlueGreen");
    }

    #[test]
    fn test_explicit_delimiter_prevents_collapse() {
        let record = tree_record(&["Phase", "PhaseBlue000Green"]);

        // The manual break keeps Blue and Green as separate nodes, so Blue
        // is synthesized even though it has a single child.
        assert_eq!(record.synthesized(), &["PhaseBlue".to_string()]);
        assert_eq!(record.display_of("PhaseBlue"), Some("Blue"));
        assert_eq!(record.display_of("PhaseBlue000Green"), Some("Green"));
        assert_eq!(record.parents()["PhaseBlue000Green"], "PhaseBlue");
        assert_eq!(record.parents()["PhaseBlue"], "Phase");
    }

    #[test]
    fn test_sibling_confirmed_break_splits_shared_words() {
        let record = tree_record(&[
            "Phase",
            "PhaseBlueGreenOne",
            "PhaseBlueGreenTwo",
            "PhaseBlueRed",
        ]);

        // "Blue Red" confirms the break after Blue, so Blue and Green stay
        // separate nodes and both intermediates are synthesized.
        assert_eq!(
            record.synthesized(),
            &["PhaseBlue".to_string(), "PhaseBlueGreen".to_string()]
        );
        assert_eq!(record.parents()["PhaseBlueGreen"], "PhaseBlue");
        assert_eq!(record.parents()["PhaseBlueRed"], "PhaseBlue");
        assert_eq!(record.display_of("PhaseBlueGreen"), Some("Green"));
        assert_eq!(record.display_of("PhaseBlueRed"), Some("Red"));
    }

    #[test]
    fn test_parent_chain_terminates_at_root() {
        let record = tree_record(&["Phase", "PhaseBlueGreenOne", "PhaseBlueGreenTwo"]);

        for key in record.keys() {
            let mut current = key.clone();
            let mut steps = 0;
            while record.parents()[&current] != current {
                current = record.parents()[&current].clone();
                steps += 1;
                assert!(steps <= record.keys().len(), "parent chain does not terminate");
            }
            assert_eq!(current, "Phase");
        }
    }

    #[test]
    fn test_root_only_tree() {
        let record = tree_record(&["Solo"]);

        assert!(record.is_tree());
        assert!(record.synthesized().is_empty());
        assert_eq!(record.parents()["Solo"], "Solo");
        assert_eq!(record.display_of("Solo"), Some(""));
    }

    #[test]
    fn test_synthesize_ident_prefers_author_compactness() {
        let existing = vec!["Phase".to_string(), "PhaseBlueGreenOne".to_string()];
        let ident = synthesize_ident("Phase", &["Blue Green".to_string()], &existing);
        assert_eq!(ident, "PhaseBlueGreen");
    }

    #[test]
    fn test_synthesize_ident_keeps_full_delimiters_without_evidence() {
        let existing = vec!["Phase".to_string()];
        let ident = synthesize_ident(
            "Phase",
            &["Blue".to_string(), "Green".to_string()],
            &existing,
        );
        assert_eq!(ident, "PhaseBlue000Green");
    }
}
