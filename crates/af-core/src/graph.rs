//! Import dependency graph with cycle and external-dependency detection

use crate::exclusion::ExclusionSet;
use crate::imports::{parse_source, ContractDecl, ParsedFile};
use crate::source::ContractProject;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Number of files reported as the heaviest importers
pub const TOP_IMPORTERS: usize = 5;

/// A resolved import between two in-scope files
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImportEdge {
    pub from: String,
    pub to: String,
}

/// An import cycle between two files, stored with the lexically smaller path
/// first so that `(a, b)` and `(b, a)` compare equal
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CyclePair(pub String, pub String);

impl CyclePair {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self(a.to_string(), b.to_string())
        } else {
            Self(b.to_string(), a.to_string())
        }
    }
}

/// A file and its import out-degree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedFile {
    pub path: String,
    pub out_degree: usize,
}

/// Serializable result of a dependency-graph build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReport {
    pub nodes: Vec<String>,
    pub edges: Vec<ImportEdge>,
    /// Declarations per file, with their inheritance lists
    pub contracts: BTreeMap<String, Vec<ContractDecl>>,
    pub cycles: Vec<CyclePair>,
    pub external_dependencies: Vec<String>,
    pub files_with_most_imports: Vec<RankedFile>,
    /// Files left out of the graph because they could not be parsed
    pub skipped_files: Vec<String>,
    /// Import declarations across all parsed files
    pub total_imports: usize,
    /// Imports pointing into excluded library/vendor paths
    pub excluded_imports: usize,
}

/// Directed graph of in-scope files; an edge `a -> b` means `a` imports `b`.
///
/// Import targets that do not resolve to a node are kept as external
/// dependencies and never become edges.
#[derive(Debug)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
    contracts: BTreeMap<String, Vec<ContractDecl>>,
    external: BTreeSet<String>,
    skipped: Vec<String>,
    total_imports: usize,
    excluded_imports: usize,
}

impl DependencyGraph {
    /// Parse every in-scope file (in parallel) and build the graph.
    ///
    /// Files that are not valid UTF-8 are skipped with a warning and do not
    /// become nodes.
    pub fn build(project: &ContractProject, exclusions: &ExclusionSet) -> Self {
        let files: Vec<_> = project.files().collect();
        let results: Vec<Result<ParsedFile, String>> = files
            .par_iter()
            .map(|file| match file.text() {
                Ok(text) => Ok(parse_source(&file.path, text)),
                Err(e) => Err(format!("{} ({})", file.path, e)),
            })
            .collect();

        let mut parsed = Vec::with_capacity(results.len());
        let mut skipped = Vec::new();
        for result in results {
            match result {
                Ok(file) => parsed.push(file),
                Err(reason) => {
                    log::warn!("Skipping unparseable source file {}", reason);
                    skipped.push(reason);
                }
            }
        }

        let mut graph = Self::from_parsed(parsed, exclusions);
        skipped.sort();
        graph.skipped = skipped;
        graph
    }

    /// Build the graph from already-parsed files.
    ///
    /// Output does not depend on the order of `parsed`.
    pub fn from_parsed(parsed: Vec<ParsedFile>, exclusions: &ExclusionSet) -> Self {
        let files: BTreeMap<String, ParsedFile> =
            parsed.into_iter().map(|f| (f.path.clone(), f)).collect();
        let known: BTreeSet<String> = files.keys().cloned().collect();

        let mut dag = Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
            contracts: BTreeMap::new(),
            external: BTreeSet::new(),
            skipped: Vec::new(),
            total_imports: 0,
            excluded_imports: 0,
        };

        for path in &known {
            let idx = dag.graph.add_node(path.clone());
            dag.node_map.insert(path.clone(), idx);
        }

        for (path, file) in files {
            let from = dag.node_map[&path];
            for raw in &file.imports {
                dag.total_imports += 1;
                match resolve_import(&path, raw, &known) {
                    Some(target) => {
                        let to = dag.node_map[&target];
                        dag.graph.update_edge(from, to, ());
                    }
                    None => {
                        let normalized = normalize_import_target(raw);
                        let joined = join_relative(&path, raw);
                        let excluded = exclusions.is_excluded(&normalized)
                            || joined.as_deref().is_some_and(|j| exclusions.is_excluded(j));
                        if excluded {
                            dag.excluded_imports += 1;
                        } else {
                            dag.external.insert(normalized);
                        }
                    }
                }
            }
            if !file.contracts.is_empty() {
                dag.contracts.insert(path, file.contracts);
            }
        }

        dag
    }

    /// Check whether `from` can reach `to` along import edges (any depth)
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        match (self.node_map.get(from), self.node_map.get(to)) {
            (Some(&start), Some(&target)) => {
                let mut visited = HashSet::new();
                self.reaches(start, target, &mut visited)
            }
            _ => false,
        }
    }

    /// Iterative depth-first reachability. `visited` belongs to this one
    /// query; sharing it across queries would hide cycles behind paths an
    /// earlier query already explored.
    fn reaches(&self, start: NodeIndex, target: NodeIndex, visited: &mut HashSet<NodeIndex>) -> bool {
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            if node == target {
                return true;
            }
            if !visited.insert(node) {
                continue;
            }
            stack.extend(
                self.graph
                    .neighbors_directed(node, Direction::Outgoing)
                    .filter(|n| !visited.contains(n)),
            );
        }
        false
    }

    /// All import cycles as deduplicated unordered pairs.
    ///
    /// For every edge `a -> b` the pair `{a, b}` is a cycle iff `a` is
    /// reachable from `b`.
    pub fn cycles(&self) -> Vec<CyclePair> {
        let mut cycles = BTreeSet::new();
        for edge in self.graph.edge_references() {
            let (a, b) = (edge.source(), edge.target());
            let mut visited = HashSet::new();
            if self.reaches(b, a, &mut visited) {
                cycles.insert(CyclePair::new(&self.graph[a], &self.graph[b]));
            }
        }
        cycles.into_iter().collect()
    }

    /// Files by import out-degree (descending), ties by path, first `limit`
    pub fn most_imports(&self, limit: usize) -> Vec<RankedFile> {
        let mut ranked: Vec<RankedFile> = self
            .node_map
            .iter()
            .map(|(path, &idx)| RankedFile {
                path: path.clone(),
                out_degree: self.graph.neighbors_directed(idx, Direction::Outgoing).count(),
            })
            .collect();
        ranked.sort_by(|a, b| {
            (Reverse(a.out_degree), &a.path).cmp(&(Reverse(b.out_degree), &b.path))
        });
        ranked.truncate(limit);
        ranked
    }

    /// Node paths in lexical order
    pub fn nodes(&self) -> Vec<String> {
        let mut nodes: Vec<String> = self.node_map.keys().cloned().collect();
        nodes.sort();
        nodes
    }

    /// Resolved edges in lexical order
    pub fn edges(&self) -> Vec<ImportEdge> {
        let mut edges: Vec<ImportEdge> = self
            .graph
            .edge_references()
            .map(|e| ImportEdge {
                from: self.graph[e.source()].clone(),
                to: self.graph[e.target()].clone(),
            })
            .collect();
        edges.sort();
        edges
    }

    /// Direct imports of a file that resolved to in-scope files
    pub fn dependencies(&self, path: &str) -> Vec<String> {
        let Some(&idx) = self.node_map.get(path) else {
            return Vec::new();
        };
        let mut deps: Vec<String> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|n| self.graph[n].clone())
            .collect();
        deps.sort();
        deps
    }

    /// Deduplicated, normalized external import targets
    pub fn external_dependencies(&self) -> Vec<String> {
        self.external.iter().cloned().collect()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.node_map.contains_key(path)
    }

    /// Snapshot everything the audit report needs
    pub fn report(&self) -> DependencyReport {
        DependencyReport {
            nodes: self.nodes(),
            edges: self.edges(),
            contracts: self.contracts.clone(),
            cycles: self.cycles(),
            external_dependencies: self.external_dependencies(),
            files_with_most_imports: self.most_imports(TOP_IMPORTERS),
            skipped_files: self.skipped.clone(),
            total_imports: self.total_imports,
            excluded_imports: self.excluded_imports,
        }
    }
}

/// Strip relative qualifiers (`./`, `../`) and the `@` package marker
pub fn normalize_import_target(raw: &str) -> String {
    let mut target = raw.trim().replace('\\', "/");
    loop {
        if let Some(rest) = target.strip_prefix("./") {
            target = rest.to_string();
        } else if let Some(rest) = target.strip_prefix("../") {
            target = rest.to_string();
        } else if let Some(rest) = target.strip_prefix('@') {
            target = rest.to_string();
        } else {
            break;
        }
    }
    target
}

/// Lexically join a relative import onto the importing file's directory.
/// Returns `None` for non-relative targets or ones escaping the project root.
fn join_relative(importer: &str, raw: &str) -> Option<String> {
    let raw = raw.trim().replace('\\', "/");
    if !(raw.starts_with("./") || raw.starts_with("../")) {
        return None;
    }

    let mut parts: Vec<&str> = importer.split('/').collect();
    parts.pop();
    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

/// Resolve an import target against the known in-scope paths
fn resolve_import(importer: &str, raw: &str, known: &BTreeSet<String>) -> Option<String> {
    if let Some(joined) = join_relative(importer, raw) {
        if known.contains(&joined) {
            return Some(joined);
        }
    }

    let normalized = normalize_import_target(raw);
    if normalized.is_empty() {
        return None;
    }
    if known.contains(&normalized) {
        return Some(normalized);
    }

    let suffix = format!("/{}", normalized);
    known.iter().find(|k| k.ends_with(&suffix)).cloned()
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod tests;
