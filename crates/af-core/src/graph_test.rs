use super::*;
use crate::config::DEFAULT_EXCLUDES;
use crate::source::SourceFile;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn parsed(path: &str, imports: &[&str]) -> ParsedFile {
    ParsedFile {
        path: path.to_string(),
        imports: imports.iter().map(|s| s.to_string()).collect(),
        contracts: Vec::new(),
    }
}

fn defaults() -> ExclusionSet {
    ExclusionSet::new(DEFAULT_EXCLUDES).unwrap()
}

#[test]
fn test_mutual_import_with_excluded_library_file() {
    let dir = tempdir().unwrap();
    let write = |rel: &str, content: &str| {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    };
    write("A.sol", "import \"./B.sol\";\ncontract A {}\n");
    write("B.sol", "import \"./A.sol\";\ncontract B {}\n");
    write("lib/C.sol", "import \"lib/forge-std/src/Test.sol\";\ncontract C {}\n");

    let exclusions = defaults();
    let project = ContractProject::load(dir.path(), &exclusions, &["sol"]).unwrap();
    let report = DependencyGraph::build(&project, &exclusions).report();

    assert_eq!(report.nodes, vec!["A.sol", "B.sol"]);
    assert_eq!(report.cycles, vec![CyclePair::new("A.sol", "B.sol")]);
    assert!(report.external_dependencies.is_empty());
}

#[test]
fn test_import_into_excluded_path_is_not_external() {
    let graph = DependencyGraph::from_parsed(
        vec![parsed(
            "test/Vault.t.sol",
            &["forge-std/Test.sol", "../lib/forge-std/src/Test.sol"],
        )],
        &defaults(),
    );
    let report = graph.report();
    assert_eq!(report.excluded_imports, 1);
    assert_eq!(report.external_dependencies, vec!["forge-std/Test.sol"]);
    assert!(report.edges.is_empty());
}

#[test]
fn test_cycle_reported_once_regardless_of_order() {
    let forward = DependencyGraph::from_parsed(
        vec![parsed("A.sol", &["./B.sol"]), parsed("B.sol", &["./A.sol"])],
        &ExclusionSet::empty(),
    );
    let backward = DependencyGraph::from_parsed(
        vec![parsed("B.sol", &["./A.sol"]), parsed("A.sol", &["./B.sol"])],
        &ExclusionSet::empty(),
    );
    assert_eq!(forward.cycles().len(), 1);
    assert_eq!(forward.cycles(), backward.cycles());
    assert_eq!(forward.report(), backward.report());
}

#[test]
fn test_deep_indirect_cycle_is_detected() {
    // a -> b -> c -> d -> e -> a, plus a diamond so an earlier traversal
    // explores d before the query that needs it.
    let graph = DependencyGraph::from_parsed(
        vec![
            parsed("a.sol", &["./b.sol", "./d.sol"]),
            parsed("b.sol", &["./c.sol"]),
            parsed("c.sol", &["./d.sol"]),
            parsed("d.sol", &["./e.sol"]),
            parsed("e.sol", &["./a.sol"]),
        ],
        &ExclusionSet::empty(),
    );

    let cycles = graph.cycles();
    for (x, y) in [
        ("a.sol", "b.sol"),
        ("b.sol", "c.sol"),
        ("c.sol", "d.sol"),
        ("d.sol", "e.sol"),
        ("a.sol", "e.sol"),
        ("a.sol", "d.sol"),
    ] {
        assert!(cycles.contains(&CyclePair::new(x, y)), "missing {x} <-> {y}");
    }
    assert_eq!(cycles.len(), 6);
    assert!(graph.has_path("c.sol", "b.sol"));
}

#[test]
fn test_acyclic_graph_has_no_cycles() {
    let graph = DependencyGraph::from_parsed(
        vec![
            parsed("a.sol", &["./b.sol", "./c.sol"]),
            parsed("b.sol", &["./c.sol"]),
            parsed("c.sol", &[]),
        ],
        &ExclusionSet::empty(),
    );
    assert!(graph.cycles().is_empty());
    assert!(graph.has_path("a.sol", "c.sol"));
    assert!(!graph.has_path("c.sol", "a.sol"));
}

#[test]
fn test_self_import_is_a_cycle() {
    let graph = DependencyGraph::from_parsed(
        vec![parsed("Loop.sol", &["./Loop.sol"])],
        &ExclusionSet::empty(),
    );
    assert_eq!(graph.cycles(), vec![CyclePair::new("Loop.sol", "Loop.sol")]);
}

#[test]
fn test_unresolved_targets_never_create_edges() {
    let graph = DependencyGraph::from_parsed(
        vec![
            parsed("src/Vault.sol", &["@openzeppelin/contracts/token/ERC20/ERC20.sol", "./Missing.sol"]),
            parsed("src/Token.sol", &["@openzeppelin/contracts/token/ERC20/ERC20.sol"]),
        ],
        &ExclusionSet::empty(),
    );
    let report = graph.report();
    assert!(report.edges.is_empty());
    assert_eq!(
        report.external_dependencies,
        vec!["Missing.sol", "openzeppelin/contracts/token/ERC20/ERC20.sol"]
    );
    for edge in &report.edges {
        assert!(graph.contains(&edge.to));
    }
    assert_eq!(report.total_imports, 3);
}

#[test]
fn test_resolution_strategies() {
    let graph = DependencyGraph::from_parsed(
        vec![
            parsed("src/core/Vault.sol", &["../interfaces/IVault.sol", "src/libs/Math.sol", "Token.sol"]),
            parsed("src/interfaces/IVault.sol", &[]),
            parsed("src/libs/Math.sol", &[]),
            parsed("src/tokens/Token.sol", &[]),
        ],
        &ExclusionSet::empty(),
    );
    assert_eq!(
        graph.dependencies("src/core/Vault.sol"),
        vec!["src/interfaces/IVault.sol", "src/libs/Math.sol", "src/tokens/Token.sol"]
    );
    assert!(graph.external_dependencies().is_empty());
}

#[test]
fn test_duplicate_imports_yield_one_edge() {
    let graph = DependencyGraph::from_parsed(
        vec![parsed("A.sol", &["./B.sol", "B.sol"]), parsed("B.sol", &[])],
        &ExclusionSet::empty(),
    );
    assert_eq!(graph.edges().len(), 1);
    assert_eq!(graph.most_imports(1)[0].out_degree, 1);
}

#[test]
fn test_ranking_by_out_degree_then_path() {
    let graph = DependencyGraph::from_parsed(
        vec![
            parsed("z.sol", &["./a.sol", "./b.sol"]),
            parsed("y.sol", &["./a.sol", "./b.sol"]),
            parsed("x.sol", &["./a.sol"]),
            parsed("a.sol", &[]),
            parsed("b.sol", &[]),
            parsed("c.sol", &["./a.sol", "./b.sol", "./x.sol"]),
        ],
        &ExclusionSet::empty(),
    );
    let ranked: Vec<(String, usize)> = graph
        .most_imports(TOP_IMPORTERS)
        .into_iter()
        .map(|r| (r.path, r.out_degree))
        .collect();
    assert_eq!(
        ranked,
        vec![
            ("c.sol".to_string(), 3),
            ("y.sol".to_string(), 2),
            ("z.sol".to_string(), 2),
            ("x.sol".to_string(), 1),
            ("a.sol".to_string(), 0),
        ]
    );
}

#[test]
fn test_node_set_is_project_minus_excluded_for_any_order() {
    let exclusions = ExclusionSet::new(&["mocks/**", "lib/**"]).unwrap();
    let mut files = vec![
        SourceFile::new("src/A.sol", "import \"./B.sol\";"),
        SourceFile::new("src/B.sol", ""),
        SourceFile::new("mocks/M.sol", "import \"../src/A.sol\";"),
        SourceFile::new("lib/L.sol", ""),
    ];
    let expected = vec!["src/A.sol".to_string(), "src/B.sol".to_string()];

    for _ in 0..files.len() {
        files.rotate_left(1);
        let in_scope: Vec<SourceFile> = files
            .iter()
            .filter(|f| !exclusions.is_excluded(&f.path))
            .cloned()
            .collect();
        let project = ContractProject::from_files("/p", in_scope);
        let graph = DependencyGraph::build(&project, &exclusions);
        assert_eq!(graph.nodes(), expected);
    }
}

#[test]
fn test_non_utf8_file_is_skipped_not_fatal() {
    let project = ContractProject::from_files(
        Path::new("/p"),
        vec![
            SourceFile::new("Good.sol", "contract Good {}"),
            SourceFile::new("Bad.sol", vec![0xc3, 0x28]),
        ],
    );
    let report = DependencyGraph::build(&project, &ExclusionSet::empty()).report();
    assert_eq!(report.nodes, vec!["Good.sol"]);
    assert_eq!(report.skipped_files.len(), 1);
    assert!(report.skipped_files[0].starts_with("Bad.sol"));
    assert_eq!(report.contracts["Good.sol"][0].name, "Good");
}

#[test]
fn test_normalize_import_target() {
    assert_eq!(normalize_import_target("./A.sol"), "A.sol");
    assert_eq!(normalize_import_target("../../x/B.sol"), "x/B.sol");
    assert_eq!(normalize_import_target("@oz/C.sol"), "oz/C.sol");
}
