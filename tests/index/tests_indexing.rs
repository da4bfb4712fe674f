//! End-to-end indexing of Perl sources

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use perl5::FileId;
use perl5::index::{
    FileIndexState, IndexError, IndexOutcome, Indexer, IndexerConfig, LoadOutcome, StubIndex,
    StubIndexRegistry, registry,
};
use perl5::stubs::{IndexKey, StubFlags, StubKind};
use rstest::rstest;

use crate::helpers::source_fixtures;
use crate::helpers::stub_helpers::{new_indexer, stubs_of, summarize};

#[test]
fn test_two_lexical_scalars() {
    let indexer = new_indexer();
    let file = FileId::new(1);
    let report = indexer.index_text(file, 1, "my $x; my $y;").unwrap();
    assert_eq!(report.stubs, 2);

    let set = indexer.index().file_stubs(file).unwrap();
    assert_eq!(
        summarize(set.stubs()),
        vec![
            ("scalar variable", "main", "x"),
            ("scalar variable", "main", "y")
        ]
    );

    let found = indexer.index().lookup(IndexKey::SCALAR, "x").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].file, file);
    assert!(found[0].stub.flags.contains(StubFlags::FILE_SCOPE));
    assert!(found[0].stub.flags.contains(StubFlags::LEXICAL));
}

#[test]
fn test_module_stubs() {
    let stubs = stubs_of(source_fixtures::MODULE);
    assert_eq!(
        summarize(&stubs),
        vec![
            ("package", "Acme", "Acme::Counter"),
            ("scalar variable", "Acme::Counter", "VERSION"),
            ("array variable", "Acme::Counter", "EXPORT_OK"),
            ("hash variable", "Acme::Counter", "registry"),
            ("sub definition", "Acme::Counter", "new"),
            ("scalar variable", "Acme::Counter", "class"),
            ("hash variable", "Acme::Counter", "args"),
            ("scalar variable", "Acme::Counter", "self"),
            ("sub definition", "Acme::Counter", "increment"),
            ("scalar variable", "Acme::Counter", "self"),
        ]
    );
    assert_eq!(stubs[1].flags, StubFlags::PACKAGE | StubFlags::FILE_SCOPE);
    assert_eq!(stubs[4].flags, StubFlags::FILE_SCOPE);
    assert_eq!(stubs[5].flags, StubFlags::LEXICAL);
}

#[test]
fn test_package_scoping() {
    let stubs = stubs_of(source_fixtures::TWO_PACKAGES);
    assert_eq!(
        summarize(&stubs),
        vec![
            ("package", "main", "First"),
            ("scalar variable", "First", "name"),
            ("package", "main", "Second"),
            ("scalar variable", "Second", "name"),
            ("sub definition", "Second", "hello"),
            ("scalar variable", "First", "after"),
        ]
    );
    assert!(!stubs[4].flags.contains(StubFlags::FILE_SCOPE));
}

#[rstest]
#[case("item", StubFlags::LEXICAL)]
#[case("line", StubFlags::LEXICAL)]
#[case("_", StubFlags::LOCAL)]
#[case("seen", StubFlags::LEXICAL.union(StubFlags::STATE))]
fn test_control_flow_scalars(#[case] name: &str, #[case] flags: StubFlags) {
    let indexer = new_indexer();
    indexer
        .index_text(FileId::new(1), 1, source_fixtures::CONTROL_FLOW)
        .unwrap();
    let found = indexer.index().lookup(IndexKey::SCALAR, name).unwrap();
    assert_eq!(found.len(), 1, "expected one `{}`", name);
    assert_eq!(found[0].stub.flags, flags);
}

#[test]
fn test_lookup_spans_files() {
    let indexer = new_indexer();
    indexer.index_text(FileId::new(1), 1, source_fixtures::MODULE).unwrap();
    indexer.index_text(FileId::new(2), 1, "sub new { }").unwrap();

    let found = indexer.index().lookup(IndexKey::SUB, "new").unwrap();
    let namespaces: Vec<_> = found.iter().map(|s| s.stub.namespace.as_str()).collect();
    assert_eq!(namespaces, vec!["Acme::Counter", "main"]);
    assert_eq!(indexer.index().lookup(IndexKey::PACKAGE, "Acme::Counter").unwrap().len(), 1);
}

#[test]
fn test_reindex_after_edit() {
    let indexer = new_indexer();
    let file = FileId::new(1);
    indexer.index_text(file, 1, "my $old; sub gone { }").unwrap();
    indexer.index().mark_stale(file, 2);
    assert_eq!(indexer.index().file_state(file), FileIndexState::Stale);
    assert_eq!(indexer.index().lookup(IndexKey::SUB, "gone").unwrap().len(), 1);

    indexer.index_text(file, 2, "my $new;").unwrap();
    assert_eq!(indexer.index().file_state(file), FileIndexState::Indexed);
    assert!(indexer.index().lookup(IndexKey::SUB, "gone").unwrap().is_empty());
    assert!(indexer.index().lookup(IndexKey::SCALAR, "old").unwrap().is_empty());
    assert_eq!(indexer.index().lookup(IndexKey::SCALAR, "new").unwrap().len(), 1);
}

#[test]
fn test_malformed_file_does_not_affect_others() {
    let indexer = new_indexer();
    let report = indexer
        .index_text(FileId::new(1), 1, "package ;\nsub { my $x = ;\n")
        .unwrap();
    assert!(report.diagnostics.iter().any(|d| d.is_error()));
    indexer.index_text(FileId::new(2), 1, "my $fine;").unwrap();
    assert_eq!(indexer.index().lookup(IndexKey::SCALAR, "fine").unwrap().len(), 1);
    assert_eq!(indexer.index().lookup(IndexKey::SCALAR, "x").unwrap().len(), 1);
}

#[rstest]
#[case::parens(format!("my $x = {}1{};\n", "(".repeat(10_000), ")".repeat(10_000)))]
#[case::unclosed(format!("my $x = {}1;\n", "(".repeat(10_000)))]
#[case::anon_subs(format!("my $x = {}1{};\n", "sub { ".repeat(10_000), " }".repeat(10_000)))]
fn test_deeply_nested_source_keeps_outer_stub(#[case] source: String) {
    let indexer = new_indexer();
    let file = FileId::new(1);
    let report = indexer.index_text(file, 1, &source).unwrap();
    assert_eq!(report.outcome, IndexOutcome::Indexed);
    assert!(report.diagnostics.iter().any(|d| d.code.as_deref() == Some("E0205")));

    let set = indexer.index().file_stubs(file).unwrap();
    assert_eq!(summarize(&set.stubs()[..1]), vec![("scalar variable", "main", "x")]);
    assert_eq!(indexer.index().lookup(IndexKey::SCALAR, "x").unwrap().len(), 1);
}

#[test]
fn test_persisted_stubs_survive_restart() {
    let indexer = new_indexer();
    let file = FileId::new(3);
    indexer.index_text(file, 4, source_fixtures::MODULE).unwrap();
    let bytes = indexer.index().file_bytes(file).unwrap().unwrap();

    let restarted = new_indexer();
    let outcome = restarted.index().load_file_bytes(file, &bytes).unwrap();
    assert_eq!(outcome, LoadOutcome::Loaded { version: 4, stubs: 10 });
    assert_eq!(
        restarted.index().file_stubs(file).unwrap().stubs(),
        indexer.index().file_stubs(file).unwrap().stubs()
    );
}

#[test]
fn test_corrupt_bytes_trigger_rebuild() {
    let indexer = new_indexer();
    let file = FileId::new(1);
    let mut bytes = {
        let source = new_indexer();
        source.index_text(file, 1, "my $x;").unwrap();
        source.index().file_bytes(file).unwrap().unwrap()
    };
    bytes.push(0x00);

    let outcome = indexer.index().load_file_bytes(file, &bytes).unwrap();
    assert!(matches!(outcome, LoadOutcome::RebuildRequired(_)));
    assert_eq!(indexer.index().file_state(file), FileIndexState::NotIndexed);

    let report = indexer.index_text(file, 1, "my $x;").unwrap();
    assert_eq!(report.outcome, IndexOutcome::Indexed);
    assert_eq!(indexer.index().lookup(IndexKey::SCALAR, "x").unwrap().len(), 1);
}

// The only integration test touching the process-wide registry slot.
#[test]
fn test_global_registry_lifecycle() {
    registry::teardown();
    assert!(matches!(
        StubIndex::with_global_registry(),
        Err(IndexError::NotInstalled)
    ));

    let mut builder = StubIndexRegistry::builder();
    builder
        .register(IndexKey::SCALAR, StubKind::ScalarVariable)
        .unwrap()
        .register(IndexKey::SUB, StubKind::SubDefinition)
        .unwrap();
    registry::install(builder.build()).unwrap();

    let index = Arc::new(StubIndex::with_global_registry().unwrap());
    let indexer = Indexer::new(index, IndexerConfig::default()).unwrap();
    let err = indexer
        .index_text(FileId::new(1), 1, "my @not_registered;")
        .unwrap_err();
    assert_eq!(err, IndexError::UnregisteredKind(StubKind::ArrayVariable));
    assert_eq!(indexer.index().file_state(FileId::new(1)), FileIndexState::NotIndexed);

    indexer.index_text(FileId::new(1), 2, "my $ok; sub ok { }").unwrap();
    assert_eq!(indexer.index().lookup(IndexKey::SUB, "ok").unwrap().len(), 1);
    assert_eq!(
        indexer.index().lookup(IndexKey::HASH, "ok"),
        Err(IndexError::UnknownKey(IndexKey::HASH))
    );

    assert!(registry::teardown().is_some());
    // Existing indexes keep their registry.
    assert_eq!(indexer.index().lookup(IndexKey::SCALAR, "ok").unwrap().len(), 1);
}
