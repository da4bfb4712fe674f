//! Live and stub-backed declarations answer the same queries

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use perl5::parser::parse;
use perl5::psi::PsiError;
use perl5::stubs::{
    self, Declaration, DeclarationPsi, PerlStub, StubElementType, StubFlags, StubKind, decode_stub,
    encode_stub,
};
use rstest::rstest;

use crate::helpers::source_fixtures;

fn declarations(source: &str) -> Vec<DeclarationPsi> {
    parse(source)
        .syntax()
        .descendants()
        .filter_map(|node| DeclarationPsi::from_node(&node))
        .collect()
}

#[rstest]
#[case(source_fixtures::MODULE)]
#[case(source_fixtures::TWO_PACKAGES)]
#[case(source_fixtures::CONTROL_FLOW)]
fn test_stub_round_trip_preserves_name_and_flags(#[case] source: &str) {
    let live = declarations(source);
    assert!(!live.is_empty());
    for declaration in live {
        let stub = declaration.to_stub().unwrap().into_owned();
        let detached = stub.kind.element_type().create_psi(stub.clone());

        assert!(detached.is_detached());
        assert_eq!(detached.kind(), declaration.kind());
        assert_eq!(detached.name().unwrap(), declaration.name().unwrap());
        assert_eq!(detached.namespace().unwrap(), declaration.namespace().unwrap());
        assert_eq!(detached.flags().unwrap(), declaration.flags().unwrap());

        // Survives the persisted form as well.
        let decoded = decode_stub(&encode_stub(&stub).unwrap()).unwrap();
        assert_eq!(DeclarationPsi::from_stub(decoded).to_stub().unwrap().as_ref(), &stub);
    }
}

#[test]
fn test_detached_declaration_has_no_tree() {
    let stub = PerlStub::new(StubKind::ScalarVariable, "count", "Acme", StubFlags::PACKAGE);
    let detached = DeclarationPsi::from_stub(stub);

    assert!(detached.syntax().is_none());
    assert_eq!(detached.qualified_name().unwrap(), "Acme::count");
    match detached.enclosing_block() {
        Err(PsiError::Detached(err)) => {
            assert_eq!(err.accessor, "enclosing_block");
            assert_eq!(err.name, "count");
        }
        other => panic!("expected a detached error, got {:?}", other),
    }
    assert!(detached.text_range().is_err());
}

#[test]
fn test_live_declaration_has_tree() {
    let live = declarations("sub outer { my $inner; }");
    let inner = live
        .iter()
        .find(|d| d.kind() == StubKind::ScalarVariable)
        .unwrap();
    assert!(inner.enclosing_block().unwrap().is_some());
    assert!(inner.text_range().is_ok());

    let sub = live
        .iter()
        .find(|d| d.kind() == StubKind::SubDefinition)
        .unwrap();
    assert_eq!(sub.enclosing_block().unwrap(), None);
}

#[test]
fn test_every_kind_has_an_element_type() {
    for kind in StubKind::ALL {
        assert_eq!(kind.element_type().kind(), kind);
        assert_eq!(kind.element_type().index_key(), kind.index_key());
    }
    assert_eq!(stubs::element_types().len(), StubKind::ALL.len());
}
