//! End-to-end resolution through the working set and the query layer.
#![cfg(feature = "srcml")]

mod common;

use rstest::rstest;
use srcdata::hir::{MatchRank, ScopeKind, TypeUse};
use srcdata::ide::{
    DefinitionsForMethodCall, FindMethodCallsAtLocation, FindScopesByName, QueryExt,
    ScopeForLocation, StatementForLocation,
};
use srcdata::{Error, SourceLocation, WorkingSet};

use common::*;

fn loaded(units: &[srcdata::ParsedUnit]) -> WorkingSet {
    let ws = WorkingSet::default();
    let report = ws.initialize(units).expect("initializes");
    assert!(report.is_clean(), "{report:?}");
    ws
}

#[rstest]
#[case::inner_use(2, "double", 4)]
#[case::outer_use(3, "int", 2)]
fn test_shadowing_resolves_innermost(
    #[case] occurrence: usize,
    #[case] type_name: &str,
    #[case] declared_on: u32,
) {
    let unit = shadowing();
    let ws = loaded(std::slice::from_ref(&unit));
    let use_site = unit.find_text("x", occurrence).expect("use site");

    let decl = ws
        .declaration_for_variable(&use_site)
        .expect("query runs")
        .expect("declaration found");
    assert_eq!(decl.declared_type, TypeUse::builtin(type_name));
    assert_eq!(decl.location.start_line(), declared_on);
}

#[test]
fn test_call_resolves_through_base_type_in_other_file() {
    let header = base_header();
    let source = derived_source();
    let ws = loaded(&[header, source.clone()]);

    let call = source.find_text("f(", 0).expect("call site");
    let targets = ws.definitions_for_call(&call).expect("query runs");
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].method.qualified_name, "A::f");
    assert_eq!(targets[0].rank, MatchRank::Exact);
    assert_eq!(targets[0].method.location().map(|l| l.file()), Some("a.h"));
}

#[test]
fn test_deleting_definition_file_empties_resolution() {
    let source = derived_source();
    let ws = loaded(&[base_header(), source.clone()]);
    let call = source.find_text("f(", 0).expect("call site");
    assert_eq!(ws.definitions_for_call(&call).expect("query runs").len(), 1);

    assert!(ws.remove_file("a.h").expect("removes"));
    assert!(ws.definitions_for_call(&call).expect("query runs").is_empty());
    let found = ws
        .execute(&FindScopesByName::new("A").of_kind(ScopeKind::Type), None)
        .expect("query runs");
    assert!(found.is_empty());
}

#[test]
fn test_reparse_of_unchanged_file_is_idempotent() {
    let header = base_header();
    let ws = loaded(&[header.clone(), derived_source()]);
    let before = ws.read(None, |tree| tree.outline()).expect("readable");

    ws.add_or_update_file(&header).expect("re-merges");
    let after = ws.read(None, |tree| tree.outline()).expect("readable");
    assert_eq!(before, after);
}

#[test]
fn test_update_matches_fresh_load() {
    let source = out_of_line_source();
    let call = source.find_text("f(", 0).expect("call site");
    let ws = loaded(&[hierarchy_header(true), source.clone()]);
    let before: Vec<_> = ws
        .definitions_for_call(&call)
        .expect("query runs")
        .into_iter()
        .map(|t| t.method.qualified_name)
        .collect();
    assert_eq!(before, vec!["A::f"]);

    ws.add_or_update_file(&hierarchy_header(false)).expect("updates");
    assert!(ws.definitions_for_call(&call).expect("query runs").is_empty());

    let fresh = loaded(&[hierarchy_header(false), source]);
    assert!(fresh.definitions_for_call(&call).expect("query runs").is_empty());
    assert_eq!(
        ws.read(None, |tree| tree.outline()).expect("readable"),
        fresh.read(None, |tree| tree.outline()).expect("readable")
    );
}

#[test]
fn test_namespace_alias_resolves_qualified_call() {
    let library = unit(&format!(
        r#"<unit {NS} language="C++" filename="lib.h"><namespace>namespace <name>lib</name> <block>{{
<namespace>namespace <name>detail</name> <block>{{
<function_decl><type><name>void</name></type> <name>run</name><parameter_list>()</parameter_list>;</function_decl>
}}</block></namespace>
}}</block></namespace>
</unit>"#
    ));
    let client = unit(&format!(
        r#"<unit {NS} language="C++" filename="main.cpp"><namespace>namespace <name>d</name> <init>= <name><name>lib</name><operator>::</operator><name>detail</name></name></init>;</namespace>
<function><type><name>void</name></type> <name>go</name><parameter_list>()</parameter_list> <block>{{<block_content> <expr_stmt><expr><call><name><name>d</name><operator>::</operator><name>run</name></name><argument_list>()</argument_list></call></expr>;</expr_stmt> </block_content>}}</block></function>
</unit>"#
    ));
    let ws = loaded(&[library, client.clone()]);

    let go = ws.execute(&FindScopesByName::new("go"), None).expect("query runs");
    assert_eq!(go.len(), 1);
    assert_eq!(go[0].qualified_name, "go");

    let call = client.find_text("run(", 0).expect("call site");
    let targets = ws.definitions_for_call(&call).expect("query runs");
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].method.qualified_name, "lib::detail::run");
}

#[test]
fn test_update_drops_declarations_absent_from_reparse() {
    let ws = loaded(&[functions("lib.c", &["alpha", "beta"])]);
    ws.add_or_update_file(&functions("lib.c", &["alpha"]))
        .expect("updates");

    let beta = ws.execute(&FindScopesByName::new("beta"), None).expect("query runs");
    assert!(beta.is_empty());
    let alpha = ws.execute(&FindScopesByName::new("alpha"), None).expect("query runs");
    assert_eq!(alpha.len(), 1);
    assert_eq!(alpha[0].kind, ScopeKind::Method);
}

#[test]
fn test_merge_conflict_keeps_previous_contribution() {
    let ws = loaded(&[java_class("one/Widget.java", "Widget")]);
    let before = ws.read(None, |tree| tree.outline()).expect("readable");

    let err = ws.add_or_update_file(&java_class("two/Widget.java", "Widget"));
    match err {
        Err(Error::MergeConflict(conflict)) => {
            assert_eq!(conflict.qualified_name, "app.Widget");
            assert_eq!(conflict.file.as_ref(), "two/Widget.java");
        }
        other => panic!("expected a merge conflict, got {other:?}"),
    }
    assert!(!ws.contains_file("two/Widget.java"));
    assert_eq!(ws.read(None, |tree| tree.outline()).expect("readable"), before);
    assert_eq!(ws.statistics().expect("stats").error_count, 1);

    ws.add_or_update_file(&java_class("two/Widget.java", "Gadget"))
        .expect("fixed file merges");
    assert!(ws.diagnostics().is_empty());
}

#[test]
fn test_location_queries() {
    let unit = shadowing();
    let ws = loaded(std::slice::from_ref(&unit));
    let inner_use = unit.find_text("x", 2).expect("use site");

    let innermost = ws
        .execute(&StatementForLocation::new(inner_use.clone()), None)
        .expect("query runs")
        .expect("inside a scope");
    assert_eq!(innermost.kind, ScopeKind::Block);

    let method = ws
        .execute(&ScopeForLocation::new(inner_use.clone()).of_kind(ScopeKind::Method), None)
        .expect("query runs")
        .expect("inside a method");
    assert_eq!(method.name, "f");
    assert_eq!(ws.find_scope(&inner_use).expect("query runs"), Some(innermost));

    let calls = ws
        .execute(&FindMethodCallsAtLocation::new(inner_use.clone()), None)
        .expect("query runs");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].name, "g");
    assert_eq!(calls[0].location.start_line(), 5);

    let count = ws
        .execute(&DefinitionsForMethodCall::new(inner_use).map(|targets| targets.len()), None)
        .expect("query runs");
    assert_eq!(count, 0, "g is never defined");
}

#[test]
fn test_location_outside_project_is_invalid_input() {
    let ws = loaded(&[shadowing()]);
    let err = ws.find_scope(&SourceLocation::new("elsewhere.cpp", 1, 1));
    assert!(matches!(err, Err(Error::InvalidInput(_))));

    // Inside the project but outside every scope is simply nothing.
    let none = ws
        .declaration_for_variable(&SourceLocation::new("shadow.cpp", 1, 1))
        .expect("query runs");
    assert!(none.is_none());
}
