//! Whole-pipeline integration: compile, transport, evaluate, render.

mod common;

use common::{grid, FailingTransport, ScriptedTransport, ScriptVariant};
use serde_json::json;
use trestle::{TestPage, TestSummary};

#[test]
fn test_full_run_renders_judgments_and_counts() {
    let table = grid(&[
        &["demo:echo box"],
        &["$v=", "echo int", "10"],
        &["check", "echo int", "$v", "$v"],
    ]);
    let mut page = TestPage::new();
    page.add_table(ScriptVariant, table.clone());

    let mut transport = ScriptedTransport::new(&[
        ("scriptTable_0_0", "OK"),
        ("scriptTable_0_1", "10"),
        ("scriptTable_0_2", "10"),
    ]);
    let summary = page.run(&mut transport).unwrap();

    assert_eq!(
        transport.sent_tags(),
        vec!["scriptTable_0_0", "scriptTable_0_1", "scriptTable_0_2"],
    );
    assert_eq!(
        transport.sent[1],
        json!(["scriptTable_0_1", "callAndAssign", "v", "scriptTable_0", "echoInt", "10"]),
    );

    assert_eq!(table.cell_text(0, 0), "pass(demo:echo box)");
    assert_eq!(table.cell_text(0, 1), "$v<-[10]");
    assert_eq!(table.cell_text(3, 2), "pass($v->[10])");

    assert_eq!(
        summary,
        TestSummary {
            right: 1,
            wrong: 0,
            exceptions: 0,
            ignores: 0,
        },
    );
    assert_eq!(summary.to_string(), "R:1 W:0 E:0 I:0");
}

#[test]
fn test_comparator_expressions_judge_returned_values() {
    let table = grid(&[
        &["gauge"],
        &["check", "measure", "<10"],
        &["check", "measure", "1 <= _ <= 10"],
        &["check", "measure", "=~/^ab/"],
        &["check", "measure", "~=3.14"],
        &["reject", "measure", "<10"],
        &["reject", "measure", "5"],
    ]);
    let mut page = TestPage::new();
    page.add_table(ScriptVariant, table.clone());

    let mut transport = ScriptedTransport::new(&[
        ("scriptTable_0_0", "OK"),
        ("scriptTable_0_1", "5"),
        ("scriptTable_0_2", "10"),
        ("scriptTable_0_3", "abcdef"),
        ("scriptTable_0_4", "3.141"),
        ("scriptTable_0_5", "5"),
        ("scriptTable_0_6", "7"),
    ]);
    let summary = page.run(&mut transport).unwrap();

    assert_eq!(table.cell_text(2, 1), "pass(5<10)");
    assert_eq!(table.cell_text(2, 2), "pass(1<=10<=10)");
    assert_eq!(table.cell_text(2, 3), "pass(/^ab/ found in: abcdef)");
    assert_eq!(table.cell_text(2, 4), "pass(3.141~=3.14)");
    // A satisfied comparator is a failure for a reject row, and a plain
    // mismatch is a pass.
    assert_eq!(table.cell_text(2, 5), "fail(5<10)");
    assert_eq!(table.cell_text(2, 6), "[7] pass(is not [5])");

    assert_eq!(
        summary,
        TestSummary {
            right: 5,
            wrong: 1,
            exceptions: 0,
            ignores: 0,
        },
    );
}

#[test]
fn test_page_with_no_results_yields_only_ignores() {
    let table = grid(&[
        &["demo:echo box"],
        &["check", "echo int", "1", "1"],
        &["$v=", "echo int", "2"],
    ]);
    let mut page = TestPage::new();
    page.add_table(ScriptVariant, table.clone());

    let mut transport = ScriptedTransport::new(&[]);
    let summary = page.run(&mut transport).unwrap();

    assert_eq!(table.cell_text(0, 0), "demo:echo box ignore(Test not run)");
    assert_eq!(table.cell_text(3, 1), "1 ignore(Test not run)");
    assert_eq!(table.cell_text(0, 2), "$v= ignore(Test not run)");

    assert_eq!(summary.ignores, 3);
    assert_eq!(summary.total(), 3);
}

#[test]
fn test_exception_markers_short_circuit_their_cells() {
    let table = grid(&[&["box"], &["check", "poke", "done"], &["go now"]]);
    let mut page = TestPage::new();
    page.add_table(ScriptVariant, table.clone());

    let mut transport = ScriptedTransport::new(&[
        ("scriptTable_0_0", "OK"),
        ("scriptTable_0_1", "__EXCEPTION__:java.lang.Boom"),
        ("scriptTable_0_2", "__FAIL__:stuck"),
    ]);
    let summary = page.run(&mut transport).unwrap();

    assert_eq!(table.cell_text(2, 1), "done error(java.lang.Boom)");
    // Even a silently judged action row surfaces a marker.
    assert_eq!(table.cell_text(0, 2), "go now fail(stuck)");

    assert_eq!(
        summary,
        TestSummary {
            right: 0,
            wrong: 1,
            exceptions: 1,
            ignores: 0,
        },
    );
}

#[test]
fn test_unknown_construction_message_counts_an_error() {
    let table = grid(&[&["mystery box"]]);
    let mut page = TestPage::new();
    page.add_table(ScriptVariant, table.clone());

    let mut transport = ScriptedTransport::new(&[("scriptTable_0_0", "No such class")]);
    let summary = page.run(&mut transport).unwrap();

    assert_eq!(table.cell_text(0, 0), "error(Unknown construction message)");
    assert_eq!(summary.exceptions, 1);
    assert_eq!(summary.total(), 1);
}

#[test]
fn test_symbols_assigned_by_one_root_reach_the_next() {
    let first = grid(&[&["alpha"], &["$total=", "count", "5"]]);
    let second = grid(&[&["beta"], &["check", "recount", "$total"]]);
    let mut page = TestPage::new();
    page.add_table(ScriptVariant, first.clone());
    page.add_table(ScriptVariant, second.clone());

    let mut transport = ScriptedTransport::new(&[
        ("scriptTable_0_0", "OK"),
        ("scriptTable_0_1", "5"),
        ("scriptTable_1_0", "OK"),
        ("scriptTable_1_1", "5"),
    ]);
    let summary = page.run(&mut transport).unwrap();

    assert_eq!(first.cell_text(0, 1), "$total<-[5]");
    assert_eq!(second.cell_text(2, 1), "pass($total->[5])");
    assert_eq!(summary.right, 1);
}

#[test]
fn test_transport_failure_aborts_the_run() {
    let table = grid(&[&["box"], &["go"]]);
    let mut page = TestPage::new();
    page.add_table(ScriptVariant, table.clone());

    let mut transport = FailingTransport {
        message: "connection refused".into(),
    };
    let error = page.run(&mut transport).unwrap_err();

    assert_eq!(error.to_string(), "Transport error: connection refused");
    assert!(!error.is_syntax());
    assert_eq!(
        error.diagnostic_info.error_code,
        "trestle::transport::failure",
    );

    // No judgments were rendered and the expectations are still queued.
    assert_eq!(table.cell_text(0, 0), "box");
    assert_eq!(page.context().expectations.len(), 2);
}
