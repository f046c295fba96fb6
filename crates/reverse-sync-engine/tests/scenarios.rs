//! End-to-end behaviour of the sync pipeline and the round-trip record.

use pretty_assertions::assert_eq;
use reverse_sync_engine::diff::ChangeKind;
use reverse_sync_engine::patch::Strategy;
use reverse_sync_engine::patcher::apply_patches;
use reverse_sync_engine::roundtrip::{build_record, extract_fragments, rehydrate, splice_rehydrate};
use reverse_sync_engine::{LostInfo, PatchOperation, sync_document};

const CALLOUT_PAGE: &str = concat!(
    "<h1>Guide</h1>\n",
    "<ac:structured-macro ac:name=\"info\" ac:schema-version=\"1\"><ac:rich-text-body>",
    "<p>First paragraph stays.</p><p>Second paragraph <strong>here</strong>.</p>",
    "</ac:rich-text-body></ac:structured-macro>\n"
);

#[test]
fn paragraph_edit_is_patched_directly() {
    let outcome = sync_document(
        "# T\n\nPara one.\n",
        "# T\n\nPara ONE.\n",
        "<h1>T</h1>\n<p>Para one.</p>\n",
        None,
    );

    assert_eq!(outcome.changes.len(), 1);
    assert_eq!(outcome.changes[0].kind, ChangeKind::Modified);
    assert_eq!(outcome.changes[0].position, 2);
    assert_eq!(outcome.plan.patches.len(), 1);
    assert_eq!(outcome.plan.patches[0].strategy, Strategy::Direct);
    assert_eq!(outcome.markup, "<h1>T</h1>\n<p>Para ONE.</p>\n");
}

fn code_page(body: &str) -> String {
    format!(
        "<ac:structured-macro ac:name=\"code\"><ac:parameter ac:name=\"language\">sh</ac:parameter>\
         <ac:plain-text-body><![CDATA[{body}]]></ac:plain-text-body></ac:structured-macro>"
    )
}

#[test]
fn multi_line_code_edit_keeps_newlines_and_indentation() {
    let outcome = sync_document(
        "```sh\necho a\n    echo b\n```\n",
        "```sh\necho A\n    echo b\n```\n",
        &code_page("echo a\n    echo b"),
        None,
    );

    assert_eq!(outcome.plan.patches.len(), 1);
    assert_eq!(outcome.markup, code_page("echo A\n    echo b"));
}

#[test]
fn code_body_with_markdown_syntax_is_patched() {
    let body = "ls -la\n  cd /tmp\n- item **kw** <x>";
    let outcome = sync_document(
        &format!("```sh\n{body}\n```\n"),
        &format!("```sh\n{}\n```\n", body.replace("ls -la", "ls -lah")),
        &code_page(body),
        None,
    );

    assert_eq!(
        outcome.plan.patches[0].operation.address(),
        Some("macro-code[1]")
    );
    assert_eq!(outcome.markup, code_page(&body.replace("ls -la", "ls -lah")));
}

#[test]
fn indentation_only_code_edit_is_applied() {
    let outcome = sync_document(
        "Intro.\n\n```sh\nif x; then\n  run\nfi\n```\n",
        "Intro.\n\n```sh\nif x; then\n    run\nfi\n```\n",
        &format!("<p>Intro.</p>{}", code_page("if x; then\n  run\nfi")),
        None,
    );

    assert_eq!(
        outcome.markup,
        format!("<p>Intro.</p>{}", code_page("if x; then\n    run\nfi"))
    );
}

#[test]
fn list_items_do_not_leak_into_each_other() {
    let outcome = sync_document(
        "- item A text\n- item B text\n",
        "- item A text appended\n- item B text modified\n",
        "<ul><li><p>item A text</p></li><li><p>item B text</p></li></ul>",
        None,
    );

    assert_eq!(
        outcome.markup,
        "<ul><li><p>item A text appended</p></li><li><p>item B text modified</p></li></ul>"
    );
}

#[test]
fn callout_edit_touches_one_child() {
    let previous = "# Guide\n\n<Callout type=\"info\">\nFirst paragraph stays.\n\nSecond paragraph **here**.\n</Callout>\n";
    let next = "# Guide\n\n<Callout type=\"info\">\nFirst paragraph stays.\n\nSecond paragraph **here** now.\n</Callout>\n";

    let outcome = sync_document(previous, next, CALLOUT_PAGE, None);

    assert_eq!(outcome.plan.patches.len(), 1);
    let address = outcome.plan.patches[0].operation.address();
    assert_eq!(address, Some("macro-info[1]/p[2]"));
    assert!(outcome.markup.contains("<p>First paragraph stays.</p>"));
    assert!(
        outcome
            .markup
            .contains("<p>Second paragraph <strong>here</strong> now.</p>")
    );
    assert!(outcome.markup.contains("ac:schema-version=\"1\""));
}

#[test]
fn repeated_phrase_changes_only_the_edited_occurrence() {
    let page = concat!(
        "<p>The upload limit is <strong>700MB</strong> per file.</p>\n",
        "<p>Files above 700MB are rejected by the server.</p>\n"
    );
    let outcome = sync_document(
        "The upload limit is **700MB** per file.\n\nFiles above 700MB are rejected by the server.\n",
        "The upload limit is **700MB** per file.\n\nFiles above 700MB are split by the server.\n",
        page,
        None,
    );

    assert_eq!(
        outcome.markup,
        concat!(
            "<p>The upload limit is <strong>700MB</strong> per file.</p>\n",
            "<p>Files above 700MB are split by the server.</p>\n"
        )
    );
}

#[test]
fn patching_twice_is_the_same_as_once() {
    let outcome = sync_document(
        "Para one.\n\n- a\n- b\n",
        "Para uno.\n\n- a\n- b\n- c\n",
        "<p>Para one.</p><ul><li><p>a</p></li><li><p>b</p></li></ul>",
        None,
    );
    let ops: Vec<PatchOperation> = outcome.plan.operations();
    assert!(!ops.is_empty());

    let again = apply_patches(&outcome.markup, &ops);
    assert_eq!(again, outcome.markup);
}

#[test]
fn unchanged_bytes_survive_patching() {
    let page = "<p>One.</p>\n  <!-- keep me -->\n<p>Two &amp; more.</p>\n<p>Three.</p>";
    let outcome = sync_document(
        "One.\n\nTwo & more.\n\nThree.\n",
        "One.\n\nTwo & more.\n\nThree!\n",
        page,
        None,
    );

    assert_eq!(
        outcome.markup,
        "<p>One.</p>\n  <!-- keep me -->\n<p>Two &amp; more.</p>\n<p>Three!</p>"
    );
}

#[test]
fn fragments_reassemble_to_the_input() {
    for markup in [
        "",
        "plain text only",
        "<p>a</p>",
        "\n<h2>T</h2>\n\n<p>a <b>b</b></p>\n<ul><li>x</li></ul>\n",
        CALLOUT_PAGE,
        "<p>one</p><ac:layout><ac:layout-section><ac:layout-cell><p>cell</p></ac:layout-cell></ac:layout-section></ac:layout>",
    ] {
        let split = extract_fragments(markup).unwrap();
        assert_eq!(split.reassemble(), markup);
        assert_eq!(
            split.separators.len(),
            split.fragments.len().saturating_sub(1)
        );
    }
}

#[test]
fn record_restores_original_markup() {
    let mdx = "# Guide\n\n<Callout type=\"info\">\nFirst paragraph stays.\n\nSecond paragraph **here**.\n</Callout>\n";
    let record = build_record(CALLOUT_PAGE, mdx, "1234", &LostInfo::default()).unwrap();

    assert_eq!(rehydrate(mdx, &record), CALLOUT_PAGE);

    let spliced = splice_rehydrate(mdx, &record);
    assert_eq!(spliced.markup, CALLOUT_PAGE);
    assert_eq!(spliced.emitted, 0);
}
