//! Tree construction through the public API
//!
//! Run with: cargo test --test parser_tests

use duel_compiler::ast::{BlockKind, CommandKind, ElementKind, NodeRef, TEST_ATTR, Value};
use duel_compiler::{Ast, ErrorKind, HtmlConfig, ParseError, parse};

fn parse_ok(source: &str) -> Ast {
    match parse(source, &HtmlConfig::standard()) {
        Ok(ast) => ast,
        Err(err) => panic!("parse failed: {}\n{}", err, err.render(source, "test.duel")),
    }
}

fn parse_err(source: &str) -> ParseError {
    match parse(source, &HtmlConfig::standard()) {
        Ok(ast) => panic!("expected an error, got {} view(s)", ast.views.len()),
        Err(err) => err,
    }
}

fn only_view(ast: &Ast) -> NodeRef<'_> {
    assert_eq!(ast.views.len(), 1);
    ast.views().next().unwrap()
}

fn test_value(node: NodeRef<'_>) -> Option<Value> {
    node.attribute(TEST_ATTR).and_then(|attr| attr.value.clone())
}

#[test]
fn test_nesting_with_void_element() {
    let ast = parse_ok("<view name=\"v\"><div><span><img></span></div></view>");
    let view = only_view(&ast);

    let div = view.first_child().unwrap();
    let span = div.first_child().unwrap();
    let img = span.first_child().unwrap();
    assert_eq!(div.tag(), Some("div"));
    assert_eq!(span.tag(), Some("span"));
    assert_eq!(img.tag(), Some("img"));
    assert_eq!(img.child_count(), 0);
    assert_eq!(div.child_count(), 1);
    assert_eq!(span.child_count(), 1);
    assert_eq!(img.parent().map(|p| p.id()), Some(span.id()));
}

#[test]
fn test_if_attribute_becomes_wrapper() {
    let ast = parse_ok("<view name=\"v\"><p class=\"c\" if=\"data.show\">x</p></view>");
    let view = only_view(&ast);

    let wrapper = view.first_child().unwrap();
    assert_eq!(wrapper.command(), Some(CommandKind::If));
    assert_eq!(test_value(wrapper), Some(Value::expression("data.show")));
    assert_eq!(wrapper.child_count(), 1);

    let p = wrapper.first_child().unwrap();
    assert_eq!(p.tag(), Some("p"));
    let names: Vec<&str> = p.attributes().unwrap().keys().map(String::as_str).collect();
    assert_eq!(names, vec!["class"]);
}

#[test]
fn test_if_attribute_with_block_value() {
    let ast = parse_ok("<view name=\"v\"><img src=\"a.png\" if=\"<%= data.ok %>\"></view>");
    let wrapper = only_view(&ast).first_child().unwrap();
    assert_eq!(test_value(wrapper), Some(Value::expression(" data.ok ")));
    assert_eq!(wrapper.first_child().and_then(|n| n.tag()), Some("img"));
}

#[test]
fn test_conditional_on_call() {
    let ast = parse_ok("<view name=\"v\"><call view=\"Other\" if=\"data.more\"></call>x</view>");
    let children: Vec<_> = only_view(&ast).children().collect();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].command(), Some(CommandKind::If));
    assert_eq!(test_value(children[0]), Some(Value::expression("data.more")));

    let call = children[0].first_child().unwrap();
    assert_eq!(call.command(), Some(CommandKind::Call));
    assert!(call.attribute("if").is_none());
    assert_eq!(children[1].text(), Some("x"));
}

#[test]
fn test_for_rejects_if_attribute() {
    let err = parse_err("<view name=\"v\"><for each=\"data.items\" if=\"data.items\">i</for></view>");
    assert_eq!(err.message, "Invalid attribute on FOR command: if");
}

#[test]
fn test_if_else_chain_is_one_xor() {
    let ast = parse_ok("<view name=\"v\"><if test=\"a\">A<else if=\"b\">B<else>C</if></view>");
    let view = only_view(&ast);
    assert_eq!(view.child_count(), 1);

    let xor = view.first_child().unwrap();
    assert_eq!(xor.command(), Some(CommandKind::Xor));

    let cases: Vec<_> = xor.children().collect();
    assert_eq!(cases.len(), 3);
    assert!(cases.iter().all(|c| c.command() == Some(CommandKind::If)));
    assert_eq!(test_value(cases[0]), Some(Value::expression("a")));
    assert_eq!(test_value(cases[1]), Some(Value::expression("b")));
    assert!(cases[2].attribute(TEST_ATTR).is_none());

    let texts: Vec<_> = cases.iter().filter_map(|c| c.first_child()?.text()).collect();
    assert_eq!(texts, vec!["A", "B", "C"]);
}

#[test]
fn test_closed_else_extends_preceding_chain() {
    let ast = parse_ok("<view name=\"v\"><if test=\"a\">A</if><else>B</else></view>");
    let view = only_view(&ast);
    assert_eq!(view.child_count(), 1);
    assert_eq!(view.first_child().map(|xor| xor.child_count()), Some(2));
}

#[test]
fn test_nested_if_inside_branch() {
    let ast = parse_ok("<view name=\"v\"><if test=\"a\"><if test=\"b\">AB</if><else>N</if></view>");
    let xor = only_view(&ast).first_child().unwrap();
    let cases: Vec<_> = xor.children().collect();
    assert_eq!(cases.len(), 2);

    let inner = cases[0].first_child().unwrap();
    assert_eq!(inner.command(), Some(CommandKind::Xor));
    assert_eq!(inner.child_count(), 1);
    assert_eq!(cases[1].first_child().and_then(|n| n.text()), Some("N"));
}

#[test]
fn test_call_parts() {
    let ast = parse_ok(concat!(
        "<view name=\"v\"><call view=\"X\">\n  ",
        "<part name=\"p\">P</part>other text</call></view>",
    ));
    let call = only_view(&ast).first_child().unwrap();
    assert_eq!(call.command(), Some(CommandKind::Call));
    assert_eq!(
        call.attribute("view").and_then(|a| a.value.clone()),
        Some(Value::expression("X"))
    );

    let parts: Vec<_> = call.children().collect();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].part_name(), Some("p"));
    assert_eq!(parts[1].part_name(), Some(""));
    assert_eq!(parts[1].first_child().and_then(|n| n.text()), Some("other text"));
}

#[test]
fn test_call_defer_and_view_flags() {
    let ast = parse_ok("<view name=\"v\" server-only><call view=\"X\" defer></call></view>");
    let view = only_view(&ast);
    assert!(view.is_server_only());
    assert!(!view.is_client_only());
    let call = view.first_child().unwrap();
    assert!(call.is_defer());
    assert_eq!(call.child_count(), 0);
}

#[test]
fn test_whitespace_only_view_is_empty() {
    let ast = parse_ok("<view name=\"v\">\n    \n</view>");
    assert_eq!(only_view(&ast).child_count(), 0);
}

#[test]
fn test_view_edges_are_trimmed() {
    let ast = parse_ok("<view name=\"v\">\n  <b>x</b>\n  tail  \n</view>");
    let view = only_view(&ast);
    let children: Vec<_> = view.children().collect();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].tag(), Some("b"));
    assert_eq!(children[1].text(), Some("\n  tail  \n"));
}

#[test]
fn test_stray_and_implicit_closes() {
    let ast = parse_ok("<view name=\"v\"><p>x</b>y<i>z</view>");
    let view = only_view(&ast);
    assert_eq!(view.to_string(), "<view name=\"v\"><p>xy<i>z</i></p></view>");
}

#[test]
fn test_raw_text_elements() {
    let ast = parse_ok("<view name=\"v\"><script>if (a < b) { c(\"<em>\"); }</script></view>");
    let script = only_view(&ast).first_child().unwrap();
    assert_eq!(script.child_count(), 1);
    assert_eq!(script.first_child().and_then(|n| n.text()), Some("if (a < b) { c(\"<em>\"); }"));
}

#[test]
fn test_blocks_in_content() {
    let ast = parse_ok("<view name=\"v\"><!doctype html><!-- c --><%-- d --%><% s %><%# m %><?php x ?></view>");
    let kinds: Vec<BlockKind> = only_view(&ast).children().filter_map(|n| n.block()).map(|b| b.kind).collect();
    assert_eq!(
        kinds,
        vec![
            BlockKind::DocType,
            BlockKind::Comment,
            BlockKind::CodeComment,
            BlockKind::Statement,
            BlockKind::MarkupExpression,
            BlockKind::Unknown,
        ]
    );
}

#[test]
fn test_render_reparses_to_equal_tree() {
    let source = concat!(
        "<view name=\"v\">",
        "<!doctype html><a href=\"<%= url %>\" title=\"t\">x<br/></a>",
        "<!-- c --><%# m %><%-- hidden --%>",
        "</view>",
    );
    let first = parse_ok(source);
    let rendered = only_view(&first).to_string();
    assert_eq!(
        rendered,
        "<view name=\"v\"><!DOCTYPE html><a href=\"<%= url %>\" title=\"t\">x<br /></a><!-- c --><%# m %><%-- hidden --%></view>"
    );

    let second = parse_ok(&rendered);
    assert_eq!(first, second);
}

#[test]
fn test_render_reparses_escaped_text() {
    let first = parse_ok("<view name=\"v\"><p title='say \"hi\" &amp; bye'>&lt;b&gt;x &amp; y</p></view>");
    let rendered = only_view(&first).to_string();
    assert_eq!(
        rendered,
        "<view name=\"v\"><p title=\"say &quot;hi&quot; &amp; bye\">&lt;b>x &amp; y</p></view>"
    );

    let p = only_view(&first).first_child().unwrap();
    assert_eq!(p.first_child().and_then(|n| n.text()), Some("<b>x & y"));

    let second = parse_ok(&rendered);
    assert_eq!(first, second);
}

#[test]
fn test_equality_ignores_positions() {
    let a = parse_ok("<view name=\"v\"><p class=\"x\">t</p></view>");
    let b = parse_ok("<view   name = \"v\"><p\n  class='x'>t</p></view>");
    assert_eq!(a, b);

    let c = parse_ok("<view name=\"v\"><p class=\"y\">t</p></view>");
    assert_ne!(a, c);
}

#[test]
fn test_entities_in_attributes() {
    let ast = parse_ok("<view name=\"v\"><a title=\"&lt;x&gt; &amp; y\">z</a></view>");
    let a = only_view(&ast).first_child().unwrap();
    assert_eq!(a.attribute("title").and_then(|attr| attr.value.clone()), Some(Value::literal("<x> & y")));
}

#[test]
fn test_view_element_kind() {
    let ast = parse_ok("<VIEW NAME=\"Upper\">x</VIEW>");
    let view = only_view(&ast);
    assert_eq!(
        view.element_kind(),
        Some(&ElementKind::View { name: Some("Upper".into()), client_only: false, server_only: false })
    );
}

#[test]
fn test_missing_view_name() {
    let err = parse_err("<view>x</view>");
    assert_eq!(err.kind, ErrorKind::MissingViewName);
    assert_eq!(err.message, "View is missing name attribute");
    assert!(err.node.is_some());

    assert_eq!(parse_err("<view name=\"\"></view>").kind, ErrorKind::MissingViewName);
}

#[test]
fn test_content_outside_view() {
    let err = parse_err("<view name=\"v\"></view>\n<p>stray</p>");
    assert_eq!(err.kind, ErrorKind::ContentOutsideView);
    assert_eq!(err.message, "Content must sit within a named view.");
    assert_eq!(err.position.line, 1);
}

#[test]
fn test_invalid_command_attribute() {
    let source = "<view name=\"v\">\n<for items=\"a\"></for></view>";
    let err = parse_err(source);
    assert_eq!(err.kind, ErrorKind::InvalidAttribute);
    assert_eq!(err.message, "Invalid attribute on FOR command: items");
    assert_eq!((err.position.line, err.position.col), (1, 5));
    assert!(err.render(source, "bad.duel").contains("bad.duel:2:6"));
}

#[test]
fn test_dynamic_part_name_rejected() {
    let err = parse_err("<view name=\"v\"><call view=\"X\"><part name=\"<%= n %>\"></part></call></view>");
    assert_eq!(err.message, "PART name must be a string literal");
}

#[test]
fn test_unterminated_block() {
    let err = parse_err("<view name=\"v\">\n  <%= data.name\n</view>");
    assert_eq!(err.kind, ErrorKind::Syntax);
    assert_eq!(err.message, "Syntax error: Unterminated block");
    assert_eq!((err.position.line, err.position.col), (1, 2));
}

#[test]
fn test_empty_document_has_no_views() {
    let ast = parse_ok("  \n");
    assert!(ast.views.is_empty());
}

#[test]
fn test_unterminated_cdata_and_conditional_comment() {
    for source in [
        "<view name=\"a\"><![CDATA[ never closed</view>",
        "<view name=\"a\"><!--[note --></view>",
    ] {
        let err = parse_err(source);
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!(err.message, "Syntax error: Unterminated block");
        assert_eq!(err.position.col, 15);
    }
}

#[test]
fn test_else_inside_call_is_wrapped_in_xor() {
    let ast = parse_ok("<view name=\"v\"><call view=\"X\"><else if=\"c\">y</else><else>n</else></call></view>");
    let call = only_view(&ast).first_child().unwrap();
    let part = call.first_child().unwrap();
    assert_eq!(part.part_name(), Some(""));
    assert_eq!(part.child_count(), 1);

    let xor = part.first_child().unwrap();
    assert_eq!(xor.command(), Some(CommandKind::Xor));
    let cases: Vec<_> = xor.children().collect();
    assert_eq!(cases.len(), 2);
    assert_eq!(test_value(cases[0]), Some(Value::expression("c")));
    assert_eq!(cases[1].first_child().and_then(|n| n.text()), Some("n"));
}
