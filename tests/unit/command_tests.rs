use super::*;
use crate::catalog::default_catalog;

fn parser() -> CommandParser {
    CommandParser::new(default_catalog())
}

fn tokens(parser: &CommandParser) -> Vec<&str> {
    parser
        .suggestions()
        .into_iter()
        .map(|entry| entry.token.as_str())
        .collect()
}

#[test]
fn bare_slash_shows_whole_catalog() {
    let mut parser = parser();
    parser.evaluate("/", 1);
    assert!(parser.is_visible());
    assert_eq!(parser.suggestions().len(), default_catalog().len());
}

#[test]
fn plain_text_hides_panel() {
    let mut parser = parser();
    parser.evaluate("hello", 5);
    assert!(!parser.is_visible());
    assert!(parser.suggestions().is_empty());
}

#[test]
fn slash_after_text_selects_into_place() {
    let mut parser = parser();
    parser.evaluate("please /", 8);
    assert!(parser.is_visible());

    let selection = parser
        .select("please /", "combine-thesis")
        .expect("slash query should be active");
    assert_eq!(selection.buffer, "please /combine-thesis ");
    assert_eq!(selection.caret, selection.buffer.len());
    assert!(!parser.is_visible());
}

#[test]
fn typed_prefix_filters_case_insensitively() {
    let mut parser = parser();
    parser.evaluate("/Su", 3);
    assert_eq!(tokens(&parser), vec!["summarize-paper"]);

    parser.evaluate("/zzz", 4);
    assert!(parser.suggestions().is_empty());
    assert!(!parser.is_visible());
}

#[test]
fn leading_slash_command_stays_active_with_caret_in_arguments() {
    let mut parser = parser();
    parser.evaluate("/draft my notes", 15);
    let active = parser.active_query().expect("leading slash should trigger");
    assert_eq!(active.query, "draft");
    assert_eq!(tokens(&parser), vec!["draft-outline"]);

    let selection = parser
        .select("/draft my notes", "draft-outline")
        .expect("select should apply");
    assert_eq!(selection.buffer, "/draft-outline my notes");
}

#[test]
fn select_preserves_text_after_caret() {
    let mut parser = parser();
    let buffer = "run /lit then report";
    parser.evaluate(buffer, 8);
    let selection = parser
        .select_highlighted(buffer)
        .expect("literature-review should be highlighted");
    assert_eq!(selection.buffer, "run /literature-review then report");
    assert_eq!(selection.caret, "run /literature-review ".len());
}

#[test]
fn dismiss_hides_until_a_new_slash_is_typed() {
    let mut parser = parser();
    parser.evaluate("/", 1);
    parser.dismiss();
    assert!(!parser.is_visible());

    parser.evaluate("/c", 2);
    assert!(!parser.is_visible());

    parser.evaluate("/c and /", 8);
    assert!(parser.is_visible());

    parser.evaluate("", 0);
    parser.evaluate("/", 1);
    assert!(parser.is_visible());
}

#[test]
fn highlight_moves_within_bounds_and_resets_on_new_query() {
    let mut parser = parser();
    parser.evaluate("/", 1);
    parser.move_highlight_up();
    assert_eq!(parser.highlighted(), 0);
    for _ in 0..20 {
        parser.move_highlight_down();
    }
    assert_eq!(parser.highlighted(), default_catalog().len() - 1);

    parser.evaluate("/c", 2);
    assert_eq!(parser.highlighted(), 0);
    parser.move_highlight_down();
    assert_eq!(
        parser.highlighted_suggestion().map(|entry| entry.token.as_str()),
        Some("check-citations")
    );
}

#[test]
fn slash_right_before_caret_triggers_even_inside_a_word() {
    let mut parser = parser();
    parser.evaluate("hello/", 6);
    assert!(parser.is_visible());
    assert_eq!(parser.suggestions().len(), default_catalog().len());

    let selection = parser
        .select("hello/", "draft-outline")
        .expect("slash before caret should be active");
    assert_eq!(selection.buffer, "hello/draft-outline ");
    assert_eq!(selection.caret, selection.buffer.len());
}

#[test]
fn slash_earlier_in_a_word_does_not_trigger() {
    assert_eq!(find_slash_query("and/or", 6), None);
    assert_eq!(find_slash_query("see http://x", 12), None);
}

#[test]
fn caret_inside_multibyte_text_is_clamped_to_char_boundary() {
    let query = find_slash_query("é /", 1).map(|q| q.query);
    assert_eq!(query, None);
    let query = find_slash_query("é /su", 6).map(|q| q.query);
    assert_eq!(query.as_deref(), Some("su"));
}

#[test]
fn enter_accepts_only_incomplete_queries_under_the_caret() {
    let mut parser = parser();
    parser.evaluate("/comb", 5);
    assert!(parser.accepts_enter());

    parser.evaluate("/combine-thesis", 15);
    assert!(parser.is_visible());
    assert!(!parser.accepts_enter());

    parser.evaluate("/comb notes", 11);
    assert!(parser.is_visible());
    assert!(!parser.accepts_enter());
}

#[test]
fn caret_inside_slash_word_replaces_the_whole_word() {
    let mut parser = parser();
    parser.evaluate("/sumXX tail", 4);
    assert_eq!(parser.active_query().map(|q| q.query.as_str()), Some("sum"));
    let selection = parser
        .select("/sumXX tail", "summarize-paper")
        .expect("query active");
    assert_eq!(selection.buffer, "/summarize-paper tail");
}
