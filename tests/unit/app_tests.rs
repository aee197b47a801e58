use super::*;
use crate::auto_scroll::DEFAULT_STREAM_DEBOUNCE;
use crate::feed::parse_feed_line;
use crate::messages::MessageEvent;
use crate::step_tree::StepStatus;
use std::time::Duration;

fn feed(app: &mut App, now: Instant, lines: &[&str]) {
    for line in lines {
        let event = parse_feed_line(line)
            .expect("feed line should parse")
            .expect("feed line should not be blank");
        app.apply_feed_event(event, now);
    }
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        app.input_char(c);
    }
}

#[test]
fn default_state_is_running_and_empty() {
    let app = App::default();
    assert!(app.running);
    assert!(app.steps().is_empty());
    assert!(app.messages().is_empty());
    assert_eq!(app.progress_summary().display_percent(), 0);
    assert_eq!(app.follow_state(), FollowState::Following);
    assert_eq!(app.feed_status(), FeedStatus::Waiting);
}

#[test]
fn step_announcements_and_updates_drive_progress() {
    let mut app = App::default();
    let now = Instant::now();
    feed(
        &mut app,
        now,
        &[
            r#"{"type":"step","step_id":"a","name":"Gather"}"#,
            r#"{"type":"step","step_id":"b","name":"Draft"}"#,
            r#"{"type":"step","step_id":"b1","parent_id":"b","name":"Intro","status":"running"}"#,
            r#"{"type":"step","step_id":"a","status":"done"}"#,
        ],
    );
    assert_eq!(app.feed_status(), FeedStatus::Live);
    assert_eq!(app.steps().len(), 3);
    assert_eq!(app.progress_summary().display_percent(), 50);
    assert_eq!(
        app.steps().find("b1").map(|step| step.status),
        Some(StepStatus::Running)
    );

    feed(&mut app, now, &[r#"{"type":"progress","percentage":80}"#]);
    let summary = app.progress_summary();
    assert_eq!(summary.display_percent(), 80);
    assert!(summary.authoritative);
}

#[test]
fn update_without_name_for_unknown_step_is_ignored() {
    let mut app = App::default();
    let outcome = app.apply_step_event(StepEvent {
        step_id: "ghost".to_string(),
        parent_id: None,
        name: None,
        status: Some(StepStatus::Running),
        percentage: None,
        start_time: None,
        end_time: None,
    });
    assert_eq!(outcome, UpdateOutcome::NotFound);
    assert!(app.steps().is_empty());
}

#[test]
fn new_turn_replaces_step_tree_and_shows_executing_indicator() {
    let mut app = App::default();
    let now = Instant::now();
    feed(
        &mut app,
        now,
        &[
            r#"{"type":"step","step_id":"old","name":"Old"}"#,
            r#"{"type":"progress","percentage":40}"#,
            r#"{"type":"turn_started","turn_id":"t2","agent_tag":"writer"}"#,
        ],
    );
    assert!(app.steps().is_empty());
    assert!(!app.progress_summary().authoritative);
    assert_eq!(app.executing_turns().len(), 1);

    feed(&mut app, now, &[r#"{"type":"turn_finished","turn_id":"t2"}"#]);
    assert!(app.executing_turns().is_empty());
}

#[test]
fn streaming_growth_scrolls_smoothly_to_bottom_while_following() {
    let mut app = App::default();
    let start = Instant::now();
    app.set_chat_viewport(12, 5);
    app.apply_feed_event(
        FeedEvent::Message(MessageEvent::delta("m1", Role::Assistant, "hello")),
        start,
    );
    app.on_tick(start);
    assert_eq!(app.chat_scroll(), 0);

    let mut now = start + DEFAULT_STREAM_DEBOUNCE;
    for _ in 0..20 {
        app.on_tick(now);
        now += Duration::from_millis(16);
    }
    assert_eq!(app.chat_scroll(), 12);
}

#[test]
fn scrolling_away_pins_view_and_growth_no_longer_moves_it() {
    let mut app = App::default();
    let now = Instant::now();
    app.set_chat_viewport(20, 5);
    app.scroll_chat_down();
    assert_eq!(app.chat_scroll(), 1);
    assert_eq!(app.follow_state(), FollowState::PinnedByUser);

    app.apply_feed_event(
        FeedEvent::Message(MessageEvent::finished("m1", Role::Assistant, "done")),
        now,
    );
    app.on_tick(now + Duration::from_secs(1));
    assert_eq!(app.chat_scroll(), 1);

    app.page_chat_down();
    app.page_chat_down();
    app.page_chat_down();
    app.page_chat_down();
    assert_eq!(app.chat_scroll(), 20);
    assert_eq!(app.follow_state(), FollowState::Following);
}

#[test]
fn jump_to_bottom_resumes_following_after_debounce() {
    let mut app = App::default();
    let now = Instant::now();
    app.set_chat_viewport(30, 5);
    app.scroll_chat_down();
    assert_eq!(app.follow_state(), FollowState::PinnedByUser);

    app.jump_to_bottom(now);
    assert_eq!(app.follow_state(), FollowState::Following);
    app.on_tick(now + DEFAULT_STREAM_DEBOUNCE);
    assert_eq!(app.chat_scroll(), 30);
}

#[test]
fn slash_after_text_opens_panel_and_tab_inserts_workflow() {
    let mut app = App::default();
    type_text(&mut app, "please /");
    assert!(app.should_show_command_panel());
    assert_eq!(app.command_suggestions().len(), default_catalog().len());

    assert!(app.complete_command());
    assert_eq!(app.chat_input(), "please /combine-thesis ");
    assert!(!app.should_show_command_panel());
    assert_eq!(app.chat_cursor_line_col(200), (0, 23));
}

#[test]
fn plain_text_never_opens_panel() {
    let mut app = App::default();
    type_text(&mut app, "hello");
    assert!(!app.should_show_command_panel());
    assert!(!app.complete_command());
}

#[test]
fn escape_dismisses_panel_until_next_slash() {
    let mut app = App::default();
    type_text(&mut app, "/");
    app.dismiss_command_panel();
    assert!(!app.should_show_command_panel());
    type_text(&mut app, "c");
    assert!(!app.should_show_command_panel());
    app.backspace_input();
    app.backspace_input();
    type_text(&mut app, "/");
    assert!(app.should_show_command_panel());
}

#[test]
fn arrows_move_highlight_while_panel_is_open() {
    let mut app = App::default();
    type_text(&mut app, "/");
    app.move_down(40);
    app.move_down(40);
    assert_eq!(app.highlighted_command(), 2);
    app.move_up(40);
    assert_eq!(app.highlighted_command(), 1);
    assert!(app.complete_command());
    assert_eq!(app.chat_input(), "/literature-review ");
}

#[test]
fn clicking_a_suggestion_selects_it() {
    let mut app = App::default();
    type_text(&mut app, "run /d");
    assert!(app.select_command(0));
    assert_eq!(app.chat_input(), "run /draft-outline ");
    assert!(!app.select_command(0));
}

#[test]
fn enter_completes_partial_workflow_before_sending() {
    let mut app = App::default();
    let now = Instant::now();
    type_text(&mut app, "/comb");
    assert_eq!(app.submit(now), None);
    assert_eq!(app.chat_input(), "/combine-thesis ");

    type_text(&mut app, "chapters");
    let intent = app.submit(now).expect("complete command should send");
    assert_eq!(intent.text, "/combine-thesis chapters");
}

#[test]
fn submit_emits_intent_with_attachments_and_local_message() {
    let mut app = App::default();
    let now = Instant::now();
    type_text(&mut app, "  summarize @notes/ch1.md and @refs.bib  ");
    let intent = app.submit(now).expect("non-empty input should send");
    assert_eq!(intent.text, "summarize @notes/ch1.md and @refs.bib");
    assert_eq!(
        intent.attached_files,
        vec![PathBuf::from("notes/ch1.md"), PathBuf::from("refs.bib")]
    );
    assert_eq!(app.chat_input(), "");
    assert_eq!(app.messages().len(), 1);
    assert_eq!(app.messages().messages()[0].role, Role::User);
    assert_eq!(app.executing_turns().len(), 1);

    feed(&mut app, now, &[r#"{"type":"turn_started","turn_id":"t1"}"#]);
    let turns = app.executing_turns();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].turn_id, "t1");
}

#[test]
fn submit_ignores_whitespace_only_input() {
    let mut app = App::default();
    type_text(&mut app, "   ");
    assert_eq!(app.submit(Instant::now()), None);
    assert!(app.messages().is_empty());
}

#[test]
fn sending_while_a_turn_streams_keeps_both_indicators() {
    let mut app = App::default();
    let now = Instant::now();
    feed(
        &mut app,
        now,
        &[
            r#"{"type":"turn_started","turn_id":"t1"}"#,
            r#"{"type":"message","message_id":"m1","role":"assistant","content_delta":"work","is_streaming":true}"#,
        ],
    );
    type_text(&mut app, "another question");
    assert!(app.submit(now).is_some());
    assert_eq!(app.executing_turns().len(), 2);
    assert!(app.messages().get("m1").is_some_and(|m| m.is_streaming));
}

#[test]
fn quit_tears_down_auto_scroll() {
    let mut app = App::default();
    let now = Instant::now();
    app.set_chat_viewport(10, 5);
    app.apply_feed_event(
        FeedEvent::Message(MessageEvent::delta("m1", Role::Assistant, "x")),
        now,
    );
    app.quit();
    assert!(!app.running);
    app.on_tick(now + Duration::from_secs(1));
    assert_eq!(app.chat_scroll(), 0);
}

#[test]
fn feed_end_is_reported() {
    let mut app = App::default();
    app.apply_feed_item(FeedItem::Ended { lines: 4, skipped: 1 }, Instant::now());
    assert_eq!(app.feed_status(), FeedStatus::Ended { lines: 4, skipped: 1 });
}

#[test]
fn inserts_and_deletes_at_cursor_position() {
    let mut app = App::default();
    type_text(&mut app, "ac");
    app.move_cursor_left();
    app.input_char('b');
    assert_eq!(app.chat_input(), "abc");
    app.move_cursor_home();
    app.delete_input();
    assert_eq!(app.chat_input(), "bc");
    app.move_cursor_end();
    app.backspace_input();
    assert_eq!(app.chat_input(), "b");
}

#[test]
fn cursor_moves_up_and_down_over_wrapped_lines() {
    let mut app = App::default();
    type_text(&mut app, "abcd efgh ijkl");
    assert_eq!(app.chat_cursor_line_col(5), (2, 4));
    app.move_up(5);
    assert_eq!(app.chat_cursor_line_col(5), (1, 4));
    app.move_down(5);
    assert_eq!(app.chat_cursor_line_col(5), (2, 4));
}

#[test]
fn snapshot_serializes_current_state() {
    let mut app = App::default();
    let now = Instant::now();
    feed(
        &mut app,
        now,
        &[
            r#"{"type":"step","step_id":"a","name":"Gather","status":"running"}"#,
            r#"{"type":"message","message_id":"m1","role":"assistant","content_final":"hi","is_streaming":false}"#,
        ],
    );
    let value = serde_json::to_value(app.snapshot()).expect("snapshot serializes");
    assert_eq!(value["current_step"], "a");
    assert_eq!(value["steps"][0]["status"], "running");
    assert_eq!(value["messages"][0]["content"], "hi");
    assert_eq!(value["follow_state"], "following");
    assert_eq!(value["progress"]["counts"]["running"], 1);
}

#[test]
fn notices_render_as_system_messages_and_follow() {
    let mut app = App::default();
    let now = Instant::now();
    app.set_chat_viewport(8, 5);
    app.push_notice("outbox unavailable", now);
    let last = app.messages().messages().last().expect("notice appended");
    assert_eq!(last.role, Role::System);
    assert_eq!(last.content, "outbox unavailable");
    app.on_tick(now);
    assert!(app.chat_scroll() > 0);
}

#[test]
fn feed_events_report_whether_a_redraw_is_needed() {
    let mut app = App::default();
    let now = Instant::now();
    let apply = |app: &mut App, line: &str| {
        let event = parse_feed_line(line)
            .expect("feed line should parse")
            .expect("feed line should not be blank");
        app.apply_feed_event(event, now)
    };
    assert!(apply(&mut app, r#"{"type":"step","step_id":"a","name":"Plan"}"#));
    assert!(apply(&mut app, r#"{"type":"step","step_id":"a","status":"running"}"#));
    assert!(!apply(&mut app, r#"{"type":"step","step_id":"a","status":"running"}"#));
    assert!(!apply(&mut app, r#"{"type":"step","step_id":"ghost","status":"completed"}"#));
    assert!(apply(&mut app, r#"{"type":"progress","percentage":20}"#));
    assert!(!apply(&mut app, r#"{"type":"progress","percentage":20}"#));
    assert!(!apply(&mut app, r#"{"type":"turn_finished","turn_id":"never"}"#));
}

#[test]
fn paging_up_during_a_stream_pins_the_view() {
    let mut app = App::default();
    let start = Instant::now();
    app.set_chat_viewport(100, 20);
    app.jump_to_bottom(start);
    app.on_tick(start + DEFAULT_STREAM_DEBOUNCE);
    assert_eq!(app.chat_scroll(), 100);

    let mut now = start + DEFAULT_STREAM_DEBOUNCE;
    app.apply_feed_event(
        FeedEvent::Message(MessageEvent::delta("m1", Role::Assistant, "token")),
        now,
    );
    now += DEFAULT_STREAM_DEBOUNCE;
    app.on_tick(now);

    app.page_chat_up();
    assert_eq!(app.chat_scroll(), 80);
    assert_eq!(app.follow_state(), FollowState::PinnedByUser);

    for _ in 0..10 {
        now += Duration::from_millis(20);
        app.apply_feed_event(
            FeedEvent::Message(MessageEvent::delta("m1", Role::Assistant, " more")),
            now,
        );
        app.on_tick(now);
    }
    assert_eq!(app.chat_scroll(), 80);
    assert_eq!(app.follow_state(), FollowState::PinnedByUser);
    assert!(!app.snapshot().scroll.auto_follow);
}
