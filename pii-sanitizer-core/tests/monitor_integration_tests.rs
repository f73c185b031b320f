// pii-sanitizer-core/tests/monitor_integration_tests.rs
use std::time::Duration;

use pii_sanitizer_core::dom::{CaretScope, ElementDescriptor, ElementTag, ParagraphNode};
use pii_sanitizer_core::editor::adapter::TRAILING_BREAK_CLASS;
use pii_sanitizer_core::memory::Content;
use pii_sanitizer_core::monitor::JUST_PASTED_KEY;
use pii_sanitizer_core::scheduler::TimerId;
use pii_sanitizer_core::{
    ContentMonitor, EditableElement, MemoryPage, MonitorConfig, MutationRecord, SanitizationRule,
    Scheduler, SettingsChange, SettingsSnapshot, Task, VirtualClock, Website,
};

type Monitor = ContentMonitor<MemoryPage, VirtualClock>;

fn allow_list() -> Vec<Website> {
    ["chatgpt.com", "claude.ai"]
        .iter()
        .map(|host| Website { hostname: host.to_string(), enabled: true })
        .collect()
}

fn rules() -> Vec<SanitizationRule> {
    vec![
        SanitizationRule::regex("ssn", r"\b\d{3}-\d{2}-\d{4}\b", "XXX-XX-XXXX"),
        SanitizationRule::literal("asd", "asd", "WEEEeeeEEEE"),
    ]
}

fn monitor_on(page: &MemoryPage) -> Monitor {
    let settings = SettingsSnapshot { rules: rules(), allow_list: allow_list(), paused: false };
    ContentMonitor::new(page.clone(), VirtualClock::new(), settings, MonitorConfig::default())
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn is_monitored(element: &impl EditableElement) -> bool {
    element.has_class("pii-monitored")
}

#[test_log::test]
fn test_start_on_allow_listed_page_marks_existing_surfaces() {
    let page = MemoryPage::new("chatgpt.com");
    let input = page.add_text_input();
    let editor = page.add_prompt_editor();
    let mut monitor = monitor_on(&page);

    assert!(monitor.start());
    assert!(is_monitored(&input));
    assert!(is_monitored(&editor));
    assert_eq!(input.listener_attachments(), 1);
    assert!(page.is_observing());
    assert_eq!(page.styles().len(), 1);
    assert!(page.styles()[0].contains(".pii-monitored"));
    assert!(monitor.scheduler().is_scheduled(Task::PeriodicRescan));
}

#[test]
fn test_page_outside_allow_list_stays_untouched() {
    let page = MemoryPage::new("example.org");
    let input = page.add_text_input();
    let mut monitor = monitor_on(&page);

    assert!(!monitor.start());
    assert!(!is_monitored(&input));
    assert!(page.styles().is_empty());
    assert!(!page.is_observing());
    assert_eq!(monitor.scheduler().pending(), 0);
    assert!(!monitor.on_qualifying_change(&[MutationRecord::ChildList { added: 1 }]));
}

#[test]
fn test_allow_list_refresh_activates_monitoring() {
    let page = MemoryPage::new("example.org");
    let input = page.add_text_input();
    let mut monitor = monitor_on(&page);
    assert!(!monitor.start());

    let mut sites = allow_list();
    sites.push(Website { hostname: "example.org".into(), enabled: true });
    monitor.refresh(SettingsChange { allow_list: Some(sites), ..Default::default() });

    assert!(monitor.is_active());
    assert!(is_monitored(&input));
}

#[test]
fn test_rescan_sets_up_each_surface_once() {
    let page = MemoryPage::new("claude.ai");
    let input = page.add_text_input();
    let mut monitor = monitor_on(&page);
    monitor.start();

    for _ in 0..3 {
        assert!(monitor.on_qualifying_change(&[MutationRecord::ChildList { added: 1 }]));
        monitor.advance(ms(100));
    }
    assert_eq!(input.listener_attachments(), 1);
    assert!(input.listeners_attached());
}

#[test_log::test]
fn test_burst_of_changes_collapses_into_one_trailing_rescan() {
    let page = MemoryPage::new("claude.ai");
    let mut monitor = monitor_on(&page);
    monitor.start();

    let late = page.add_textarea();
    for _ in 0..3 {
        monitor.on_qualifying_change(&[MutationRecord::ChildList { added: 1 }]);
        monitor.advance(ms(60));
    }
    // Periodic fallback plus exactly one debounced rescan.
    assert_eq!(monitor.scheduler().pending(), 2);
    assert!(monitor.discovery().has_pending_rescan());
    assert!(!is_monitored(&late));

    // 100 ms after the last change.
    monitor.advance(ms(40));
    assert!(is_monitored(&late));
    assert!(!monitor.discovery().has_pending_rescan());
}

#[test]
fn test_periodic_fallback_finds_unannounced_surfaces() {
    let page = MemoryPage::new("claude.ai");
    let mut monitor = monitor_on(&page);
    monitor.start();

    let silent = page.add_text_input();
    monitor.advance(ms(2000));
    assert!(!is_monitored(&silent));
    monitor.advance(ms(100));
    assert!(is_monitored(&silent));
}

#[test]
fn test_only_relevant_attribute_changes_qualify() {
    let page = MemoryPage::new("claude.ai");
    let mut monitor = monitor_on(&page);
    monitor.start();

    let div = page.insert(ElementDescriptor::new(ElementTag::Div), Content::Text(String::new()));
    let change = |attribute: &str| MutationRecord::Attributes {
        target: div.clone(),
        attribute: attribute.to_string(),
    };

    assert!(!monitor.on_qualifying_change(&[change("contenteditable")]));
    assert!(!monitor.on_qualifying_change(&[MutationRecord::ChildList { added: 0 }]));

    div.set_attribute("contenteditable", "true");
    assert!(!monitor.on_qualifying_change(&[change("title")]));
    assert!(monitor.on_qualifying_change(&[change("contenteditable")]));
    monitor.advance(ms(100));
    assert!(is_monitored(&div));
}

#[test]
fn test_removed_surface_is_forgotten() {
    let page = MemoryPage::new("claude.ai");
    let input = page.add_text_input();
    let mut monitor = monitor_on(&page);
    monitor.start();

    page.remove(input.surface_id());
    monitor.on_qualifying_change(&[MutationRecord::ChildList { added: 1 }]);
    monitor.advance(ms(100));
    assert_eq!(input.listener_attachments(), 1);
}

#[test_log::test]
fn test_input_on_field_rewrites_and_anchors_caret() {
    let page = MemoryPage::new("claude.ai");
    let input = page.add_text_input();
    let mut monitor = monitor_on(&page);
    monitor.start();
    input.probe_guard(monitor.state().programmatic_update_flag());

    input.type_value("xasdy", 4);
    assert!(monitor.on_input(&input));
    assert_eq!(input.field_value().as_deref(), Some("xWEEEeeeEEEEy"));
    assert_eq!(input.selection(), Some((12, 12)));
    // The write happened with the guard raised, and the guard is gone now.
    assert_eq!(input.writes(), vec![true]);
    assert!(!monitor.state().is_programmatic_update());
}

#[test]
fn test_field_offsets_count_characters_not_utf16_units() {
    let page = MemoryPage::new("claude.ai");
    let input = page.add_text_input();
    let mut monitor = monitor_on(&page);
    monitor.start();

    // The emoji is two UTF-16 units but one character.
    input.type_value("\u{1F600}asdy", 4);
    assert!(monitor.on_input(&input));
    assert_eq!(input.field_value().as_deref(), Some("\u{1F600}WEEEeeeEEEEy"));
    assert_eq!(input.selection(), Some((12, 12)));
}

#[test]
fn test_input_without_match_leaves_field_alone() {
    let page = MemoryPage::new("claude.ai");
    let input = page.add_textarea();
    let mut monitor = monitor_on(&page);
    monitor.start();
    input.probe_guard(monitor.state().programmatic_update_flag());

    input.type_value("nothing to see", 3);
    assert!(!monitor.on_input(&input));
    assert_eq!(input.selection(), Some((3, 3)));
    assert!(input.writes().is_empty());
}

#[test]
fn test_input_on_prompt_editor_renders_paragraphs() {
    let page = MemoryPage::new("chatgpt.com");
    let editor = page.add_prompt_editor();
    let mut monitor = monitor_on(&page);
    monitor.start();

    editor.set_paragraphs(&["call 123-45-6789", "", "bye\u{200B}"]);
    assert!(monitor.on_input(&editor));
    assert_eq!(
        editor.content(),
        Content::Paragraphs(vec![
            ParagraphNode::Text("call XXX-XX-XXXX".into()),
            ParagraphNode::LineBreak { class: Some(TRAILING_BREAK_CLASS.into()) },
            ParagraphNode::Text("bye".into()),
        ])
    );
    assert_eq!(editor.collapsed_to(), Some(CaretScope::LastBlock));
}

#[test]
fn test_input_on_composer_uses_plain_breaks() {
    let page = MemoryPage::new("claude.ai");
    let editor = page.add_composer();
    let mut monitor = monitor_on(&page);
    monitor.start();

    editor.set_paragraphs(&["asd", ""]);
    assert!(monitor.on_input(&editor));
    assert_eq!(
        editor.content(),
        Content::Paragraphs(vec![
            ParagraphNode::Text("WEEEeeeEEEE".into()),
            ParagraphNode::LineBreak { class: None },
        ])
    );
}

#[test]
fn test_input_on_generic_region_places_caret_in_text() {
    let page = MemoryPage::new("claude.ai");
    let region = page.add_editable_div();
    let mut monitor = monitor_on(&page);
    monitor.start();

    region.set_text("xasdy", Some(4));
    assert!(monitor.on_input(&region));
    assert_eq!(region.content(), Content::Text("xWEEEeeeEEEEy".into()));
    assert_eq!(region.caret(), Some(12));
    assert_eq!(region.collapsed_to(), None);
}

#[test]
fn test_caret_failure_falls_back_to_end() {
    let page = MemoryPage::new("claude.ai");
    let region = page.add_editable_div();
    let mut monitor = monitor_on(&page);
    monitor.start();

    region.fail_caret_placement(true);
    region.set_text("asd and more", Some(3));
    assert!(monitor.on_input(&region));
    assert_eq!(region.content(), Content::Text("WEEEeeeEEEE and more".into()));
    assert_eq!(region.collapsed_to(), Some(CaretScope::Whole));
    assert!(!monitor.state().is_programmatic_update());
}

#[test]
fn test_paused_engine_ignores_input_and_paste() {
    let page = MemoryPage::new("claude.ai");
    let input = page.add_text_input();
    let editor = page.add_composer();
    let mut monitor = monitor_on(&page);
    monitor.start();
    monitor.refresh(SettingsChange { paused: Some(true), ..Default::default() });

    input.type_value("asd", 3);
    assert!(!monitor.on_input(&input));
    assert_eq!(input.field_value().as_deref(), Some("asd"));

    monitor.on_paste(&editor);
    assert_eq!(editor.data(JUST_PASTED_KEY), None);
    assert!(!monitor.scheduler().is_scheduled(Task::DeferredPaste(editor.surface_id())));
}

#[test]
fn test_events_during_programmatic_update_are_ignored() {
    let page = MemoryPage::new("claude.ai");
    let input = page.add_text_input();
    let mut monitor = monitor_on(&page);
    monitor.start();

    input.type_value("asd", 3);
    let flag = monitor.state().programmatic_update_flag();
    flag.set(true);
    assert!(!monitor.on_input(&input));
    flag.set(false);
    assert!(monitor.on_input(&input));
}

#[test]
fn test_hidden_keyboard_proxy_is_never_rewritten() {
    let page = MemoryPage::new("chatgpt.com");
    let proxy = page.insert(
        ElementDescriptor::new(ElementTag::TextArea)
            .hidden()
            .with_attribute("data-virtualkeyboard", "true"),
        Content::Field(String::new()),
    );
    let mut monitor = monitor_on(&page);
    monitor.start();

    assert!(!is_monitored(&proxy));
    proxy.type_value("asd", 3);
    assert!(!monitor.on_input(&proxy));
    assert_eq!(proxy.field_value().as_deref(), Some("asd"));
}

#[test_log::test]
fn test_paste_into_paragraph_editor_is_deferred_one_turn() {
    let page = MemoryPage::new("chatgpt.com");
    let editor = page.add_prompt_editor();
    let mut monitor = monitor_on(&page);
    monitor.start();

    monitor.on_paste(&editor);
    assert_eq!(editor.data(JUST_PASTED_KEY).as_deref(), Some("true"));
    assert!(monitor.scheduler().is_scheduled(Task::DeferredPaste(editor.surface_id())));

    // The host editor materialises the pasted lines after the event.
    editor.set_paragraphs(&["ssn 123-45-6789", "asd"]);
    monitor.advance(Duration::ZERO);

    assert_eq!(
        editor.content(),
        Content::Paragraphs(vec![
            ParagraphNode::Text("ssn XXX-XX-XXXX".into()),
            ParagraphNode::Text("WEEEeeeEEEE".into()),
        ])
    );
    assert_eq!(editor.collapsed_to(), Some(CaretScope::LastBlock));
    assert_eq!(editor.data(JUST_PASTED_KEY), None);
}

#[test]
fn test_paste_into_field_moves_caret_to_end() {
    let page = MemoryPage::new("claude.ai");
    let input = page.add_text_input();
    let mut monitor = monitor_on(&page);
    monitor.start();

    monitor.on_paste(&input);
    assert!(!monitor.scheduler().is_scheduled(Task::DeferredPaste(input.surface_id())));

    input.type_value("asd tail", 3);
    assert!(monitor.on_input(&input));
    assert_eq!(input.field_value().as_deref(), Some("WEEEeeeEEEE tail"));
    assert_eq!(input.selection(), Some((16, 16)));
    assert_eq!(input.data(JUST_PASTED_KEY), None);
}

#[test]
fn test_deferred_paste_for_removed_surface_is_dropped() {
    let page = MemoryPage::new("chatgpt.com");
    let editor = page.add_prompt_editor();
    let mut monitor = monitor_on(&page);
    monitor.start();

    monitor.on_paste(&editor);
    page.remove(editor.surface_id());
    monitor.advance(Duration::ZERO);
    assert!(!monitor.scheduler().is_scheduled(Task::DeferredPaste(editor.surface_id())));
}

#[test]
fn test_rule_refresh_applies_to_next_input() {
    let page = MemoryPage::new("claude.ai");
    let input = page.add_text_input();
    let mut monitor = monitor_on(&page);
    monitor.start();

    monitor.refresh(SettingsChange {
        rules: Some(vec![SanitizationRule::literal("secret", "hunter2", "*******")]),
        ..Default::default()
    });
    input.type_value("pw hunter2 asd", 14);
    assert!(monitor.on_input(&input));
    assert_eq!(input.field_value().as_deref(), Some("pw ******* asd"));
}

#[test]
fn test_custom_scheduler_receives_discovery_timers() {
    #[derive(Default)]
    struct Recorder {
        scheduled: Vec<(Duration, Task)>,
        repeating: Vec<(Duration, Task)>,
        cancelled: usize,
    }

    impl Scheduler for Recorder {
        fn schedule(&mut self, delay: Duration, task: Task) -> TimerId {
            self.scheduled.push((delay, task));
            TimerId(self.scheduled.len() as u64)
        }

        fn schedule_repeating(&mut self, period: Duration, task: Task) -> TimerId {
            self.repeating.push((period, task));
            TimerId(1000)
        }

        fn cancel(&mut self, _id: TimerId) {
            self.cancelled += 1;
        }
    }

    let page = MemoryPage::new("claude.ai");
    let settings = SettingsSnapshot { rules: rules(), allow_list: allow_list(), paused: false };
    let mut monitor = ContentMonitor::new(page, Recorder::default(), settings, MonitorConfig::default());
    monitor.start();
    monitor.on_qualifying_change(&[MutationRecord::ChildList { added: 2 }]);
    monitor.on_qualifying_change(&[MutationRecord::ChildList { added: 1 }]);

    let recorder = monitor.scheduler();
    assert_eq!(recorder.repeating, vec![(ms(2000), Task::PeriodicRescan)]);
    assert_eq!(recorder.scheduled, vec![(ms(100), Task::Rescan), (ms(100), Task::Rescan)]);
    assert_eq!(recorder.cancelled, 1);
}
