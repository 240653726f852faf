use super::*;
use crate::enhance::Action;

const TWO_PANELS: &str = r#"
<div id="wrap">
  <nav id="sidebar">...</nav>
  <nav id="other">...</nav>
  <button id="btn">Go</button>
</div>
"#;

fn toggle(page: &Page, id: &str) -> Action {
    Action::ToggleSidebar {
        sidebar: page.dom.by_id(id).unwrap(),
    }
}

#[test]
fn timers_fire_in_due_time_order() {
    let mut page = page(TWO_PANELS);
    let late = toggle(&page, "other");
    let soon = toggle(&page, "sidebar");
    page.set_timeout(late, 100);
    page.set_timeout(soon, 50);

    page.advance_time(60).unwrap();
    assert!(page.has_class("#sidebar", "show").unwrap());
    assert!(!page.has_class("#other", "show").unwrap());

    page.advance_time(40).unwrap();
    assert!(page.has_class("#other", "show").unwrap());
    assert_eq!(page.now_ms(), 100);
}

#[test]
fn equal_due_times_fire_in_scheduling_order() {
    let mut page = page(TWO_PANELS);
    let first = toggle(&page, "sidebar");
    let second = toggle(&page, "sidebar");
    page.set_timeout(first, 10);
    page.set_timeout(second, 10);

    page.set_trace_timers(true);
    page.advance_time(10).unwrap();
    let logs = page.take_trace_logs();
    assert_eq!(logs.len(), 2);
    assert!(logs[0].contains("id=1"));
    assert!(logs[1].contains("id=2"));
    // Two toggles cancel out.
    assert!(!page.has_class("#sidebar", "show").unwrap());
}

#[test]
fn intervals_repeat_until_cleared() {
    let mut page = page(TWO_PANELS);
    let action = toggle(&page, "sidebar");
    let id = page.set_interval(action, 10);

    page.advance_time(35).unwrap();
    // Fired at 10, 20, 30.
    assert!(page.has_class("#sidebar", "show").unwrap());
    assert_eq!(page.pending_timers().len(), 1);

    assert!(page.clear_timer(id));
    assert!(page.pending_timers().is_empty());
    page.advance_time(100).unwrap();
    assert!(page.has_class("#sidebar", "show").unwrap());
}

#[test]
fn step_limit_stops_runaway_intervals() {
    let mut page = page(TWO_PANELS);
    let action = toggle(&page, "sidebar");
    page.set_interval(action, 1);
    page.set_timer_step_limit(5);

    let err = page.advance_time(100).unwrap_err();
    assert!(matches!(err, Error::Timer(_)));
}

#[test]
fn flush_drains_pending_timeouts() {
    let mut page = page(TWO_PANELS);
    let action = toggle(&page, "sidebar");
    page.set_timeout(action, 250);
    page.flush().unwrap();

    assert!(page.has_class("#sidebar", "show").unwrap());
    assert_eq!(page.now_ms(), 250);
    assert!(page.pending_timers().is_empty());
}

#[test]
fn run_due_timers_fires_only_what_is_already_due() {
    let mut page = page(TWO_PANELS);
    page.set_timeout(toggle(&page, "sidebar"), 0);
    page.set_timeout(toggle(&page, "other"), 20);

    let fired = page.run_due_timers().unwrap();
    assert_eq!(fired, 1);
    assert_eq!(page.now_ms(), 0);
    assert!(page.has_class("#sidebar", "show").unwrap());
    assert!(!page.has_class("#other", "show").unwrap());
}

#[test]
fn clear_all_timers_empties_the_queue() {
    let mut page = page(TWO_PANELS);
    page.set_timeout(toggle(&page, "sidebar"), 10);
    page.set_interval(toggle(&page, "other"), 10);

    page.clear_all_timers();
    assert!(page.pending_timers().is_empty());
    page.advance_time(100).unwrap();
    assert!(!page.has_class("#sidebar", "show").unwrap());
}

#[test]
fn enable_trace_covers_events_and_timers() {
    let mut page = page(TWO_PANELS);
    page.enable_trace(true);
    page.set_timeout(toggle(&page, "sidebar"), 5);
    page.click("#btn").unwrap();
    page.advance_time(5).unwrap();

    let logs = page.take_trace_logs();
    assert!(logs.iter().any(|line| line.starts_with("[event]")));
    assert!(logs.iter().any(|line| line.starts_with("[timer]")));

    page.enable_trace(false);
    page.click("#btn").unwrap();
    assert!(page.take_trace_logs().is_empty());
}

#[test]
fn pending_timers_report_relative_due_times() {
    let mut page = page(TWO_PANELS);
    page.set_timeout(toggle(&page, "sidebar"), 40);
    page.set_timeout(toggle(&page, "other"), 15);
    page.advance_time(10).unwrap();

    let pending = page.pending_timers();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].due_in_ms, 5);
    assert_eq!(pending[1].due_in_ms, 30);
    assert_eq!(pending[0].interval_ms, None);
}

#[test]
fn bubbling_reaches_ancestor_listeners() {
    let mut page = page(TWO_PANELS);
    let wrap = page.dom.by_id("wrap").unwrap();
    let action = toggle(&page, "sidebar");
    page.add_listener(wrap, "click", false, action);

    page.click("#btn").unwrap();
    assert!(page.has_class("#sidebar", "show").unwrap());
}

#[test]
fn capture_listeners_fire_on_the_way_down() {
    let mut page = page(TWO_PANELS);
    let wrap = page.dom.by_id("wrap").unwrap();
    page.add_listener(wrap, "click", true, toggle(&page, "sidebar"));

    page.click("#btn").unwrap();
    assert!(page.has_class("#sidebar", "show").unwrap());
}

#[test]
fn capture_listener_does_not_double_fire_on_bubble() {
    let mut page = page(TWO_PANELS);
    let wrap = page.dom.by_id("wrap").unwrap();
    page.add_listener(wrap, "click", true, toggle(&page, "sidebar"));
    page.add_listener(wrap, "click", false, toggle(&page, "other"));

    page.click("#btn").unwrap();
    // Each phase ran its own listener exactly once.
    assert!(page.has_class("#sidebar", "show").unwrap());
    assert!(page.has_class("#other", "show").unwrap());
}

#[test]
fn removed_listeners_stop_firing() {
    let mut page = page(TWO_PANELS);
    let btn = page.dom.by_id("btn").unwrap();
    let id = page.add_listener(btn, "click", false, toggle(&page, "sidebar"));

    page.click("#btn").unwrap();
    assert!(page.has_class("#sidebar", "show").unwrap());

    assert!(page.remove_listener(id));
    assert!(!page.remove_listener(id));
    page.click("#btn").unwrap();
    assert!(page.has_class("#sidebar", "show").unwrap());
}

#[test]
fn focus_moves_between_elements() {
    let mut page = page(r#"
    <form>
      <input id="a" class="currency-input" value="$1.5">
      <input id="b" class="currency-input" value="$2.5">
    </form>
    "#);
    let _enhancer = Enhancer::install(&mut page).unwrap();

    page.focus("#a").unwrap();
    assert_eq!(page.value_of("#a").unwrap(), "1.5");

    // Focusing the second input blurs the first.
    page.focus("#b").unwrap();
    assert_eq!(page.value_of("#a").unwrap(), "1.50");
    assert_eq!(page.value_of("#b").unwrap(), "2.5");

    // Blurring an unfocused element is a no-op.
    page.blur("#a").unwrap();
    page.blur("#b").unwrap();
    assert_eq!(page.value_of("#b").unwrap(), "2.50");
}

#[test]
fn gestures_on_missing_selectors_report_the_selector() {
    let mut page = page(TWO_PANELS);
    let err = page.click("#missing").unwrap_err();
    assert_eq!(err, Error::SelectorNotFound("#missing".to_string()));
}

#[test]
fn typing_into_a_non_control_is_a_type_mismatch() {
    let mut page = page(TWO_PANELS);
    let err = page.type_text("#wrap", "hola").unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }));
}

#[test]
fn checkbox_click_toggles_and_fires_change() {
    let mut page = page(r#"
    <form id="f">
      <input type="checkbox" id="c" name="ok">
      <input type="radio" id="r1" name="pick" checked>
      <input type="radio" id="r2" name="pick">
    </form>
    "#);
    page.click("#c").unwrap();
    assert!(page.dom.checked(page.dom.by_id("c").unwrap()).unwrap());
    page.click("#c").unwrap();
    assert!(!page.dom.checked(page.dom.by_id("c").unwrap()).unwrap());

    page.click("#r2").unwrap();
    assert!(page.dom.checked(page.dom.by_id("r2").unwrap()).unwrap());
    assert!(!page.dom.checked(page.dom.by_id("r1").unwrap()).unwrap());
}
