use super::*;

#[test]
fn month_display_is_filled_on_install() {
    let mut page = page(r#"<div><span class="current-month">...</span></div>"#);
    page.set_clock_ms(AUG_30_2026_MS);
    let _enhancer = Enhancer::install(&mut page).unwrap();
    assert_eq!(page.text_of(".current-month").unwrap(), "Agosto 2026");
}

#[test]
fn month_display_refreshes_on_the_hourly_interval() {
    let mut page = page(r#"<div><span class="current-month"></span></div>"#);
    page.set_clock_ms(AUG_30_2026_MS);
    let _enhancer = Enhancer::install(&mut page).unwrap();

    // Jump the wall clock past the month boundary; the next interval tick
    // recomputes the label from the new time.
    page.set_clock_ms(AUG_30_2026_MS + 3 * 86_400_000);
    assert_eq!(page.text_of(".current-month").unwrap(), "Agosto 2026");
    page.advance_time(0).unwrap();
    assert_eq!(page.text_of(".current-month").unwrap(), "Septiembre 2026");
}

#[test]
fn every_month_element_gets_the_label() {
    let mut page = page(
        r#"<div><h1 class="current-month"></h1><footer><span class="current-month"></span></footer></div>"#,
    );
    page.set_clock_ms(AUG_30_2026_MS);
    let _enhancer = Enhancer::install(&mut page).unwrap();
    for node in page.dom.query_selector_all(".current-month").unwrap() {
        assert_eq!(page.dom.text_content(node), "Agosto 2026");
    }
}

const DELETE_ROW: &str = r#"
<form id="delete-form" method="post">
  <button type="submit" class="btn-delete" id="del">Eliminar</button>
</form>
"#;

#[test]
fn declined_confirm_blocks_the_delete_submit() {
    let (mut page, _enhancer) = enhanced(DELETE_ROW);
    page.push_confirm_response(false);
    page.click("#del").unwrap();

    assert_eq!(page.confirm_prompts().len(), 1);
    assert!(page.confirm_prompts()[0].starts_with("\u{bf}Est\u{e1}s seguro"));
    // The prevented click never reached the form, so no guard engaged.
    assert!(!page.is_disabled("#del").unwrap());
}

#[test]
fn accepted_confirm_lets_the_submit_proceed() {
    let (mut page, _enhancer) = enhanced(DELETE_ROW);
    page.push_confirm_response(true);
    page.click("#del").unwrap();

    assert_eq!(page.confirm_prompts().len(), 1);
    assert!(page.is_disabled("#del").unwrap());
}

#[test]
fn confirm_default_answers_unscripted_prompts() {
    let (mut page, _enhancer) = enhanced(DELETE_ROW);
    page.set_confirm_default(false);
    page.click("#del").unwrap();
    assert!(!page.is_disabled("#del").unwrap());

    page.set_confirm_default(true);
    page.click("#del").unwrap();
    assert!(page.is_disabled("#del").unwrap());
    assert_eq!(page.confirm_prompts().len(), 2);
}

const SIDEBAR_PAGE: &str = r#"
<div>
  <button id="sidebarToggler">Menu</button>
  <nav id="sidebar" class="sidebar">...</nav>
</div>
"#;

#[test]
fn sidebar_toggler_flips_the_show_class() {
    let (mut page, _enhancer) = enhanced(SIDEBAR_PAGE);
    assert!(!page.has_class("#sidebar", "show").unwrap());

    page.click("#sidebarToggler").unwrap();
    assert!(page.has_class("#sidebar", "show").unwrap());

    page.click("#sidebarToggler").unwrap();
    assert!(!page.has_class("#sidebar", "show").unwrap());
}

#[test]
fn teardown_leaves_the_page_inert() {
    let (mut page, enhancer) = enhanced(SIDEBAR_PAGE);
    enhancer.teardown(&mut page).unwrap();

    page.click("#sidebarToggler").unwrap();
    assert!(!page.has_class("#sidebar", "show").unwrap());
    assert!(page.pending_timers().is_empty());
}

#[test]
fn event_trace_records_dispatches() {
    let (mut page, _enhancer) = enhanced(SIDEBAR_PAGE);
    page.set_trace_events(true);
    page.click("#sidebarToggler").unwrap();

    let logs = page.take_trace_logs();
    assert!(logs.iter().any(|line| {
        line.contains("[event]") && line.contains("type=click") && line.contains("button#sidebarToggler")
    }));
    // Draining leaves the buffer empty.
    assert!(page.take_trace_logs().is_empty());
}

#[test]
fn timer_trace_records_firings() {
    let (mut page, _enhancer) = enhanced(SIDEBAR_PAGE);
    page.set_trace_timers(true);
    page.advance_time(ALERT_DISMISS_MS).unwrap();

    let logs = page.take_trace_logs();
    assert!(logs.iter().any(|line| line.contains("[timer] fire") && line.contains("kind=timeout")));
}

#[test]
fn trace_log_limit_drops_oldest_lines() {
    let (mut page, _enhancer) = enhanced(SIDEBAR_PAGE);
    page.set_trace_events(true);
    page.set_trace_log_limit(3);
    for _ in 0..5 {
        page.click("#sidebarToggler").unwrap();
    }
    assert_eq!(page.take_trace_logs().len(), 3);
}
