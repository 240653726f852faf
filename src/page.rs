use std::collections::{HashMap, VecDeque};

use super::*;
use crate::widgets::WidgetRegistry;

const DEFAULT_TIMER_STEP_LIMIT: usize = 10_000;
const DEFAULT_TRACE_LOG_LIMIT: usize = 10_000;

#[derive(Debug, Clone)]
pub(crate) struct Listener {
    pub(crate) id: u64,
    pub(crate) capture: bool,
    pub(crate) action: Action,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ListenerStore {
    // node -> event type -> listeners in registration order
    map: HashMap<NodeId, HashMap<String, Vec<Listener>>>,
}

impl ListenerStore {
    fn add(&mut self, node: NodeId, event: &str, listener: Listener) {
        self.map
            .entry(node)
            .or_default()
            .entry(event.to_string())
            .or_default()
            .push(listener);
    }

    fn remove(&mut self, listener_id: u64) -> bool {
        for per_event in self.map.values_mut() {
            for listeners in per_event.values_mut() {
                let before = listeners.len();
                listeners.retain(|l| l.id != listener_id);
                if listeners.len() != before {
                    return true;
                }
            }
        }
        false
    }

    fn for_node(&self, node: NodeId, event: &str) -> Vec<Listener> {
        self.map
            .get(&node)
            .and_then(|per_event| per_event.get(event))
            .cloned()
            .unwrap_or_default()
    }
}

/// Flags accumulated while an event propagates.
#[derive(Debug, Clone, Default)]
pub(crate) struct EventState {
    pub(crate) default_prevented: bool,
    pub(crate) propagation_stopped: bool,
    pub(crate) immediate_propagation_stopped: bool,
}

#[derive(Debug, Clone)]
struct ScheduledTask {
    id: u64,
    due_at: i64,
    order: u64,
    interval_ms: Option<i64>,
    action: Action,
}

/// A timer visible through [`Page::pending_timers`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTimer {
    pub id: u64,
    pub due_in_ms: i64,
    pub interval_ms: Option<i64>,
}

// A form absent from the guard map is idle; it appears here only while a
// submission is in flight.
#[derive(Debug, Clone)]
pub(crate) enum GuardState {
    Pending {
        button: NodeId,
        original_label: String,
        timer_id: u64,
    },
}

/// A parsed page plus everything scripted behavior needs: an event listener
/// store, a virtual clock with a timer queue, focus tracking, widget
/// instances, and confirm-prompt scripting.
///
/// Time never advances on its own; tests drive it with [`Page::advance_time`].
#[derive(Debug, Clone)]
pub struct Page {
    pub(crate) dom: Dom,
    listeners: ListenerStore,
    task_queue: Vec<ScheduledTask>,
    pub(crate) active_element: Option<NodeId>,
    now_ms: i64,
    timer_step_limit: usize,
    next_timer_id: u64,
    next_task_order: u64,
    next_listener_id: u64,
    pub(crate) guards: HashMap<NodeId, GuardState>,
    pub(crate) widgets: WidgetRegistry,
    confirm_default: bool,
    confirm_queue: VecDeque<bool>,
    confirm_prompts: Vec<String>,
    trace_events: bool,
    trace_timers: bool,
    trace_stderr: bool,
    trace_log_limit: usize,
    trace_logs: Vec<String>,
}

impl Page {
    /// Parse `html` into a page with an empty listener store and the clock
    /// at zero.
    pub fn from_html(html: &str) -> Result<Self> {
        let dom = stacker::maybe_grow(64 * 1024, 4 * 1024 * 1024, || parse_html(html))?;
        Ok(Self {
            dom,
            listeners: ListenerStore::default(),
            task_queue: Vec::new(),
            active_element: None,
            now_ms: 0,
            timer_step_limit: DEFAULT_TIMER_STEP_LIMIT,
            next_timer_id: 1,
            next_task_order: 0,
            next_listener_id: 1,
            guards: HashMap::new(),
            widgets: WidgetRegistry::default(),
            confirm_default: true,
            confirm_queue: VecDeque::new(),
            confirm_prompts: Vec::new(),
            trace_events: false,
            trace_timers: false,
            trace_stderr: false,
            trace_log_limit: DEFAULT_TRACE_LOG_LIMIT,
            trace_logs: Vec::new(),
        })
    }

    // ---- clock ----

    /// Current virtual time in unix milliseconds.
    pub fn now_ms(&self) -> i64 {
        self.now_ms
    }

    /// Set the virtual clock without firing timers. Pending timers keep
    /// their absolute due times.
    pub fn set_clock_ms(&mut self, ms: i64) {
        self.now_ms = ms;
    }

    // ---- selectors and accessors ----

    pub(crate) fn require_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    /// Whether any element matches `selector`.
    pub fn exists(&self, selector: &str) -> Result<bool> {
        Ok(self.dom.query_selector(selector)?.is_some())
    }

    /// Current control value of the first match.
    pub fn value_of(&self, selector: &str) -> Result<String> {
        let node = self.require_one(selector)?;
        self.dom.value(node)
    }

    /// Concatenated text content of the first match.
    pub fn text_of(&self, selector: &str) -> Result<String> {
        let node = self.require_one(selector)?;
        Ok(self.dom.text_content(node))
    }

    /// Serialized children of the first match.
    pub fn inner_html_of(&self, selector: &str) -> Result<String> {
        let node = self.require_one(selector)?;
        self.dom.inner_html(node)
    }

    /// Inline `display` style of the first match; empty when unset.
    pub fn display_of(&self, selector: &str) -> Result<String> {
        let node = self.require_one(selector)?;
        self.dom.style_get(node, "display")
    }

    pub fn has_class(&self, selector: &str, class_name: &str) -> Result<bool> {
        let node = self.require_one(selector)?;
        self.dom.class_contains(node, class_name)
    }

    pub fn is_disabled(&self, selector: &str) -> Result<bool> {
        let node = self.require_one(selector)?;
        Ok(self.dom.disabled(node))
    }

    pub fn attr_of(&self, selector: &str, name: &str) -> Result<Option<String>> {
        let node = self.require_one(selector)?;
        Ok(self.dom.attr(node, name))
    }

    /// Number of elements matching `selector`.
    pub fn count(&self, selector: &str) -> Result<usize> {
        Ok(self.dom.query_selector_all(selector)?.len())
    }

    // ---- listeners ----

    pub(crate) fn add_listener(
        &mut self,
        node: NodeId,
        event: &str,
        capture: bool,
        action: Action,
    ) -> u64 {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners.add(node, event, Listener { id, capture, action });
        id
    }

    pub(crate) fn remove_listener(&mut self, listener_id: u64) -> bool {
        self.listeners.remove(listener_id)
    }

    // ---- event dispatch ----

    /// Dispatch `event` on the first match of `selector` with full
    /// capture, target, and bubble propagation.
    pub fn dispatch(&mut self, selector: &str, event: &str) -> Result<()> {
        let node = self.require_one(selector)?;
        self.dispatch_event_on(node, event)?;
        Ok(())
    }

    pub(crate) fn dispatch_event_on(&mut self, target: NodeId, event: &str) -> Result<EventState> {
        let mut path = Vec::new();
        let mut cursor = self.dom.parent(target);
        while let Some(node) = cursor {
            if self.dom.element(node).is_some() {
                path.push(node);
            }
            cursor = self.dom.parent(node);
        }
        // path is target's ancestors, nearest first; capture walks it reversed.

        let mut state = EventState::default();

        for node in path.iter().rev() {
            self.trace_event(event, *node, "capture");
            self.run_listeners_at(*node, event, target, true, &mut state)?;
            if state.propagation_stopped || state.immediate_propagation_stopped {
                return Ok(state);
            }
        }

        self.trace_event(event, target, "target");
        self.run_listeners_at(target, event, target, false, &mut state)?;
        if state.propagation_stopped || state.immediate_propagation_stopped {
            return Ok(state);
        }

        for node in &path {
            self.trace_event(event, *node, "bubble");
            self.run_listeners_at(*node, event, target, false, &mut state)?;
            if state.propagation_stopped || state.immediate_propagation_stopped {
                return Ok(state);
            }
        }

        Ok(state)
    }

    /// Run listeners registered on `node`. At the target both capture and
    /// bubble listeners fire; elsewhere only the matching phase.
    fn run_listeners_at(
        &mut self,
        node: NodeId,
        event: &str,
        target: NodeId,
        capture_phase: bool,
        state: &mut EventState,
    ) -> Result<()> {
        let at_target = node == target;
        let listeners = self.listeners.for_node(node, event);
        for listener in listeners {
            if !at_target && listener.capture != capture_phase {
                continue;
            }
            self.run_action(listener.action.clone(), target, state)?;
            if state.immediate_propagation_stopped {
                break;
            }
        }
        Ok(())
    }

    fn non_bubbling_event(&mut self, target: NodeId, event: &str) -> Result<EventState> {
        let mut state = EventState::default();
        self.trace_event(event, target, "target");
        self.run_listeners_at(target, event, target, false, &mut state)?;
        Ok(state)
    }

    // ---- gestures ----

    /// Click the first match. Disabled controls swallow the click. A click
    /// on a submit control whose default was not prevented submits its form.
    pub fn click(&mut self, selector: &str) -> Result<()> {
        let node = self.require_one(selector)?;
        if self.dom.disabled(node) {
            return Ok(());
        }

        let was_checked = self.dom.element(node).map(|e| e.checked).unwrap_or(false);
        if dom::is_checkbox_input(&self.dom, node) {
            self.dom.set_checked(node, !was_checked)?;
        } else if dom::is_radio_input(&self.dom, node) {
            self.check_radio(node)?;
        }

        let state = self.dispatch_event_on(node, "click")?;
        if state.default_prevented {
            if dom::is_checkbox_input(&self.dom, node) || dom::is_radio_input(&self.dom, node) {
                self.dom.set_checked(node, was_checked)?;
            }
            return Ok(());
        }

        if dom::is_checkbox_input(&self.dom, node) || dom::is_radio_input(&self.dom, node) {
            self.dispatch_event_on(node, "change")?;
        }

        if dom::is_submit_control(&self.dom, node) {
            if let Some(form) = self.dom.find_ancestor_by_tag(node, "form") {
                self.dispatch_event_on(form, "submit")?;
            }
        }

        Ok(())
    }

    fn check_radio(&mut self, radio: NodeId) -> Result<()> {
        let name = self.dom.attr(radio, "name");
        if let Some(name) = name {
            if let Some(form) = self.dom.find_ancestor_by_tag(radio, "form") {
                let group = self
                    .dom
                    .query_selector_all_from(form, "input[type=\"radio\"]")?;
                for other in group {
                    if other != radio && self.dom.attr(other, "name").as_deref() == Some(&name) {
                        self.dom.set_checked(other, false)?;
                    }
                }
            }
        }
        self.dom.set_checked(radio, true)
    }

    /// Replace the control's value and fire `input`.
    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let node = self.require_one(selector)?;
        if !dom::is_form_control(&self.dom, node) {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "form control".to_string(),
                actual: self.dom.tag_name(node).unwrap_or("").to_string(),
            });
        }
        if self.dom.disabled(node) || self.dom.readonly(node) {
            return Ok(());
        }
        self.dom.set_value(node, text)?;
        self.dispatch_event_on(node, "input")?;
        Ok(())
    }

    /// Replace the control's value and fire `input` then `change`, the way
    /// an edit followed by leaving the field does.
    pub fn change_value(&mut self, selector: &str, text: &str) -> Result<()> {
        self.type_text(selector, text)?;
        let node = self.require_one(selector)?;
        self.dispatch_event_on(node, "change")?;
        Ok(())
    }

    /// Pick an option by value on a `<select>` and fire `change`.
    pub fn select_value(&mut self, selector: &str, value: &str) -> Result<()> {
        let node = self.require_one(selector)?;
        let is_select = self
            .dom
            .tag_name(node)
            .map(|tag| tag.eq_ignore_ascii_case("select"))
            .unwrap_or(false);
        if !is_select {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "select".to_string(),
                actual: self.dom.tag_name(node).unwrap_or("").to_string(),
            });
        }
        self.dom.set_value(node, value)?;
        self.dispatch_event_on(node, "change")?;
        Ok(())
    }

    /// Move focus to the first match, firing `blur`/`focusout` on the old
    /// element and `focus`/`focusin` on the new one.
    pub fn focus(&mut self, selector: &str) -> Result<()> {
        let node = self.require_one(selector)?;
        if self.active_element == Some(node) {
            return Ok(());
        }
        self.blur_active()?;
        self.active_element = Some(node);
        self.non_bubbling_event(node, "focus")?;
        self.dispatch_event_on(node, "focusin")?;
        Ok(())
    }

    /// Remove focus from the first match if it is the active element.
    pub fn blur(&mut self, selector: &str) -> Result<()> {
        let node = self.require_one(selector)?;
        if self.active_element != Some(node) {
            return Ok(());
        }
        self.blur_active()
    }

    fn blur_active(&mut self) -> Result<()> {
        let Some(old) = self.active_element.take() else {
            return Ok(());
        };
        self.non_bubbling_event(old, "blur")?;
        self.dispatch_event_on(old, "focusout")?;
        Ok(())
    }

    /// Fire `submit` on the form matched by `selector`.
    pub fn submit(&mut self, selector: &str) -> Result<()> {
        let node = self.require_one(selector)?;
        self.dispatch_event_on(node, "submit")?;
        Ok(())
    }

    // ---- timers ----

    pub(crate) fn set_timeout(&mut self, action: Action, delay_ms: i64) -> u64 {
        self.schedule(action, delay_ms, None)
    }

    pub(crate) fn set_interval(&mut self, action: Action, interval_ms: i64) -> u64 {
        self.schedule(action, interval_ms, Some(interval_ms))
    }

    fn schedule(&mut self, action: Action, delay_ms: i64, interval_ms: Option<i64>) -> u64 {
        let id = self.next_timer_id;
        self.next_timer_id += 1;
        let order = self.next_task_order;
        self.next_task_order += 1;
        self.task_queue.push(ScheduledTask {
            id,
            due_at: self.now_ms + delay_ms.max(0),
            order,
            interval_ms,
            action,
        });
        id
    }

    pub(crate) fn clear_timer(&mut self, timer_id: u64) -> bool {
        let before = self.task_queue.len();
        self.task_queue.retain(|task| task.id != timer_id);
        self.task_queue.len() != before
    }

    /// Advance the clock by `ms`, firing every timer that falls due, in
    /// due-time then scheduling order.
    pub fn advance_time(&mut self, ms: i64) -> Result<()> {
        let target = self.now_ms + ms.max(0);
        self.advance_time_to(target)
    }

    /// Advance the clock to an absolute time. A target in the past only
    /// fires timers that are already due.
    pub fn advance_time_to(&mut self, target_ms: i64) -> Result<()> {
        let mut steps = 0usize;
        loop {
            let next = self
                .task_queue
                .iter()
                .filter(|task| task.due_at <= target_ms)
                .min_by_key(|task| (task.due_at, task.order))
                .map(|task| task.id);
            let Some(id) = next else {
                break;
            };
            steps += 1;
            if steps > self.timer_step_limit {
                return Err(Error::Timer(format!(
                    "timer step limit of {} exceeded",
                    self.timer_step_limit
                )));
            }
            self.fire_task(id)?;
        }
        if target_ms > self.now_ms {
            self.now_ms = target_ms;
        }
        Ok(())
    }

    /// Run timers until the queue drains, advancing the clock as needed.
    pub fn flush(&mut self) -> Result<()> {
        let mut steps = 0usize;
        loop {
            let next = self
                .task_queue
                .iter()
                .min_by_key(|task| (task.due_at, task.order))
                .map(|task| task.id);
            let Some(id) = next else {
                return Ok(());
            };
            steps += 1;
            if steps > self.timer_step_limit {
                return Err(Error::Timer(format!(
                    "timer step limit of {} exceeded",
                    self.timer_step_limit
                )));
            }
            self.fire_task(id)?;
        }
    }

    /// Fire every timer already due at the current clock, without moving
    /// it. Returns the number of timers that ran.
    pub fn run_due_timers(&mut self) -> Result<usize> {
        let mut fired = 0usize;
        loop {
            let next = self
                .task_queue
                .iter()
                .filter(|task| task.due_at <= self.now_ms)
                .min_by_key(|task| (task.due_at, task.order))
                .map(|task| task.id);
            let Some(id) = next else {
                return Ok(fired);
            };
            fired += 1;
            if fired > self.timer_step_limit {
                return Err(Error::Timer(format!(
                    "timer step limit of {} exceeded",
                    self.timer_step_limit
                )));
            }
            self.fire_task(id)?;
        }
    }

    /// Drop every pending timer without firing it.
    pub fn clear_all_timers(&mut self) {
        self.task_queue.clear();
    }

    fn fire_task(&mut self, id: u64) -> Result<()> {
        let Some(pos) = self.task_queue.iter().position(|task| task.id == id) else {
            return Ok(());
        };
        let task = self.task_queue.remove(pos);
        if task.due_at > self.now_ms {
            self.now_ms = task.due_at;
        }
        self.trace_timer(&task);
        if let Some(interval) = task.interval_ms {
            let order = self.next_task_order;
            self.next_task_order += 1;
            self.task_queue.push(ScheduledTask {
                id: task.id,
                due_at: self.now_ms + interval.max(1),
                order,
                interval_ms: Some(interval),
                action: task.action.clone(),
            });
        }
        let mut state = EventState::default();
        let target = self.dom.root;
        self.run_action(task.action, target, &mut state)
    }

    /// Timers waiting in the queue, soonest first.
    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        let mut tasks = self.task_queue.clone();
        tasks.sort_by_key(|task| (task.due_at, task.order));
        tasks
            .into_iter()
            .map(|task| PendingTimer {
                id: task.id,
                due_in_ms: (task.due_at - self.now_ms).max(0),
                interval_ms: task.interval_ms,
            })
            .collect()
    }

    /// Cap on timer firings per advance; guards against interval storms.
    pub fn set_timer_step_limit(&mut self, limit: usize) {
        self.timer_step_limit = limit.max(1);
    }

    // ---- confirm prompts ----

    /// Answer confirm prompts have no scripted response queued for.
    pub fn set_confirm_default(&mut self, accept: bool) {
        self.confirm_default = accept;
    }

    /// Queue one scripted answer; each prompt consumes the oldest.
    pub fn push_confirm_response(&mut self, accept: bool) {
        self.confirm_queue.push_back(accept);
    }

    /// Every confirm message shown so far, oldest first.
    pub fn confirm_prompts(&self) -> &[String] {
        &self.confirm_prompts
    }

    pub(crate) fn confirm(&mut self, message: &str) -> bool {
        self.confirm_prompts.push(message.to_string());
        self.confirm_queue
            .pop_front()
            .unwrap_or(self.confirm_default)
    }

    // ---- submission guards ----

    /// Release the in-flight submission guard on the form matched by
    /// `selector`, restoring its submit button immediately and cancelling
    /// the fallback recovery timer. A form with no pending guard is a no-op.
    pub fn resolve_submission(&mut self, selector: &str) -> Result<()> {
        let form = self.require_one(selector)?;
        self.release_guard(form, true)
    }

    pub(crate) fn release_guard(&mut self, form: NodeId, cancel_timer: bool) -> Result<()> {
        let Some(GuardState::Pending {
            button,
            original_label,
            timer_id,
        }) = self.guards.remove(&form)
        else {
            return Ok(());
        };
        if cancel_timer {
            self.clear_timer(timer_id);
        }
        if self.dom.is_valid_node(button) && self.dom.element(button).is_some() {
            self.dom.set_disabled(button, false)?;
            self.dom.set_inner_html(button, &original_label)?;
        }
        Ok(())
    }

    // ---- form validation ----

    /// Built-in constraint check: required controls must be non-empty
    /// (checked, for checkboxes) and number inputs must respect `min`.
    pub(crate) fn check_validity(&self, form: NodeId) -> Result<bool> {
        let controls = self
            .dom
            .query_selector_all_from(form, "input, select, textarea")?;
        for control in controls {
            let element = self
                .dom
                .element(control)
                .ok_or_else(|| Error::DomOp("form control is not an element".into()))?;
            if element.disabled {
                continue;
            }
            if element.required {
                let is_checkbox = dom::is_checkbox_input(&self.dom, control);
                if is_checkbox && !element.checked {
                    return Ok(false);
                }
                if !is_checkbox && element.value.trim().is_empty() {
                    return Ok(false);
                }
            }
            let is_number = element.tag_name.eq_ignore_ascii_case("input")
                && element
                    .attrs
                    .get("type")
                    .map(|t| t.eq_ignore_ascii_case("number"))
                    .unwrap_or(false);
            if is_number && !element.value.is_empty() {
                if let (Ok(value), Some(min)) = (
                    element.value.parse::<f64>(),
                    element.attrs.get("min").and_then(|m| m.parse::<f64>().ok()),
                ) {
                    if value < min {
                        return Ok(false);
                    }
                }
            }
        }
        Ok(true)
    }

    // ---- trace ----

    /// Switch event and timer tracing on or off together.
    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace_events = enabled;
        self.trace_timers = enabled;
    }

    /// Log every event dispatch phase to the trace buffer.
    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace_events = enabled;
    }

    /// Log every timer firing to the trace buffer.
    pub fn set_trace_timers(&mut self, enabled: bool) {
        self.trace_timers = enabled;
    }

    /// Mirror trace lines to stderr as they are produced.
    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_stderr = enabled;
    }

    /// Cap the trace buffer; oldest lines are dropped past the limit.
    pub fn set_trace_log_limit(&mut self, limit: usize) {
        self.trace_log_limit = limit.max(1);
    }

    /// Drain and return the accumulated trace lines.
    pub fn take_trace_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace_logs)
    }

    fn trace_event(&mut self, event: &str, node: NodeId, phase: &str) {
        if !self.trace_events {
            return;
        }
        let label = self.node_label(node);
        self.push_trace(format!("[event] type={event} node={label} phase={phase}"));
    }

    fn trace_timer(&mut self, task: &ScheduledTask) {
        if !self.trace_timers {
            return;
        }
        let kind = if task.interval_ms.is_some() {
            "interval"
        } else {
            "timeout"
        };
        self.push_trace(format!(
            "[timer] fire id={} kind={kind} at={}",
            task.id, self.now_ms
        ));
    }

    fn node_label(&self, node: NodeId) -> String {
        match self.dom.element(node) {
            Some(element) => match element.attrs.get("id") {
                Some(id) if !id.is_empty() => format!("{}#{id}", element.tag_name),
                _ => element.tag_name.clone(),
            },
            None => "#document".to_string(),
        }
    }

    fn push_trace(&mut self, line: String) {
        if self.trace_stderr {
            eprintln!("{line}");
        }
        self.trace_logs.push(line);
        if self.trace_logs.len() > self.trace_log_limit {
            let drop = self.trace_logs.len() - self.trace_log_limit;
            self.trace_logs.drain(..drop);
        }
    }
}
