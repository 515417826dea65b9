use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::dom::{Dom, NodeId};
use crate::html::parse_form_markup;
use crate::scheduler::{PendingTimer, SchedulerState};
use crate::trace::{TraceCategory, TraceState};
use crate::windows::{ScreenSize, WindowHost, WindowId};
use crate::{Error, Result};

pub type EventHandler = Rc<dyn Fn(&mut Page, &Event) -> Result<()>>;
pub type UnloadHandler = Box<dyn FnOnce(&mut Page) -> Result<()>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    event_type: String,
    target: NodeId,
}

impl Event {
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The element the event was dispatched to.
    pub fn target(&self) -> NodeId {
        self.target
    }
}

/// Text selection inside a field, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub node: NodeId,
    pub start: usize,
    pub end: usize,
}

struct Listener {
    event_type: String,
    handler: EventHandler,
}

#[derive(Default)]
struct ListenerStore {
    map: HashMap<NodeId, Vec<Listener>>,
}

impl ListenerStore {
    fn add(&mut self, node_id: NodeId, event_type: String, handler: EventHandler) {
        self.map.entry(node_id).or_default().push(Listener {
            event_type,
            handler,
        });
    }

    fn get(&self, node_id: NodeId, event_type: &str) -> Vec<EventHandler> {
        self.map
            .get(&node_id)
            .map(|listeners| {
                listeners
                    .iter()
                    .filter(|listener| listener.event_type == event_type)
                    .map(|listener| Rc::clone(&listener.handler))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn len(&self) -> usize {
        self.map.values().map(Vec::len).sum()
    }
}

/// A deterministic in-memory page: the form controls of one document plus
/// the browser services the form scripts rely on.
///
/// Time only moves when the caller advances it, alerts are recorded instead
/// of shown, and secondary windows live in a [`WindowHost`].
pub struct Page {
    dom: Dom,
    listeners: ListenerStore,
    scheduler: SchedulerState,
    active_element: Option<NodeId>,
    selection: Option<Selection>,
    alert_messages: Vec<String>,
    windows: WindowHost,
    screen: ScreenSize,
    unload_handler: Option<UnloadHandler>,
    unloaded: bool,
    trace_state: TraceState,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("dom", &self.dom)
            .field("listeners", &self.listeners.len())
            .field("scheduler", &self.scheduler)
            .field("active_element", &self.active_element)
            .field("selection", &self.selection)
            .field("alert_messages", &self.alert_messages)
            .field("windows", &self.windows)
            .field("screen", &self.screen)
            .field("unloaded", &self.unloaded)
            .finish_non_exhaustive()
    }
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        let dom = parse_form_markup(html)?;
        Ok(Self {
            dom,
            listeners: ListenerStore::default(),
            scheduler: SchedulerState::default(),
            active_element: None,
            selection: None,
            alert_messages: Vec::new(),
            windows: WindowHost::default(),
            screen: ScreenSize::default(),
            unload_handler: None,
            unloaded: false,
            trace_state: TraceState::default(),
        })
    }

    // Tracing

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace_state.enabled = enabled;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        self.trace_state.take()
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_state.to_stderr = enabled;
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace_state.events = enabled;
    }

    pub fn set_trace_timers(&mut self, enabled: bool) {
        self.trace_state.timers = enabled;
    }

    pub fn set_trace_windows(&mut self, enabled: bool) {
        self.trace_state.windows = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::Runtime(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace_state.set_log_limit(max_entries);
        Ok(())
    }

    pub(crate) fn trace(&mut self, line: String) {
        self.trace_state.line(TraceCategory::Other, line);
    }

    fn trace_event_line(&mut self, line: String) {
        self.trace_state.line(TraceCategory::Event, line);
    }

    fn trace_timer_line(&mut self, line: String) {
        self.trace_state.line(TraceCategory::Timer, line);
    }

    fn trace_window_line(&mut self, line: String) {
        self.trace_state.line(TraceCategory::Window, line);
    }

    pub(crate) fn trace_node_label(&self, node: NodeId) -> String {
        if let Some(id) = self.dom.attr(node, "id") {
            return format!("#{id}");
        }
        let tag = self.dom.tag_name(node).unwrap_or("node");
        match self.dom.attr(node, "name") {
            Some(name) => format!("{tag}[name={name}]"),
            None => tag.to_string(),
        }
    }

    // Document

    /// Resolves `#id` or `[name=value]` to the first matching element.
    pub fn select_one(&self, selector: &str) -> Result<NodeId> {
        let selector = selector.trim();
        let found = if let Some(id) = selector.strip_prefix('#') {
            self.dom.by_id(id)
        } else if let Some(name) = selector
            .strip_prefix("[name=")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            let name = name.trim_matches(|c| c == '\'' || c == '"');
            self.dom.by_name(name).into_iter().next()
        } else {
            return Err(Error::UnsupportedSelector(selector.to_string()));
        };
        found.ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    pub fn by_id(&self, id: &str) -> Option<NodeId> {
        self.dom.by_id(id)
    }

    /// Every element sharing the `name` attribute, in document order.
    pub fn by_name(&self, name: &str) -> Vec<NodeId> {
        self.dom.by_name(name)
    }

    pub fn value(&self, node: NodeId) -> Result<String> {
        self.dom.value(node)
    }

    /// Programmatic write; dispatches no events.
    pub fn set_value(&mut self, node: NodeId, value: &str) -> Result<()> {
        self.dom.set_value(node, value)
    }

    pub fn checked(&self, node: NodeId) -> Result<bool> {
        self.dom.checked(node)
    }

    pub fn is_disabled(&self, node: NodeId) -> bool {
        self.dom.disabled(node)
    }

    pub fn set_disabled(&mut self, node: NodeId, disabled: bool) -> Result<()> {
        self.dom.set_disabled(node, disabled)
    }

    // Events

    pub fn add_event_listener<F>(&mut self, node: NodeId, event_type: &str, handler: F)
    where
        F: Fn(&mut Page, &Event) -> Result<()> + 'static,
    {
        self.listeners
            .add(node, event_type.to_string(), Rc::new(handler));
    }

    pub fn dispatch(&mut self, selector: &str, event_type: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.dispatch_event(target, event_type)
    }

    pub fn dispatch_event(&mut self, target: NodeId, event_type: &str) -> Result<()> {
        let event = Event {
            event_type: event_type.to_string(),
            target,
        };
        let handlers = self.listeners.get(target, event_type);
        let label = self.trace_node_label(target);
        self.trace_event_line(format!(
            "[event] {event_type} target={label} listeners={}",
            handlers.len()
        ));
        for handler in handlers {
            handler(self, &event)?;
        }
        Ok(())
    }

    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.text_control(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }
        self.dom.set_value(target, text)?;
        self.dispatch_event(target, "input")
    }

    /// Edits a field the way a person does: focus it, replace the text, then
    /// leave it. `change` fires before focus moves away.
    pub fn change_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.text_control(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }
        self.focus_node(target)?;
        self.dom.set_value(target, text)?;
        self.dispatch_event(target, "input")?;
        self.dispatch_event(target, "change")?;
        self.blur_node(target)?;
        Ok(())
    }

    /// Activates a control. Checkboxes toggle and radio buttons become the
    /// checked member of their group before `click` fires.
    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }
        if self.dom.is_radio_input(target) {
            self.dom.uncheck_radio_group(target)?;
            self.dom.set_checked(target, true)?;
        } else if self.dom.is_checkable_input(target) {
            let checked = self.dom.checked(target)?;
            self.dom.set_checked(target, !checked)?;
        }
        self.dispatch_event(target, "click")
    }

    pub fn set_checked(&mut self, selector: &str, checked: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        if !self.dom.is_checkable_input(target) {
            let actual = self.dom.tag_name(target).unwrap_or("node").to_string();
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "checkbox or radio input".into(),
                actual,
            });
        }
        if self.dom.disabled(target) || self.dom.checked(target)? == checked {
            return Ok(());
        }
        if checked && self.dom.is_radio_input(target) {
            self.dom.uncheck_radio_group(target)?;
        }
        self.dom.set_checked(target, checked)?;
        self.dispatch_event(target, "input")?;
        self.dispatch_event(target, "change")
    }

    fn text_control(&self, selector: &str) -> Result<NodeId> {
        let target = self.select_one(selector)?;
        if !self.dom.is_text_control(target) {
            let actual = self.dom.tag_name(target).unwrap_or("node").to_string();
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual,
            });
        }
        Ok(target)
    }

    // Focus and selection

    pub fn focus(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.focus_node(target)
    }

    pub fn blur(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.blur_node(target)
    }

    pub fn focus_node(&mut self, node: NodeId) -> Result<()> {
        self.dom.element(node)?;
        if self.dom.disabled(node) || self.active_element == Some(node) {
            return Ok(());
        }
        if let Some(current) = self.active_element {
            self.blur_node(current)?;
        }
        self.active_element = Some(node);
        let label = self.trace_node_label(node);
        self.trace(format!("[focus] focus target={label}"));
        self.dispatch_event(node, "focus")
    }

    pub fn blur_node(&mut self, node: NodeId) -> Result<()> {
        if self.active_element != Some(node) {
            return Ok(());
        }
        self.active_element = None;
        if self.selection.is_some_and(|selection| selection.node == node) {
            self.selection = None;
        }
        let label = self.trace_node_label(node);
        self.trace(format!("[focus] blur target={label}"));
        self.dispatch_event(node, "blur")
    }

    /// Selects the whole value of a field.
    pub fn select_contents(&mut self, node: NodeId) -> Result<()> {
        let end = self.dom.value(node)?.chars().count();
        self.selection = Some(Selection {
            node,
            start: 0,
            end,
        });
        Ok(())
    }

    pub fn active_element(&self) -> Option<NodeId> {
        self.active_element
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    // Dialogs

    /// Blocking message box; recorded rather than shown.
    pub fn alert(&mut self, message: &str) {
        self.trace(format!("[dialog] alert {message:?}"));
        self.alert_messages.push(message.to_string());
    }

    pub fn take_alert_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alert_messages)
    }

    // Timers

    pub fn set_timeout<F>(&mut self, delay_ms: i64, handler: F) -> i64
    where
        F: FnOnce(&mut Page) -> Result<()> + 'static,
    {
        let (id, due_at) = self.scheduler.schedule(delay_ms, Box::new(handler));
        self.trace_timer_line(format!(
            "[timer] schedule timeout id={id} due_at={due_at} delay_ms={delay_ms}"
        ));
        id
    }

    pub fn clear_timer(&mut self, timer_id: i64) -> bool {
        let existed = self.scheduler.cancel(timer_id);
        self.trace_timer_line(format!("[timer] clear id={timer_id} existed={existed}"));
        existed
    }

    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        self.scheduler.pending()
    }

    pub fn now_ms(&self) -> i64 {
        self.scheduler.now_ms
    }

    pub fn set_timer_step_limit(&mut self, max_steps: usize) -> Result<()> {
        if max_steps == 0 {
            return Err(Error::Runtime(
                "set_timer_step_limit requires at least 1 step".into(),
            ));
        }
        self.scheduler.timer_step_limit = max_steps;
        Ok(())
    }

    pub fn advance_time(&mut self, delta_ms: i64) -> Result<()> {
        if delta_ms < 0 {
            return Err(Error::Runtime(
                "advance_time requires non-negative milliseconds".into(),
            ));
        }
        let from = self.scheduler.now_ms;
        self.scheduler.now_ms = from.saturating_add(delta_ms);
        let ran = self.run_timer_queue(Some(self.scheduler.now_ms), false)?;
        self.trace_timer_line(format!(
            "[timer] advance delta_ms={delta_ms} from={from} to={} ran_due={ran}",
            self.scheduler.now_ms
        ));
        Ok(())
    }

    pub fn advance_time_to(&mut self, target_ms: i64) -> Result<()> {
        if target_ms < self.scheduler.now_ms {
            return Err(Error::Runtime(format!(
                "advance_time_to requires target >= now_ms (target={target_ms}, now_ms={})",
                self.scheduler.now_ms
            )));
        }
        self.advance_time(target_ms - self.scheduler.now_ms)
    }

    /// Runs every queued timer, moving the clock forward as needed.
    pub fn flush(&mut self) -> Result<()> {
        let from = self.scheduler.now_ms;
        let ran = self.run_timer_queue(None, true)?;
        self.trace_timer_line(format!(
            "[timer] flush from={from} to={} ran={ran}",
            self.scheduler.now_ms
        ));
        Ok(())
    }

    pub fn run_next_timer(&mut self) -> Result<bool> {
        let Some(task) = self.scheduler.take_next(None) else {
            self.trace_timer_line("[timer] run_next none".into());
            return Ok(false);
        };
        if task.due_at > self.scheduler.now_ms {
            self.scheduler.now_ms = task.due_at;
        }
        self.execute_timer_task(task)?;
        Ok(true)
    }

    pub fn run_due_timers(&mut self) -> Result<usize> {
        self.run_timer_queue(Some(self.scheduler.now_ms), false)
    }

    fn run_timer_queue(&mut self, due_limit: Option<i64>, advance_clock: bool) -> Result<usize> {
        let mut steps = 0usize;
        while let Some(task) = self.scheduler.take_next(due_limit) {
            steps += 1;
            if steps > self.scheduler.timer_step_limit {
                return Err(Error::Runtime(format!(
                    "flush exceeded max task steps: limit={}, now_ms={}, pending_tasks={}",
                    self.scheduler.timer_step_limit,
                    self.scheduler.now_ms,
                    self.scheduler.task_queue.len() + 1
                )));
            }
            if advance_clock && task.due_at > self.scheduler.now_ms {
                self.scheduler.now_ms = task.due_at;
            }
            self.execute_timer_task(task)?;
        }
        Ok(steps)
    }

    fn execute_timer_task(&mut self, task: crate::scheduler::ScheduledTask) -> Result<()> {
        self.trace_timer_line(format!(
            "[timer] run id={} due_at={} now_ms={}",
            task.id, task.due_at, self.scheduler.now_ms
        ));
        (task.handler)(self)
    }

    // Windows

    pub fn windows(&self) -> &WindowHost {
        &self.windows
    }

    pub fn windows_mut(&mut self) -> &mut WindowHost {
        &mut self.windows
    }

    pub fn screen(&self) -> ScreenSize {
        self.screen
    }

    /// Zero for either dimension means the screen size is unknown.
    pub fn set_screen_size(&mut self, width: i64, height: i64) -> Result<()> {
        if width < 0 || height < 0 {
            return Err(Error::Runtime(format!(
                "screen size must be non-negative (width={width}, height={height})"
            )));
        }
        self.screen = ScreenSize { width, height };
        Ok(())
    }

    pub fn open_window(&mut self, url: &str, target: &str, features: &str) -> WindowId {
        let before = self.windows.created_count();
        let id = self.windows.open(url, target, features);
        let reused = self.windows.created_count() == before;
        self.trace_window_line(format!(
            "[window] open url={url} target={target:?} reused={reused}"
        ));
        id
    }

    pub fn focus_window(&mut self, id: WindowId) -> Result<()> {
        self.windows.focus(id)?;
        self.trace_window_line(format!("[window] focus id={id:?}"));
        Ok(())
    }

    pub fn close_window(&mut self, id: WindowId) -> Result<bool> {
        let was_open = self.windows.close(id)?;
        self.trace_window_line(format!("[window] close id={id:?} was_open={was_open}"));
        Ok(was_open)
    }

    // Teardown

    /// Installs the page's single unload handler, dropping any previous one.
    /// Callers that must chain take the old handler first.
    pub fn set_unload_handler(&mut self, handler: UnloadHandler) {
        self.unload_handler = Some(handler);
    }

    pub fn take_unload_handler(&mut self) -> Option<UnloadHandler> {
        self.unload_handler.take()
    }

    pub fn has_unload_handler(&self) -> bool {
        self.unload_handler.is_some()
    }

    /// Fires the unload handler. Only the first call has any effect.
    pub fn unload(&mut self) -> Result<()> {
        if self.unloaded {
            return Ok(());
        }
        self.unloaded = true;
        let handler = self.unload_handler.take();
        self.trace(format!("[unload] handler={}", handler.is_some()));
        match handler {
            Some(handler) => handler(self),
            None => Ok(()),
        }
    }

    pub fn is_unloaded(&self) -> bool {
        self.unloaded
    }

    // Assertions

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.value(target)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
            });
        }
        Ok(())
    }

    pub fn assert_checked(&self, selector: &str, expected: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.checked(target)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(())
    }

    pub fn assert_disabled(&self, selector: &str, expected: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.disabled(target);
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: format!("disabled={expected}"),
                actual: format!("disabled={actual}"),
            });
        }
        Ok(())
    }

    pub fn assert_focused(&self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.active_element != Some(target) {
            let actual = self
                .active_element
                .map(|node| self.trace_node_label(node))
                .unwrap_or_else(|| "none".into());
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: "focused".into(),
                actual,
            });
        }
        Ok(())
    }
}
