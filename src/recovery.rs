use std::cell::Cell;
use std::rc::Rc;

use crate::dom::NodeId;
use crate::page::Page;

pub const DEFAULT_RECOVERY_DELAY_MS: u32 = 10;

/// Returns focus to a rejected field once its change event has finished.
///
/// Focus cannot be moved back into a field from inside that field's own
/// change handler: the browser's default focus change runs afterwards and
/// wins. The controller records the field and acts from a short timer
/// instead, after the handler and the focus change have both completed.
///
/// Only one pending target is tracked. A second rejection before the first
/// timer fires replaces it, so the first timer refocuses the newer field and
/// the second finds nothing left to refocus.
#[derive(Debug, Clone)]
pub struct FocusRecovery {
    pending: Rc<Cell<Option<NodeId>>>,
    delay_ms: u32,
}

impl Default for FocusRecovery {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusRecovery {
    pub fn new() -> Self {
        Self {
            pending: Rc::new(Cell::new(None)),
            delay_ms: DEFAULT_RECOVERY_DELAY_MS,
        }
    }

    pub fn with_delay(mut self, delay_ms: u32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    pub fn pending_target(&self) -> Option<NodeId> {
        self.pending.get()
    }

    /// Schedules the alert-then-refocus task and returns its timer id.
    pub fn schedule_recovery(&self, page: &mut Page, field: NodeId, message: &str) -> i64 {
        if let Some(previous) = self.pending.replace(Some(field)) {
            let label = page.trace_node_label(previous);
            page.trace(format!("[focus] recovery target {label} superseded"));
        }

        let pending = Rc::clone(&self.pending);
        let message = message.to_string();
        page.set_timeout(i64::from(self.delay_ms), move |page| {
            page.alert(&message);
            let Some(target) = pending.take() else {
                page.trace("[focus] recovery skipped: no pending target".into());
                return Ok(());
            };
            page.focus_node(target)?;
            page.select_contents(target)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Result, Selection};

    #[test]
    fn recovery_waits_for_the_delay_then_alerts_focuses_and_selects() -> Result<()> {
        let mut h = Page::from_html("<input id='a' value='oops'><input id='b'>")?;
        let a = h.select_one("#a")?;
        let recovery = FocusRecovery::new();

        recovery.schedule_recovery(&mut h, a, "bad value");
        assert_eq!(recovery.pending_target(), Some(a));
        h.advance_time(9)?;
        assert!(h.take_alert_messages().is_empty());
        assert_eq!(h.active_element(), None);

        h.advance_time(1)?;
        assert_eq!(h.take_alert_messages(), vec!["bad value".to_string()]);
        h.assert_focused("#a")?;
        assert_eq!(
            h.selection(),
            Some(Selection {
                node: a,
                start: 0,
                end: 4
            })
        );
        assert_eq!(recovery.pending_target(), None);
        Ok(())
    }

    #[test]
    fn second_rejection_overwrites_the_pending_target() -> Result<()> {
        let mut h = Page::from_html("<input id='a'><input id='b'>")?;
        let a = h.select_one("#a")?;
        let b = h.select_one("#b")?;
        let recovery = FocusRecovery::new();

        recovery.schedule_recovery(&mut h, a, "first");
        h.advance_time(4)?;
        recovery.schedule_recovery(&mut h, b, "second");
        assert_eq!(recovery.pending_target(), Some(b));

        h.advance_time(6)?;
        assert_eq!(h.take_alert_messages(), vec!["first".to_string()]);
        h.assert_focused("#b")?;

        h.advance_time(4)?;
        assert_eq!(h.take_alert_messages(), vec!["second".to_string()]);
        h.assert_focused("#b")?;
        assert_eq!(recovery.pending_target(), None);
        Ok(())
    }

    #[test]
    fn clones_share_one_pending_record_and_delay_is_configurable() -> Result<()> {
        let mut h = Page::from_html("<input id='a'>")?;
        let a = h.select_one("#a")?;
        let recovery = FocusRecovery::new().with_delay(50);
        let shared = recovery.clone();

        let id = shared.schedule_recovery(&mut h, a, "late");
        assert_eq!(recovery.pending_target(), Some(a));
        assert_eq!(h.pending_timers()[0].id, id);
        assert_eq!(h.pending_timers()[0].due_at, 50);
        Ok(())
    }
}
