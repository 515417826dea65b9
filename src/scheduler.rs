use std::fmt;

use crate::Result;
use crate::page::Page;

pub(crate) type TimerHandler = Box<dyn FnOnce(&mut Page) -> Result<()>>;

pub(crate) struct ScheduledTask {
    pub(crate) id: i64,
    pub(crate) due_at: i64,
    pub(crate) order: i64,
    pub(crate) handler: TimerHandler,
}

impl fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("id", &self.id)
            .field("due_at", &self.due_at)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTimer {
    pub id: i64,
    pub due_at: i64,
    pub order: i64,
}

/// One-shot timer queue on a virtual clock.
#[derive(Debug)]
pub(crate) struct SchedulerState {
    pub(crate) task_queue: Vec<ScheduledTask>,
    pub(crate) now_ms: i64,
    pub(crate) timer_step_limit: usize,
    pub(crate) next_timer_id: i64,
    pub(crate) next_task_order: i64,
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self {
            task_queue: Vec::new(),
            now_ms: 0,
            timer_step_limit: 10_000,
            next_timer_id: 1,
            next_task_order: 0,
        }
    }
}

impl SchedulerState {
    pub(crate) fn schedule(&mut self, delay_ms: i64, handler: TimerHandler) -> (i64, i64) {
        let id = self.next_timer_id;
        self.next_timer_id += 1;
        let order = self.next_task_order;
        self.next_task_order += 1;
        let due_at = self.now_ms.saturating_add(delay_ms.max(0));
        self.task_queue.push(ScheduledTask {
            id,
            due_at,
            order,
            handler,
        });
        (id, due_at)
    }

    pub(crate) fn cancel(&mut self, timer_id: i64) -> bool {
        let before = self.task_queue.len();
        self.task_queue.retain(|task| task.id != timer_id);
        before != self.task_queue.len()
    }

    pub(crate) fn pending(&self) -> Vec<PendingTimer> {
        let mut timers = self
            .task_queue
            .iter()
            .map(|task| PendingTimer {
                id: task.id,
                due_at: task.due_at,
                order: task.order,
            })
            .collect::<Vec<_>>();
        timers.sort_by_key(|timer| (timer.due_at, timer.order));
        timers
    }

    pub(crate) fn next_task_index(&self, due_limit: Option<i64>) -> Option<usize> {
        self.task_queue
            .iter()
            .enumerate()
            .filter(|(_, task)| due_limit.is_none_or(|limit| task.due_at <= limit))
            .min_by_key(|(_, task)| (task.due_at, task.order))
            .map(|(idx, _)| idx)
    }

    pub(crate) fn take_next(&mut self, due_limit: Option<i64>) -> Option<ScheduledTask> {
        self.next_task_index(due_limit)
            .map(|idx| self.task_queue.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> TimerHandler {
        Box::new(|_page: &mut Page| Ok(()))
    }

    #[test]
    fn tasks_come_out_by_due_time_then_insertion_order() {
        let mut scheduler = SchedulerState::default();
        let (late, _) = scheduler.schedule(20, noop());
        let (first, _) = scheduler.schedule(10, noop());
        let (second, due) = scheduler.schedule(10, noop());
        assert_eq!(due, 10);

        assert!(scheduler.take_next(Some(5)).is_none());
        let order = std::iter::from_fn(|| scheduler.take_next(None).map(|task| task.id))
            .collect::<Vec<_>>();
        assert_eq!(order, vec![first, second, late]);
    }

    #[test]
    fn negative_delays_fire_immediately_and_cancel_removes() {
        let mut scheduler = SchedulerState::default();
        let (id, due) = scheduler.schedule(-5, noop());
        assert_eq!(due, 0);
        assert_eq!(scheduler.pending().len(), 1);
        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        assert!(scheduler.pending().is_empty());
    }
}
