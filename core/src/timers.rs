//! Cooperative single-shot timers advanced by the simulation clock.

use std::time::Duration;

/// Handle identifying a scheduled timer so it can be cancelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// Queue of delayed payloads that fire once the frame clock reaches them.
///
/// Nothing fires on its own: the owner calls [`Timers::advance`] once per tick
/// and acts on the payloads that became due. Superseded timers must be
/// cancelled explicitly through the handle returned by [`Timers::schedule`].
#[derive(Debug)]
pub struct Timers<T> {
    now: Duration,
    next_handle: u64,
    entries: Vec<Entry<T>>,
}

#[derive(Debug)]
struct Entry<T> {
    handle: TimerHandle,
    due: Duration,
    payload: T,
}

impl<T> Timers<T> {
    /// Creates an empty timer queue with its clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_handle: 0,
            entries: Vec::new(),
        }
    }

    /// Schedules `payload` to fire once `delay` has elapsed.
    pub fn schedule(&mut self, delay: Duration, payload: T) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        self.entries.push(Entry {
            handle,
            due: self.now.saturating_add(delay),
            payload,
        });
        handle
    }

    /// Cancels a pending timer, returning whether it was still scheduled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.handle != handle);
        self.entries.len() != before
    }

    /// Reports whether the timer is still waiting to fire.
    #[must_use]
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|entry| entry.handle == handle)
    }

    /// Number of timers waiting to fire.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no timers are waiting to fire.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Time accumulated by the queue's clock.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Advances the clock and emits every payload that became due.
    ///
    /// Payloads are emitted in due order; timers due at the same instant fire
    /// in the order they were scheduled.
    pub fn advance(&mut self, dt: Duration, out: &mut Vec<T>) {
        self.now = self.now.saturating_add(dt);

        let mut fired = Vec::new();
        let mut index = 0;
        while index < self.entries.len() {
            if self.entries[index].due <= self.now {
                fired.push(self.entries.swap_remove(index));
            } else {
                index += 1;
            }
        }

        fired.sort_by_key(|entry| (entry.due, entry.handle));
        out.extend(fired.into_iter().map(|entry| entry.payload));
    }
}

impl<T> Default for Timers<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_delay_elapses() {
        let mut timers = Timers::new();
        let handle = timers.schedule(Duration::from_secs(2), "reclaim");
        let mut fired = Vec::new();

        timers.advance(Duration::from_millis(1_500), &mut fired);
        assert!(fired.is_empty());
        assert!(timers.is_pending(handle));

        timers.advance(Duration::from_millis(500), &mut fired);
        assert_eq!(fired, vec!["reclaim"]);
        assert!(!timers.is_pending(handle));
        assert!(timers.is_empty());
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut timers = Timers::new();
        let handle = timers.schedule(Duration::from_secs(1), 1);
        assert!(timers.cancel(handle));
        assert!(!timers.cancel(handle), "second cancel is a no-op");

        let mut fired = Vec::new();
        timers.advance(Duration::from_secs(5), &mut fired);
        assert!(fired.is_empty());
    }

    #[test]
    fn emits_in_due_then_schedule_order() {
        let mut timers = Timers::new();
        let _ = timers.schedule(Duration::from_secs(3), 'c');
        let _ = timers.schedule(Duration::from_secs(1), 'a');
        let _ = timers.schedule(Duration::from_secs(1), 'b');
        let _ = timers.schedule(Duration::from_secs(9), 'z');

        let mut fired = Vec::new();
        timers.advance(Duration::from_secs(4), &mut fired);
        assert_eq!(fired, vec!['a', 'b', 'c']);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.now(), Duration::from_secs(4));
    }

    #[test]
    fn delay_is_measured_from_schedule_time() {
        let mut timers = Timers::new();
        let mut fired = Vec::new();
        timers.advance(Duration::from_secs(10), &mut fired);

        let _ = timers.schedule(Duration::from_secs(1), ());
        timers.advance(Duration::from_millis(999), &mut fired);
        assert!(fired.is_empty());
        timers.advance(Duration::from_millis(1), &mut fired);
        assert_eq!(fired.len(), 1);
    }
}
