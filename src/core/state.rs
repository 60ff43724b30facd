use keyed_priority_queue::KeyedPriorityQueue;
use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};

use super::event::{EventKey, Resumption, Wake};
use crate::error::{Result, SimError};

pub type SimTime = f64;

new_key_type! {
    pub struct WaitId;
}

// Declaration order is the resumption order at equal times
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProcessId {
    Server,
    Generator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    Pending,
    Fired,
    Cancelled,
}

#[derive(Debug)]
pub struct Wait {
    pub owner: ProcessId,
    pub state: WaitState,
    pub started: SimTime,
    pub deadline: SimTime,
}

/// Virtual clock plus the set of pending timed waits.
#[derive(Debug)]
pub struct Clock {
    now: SimTime,
    pending: KeyedPriorityQueue<WaitId, EventKey>,
    waits: SlotMap<WaitId, Wait>,
    // Most recent wait per process; retired on the next suspension
    latest: FxHashMap<ProcessId, WaitId>,

    // Increment upon scheduling
    sequence: u64,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            pending: KeyedPriorityQueue::new(),
            waits: SlotMap::with_key(),
            latest: FxHashMap::default(),
            sequence: 0,
        }
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn schedule_timeout(&mut self, owner: ProcessId, delay: SimTime) -> Result<WaitId> {
        if delay.is_nan() || delay < 0.0 {
            return Err(SimError::InvalidDelay(delay));
        }

        let deadline = self.now + delay;
        let id = self.waits.insert(Wait {
            owner,
            state: WaitState::Pending,
            started: self.now,
            deadline,
        });

        if let Some(prev) = self.latest.insert(owner, id) {
            let retired = self.waits.remove(prev);
            debug_assert!(
                retired.is_none_or(|w| w.state != WaitState::Pending),
                "{owner:?} suspended twice without resuming"
            );
        }

        let key = self.next_key(deadline, owner);
        self.pending.push(id, key);
        Ok(id)
    }

    // Re-keys a pending wait to now; anything else is left alone
    pub fn interrupt(&mut self, wait_id: WaitId) -> bool {
        let Some(wait) = self.waits.get_mut(wait_id) else {
            return false;
        };
        if wait.state != WaitState::Pending {
            return false;
        }

        wait.state = WaitState::Cancelled;
        let owner = wait.owner;
        let removed = self.pending.remove(&wait_id);
        debug_assert!(removed.is_some(), "Pending wait missing from event queue");

        let key = self.next_key(self.now, owner);
        self.pending.push(wait_id, key);
        true
    }

    pub fn wait_state(&self, wait_id: WaitId) -> Option<WaitState> {
        self.waits.get(wait_id).map(|w| w.state)
    }

    pub fn is_triggered(&self, wait_id: WaitId) -> bool {
        self.wait_state(wait_id) != Some(WaitState::Pending)
    }

    pub fn wait(&self, wait_id: WaitId) -> Option<&Wait> {
        self.waits.get(wait_id)
    }

    // Strictly before `until`
    pub fn next_due(&mut self, until: SimTime) -> Option<Resumption> {
        let (_, key) = self.pending.peek()?;
        if key.time >= until {
            return None;
        }

        let (wait_id, key) = self.pending.pop()?;
        debug_assert!(
            key.time >= self.now,
            "Clock moved backwards: now={}, event={}",
            self.now,
            key.time
        );
        self.now = key.time;

        let wait = self
            .waits
            .get_mut(wait_id)
            .expect("Queued event missing its wait");
        let wake = match wait.state {
            WaitState::Pending => {
                wait.state = WaitState::Fired;
                Wake::Timeout
            }
            WaitState::Cancelled => Wake::Interrupted,
            WaitState::Fired => unreachable!("Wait {wait_id:?} fired twice"),
        };

        Some(Resumption {
            owner: wait.owner,
            wait: wait_id,
            wake,
            at: self.now,
        })
    }

    pub fn advance_to(&mut self, time: SimTime) {
        debug_assert!(time >= self.now, "Cannot move clock backwards");
        self.now = self.now.max(time);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn next_key(&mut self, time: SimTime, owner: ProcessId) -> EventKey {
        let sequence = self.sequence;
        self.sequence += 1;
        EventKey {
            time,
            owner,
            sequence,
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_resume_in_time_order() {
        let mut clock = Clock::new();
        clock.schedule_timeout(ProcessId::Generator, 2.0).unwrap();
        clock.schedule_timeout(ProcessId::Server, 1.0).unwrap();

        let first = clock.next_due(f64::INFINITY).unwrap();
        assert_eq!(first.owner, ProcessId::Server);
        assert_eq!(first.wake, Wake::Timeout);
        assert_eq!(clock.now(), 1.0);

        let second = clock.next_due(f64::INFINITY).unwrap();
        assert_eq!(second.owner, ProcessId::Generator);
        assert_eq!(clock.now(), 2.0);
        assert!(clock.next_due(f64::INFINITY).is_none());
    }

    #[test]
    fn server_resumes_before_generator_at_same_instant() {
        let mut clock = Clock::new();
        clock.schedule_timeout(ProcessId::Generator, 1.0).unwrap();
        clock.schedule_timeout(ProcessId::Server, 1.0).unwrap();

        assert_eq!(clock.next_due(10.0).unwrap().owner, ProcessId::Server);
        assert_eq!(clock.next_due(10.0).unwrap().owner, ProcessId::Generator);
    }

    #[test]
    fn interrupt_wakes_owner_now() {
        let mut clock = Clock::new();
        let idle = clock.schedule_timeout(ProcessId::Server, 100.0).unwrap();
        clock.schedule_timeout(ProcessId::Generator, 3.0).unwrap();

        let arrival = clock.next_due(50.0).unwrap();
        assert_eq!(arrival.owner, ProcessId::Generator);
        assert!(clock.interrupt(idle));
        assert_eq!(clock.wait_state(idle), Some(WaitState::Cancelled));

        let woken = clock.next_due(50.0).unwrap();
        assert_eq!(woken.wait, idle);
        assert_eq!(woken.wake, Wake::Interrupted);
        assert_eq!(woken.at, 3.0);
    }

    #[test]
    fn interrupting_a_resolved_wait_is_a_no_op() {
        let mut clock = Clock::new();
        let wait = clock.schedule_timeout(ProcessId::Server, 1.0).unwrap();
        clock.next_due(5.0).unwrap();

        assert_eq!(clock.wait_state(wait), Some(WaitState::Fired));
        assert!(clock.is_triggered(wait));
        assert!(!clock.interrupt(wait));
        assert_eq!(clock.pending_len(), 0);
    }

    #[test]
    fn double_interrupt_is_a_no_op() {
        let mut clock = Clock::new();
        let wait = clock.schedule_timeout(ProcessId::Server, 10.0).unwrap();

        assert!(clock.interrupt(wait));
        assert!(!clock.interrupt(wait));
        assert_eq!(clock.pending_len(), 1);
    }

    #[test]
    fn retired_wait_reports_triggered() {
        let mut clock = Clock::new();
        let first = clock.schedule_timeout(ProcessId::Server, 1.0).unwrap();
        clock.next_due(5.0).unwrap();
        clock.schedule_timeout(ProcessId::Server, 1.0).unwrap();

        assert_eq!(clock.wait_state(first), None);
        assert!(clock.is_triggered(first));
        assert!(!clock.interrupt(first));
    }

    #[test]
    fn events_at_or_after_limit_are_left_pending() {
        let mut clock = Clock::new();
        clock.schedule_timeout(ProcessId::Generator, 5.0).unwrap();

        assert!(clock.next_due(5.0).is_none());
        assert_eq!(clock.pending_len(), 1);
        assert_eq!(clock.now(), 0.0);
    }

    #[test]
    fn negative_delay_is_rejected() {
        let mut clock = Clock::new();
        assert!(matches!(
            clock.schedule_timeout(ProcessId::Server, -0.5),
            Err(SimError::InvalidDelay(_))
        ));
        assert!(matches!(
            clock.schedule_timeout(ProcessId::Server, f64::NAN),
            Err(SimError::InvalidDelay(_))
        ));
    }

    #[test]
    fn zero_delay_resumes_at_current_time() {
        let mut clock = Clock::new();
        clock.schedule_timeout(ProcessId::Server, 0.0).unwrap();
        let resumed = clock.next_due(1.0).unwrap();
        assert_eq!(resumed.at, 0.0);
    }
}
