use std::cmp::Ordering;

use crate::core::{ProcessId, SimTime, WaitId};
use crate::sim::JobId;

/// Ordering key for pending events: time, then process, then scheduling order.
#[derive(Debug, Clone, Copy)]
pub struct EventKey {
    pub time: SimTime,
    pub owner: ProcessId,
    pub sequence: u64,
}

impl PartialEq for EventKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EventKey {}

// KeyedPriorityQueue is a max-heap, so the earliest key must compare greatest
impl PartialOrd for EventKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.owner.cmp(&self.owner))
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Timeout,
    Interrupted,
}

#[derive(Debug, Clone, Copy)]
pub struct Resumption {
    pub owner: ProcessId,
    pub wait: WaitId,
    pub wake: Wake,
    pub at: SimTime,
}

/// One row of the queue trace, emitted after every dispatch step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceRecord {
    pub time: SimTime,
    pub busy: bool,
    pub queue_len: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    JobArrived {
        job: JobId,
        at: SimTime,
        duration: SimTime,
    },
    ServerIdle {
        at: SimTime,
    },
    ServerWoken {
        at: SimTime,
        idle_for: SimTime,
        wake: Wake,
    },
    DispatchStarted {
        job: JobId,
        at: SimTime,
        run_for: SimTime,
        // Some only on the job's first dispatch
        waited: Option<SimTime>,
        last: bool,
    },
    DispatchEnded {
        job: JobId,
        at: SimTime,
        busy: bool,
        queue_len: usize,
    },
}

impl SimEvent {
    pub fn at(&self) -> SimTime {
        match *self {
            Self::JobArrived { at, .. }
            | Self::ServerIdle { at }
            | Self::ServerWoken { at, .. }
            | Self::DispatchStarted { at, .. }
            | Self::DispatchEnded { at, .. } => at,
        }
    }

    pub fn trace_record(&self) -> Option<TraceRecord> {
        match *self {
            Self::DispatchEnded {
                at,
                busy,
                queue_len,
                ..
            } => Some(TraceRecord {
                time: at,
                busy,
                queue_len,
            }),
            _ => None,
        }
    }
}
