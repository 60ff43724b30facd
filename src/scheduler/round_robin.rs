use std::collections::VecDeque;

use super::{Discipline, Dispatch};
use crate::{core::SimTime, sim::Job};

// Relative slack when deciding whether the remainder fits in one quantum
const SLICE_EPS: f64 = 1e-9;

/// Serve in FIFO order for at most one quantum; unfinished jobs go to the tail.
#[derive(Debug, Clone)]
pub struct RoundRobin {
    quantum: SimTime,
}

impl RoundRobin {
    pub fn new(quantum: SimTime) -> Self {
        debug_assert!(quantum > 0.0, "Quantum must be positive");
        Self { quantum }
    }

    pub fn quantum(&self) -> SimTime {
        self.quantum
    }

    // Derived from the slice count, never decremented
    pub fn remaining(&self, job: &Job) -> SimTime {
        job.service_time - f64::from(job.slices) * self.quantum
    }
}

impl Discipline for RoundRobin {
    fn name(&self) -> &'static str {
        "round_robin"
    }

    // A remaining duration of exactly one quantum is a final dispatch
    fn plan(&self, job: &Job) -> Dispatch {
        let remaining = self.remaining(job);
        let slack = SLICE_EPS * job.service_time.max(self.quantum);
        if remaining - self.quantum > slack {
            Dispatch::Preempt {
                slice: self.quantum,
            }
        } else {
            Dispatch::Complete {
                run_for: remaining.max(0.0),
            }
        }
    }

    fn requeue(&mut self, ready: &mut VecDeque<Job>, job: Job) {
        ready.push_back(job);
    }
}
