pub mod round_robin;

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{core::SimTime, sim::Job};
pub use round_robin::RoundRobin;

/// How much service the head job receives on one dispatch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dispatch {
    // Runs for `slice`, then goes back to the ready queue
    Preempt { slice: SimTime },
    // Runs to completion and leaves the system
    Complete { run_for: SimTime },
}

impl Dispatch {
    pub fn run_for(&self) -> SimTime {
        match *self {
            Self::Preempt { slice } => slice,
            Self::Complete { run_for } => run_for,
        }
    }

    pub fn is_last(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }
}

/// Discipline selector. Only round robin is implemented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ServiceDiscipline {
    #[default]
    RoundRobin,
}

pub trait Discipline {
    fn name(&self) -> &'static str;

    fn plan(&self, job: &Job) -> Dispatch;

    fn requeue(&mut self, ready: &mut VecDeque<Job>, job: Job);
}
