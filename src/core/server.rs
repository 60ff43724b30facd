use std::collections::VecDeque;

use average::{Estimate, Variance};
use tracing::trace;

use super::{
    event::{SimEvent, Wake},
    state::{Clock, ProcessId, SimTime, WaitId},
};
use crate::{
    error::Result,
    scheduler::{Discipline, Dispatch},
    sim::{Job, JobId},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ServerState {
    // Ready queue was empty; suspended on a cancellable wait
    Idle {
        wait: WaitId,
        since: SimTime,
    },
    Busy {
        wait: WaitId,
        job: JobId,
        run_for: SimTime,
    },
}

#[derive(Debug, Clone)]
pub struct ServerStats {
    pub waiting_time: SimTime,
    pub idle_time: SimTime,
    pub busy_time: SimTime,
    pub jobs_done: u64,
    // Per-job time to first dispatch
    pub first_waits: Variance,
}

impl Default for ServerStats {
    fn default() -> Self {
        Self {
            waiting_time: 0.0,
            idle_time: 0.0,
            busy_time: 0.0,
            jobs_done: 0,
            first_waits: Variance::new(),
        }
    }
}

/// Single server draining its ready queue under a service discipline.
#[derive(Debug)]
pub struct Server<D: Discipline> {
    discipline: D,
    ready: VecDeque<Job>,
    state: ServerState,
    idle_timeout: SimTime,
    stats: ServerStats,
}

impl<D: Discipline> Server<D> {
    pub fn new(discipline: D, idle_timeout: SimTime, clock: &mut Clock) -> Result<Self> {
        let since = clock.now();
        let wait = clock.schedule_timeout(ProcessId::Server, idle_timeout)?;
        trace!(at = since, "server idle");
        Ok(Self {
            discipline,
            ready: VecDeque::new(),
            state: ServerState::Idle { wait, since },
            idle_timeout,
            stats: ServerStats::default(),
        })
    }

    pub fn enqueue(&mut self, job: Job) {
        self.ready.push_back(job);
    }

    pub fn idle_wait(&self) -> Option<WaitId> {
        match self.state {
            ServerState::Idle { wait, .. } => Some(wait),
            ServerState::Busy { .. } => None,
        }
    }

    pub fn resume(
        &mut self,
        clock: &mut Clock,
        wake: Wake,
        events: &mut Vec<SimEvent>,
    ) -> Result<()> {
        let now = clock.now();
        match self.state {
            ServerState::Idle { since, .. } => {
                let idle_for = now - since;
                self.stats.idle_time += idle_for;
                trace!(at = now, idle_for, ?wake, "server woken");
                events.push(SimEvent::ServerWoken {
                    at: now,
                    idle_for,
                    wake,
                });
            }
            ServerState::Busy { job, run_for, .. } => {
                debug_assert_eq!(wake, Wake::Timeout, "Dispatch waits are not cancellable");
                self.stats.busy_time += run_for;
                events.push(SimEvent::DispatchEnded {
                    job,
                    at: now,
                    busy: !self.ready.is_empty(),
                    queue_len: self.ready.len(),
                });
            }
        }

        self.schedule_next(clock, events)
    }

    fn schedule_next(&mut self, clock: &mut Clock, events: &mut Vec<SimEvent>) -> Result<()> {
        let now = clock.now();

        let Some(mut job) = self.ready.pop_front() else {
            let wait = clock.schedule_timeout(ProcessId::Server, self.idle_timeout)?;
            self.state = ServerState::Idle { wait, since: now };
            trace!(at = now, "server idle");
            events.push(SimEvent::ServerIdle { at: now });
            return Ok(());
        };

        let waited = job.mark_dispatched(now);
        if let Some(waited) = waited {
            self.stats.waiting_time += waited;
            self.stats.first_waits.add(waited);
        }

        let plan = self.discipline.plan(&job);
        let id = job.id;
        match plan {
            Dispatch::Preempt { .. } => {
                job.slices += 1;
                self.discipline.requeue(&mut self.ready, job);
            }
            Dispatch::Complete { .. } => {
                self.stats.jobs_done += 1;
            }
        }

        let run_for = plan.run_for();
        let wait = clock.schedule_timeout(ProcessId::Server, run_for)?;
        self.state = ServerState::Busy {
            wait,
            job: id,
            run_for,
        };
        trace!(at = now, job = id, run_for, last = plan.is_last(), "dispatch");
        events.push(SimEvent::DispatchStarted {
            job: id,
            at: now,
            run_for,
            waited,
            last: plan.is_last(),
        });
        Ok(())
    }

    // Horizon teardown
    pub fn reap(&mut self, now: SimTime) {
        if let ServerState::Idle { since, wait } = self.state {
            self.stats.idle_time += now - since;
            self.state = ServerState::Idle { wait, since: now };
        }
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, ServerState::Idle { .. })
    }

    pub fn queue_len(&self) -> usize {
        self.ready.len()
    }

    pub fn ready(&self) -> impl Iterator<Item = &Job> {
        self.ready.iter()
    }

    pub fn stats(&self) -> &ServerStats {
        &self.stats
    }

    pub fn discipline(&self) -> &D {
        &self.discipline
    }
}
