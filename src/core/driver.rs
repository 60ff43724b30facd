use tracing::{debug, trace};

use super::{
    event::{Resumption, SimEvent},
    observer::Observer,
    server::Server,
    state::{Clock, ProcessId, SimTime},
};
use crate::{error::Result, scheduler::Discipline, sim::Job};

pub struct SchedCore<D: Discipline> {
    pub clock: Clock,
    pub server: Server<D>,
    observer: Observer,
}

impl<D: Discipline> SchedCore<D> {
    pub fn new(discipline: D, idle_timeout: SimTime) -> Result<Self> {
        let mut clock = Clock::new();
        let server = Server::new(discipline, idle_timeout, &mut clock)?;
        Ok(Self {
            clock,
            server,
            observer: Observer::new(),
        })
    }

    /// Hand a freshly arrived job to the server, waking it if it is idle.
    pub fn submit(&mut self, job: Job, events: &mut Vec<SimEvent>) {
        let now = self.clock.now();
        trace!(at = now, job = job.id, duration = job.service_time, "job arrived");
        events.push(SimEvent::JobArrived {
            job: job.id,
            at: now,
            duration: job.service_time,
        });
        self.server.enqueue(job);

        if let Some(wait) = self.server.idle_wait() {
            if !self.clock.is_triggered(wait) {
                let interrupted = self.clock.interrupt(wait);
                debug_assert!(interrupted, "Pending idle wait refused interrupt");
            }
        }
    }

    pub fn next_due(&mut self, until: SimTime) -> Option<Resumption> {
        self.clock.next_due(until)
    }

    pub fn resume_server(&mut self, res: Resumption, events: &mut Vec<SimEvent>) -> Result<()> {
        debug_assert_eq!(res.owner, ProcessId::Server);
        self.server.resume(&mut self.clock, res.wake, events)
    }

    pub fn observe(&mut self, events: &[SimEvent]) {
        self.observer.observe(events);
    }

    // Clock lands exactly on the horizon
    pub fn finish(&mut self, horizon: SimTime) {
        self.clock.advance_to(horizon);
        self.server.reap(horizon);
        debug!(
            at = horizon,
            pending = self.clock.pending_len(),
            queued = self.server.queue_len(),
            "simulation torn down"
        );
    }

    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }
}
