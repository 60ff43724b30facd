use rustc_hash::FxHashMap;

use super::{event::SimEvent, state::SimTime};
use crate::sim::JobId;

// Relative tolerance for the idle + busy == now conservation check
const CONSERVATION_EPS: f64 = 1e-6;

#[derive(Debug, Clone, Copy)]
struct InFlight {
    job: JobId,
    run_for: SimTime,
    last: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct JobLedger {
    dispatches: u32,
    charged: bool,
}

// Invariant checks over the event stream; per-job entries go once a job leaves
#[derive(Debug, Default)]
pub struct Observer {
    step: u64,
    last_at: SimTime,
    in_flight: Option<InFlight>,
    idle_time: SimTime,
    busy_time: SimTime,
    completed: u64,
    // Mirror of the server's ready queue length
    queued: usize,
    live: FxHashMap<JobId, JobLedger>,
}

impl Observer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, events: &[SimEvent]) {
        self.step += 1;

        for event in events {
            let at = event.at();
            debug_assert!(
                at >= self.last_at,
                "Event at {at} observed after {}",
                self.last_at
            );
            self.last_at = at;

            match *event {
                SimEvent::JobArrived { job, duration, .. } => {
                    debug_assert!(duration >= 0.0, "Negative service time {duration}");
                    self.queued += 1;
                    self.live.insert(job, JobLedger::default());
                }
                SimEvent::ServerIdle { .. } => {
                    debug_assert!(
                        self.in_flight.is_none(),
                        "Server went idle with a dispatch in flight"
                    );
                    debug_assert_eq!(
                        self.queued, 0,
                        "Server went idle with {} jobs queued",
                        self.queued
                    );
                }
                SimEvent::ServerWoken { idle_for, .. } => {
                    self.idle_time += idle_for;
                    self.check_conservation(at);
                }
                SimEvent::DispatchStarted {
                    job,
                    run_for,
                    waited,
                    last,
                    ..
                } => {
                    debug_assert!(
                        self.in_flight.is_none(),
                        "Job {job} dispatched while another dispatch is in flight"
                    );
                    debug_assert!(self.queued > 0, "Job {job} dispatched from an empty queue");
                    self.in_flight = Some(InFlight { job, run_for, last });

                    let ledger = self.live.entry(job).or_default();
                    ledger.dispatches += 1;
                    if let Some(waited) = waited {
                        debug_assert!(waited >= 0.0, "Job {job} waited {waited}");
                        debug_assert!(!ledger.charged, "Job {job} charged waiting time twice");
                        ledger.charged = true;
                    }
                    // Preempted jobs are requeued at once
                    if last {
                        self.queued = self.queued.saturating_sub(1);
                        self.completed += 1;
                    }
                }
                SimEvent::DispatchEnded { job, queue_len, .. } => {
                    debug_assert!(
                        self.in_flight.is_some(),
                        "Dispatch of job {job} ended but none was in flight"
                    );
                    debug_assert_eq!(queue_len, self.queued, "Queue length drifted");
                    if let Some(flight) = self.in_flight.take() {
                        debug_assert_eq!(flight.job, job, "Dispatch ended for the wrong job");
                        self.busy_time += flight.run_for;
                        self.check_conservation(at);
                        if flight.last {
                            let ledger = self.live.remove(&job);
                            debug_assert!(
                                ledger.is_some_and(|l| l.charged),
                                "Job {job} finished without a waiting charge"
                            );
                        }
                    }
                }
            }
        }
    }

    fn check_conservation(&self, at: SimTime) {
        let accounted = self.idle_time + self.busy_time;
        debug_assert!(
            (accounted - at).abs() <= CONSERVATION_EPS * at.max(1.0),
            "idle {} + busy {} != elapsed {at}",
            self.idle_time,
            self.busy_time
        );
    }

    pub fn steps(&self) -> u64 {
        self.step
    }

    // 0 once the job has left
    pub fn dispatch_count(&self, job: JobId) -> u32 {
        self.live.get(&job).map_or(0, |l| l.dispatches)
    }

    pub fn tracked_jobs(&self) -> usize {
        self.live.len()
    }

    pub fn jobs_completed(&self) -> u64 {
        self.completed
    }

    pub fn idle_time(&self) -> SimTime {
        self.idle_time
    }

    pub fn busy_time(&self) -> SimTime {
        self.busy_time
    }

    pub fn dispatch_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrived(job: JobId, at: SimTime, duration: SimTime) -> SimEvent {
        SimEvent::JobArrived { job, at, duration }
    }

    #[test]
    fn finished_jobs_are_dropped() {
        let mut observer = Observer::new();
        observer.observe(&[
            arrived(1, 0.0, 0.7),
            SimEvent::DispatchStarted {
                job: 1,
                at: 0.0,
                run_for: 0.5,
                waited: Some(0.0),
                last: false,
            },
            SimEvent::DispatchEnded {
                job: 1,
                at: 0.5,
                busy: true,
                queue_len: 1,
            },
            SimEvent::DispatchStarted {
                job: 1,
                at: 0.5,
                run_for: 0.2,
                waited: None,
                last: true,
            },
        ]);
        assert_eq!(observer.dispatch_count(1), 2);
        assert_eq!(observer.tracked_jobs(), 1);

        observer.observe(&[
            SimEvent::DispatchEnded {
                job: 1,
                at: 0.7,
                busy: false,
                queue_len: 0,
            },
            SimEvent::ServerIdle { at: 0.7 },
        ]);
        assert_eq!(observer.dispatch_count(1), 0);
        assert_eq!(observer.tracked_jobs(), 0);
        assert_eq!(observer.jobs_completed(), 1);
        assert!((observer.busy_time() - 0.7).abs() < 1e-12);
        assert!(!observer.dispatch_in_flight());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "charged waiting time twice")]
    fn double_charge_is_caught() {
        let mut observer = Observer::new();
        observer.observe(&[arrived(3, 0.0, 2.0)]);
        for at in [0.0, 0.5] {
            observer.observe(&[
                SimEvent::DispatchStarted {
                    job: 3,
                    at,
                    run_for: 0.5,
                    waited: Some(0.0),
                    last: false,
                },
                SimEvent::DispatchEnded {
                    job: 3,
                    at: at + 0.5,
                    busy: true,
                    queue_len: 1,
                },
            ]);
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "went idle with 1 jobs queued")]
    fn idle_with_waiting_job_is_caught() {
        let mut observer = Observer::new();
        observer.observe(&[arrived(1, 2.0, 0.3), SimEvent::ServerIdle { at: 2.0 }]);
    }
}
