use std::collections::VecDeque;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp};
use tracing::debug;

use super::job::{Job, JobId};
use crate::{
    core::{Clock, ProcessId, SchedCore, SimEvent, SimTime, WaitId},
    error::{Result, SimError},
    scheduler::Discipline,
};

/// Source of inter-arrival gaps and service demands.
pub trait Workload {
    // `None` ends the stream
    fn next_interarrival(&mut self, now: SimTime) -> Option<SimTime>;

    fn next_service(&mut self) -> SimTime;
}

/// Poisson arrivals with exponential service, drawn from one seeded stream.
#[derive(Debug, Clone)]
pub struct PoissonWorkload {
    rng: ChaCha8Rng,
    interarrival: Exp<f64>,
    service: Exp<f64>,
}

impl PoissonWorkload {
    pub fn new(arrival_rate: f64, service_rate: f64, seed: u64) -> Result<Self> {
        let interarrival = Exp::new(arrival_rate).map_err(|_| SimError::InvalidConfig {
            field: "arrival_rate",
            value: arrival_rate,
        })?;
        let service = Exp::new(service_rate).map_err(|_| SimError::InvalidConfig {
            field: "service_rate",
            value: service_rate,
        })?;
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            interarrival,
            service,
        })
    }
}

impl Workload for PoissonWorkload {
    fn next_interarrival(&mut self, _now: SimTime) -> Option<SimTime> {
        Some(self.interarrival.sample(&mut self.rng))
    }

    fn next_service(&mut self) -> SimTime {
        self.service.sample(&mut self.rng)
    }
}

/// Fixed `(arrival_time, duration)` list, replayed in order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedWorkload {
    arrivals: VecDeque<(SimTime, SimTime)>,
    current: Option<SimTime>,
}

impl ScriptedWorkload {
    pub fn new(arrivals: impl IntoIterator<Item = (SimTime, SimTime)>) -> Self {
        Self {
            arrivals: arrivals.into_iter().collect(),
            current: None,
        }
    }
}

impl Workload for ScriptedWorkload {
    fn next_interarrival(&mut self, now: SimTime) -> Option<SimTime> {
        let (at, duration) = self.arrivals.pop_front()?;
        self.current = Some(duration);
        Some(at - now)
    }

    fn next_service(&mut self) -> SimTime {
        self.current
            .take()
            .expect("Service requested before an arrival was scheduled")
    }
}

/// Produces arrivals until the population cap is met or the workload ends.
pub struct JobGenerator {
    workload: Box<dyn Workload>,
    population: Option<u64>,
    next_id: JobId,
    generated: u64,
    wait: Option<WaitId>,
}

impl JobGenerator {
    pub fn new(workload: Box<dyn Workload>, population: Option<u64>) -> Self {
        Self {
            workload,
            population,
            next_id: 1,
            generated: 0,
            wait: None,
        }
    }

    pub fn start(&mut self, clock: &mut Clock) -> Result<()> {
        self.schedule_next(clock)
    }

    pub fn resume<D: Discipline>(
        &mut self,
        core: &mut SchedCore<D>,
        events: &mut Vec<SimEvent>,
    ) -> Result<()> {
        let job = Job::new(self.next_id, core.now(), self.workload.next_service());
        self.next_id += 1;
        self.generated += 1;
        core.submit(job, events);

        self.schedule_next(&mut core.clock)
    }

    fn schedule_next(&mut self, clock: &mut Clock) -> Result<()> {
        self.wait = None;
        if self.population.is_some_and(|cap| self.generated >= cap) {
            debug!(generated = self.generated, "population exhausted");
            return Ok(());
        }

        let Some(delay) = self.workload.next_interarrival(clock.now()) else {
            debug!(generated = self.generated, "workload exhausted");
            return Ok(());
        };
        self.wait = Some(clock.schedule_timeout(ProcessId::Generator, delay)?);
        Ok(())
    }

    pub fn generated(&self) -> u64 {
        self.generated
    }

    pub fn is_exhausted(&self) -> bool {
        self.wait.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_delays_are_relative_to_now() {
        let mut workload = ScriptedWorkload::new([(10.0, 0.3), (12.0, 1.0)]);
        assert_eq!(workload.next_interarrival(0.0), Some(10.0));
        assert_eq!(workload.next_service(), 0.3);
        assert_eq!(workload.next_interarrival(10.0), Some(2.0));
        assert_eq!(workload.next_service(), 1.0);
        assert_eq!(workload.next_interarrival(12.0), None);
    }

    #[test]
    fn poisson_stream_is_reproducible() {
        let mut a = PoissonWorkload::new(3.8, 8.0, 42).unwrap();
        let mut b = PoissonWorkload::new(3.8, 8.0, 42).unwrap();
        for _ in 0..100 {
            assert_eq!(a.next_interarrival(0.0), b.next_interarrival(0.0));
            assert_eq!(a.next_service(), b.next_service());
        }
    }

    #[test]
    fn poisson_means_follow_rates() {
        let mut workload = PoissonWorkload::new(4.0, 8.0, 7).unwrap();
        let n = 200_000;
        let mut gaps = 0.0;
        let mut service = 0.0;
        for _ in 0..n {
            gaps += workload.next_interarrival(0.0).unwrap();
            service += workload.next_service();
        }
        assert!((gaps / n as f64 - 0.25).abs() < 0.01);
        assert!((service / n as f64 - 0.125).abs() < 0.005);
    }

    #[test]
    fn zero_population_schedules_nothing() {
        let mut clock = Clock::new();
        let mut generator =
            JobGenerator::new(Box::new(PoissonWorkload::new(1.0, 1.0, 0).unwrap()), Some(0));
        generator.start(&mut clock).unwrap();
        assert!(generator.is_exhausted());
        assert_eq!(clock.pending_len(), 0);
    }

    #[test]
    fn negative_rate_is_a_config_error() {
        assert!(matches!(
            PoissonWorkload::new(-1.0, 8.0, 0),
            Err(SimError::InvalidConfig {
                field: "arrival_rate",
                ..
            })
        ));
    }
}
