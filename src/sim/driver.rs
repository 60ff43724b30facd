use tracing::{debug, info};

use super::{
    generator::{JobGenerator, PoissonWorkload, Workload},
    stats::Summary,
};
use crate::{
    config::SimConfig,
    core::{ProcessId, SchedCore, SimEvent, SimTime},
    error::Result,
    scheduler::{Discipline, RoundRobin, ServiceDiscipline},
    trace::TraceSink,
};

/// Server and job generator sharing one clock, run up to a fixed horizon.
pub struct Sim<D: Discipline> {
    pub core: SchedCore<D>,
    generator: JobGenerator,
    config: SimConfig,
    finished: bool,
}

impl Sim<RoundRobin> {
    pub fn from_config(config: SimConfig) -> Result<Self> {
        config.validate()?;
        let discipline = match config.discipline {
            ServiceDiscipline::RoundRobin => RoundRobin::new(config.quantum),
        };
        let workload =
            PoissonWorkload::new(config.arrival_rate, config.service_rate, config.seed)?;
        Self::new(discipline, Box::new(workload), config)
    }
}

impl<D: Discipline> Sim<D> {
    pub fn new(discipline: D, workload: Box<dyn Workload>, config: SimConfig) -> Result<Self> {
        config.validate()?;

        // The idle wait is nominally one full horizon long, so it never
        // fires before the run is torn down.
        let mut core = SchedCore::new(discipline, config.horizon)?;
        let mut generator = JobGenerator::new(workload, config.population);
        generator.start(&mut core.clock)?;

        debug!(
            discipline = core.server.discipline().name(),
            horizon = config.horizon,
            rho = config.traffic_intensity(),
            "simulation initialised"
        );
        Ok(Self {
            core,
            generator,
            config,
            finished: false,
        })
    }

    /// Resume the next due process and return what it did.
    pub fn step(&mut self) -> Result<Vec<SimEvent>> {
        let mut events = Vec::new();
        if self.finished {
            return Ok(events);
        }

        let Some(res) = self.core.next_due(self.config.horizon) else {
            self.core.finish(self.config.horizon);
            self.finished = true;
            return Ok(events);
        };

        match res.owner {
            ProcessId::Server => self.core.resume_server(res, &mut events)?,
            ProcessId::Generator => self.generator.resume(&mut self.core, &mut events)?,
        }
        self.core.observe(&events);
        Ok(events)
    }

    pub fn run(&mut self, sink: &mut impl TraceSink) -> Result<Summary> {
        info!(
            arrival_rate = self.config.arrival_rate,
            service_rate = self.config.service_rate,
            quantum = self.config.quantum,
            horizon = self.config.horizon,
            seed = self.config.seed,
            "starting simulation"
        );

        while !self.finished {
            for event in self.step()? {
                if let Some(record) = event.trace_record() {
                    sink.record(record)?;
                }
            }
        }

        let summary = self.summary();
        info!(
            jobs_done = summary.jobs_done,
            utilization = summary.utilization,
            "simulation finished"
        );
        Ok(summary)
    }

    pub fn summary(&self) -> Summary {
        Summary::new(
            self.core.server.stats(),
            self.generator.generated(),
            self.core.server.queue_len(),
            self.config.horizon,
            self.config.arrival_rate,
            self.config.service_rate,
        )
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn now(&self) -> SimTime {
        self.core.now()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}
