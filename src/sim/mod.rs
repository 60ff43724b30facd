pub mod driver;
pub mod generator;
pub mod job;
pub mod stats;

pub use driver::Sim;
pub use generator::{JobGenerator, PoissonWorkload, ScriptedWorkload, Workload};
pub use job::{Job, JobId};
pub use stats::{Summary, mm1_mean_wait};
