pub mod config;
pub mod core;
pub mod error;
pub mod scheduler;
pub mod sim;
pub mod trace;

pub use config::SimConfig;
pub use crate::core::{SimEvent, TraceRecord};
pub use error::{Result, SimError};
pub use scheduler::{Discipline, RoundRobin, ServiceDiscipline};
pub use sim::{Job, Sim, Summary};
pub use trace::{NullTrace, TraceSink, TsvTrace};
