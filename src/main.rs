use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rr_model::{NullTrace, ServiceDiscipline, Sim, SimConfig, Summary, TsvTrace};

#[derive(Parser, Debug)]
#[command(name = "rr_model")]
#[command(version)]
#[command(about = "Round-robin M/M/1 queue simulator")]
struct Args {
    /// TOML file with simulation parameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// Arrival rate (lambda)
    #[arg(long)]
    arrival_rate: Option<f64>,

    /// Service rate (mu)
    #[arg(long)]
    service_rate: Option<f64>,

    /// Round-robin time slice
    #[arg(long)]
    quantum: Option<f64>,

    /// Virtual time at which the run stops
    #[arg(long)]
    horizon: Option<f64>,

    /// Maximum number of arrivals
    #[arg(long)]
    population: Option<u64>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum)]
    discipline: Option<ServiceDiscipline>,

    /// Write the queue trace (time, busy, queue length) as TSV
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn into_config(self) -> rr_model::Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => SimConfig::from_toml_file(path)?,
            None => SimConfig::default(),
        };

        if let Some(v) = self.arrival_rate {
            config.arrival_rate = v;
        }
        if let Some(v) = self.service_rate {
            config.service_rate = v;
        }
        if let Some(v) = self.quantum {
            config.quantum = v;
        }
        if let Some(v) = self.horizon {
            config.horizon = v;
        }
        if self.population.is_some() {
            config.population = self.population;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
        if let Some(v) = self.discipline {
            config.discipline = v;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let trace_path = args.trace.clone();
    let json = args.json;
    let config = args.into_config()?;

    let mut sim = Sim::from_config(config)?;
    let summary = match trace_path {
        Some(path) => {
            let mut trace = TsvTrace::new(BufWriter::new(File::create(&path)?))?;
            let summary = sim.run(&mut trace)?;
            trace.finish()?;
            summary
        }
        None => sim.run(&mut NullTrace)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &Summary) {
    println!("Arrivals               : {}", summary.jobs_done);
    println!(
        "Utilization            : {:.2}/{:.2}",
        summary.utilization, summary.traffic_intensity
    );
    println!(
        "Mean waiting time      : {}/{}",
        fmt_opt(summary.mean_waiting_time),
        fmt_opt(summary.theoretical_mean_waiting_time)
    );
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}
