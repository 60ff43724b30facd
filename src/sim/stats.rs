use serde::Serialize;

use crate::core::{ServerStats, SimTime};

/// End-of-run counters plus the M/M/1 figures they are compared against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub arrivals: u64,
    pub jobs_done: u64,
    pub queued_at_end: usize,
    pub idle_time: SimTime,
    pub busy_time: SimTime,
    pub waiting_time: SimTime,
    pub waiting_time_stddev: Option<f64>,
    pub horizon: SimTime,
    pub arrival_rate: f64,
    pub service_rate: f64,
    pub traffic_intensity: f64,
    pub utilization: f64,
    pub mean_waiting_time: Option<SimTime>,
    pub theoretical_mean_waiting_time: Option<SimTime>,
}

impl Summary {
    pub fn new(
        stats: &ServerStats,
        arrivals: u64,
        queued_at_end: usize,
        horizon: SimTime,
        arrival_rate: f64,
        service_rate: f64,
    ) -> Self {
        let rho = arrival_rate / service_rate;
        let mean_waiting_time =
            (stats.jobs_done > 0).then(|| stats.waiting_time / stats.jobs_done as f64);
        let waiting_time_stddev =
            (stats.first_waits.len() > 1).then(|| stats.first_waits.sample_variance().sqrt());

        Self {
            arrivals,
            jobs_done: stats.jobs_done,
            queued_at_end,
            idle_time: stats.idle_time,
            busy_time: stats.busy_time,
            waiting_time: stats.waiting_time,
            waiting_time_stddev,
            horizon,
            arrival_rate,
            service_rate,
            traffic_intensity: rho,
            utilization: 1.0 - stats.idle_time / horizon,
            mean_waiting_time,
            theoretical_mean_waiting_time: mm1_mean_wait(arrival_rate, service_rate),
        }
    }
}

/// Mean time to first service in a stable M/M/1 queue, `ρ²/((1−ρ)λ)`.
pub fn mm1_mean_wait(arrival_rate: f64, service_rate: f64) -> Option<SimTime> {
    let rho = arrival_rate / service_rate;
    (rho < 1.0).then(|| rho * rho / ((1.0 - rho) * arrival_rate))
}
