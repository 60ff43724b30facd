use crate::core::SimTime;

pub type JobId = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: JobId,
    pub arrival_time: SimTime,
    pub service_time: SimTime,
    // Full quanta served by preempted dispatches
    pub slices: u32,
    pub dispatched: bool,
}

impl Job {
    pub fn new(id: JobId, arrival_time: SimTime, service_time: SimTime) -> Self {
        Self {
            id,
            arrival_time,
            service_time,
            slices: 0,
            dispatched: false,
        }
    }

    /// Mark the job as started and return its time-to-first-dispatch, once.
    pub fn mark_dispatched(&mut self, now: SimTime) -> Option<SimTime> {
        if self.dispatched {
            return None;
        }
        self.dispatched = true;
        Some(now - self.arrival_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waiting_time_is_charged_once() {
        let mut job = Job::new(7, 2.0, 1.3);
        assert_eq!(job.mark_dispatched(2.5), Some(0.5));
        assert_eq!(job.mark_dispatched(4.0), None);
        assert!(job.dispatched);
    }
}
