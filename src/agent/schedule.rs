use tokio::time::{Duration, Instant};

/// Cadence of one agent.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub request: Duration,          // polling the source
    pub database: Option<Duration>, // None: every successful poll
    pub charts: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
}

/// A periodic chore driven from the agent's main loop.
#[derive(Debug)]
pub struct Every {
    period: Duration,
    last: Option<Instant>,
}

impl Every {
    pub fn new(period: Duration) -> Self {
        Self { period, last: None }
    }

    pub fn due(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.period => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
