pub mod http;
pub mod power;
pub mod signal;

use crate::rrdtool::Update;
use crate::Timestamp;
use anyhow::Result;

/// One reading of a data source.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    Signal(signal::Signal),
    Power(power::Power),
}

impl Sample {
    pub fn time(&self) -> Timestamp {
        match self {
            Sample::Signal(s) => s.time,
            Sample::Power(p) => p.time,
        }
    }

    pub fn update(&self) -> Update {
        match self {
            Sample::Signal(s) => s.update(),
            Sample::Power(p) => p.update(),
        }
    }

    /// JSON snapshot for the web pages; `period` is the chart refresh
    /// interval the page advertises.
    pub fn snapshot(&self, period: u64) -> Result<String> {
        match self {
            Sample::Signal(s) => signal::snapshot(s, period),
            Sample::Power(p) => power::snapshot(p, period),
        }
    }
}

/// Outcome of one successful poll, oldest sample first.
#[derive(Debug, Default)]
pub struct Poll {
    pub raw: Option<String>,
    pub samples: Vec<Sample>,
}

pub enum Source {
    Signal(signal::Source),
    Power(power::Source),
}

impl Source {
    /// Sources returning a history of samples may repeat samples
    /// already stored in the database.
    pub fn backfills(&self) -> bool {
        matches!(self, Source::Signal(s) if s.page() == signal::Page::Json)
    }

    pub async fn poll(&self) -> Result<Poll> {
        match self {
            Source::Signal(source) => {
                let (raw, signals) = source.poll().await?;
                Ok(Poll {
                    raw: Some(raw),
                    samples: signals.into_iter().map(Sample::Signal).collect(),
                })
            }
            Source::Power(source) => {
                let power = source.poll().await?;
                Ok(Poll {
                    raw: None,
                    samples: vec![Sample::Power(power)],
                })
            }
        }
    }
}
