// Polling agents: fetch a data source, store the samples in a round
// robin database, publish a snapshot for the web pages and refresh the
// charts. Every data source runs through the same loop.

pub mod output;
pub mod schedule;
pub mod source;
pub mod status;

pub use output::Output;
pub use schedule::{Every, Schedule};
pub use source::{Poll, Sample, Source};
pub use status::{NodeStatus, Status};

use crate::config::Settings;
use crate::rrdtool::{ChartSpec, Rrd, Update};
use anyhow::{bail, Context, Result};
use source::{power, signal};
use std::fs;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

// consecutive failed requests tolerated before going offline
const MAX_FAILED_REQUESTS: u32 = 0;
pub const RETRY_DELAY: Duration = Duration::from_secs(5);

pub struct Agent {
    label: &'static str,
    source: Source,
    rrd: Rrd,
    output: Output,
    schedule: Schedule,
    charts: Arc<Vec<ChartSpec>>,
    charts_dir: PathBuf,
    period: u64,
    status: NodeStatus,
    database: Option<Every>,
    renderer: Option<JoinHandle<()>>,
}

impl Agent {
    /// `label` names the data source in the log and is also the
    /// `create-rrd` argument for its database.
    pub fn new(label: &'static str, source: Source, rrd: Rrd, output: Output, schedule: Schedule) -> Self {
        let charts_dir = output
            .snapshot()
            .parent()
            .map(PathBuf::from)
            .unwrap_or_default();
        Self {
            label,
            source,
            rrd,
            output,
            database: schedule.database.map(Every::new),
            period: schedule.charts.as_secs(),
            schedule,
            charts: Arc::new(Vec::new()),
            charts_dir,
            status: NodeStatus::new(label, MAX_FAILED_REQUESTS),
            renderer: None,
        }
    }

    pub fn with_charts(mut self, dir: PathBuf, charts: Vec<ChartSpec>) -> Self {
        self.charts_dir = dir;
        self.charts = Arc::new(charts);
        self
    }

    /// Refresh interval advertised in the snapshot, in the unit the web
    /// page expects.
    pub fn with_period(mut self, period: u64) -> Self {
        self.period = period;
        self
    }

    pub fn is_online(&self) -> bool {
        self.status.is_online()
    }

    async fn poll(&self) -> Result<Poll> {
        let mut attempt = 0;
        loop {
            match self.source.poll().await {
                Ok(poll) => return Ok(poll),
                Err(e) if attempt < self.schedule.retries => {
                    attempt += 1;
                    warn!("{} request failed: {:#}, retrying", self.label, e);
                    time::sleep(self.schedule.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Polls the source once, stores the new samples when the database
    /// is due and writes the snapshot of the newest sample.
    pub async fn cycle(&mut self, now: Instant) -> Result<()> {
        let poll = self.poll().await?;
        let latest = match poll.samples.last() {
            Some(sample) => sample,
            None => bail!("{} returned no data", self.label),
        };
        let store = match self.database.as_mut() {
            Some(every) => every.due(now),
            None => true,
        };
        if store {
            let mut fresh: Vec<&Sample> = poll.samples.iter().collect();
            if self.source.backfills() {
                if let Some(last) = self.rrd.last_update().await? {
                    fresh.retain(|s| s.time().timestamp() > last);
                }
            }
            let updates: Vec<Update> = fresh.iter().map(|s| s.update()).collect();
            self.rrd.update(&updates).await?;
        }
        self.output
            .write(&latest.snapshot(self.period)?, poll.raw.as_deref())?;
        Ok(())
    }

    /// One request tick: a cycle plus the online/offline bookkeeping.
    /// Output files are removed while the source is offline.
    pub async fn step(&mut self, now: Instant) -> Status {
        let result = self.cycle(now).await;
        if let Err(e) = &result {
            error!("{} update failed: {:#}", self.label, e);
        }
        let status = self.status.record(result.is_ok());
        if status == Status::Offline {
            self.output.remove();
        }
        status
    }

    /// Renders every chart in a background task, unless the previous
    /// rendering has not finished yet. Returns whether a rendering started.
    pub fn render_charts(&mut self) -> bool {
        if let Some(task) = &self.renderer {
            if !task.is_finished() {
                warn!("{} charts still rendering, skipping", self.label);
                return false;
            }
        }
        let rrd = self.rrd.clone();
        let charts = Arc::clone(&self.charts);
        let dir = self.charts_dir.clone();
        self.renderer = Some(tokio::spawn(async move {
            for chart in charts.iter() {
                if let Err(e) = rrd.graph(chart, &dir).await {
                    warn!("chart {}: {:#}", chart.file_name, e);
                }
            }
            debug!("rendered {} charts", charts.len());
        }));
        true
    }

    /// Runs until Ctrl-C or SIGTERM.
    pub async fn run(self) -> Result<()> {
        self.run_until(shutdown()).await
    }

    pub async fn run_until(mut self, shutdown: impl Future<Output = ()>) -> Result<()> {
        info!("{} agent starting up", self.label);
        if !self.rrd.exists() {
            bail!(
                "database {} not found, run 'arednmon create-rrd {}' first",
                self.rrd.path().display(),
                self.label
            );
        }
        fs::create_dir_all(&self.charts_dir)
            .with_context(|| format!("create {}", self.charts_dir.display()))?;
        if let Some(dir) = self.output.snapshot().parent() {
            fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }

        let mut requests = time::interval(self.schedule.request);
        requests.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut charts = time::interval(self.schedule.charts);
        charts.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                now = requests.tick() => {
                    self.step(now).await;
                }
                _ = charts.tick() => {
                    self.render_charts();
                }
            }
        }
        self.output.remove();
        info!("{} agent terminating", self.label);
        Ok(())
    }
}

async fn shutdown() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => (),
                _ = term.recv() => (),
            }
        }
        Err(e) => {
            warn!("cannot listen for SIGTERM: {e}");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

pub struct SignalOptions {
    pub page: signal::Page,
    pub url: Option<String>,
    pub request_minutes: Option<u64>,
    pub chart_minutes: Option<u64>,
    pub relay: bool,
}

pub struct PowerOptions {
    pub bus: String,
    pub mux_channel: Option<u8>,
    pub request_secs: u64,
    pub database_secs: u64,
    pub chart_secs: u64,
}

/// Signal agent on the deployment layout. The JSON page keeps a day of
/// history, so it is polled hourly and every poll backfills the minutes
/// since the previous one.
pub fn signal_agent(settings: &Settings, options: SignalOptions) -> Result<Agent> {
    let (request, charts, retries) = match options.page {
        signal::Page::Json => {
            let request = options.request_minutes.unwrap_or(60).max(1);
            (request, options.chart_minutes.unwrap_or(request), 1)
        }
        signal::Page::Status => (
            options.request_minutes.unwrap_or(1).max(1),
            options.chart_minutes.unwrap_or(10),
            0,
        ),
    };
    let url = options
        .url
        .unwrap_or_else(|| options.page.default_url().to_string());
    info!("signal source {url}, every {request} min, charts every {charts} min");
    let source = signal::Source::new(options.page, &url, request as usize)?;
    let dir = settings.dynamic_dir(signal::SITE);
    let relay = options.relay.then(|| dir.join(signal::RELAY));
    let schedule = Schedule {
        request: Duration::from_secs(request * 60),
        database: None,
        charts: Duration::from_secs(charts.max(1) * 60),
        retries,
        retry_delay: RETRY_DELAY,
    };
    let agent = Agent::new(
        "signal",
        Source::Signal(source),
        Rrd::new(&settings.rrdtool, settings.database(signal::DATABASE)),
        Output::new(dir.join(signal::SNAPSHOT), relay),
        schedule,
    )
    .with_charts(dir, signal::charts(options.page))
    .with_period(charts);
    Ok(agent)
}

pub fn power_agent(settings: &Settings, options: PowerOptions) -> Result<Agent> {
    let source = power::Source::open(&options.bus, options.mux_channel)?;
    Ok(power_agent_with(settings, &options, source))
}

/// Power agent reading `source` instead of the bus named in `options`.
pub fn power_agent_with(settings: &Settings, options: &PowerOptions, source: power::Source) -> Agent {
    let dir = settings.dynamic_dir(power::SITE);
    let schedule = Schedule {
        request: Duration::from_secs(options.request_secs.max(1)),
        database: Some(Duration::from_secs(options.database_secs)),
        charts: Duration::from_secs(options.chart_secs.max(1)),
        retries: 0,
        retry_delay: RETRY_DELAY,
    };
    Agent::new(
        "power",
        Source::Power(source),
        Rrd::new(&settings.rrdtool, settings.database(power::DATABASE)),
        Output::new(dir.join(power::SNAPSHOT), None),
        schedule,
    )
    .with_charts(dir, power::charts())
    .with_period(options.chart_secs)
}
