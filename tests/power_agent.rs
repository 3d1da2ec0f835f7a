mod common;

use anyhow::bail;
use arednmon::agent::source::power::{self, Meter, Power};
use arednmon::agent::{self, Agent, Output, PowerOptions, Schedule, Source, Status};
use arednmon::rrdtool::{ChartSpec, Period, Rrd};
use arednmon::Timestamp;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::{self, Duration, Instant};

// Steady readings, after `failures` failed reads
struct Bench {
    reads: Arc<AtomicUsize>,
    failures: usize,
}

impl Meter for Bench {
    fn read(&mut self, tstamp: Timestamp) -> anyhow::Result<Power> {
        if self.reads.fetch_add(1, Ordering::SeqCst) < self.failures {
            bail!("I2C bus error: NoAcknowledge");
        }
        Ok(Power {
            time: tstamp,
            current: 250.0,
            voltage: 13.2,
            power: 3300.0,
            battemp: 21.5,
            ambtemp: 19.0,
        })
    }
}

fn bench(failures: usize) -> (power::Source, Arc<AtomicUsize>) {
    let reads = Arc::new(AtomicUsize::new(0));
    let meter = Bench {
        reads: Arc::clone(&reads),
        failures,
    };
    (power::Source::new(meter), reads)
}

fn options() -> PowerOptions {
    PowerOptions {
        bus: "/dev/i2c-1".into(),
        mux_channel: None,
        request_secs: 2,
        database_secs: 30,
        chart_secs: 600,
    }
}

#[tokio::test]
async fn database_is_updated_every_thirty_seconds() {
    let dir = tempfile::tempdir().unwrap();
    let rrdtool = common::fake_rrdtool(dir.path());
    let settings = common::settings(dir.path(), &rrdtool);
    let (source, reads) = bench(0);
    let mut agent = agent::power_agent_with(&settings, &options(), source);

    let t0 = Instant::now();
    for secs in [0, 2, 4, 28, 30, 32] {
        assert_eq!(agent.step(t0 + Duration::from_secs(secs)).await, Status::Online);
    }
    assert_eq!(reads.load(Ordering::SeqCst), 6);

    let database = settings.database("powerData.rrd");
    let calls = common::rrdtool_calls(dir.path());
    assert_eq!(calls.len(), 2);
    for call in &calls {
        assert!(call.starts_with(&format!("update {} ", database.display())));
        assert!(call.ends_with(":250.00:13.20:3300.00:21.50:19.00"));
    }

    let snapshot = fs::read_to_string(settings.dynamic_dir("power").join("powerData.js")).unwrap();
    assert!(snapshot.starts_with("[{\"period\":\"600\",\"time\":\""));
    assert!(snapshot.ends_with("\"ambtemp\":\"19.00\"}]\n"));
}

fn retrying_agent(settings: &arednmon::config::Settings, source: power::Source) -> Agent {
    let dir = settings.dynamic_dir(power::SITE);
    let schedule = Schedule {
        request: Duration::from_secs(2),
        database: None,
        charts: Duration::from_secs(600),
        retries: 1,
        retry_delay: agent::RETRY_DELAY,
    };
    Agent::new(
        "power",
        Source::Power(source),
        Rrd::new(&settings.rrdtool, settings.database(power::DATABASE)),
        Output::new(dir.join(power::SNAPSHOT), None),
        schedule,
    )
}

#[tokio::test(start_paused = true)]
async fn failed_read_is_retried_after_the_delay() {
    let dir = tempfile::tempdir().unwrap();
    let rrdtool = common::fake_rrdtool(dir.path());
    let settings = common::settings(dir.path(), &rrdtool);
    let (source, reads) = bench(1);
    let mut agent = retrying_agent(&settings, source);

    let start = Instant::now();
    assert_eq!(agent.step(start).await, Status::Online);
    assert!(start.elapsed() >= agent::RETRY_DELAY);
    assert_eq!(reads.load(Ordering::SeqCst), 2);
    assert_eq!(common::rrdtool_calls(dir.path()).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn retries_are_bounded() {
    let dir = tempfile::tempdir().unwrap();
    let rrdtool = common::fake_rrdtool(dir.path());
    let settings = common::settings(dir.path(), &rrdtool);
    let (source, reads) = bench(2);
    let mut agent = retrying_agent(&settings, source);

    let start = Instant::now();
    assert_eq!(agent.step(start).await, Status::Offline);
    assert!(start.elapsed() >= agent::RETRY_DELAY);
    assert_eq!(reads.load(Ordering::SeqCst), 2);
    assert!(common::rrdtool_calls(dir.path()).is_empty());
    assert!(!settings.dynamic_dir("power").join("powerData.js").exists());
}

#[tokio::test]
async fn shutdown_removes_the_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let rrdtool = common::fake_rrdtool(dir.path());
    let settings = common::settings(dir.path(), &rrdtool);
    fs::write(settings.database("powerData.rrd"), b"").unwrap();
    let (source, _) = bench(0);
    let agent = agent::power_agent_with(&settings, &options(), source);
    let snapshot = settings.dynamic_dir("power").join("powerData.js");

    let (stop, stopped) = oneshot::channel::<()>();
    let operator = async {
        for _ in 0..100 {
            if snapshot.exists() {
                break;
            }
            time::sleep(Duration::from_millis(50)).await;
        }
        let published = snapshot.exists();
        stop.send(()).unwrap();
        published
    };
    let (result, published) = tokio::join!(
        agent.run_until(async {
            stopped.await.ok();
        }),
        operator
    );
    result.unwrap();
    assert!(published);
    assert!(!snapshot.exists());
}

#[tokio::test]
async fn chart_rendering_is_skipped_while_busy() {
    let dir = tempfile::tempdir().unwrap();
    let rrdtool = common::slow_rrdtool(dir.path());
    let settings = common::settings(dir.path(), &rrdtool);
    let (source, _) = bench(0);
    let chart = ChartSpec::stock(Period::Day, "voltage", "VOLT", "V", "Voltage");
    let mut agent = agent::power_agent_with(&settings, &options(), source)
        .with_charts(settings.dynamic_dir("power"), vec![chart]);

    assert!(agent.render_charts());
    assert!(!agent.render_charts());
    time::sleep(Duration::from_millis(1500)).await;
    assert!(agent.render_charts());
    time::sleep(Duration::from_millis(1500)).await;

    let graphs = common::rrdtool_calls(dir.path())
        .iter()
        .filter(|call| call.starts_with("graph"))
        .count();
    assert_eq!(graphs, 2);
}
