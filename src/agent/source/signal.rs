// AREDN node signal quality.
//
// Older firmware publishes a day worth of one minute data points as JSON
// (cgi-bin/signal.json); newer firmware only shows the current
// signal/noise/ratio on the status page (cgi-bin/status).

use super::http::Fetcher;
use crate::rrdtool::{ChartSpec, DatabaseSpec, Period, Update};
use crate::{local_time, Timestamp, SNAPSHOT_DATE};
use anyhow::{bail, Context, Result};
use chrono::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

pub const SITE: &str = "arednsig";
pub const DATABASE: &str = "arednsigData.rrd";
pub const SNAPSHOT: &str = "nodeOnline.js";
pub const RELAY: &str = "arednsigOutputData.js";

pub const DEFAULT_JSON_URL: &str = "http://localnode:8080/cgi-bin/signal.json";
pub const DEFAULT_STATUS_URL: &str = "http://localnode:8080/cgi-bin/status";

const STATUS_SNR: &str =
    r"Signal/Noise/Ratio</nobr></th>\s*<td[^>]*>\s*<nobr>\s*<big>\s*<b>([^<]*?)dB";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Json,
    Status,
}

impl Page {
    pub fn default_url(&self) -> &'static str {
        match self {
            Page::Json => DEFAULT_JSON_URL,
            Page::Status => DEFAULT_STATUS_URL,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub time: Timestamp,
    pub signal: i64, // dBm
    pub noise: i64,  // dBm
    pub snr: i64,    // dB
    pub rx_mcs: i64,
    pub tx_mcs: i64,
    pub rx_rate: i64, // Mbps
    pub tx_rate: i64, // Mbps
}

impl Signal {
    pub fn update(&self) -> Update {
        let values = [
            self.signal,
            self.noise,
            self.snr,
            self.rx_mcs,
            self.tx_mcs,
            self.rx_rate,
            self.tx_rate,
        ];
        Update::new(
            self.time.timestamp(),
            values.iter().map(i64::to_string).collect(),
        )
    }
}

// One point of signal.json, e.g.
// {"tx_mcs":"15","rx_mcs":"15","m":47,"label":"01/10/2020 22:17:01",
//  "rx_rate":"130","y":[-48,-95],"x":1578694621000,"tx_rate":"130"}
#[derive(Deserialize, Debug)]
struct DataPoint {
    x: Value,
    y: Vec<Value>,
    m: Value,
    rx_mcs: Value,
    tx_mcs: Value,
    rx_rate: Value,
    tx_rate: Value,
}

// Numbers may come quoted, and are "N/A" right after the node powers on
fn integer(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}

impl DataPoint {
    fn convert(&self) -> Option<Signal> {
        let millis = integer(&self.x)?;
        Some(Signal {
            time: Utc.timestamp_opt(millis / 1000, 0).single()?,
            signal: integer(self.y.first()?)?,
            noise: integer(self.y.get(1)?)?,
            snr: integer(&self.m)?,
            rx_mcs: integer(&self.rx_mcs)?,
            tx_mcs: integer(&self.tx_mcs)?,
            rx_rate: integer(&self.rx_rate)?,
            tx_rate: integer(&self.tx_rate)?,
        })
    }
}

/// Decodes the last `trail` data points of a signal.json response.
/// Points that cannot be converted are discarded.
pub fn decode_json(content: &str, trail: usize) -> Result<Vec<Signal>> {
    // the node wraps the array of points in one more pair of delimiters
    let inner = content
        .char_indices()
        .nth(1)
        .and_then(|(begin, _)| content.char_indices().last().map(|(end, _)| (begin, end)))
        .filter(|(begin, end)| begin <= end)
        .map(|(begin, end)| &content[begin..end])
        .unwrap_or_default();
    let points: Vec<Value> = match serde_json::from_str(inner) {
        Ok(points) => points,
        Err(_) => serde_json::from_str(content).context("parse signal data")?,
    };
    let from = points.len().saturating_sub(trail);
    if points.len() - from < trail {
        debug!("only {} data points available", points.len() - from);
    }
    let mut signals = Vec::with_capacity(points.len() - from);
    for point in points[from..].iter() {
        let converted = serde_json::from_value::<DataPoint>(point.clone())
            .ok()
            .and_then(|p| p.convert());
        match converted {
            Some(signal) => signals.push(signal),
            None => warn!("discarding data point {point}"),
        }
    }
    if signals.is_empty() {
        bail!("convert data failed: no usable data points");
    }
    debug!("parse successful: {} data points", signals.len());
    Ok(signals)
}

/// Scrapes "signal / noise / ratio dB" from the node status page.
pub fn decode_status(content: &str, tstamp: Timestamp) -> Result<Signal> {
    let re = Regex::new(STATUS_SNR)?;
    let found = match re.captures(content) {
        Some(result) => result[1].replace(' ', ""),
        None => bail!("signal data not found in status page"),
    };
    let fields: Vec<&str> = found.split('/').collect();
    if fields.len() != 3 {
        bail!("unexpected signal data '{found}'");
    }
    let parse = |s: &str| {
        s.parse::<i64>()
            .with_context(|| format!("signal data '{found}'"))
    };
    Ok(Signal {
        time: tstamp,
        signal: parse(fields[0])?,
        noise: parse(fields[1])?,
        snr: parse(fields[2])?,
        rx_mcs: 0,
        tx_mcs: 0,
        rx_rate: 0,
        tx_rate: 0,
    })
}

#[derive(Serialize, Debug)]
struct Snapshot {
    date: String,
    period: String,
}

pub fn snapshot(latest: &Signal, period: u64) -> Result<String> {
    let snapshot = Snapshot {
        date: local_time(&latest.time, SNAPSHOT_DATE),
        period: period.to_string(),
    };
    Ok(serde_json::to_string(&[snapshot])?)
}

pub struct Source {
    page: Page,
    fetcher: Fetcher,
    trail: usize,
}

impl Source {
    /// `trail` is the number of one minute data points wanted per poll.
    pub fn new(page: Page, url: &str, trail: usize) -> Result<Self> {
        Ok(Self {
            page,
            fetcher: Fetcher::new(url)?,
            trail,
        })
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub async fn poll(&self) -> Result<(String, Vec<Signal>)> {
        let content = self.fetcher.fetch().await?;
        let signals = match self.page {
            Page::Json => decode_json(&content, self.trail)?,
            Page::Status => vec![decode_status(&content, Utc::now())?],
        };
        Ok((content, signals))
    }
}

pub fn database() -> DatabaseSpec {
    DatabaseSpec::new(
        60,
        370,
        96,
        &["S", "N", "SNR", "RX_MCS", "TX_MCS", "RX_RATE", "TX_RATE"],
    )
}

/// Noise, MCS and rates hardly vary, so status page charts stick to
/// signal strength and signal to noise ratio.
pub fn charts(page: Page) -> Vec<ChartSpec> {
    let mut items = vec![("signal", "S", "dBm", "RSSI"), ("snr", "SNR", "dB", "SNR")];
    if page == Page::Json {
        items.extend([
            ("noise", "N", "dBm", "Noise"),
            ("rx_rate", "RX_RATE", "Mbps", "Rx Rate"),
            ("tx_rate", "TX_RATE", "Mbps", "Tx Rate"),
        ]);
    }
    let mut charts = Vec::with_capacity(items.len() * Period::ALL.len());
    for period in Period::ALL {
        for (name, ds, label, title) in items.iter() {
            charts.push(ChartSpec::stock(period, name, ds, label, title));
        }
    }
    charts
}

#[cfg(test)]
mod tests {
    use super::*;

    const POINT_1: &str = r#"{"tx_mcs":"15","rx_mcs":"15","m":47,"label":"01/10/2020 22:17:01","rx_rate":"130","y":[-48,-95],"x":1578694621000,"tx_rate":"130"}"#;
    const POINT_2: &str = r#"{"tx_mcs":"7","rx_mcs":"6","m":40,"label":"01/10/2020 22:18:01","rx_rate":"65","y":[-55,-95],"x":1578694681000,"tx_rate":"58.5"}"#;
    const POINT_NA: &str = r#"{"tx_mcs":"N/A","rx_mcs":"N/A","m":"N/A","label":"01/10/2020 22:19:01","rx_rate":"N/A","y":["N/A","N/A"],"x":1578694741000,"tx_rate":"N/A"}"#;

    #[test]
    fn json_points_are_converted() {
        let content = format!("[[{POINT_1},{POINT_2}]]");
        let signals = decode_json(&content, 60).unwrap();
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].time.timestamp(), 1578694621);
        assert_eq!(signals[0].signal, -48);
        assert_eq!(signals[0].noise, -95);
        assert_eq!(signals[0].snr, 47);
        assert_eq!(signals[1].tx_rate, 58);
        assert_eq!(
            signals[0].update().values,
            vec!["-48", "-95", "47", "15", "15", "130", "130"]
        );
    }

    #[test]
    fn json_keeps_only_the_trail() {
        let content = format!("[[{POINT_1},{POINT_2}]]");
        let signals = decode_json(&content, 1).unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].signal, -55);
    }

    #[test]
    fn json_unwrapped_array_is_accepted() {
        let content = format!("[{POINT_1}]");
        assert_eq!(decode_json(&content, 60).unwrap().len(), 1);
    }

    #[test]
    fn unavailable_points_are_discarded() {
        let content = format!("[[{POINT_1},{POINT_NA}]]");
        assert_eq!(decode_json(&content, 60).unwrap().len(), 1);
        let content = format!("[[{POINT_NA}]]");
        assert!(decode_json(&content, 60).is_err());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(decode_json("<html>oops</html>", 60).is_err());
        assert!(decode_json("", 60).is_err());
    }

    #[test]
    fn status_page_signal_noise_ratio() {
        let page = "<tr><th align=right><nobr>Signal/Noise/Ratio</nobr></th><td valign=middle><nobr><big><b>-72 / -95 / 23 dB</b></big></nobr></td></tr>";
        let now = Utc::now();
        let signal = decode_status(page, now).unwrap();
        assert_eq!((signal.signal, signal.noise, signal.snr), (-72, -95, 23));
        assert_eq!(signal.time, now);
        assert_eq!(
            signal.update().values,
            vec!["-72", "-95", "23", "0", "0", "0", "0"]
        );
    }

    #[test]
    fn status_page_without_signal() {
        assert!(decode_status("<html><body>no rf</body></html>", Utc::now()).is_err());
        let page = "<nobr>Signal/Noise/Ratio</nobr></th><td valign=middle><nobr><big><b>N/A dB</b>";
        assert!(decode_status(page, Utc::now()).is_err());
    }

    #[test]
    fn snapshot_format() {
        let signal = Signal {
            time: Utc::now(),
            signal: -60,
            noise: -95,
            snr: 35,
            rx_mcs: 0,
            tx_mcs: 0,
            rx_rate: 0,
            tx_rate: 0,
        };
        let text = snapshot(&signal, 10).unwrap();
        assert!(text.starts_with("[{\"date\":\""));
        assert!(text.ends_with("\",\"period\":\"10\"}]"));
    }

    #[test]
    fn chart_sets() {
        assert_eq!(charts(Page::Status).len(), 6);
        assert_eq!(charts(Page::Json).len(), 15);
        assert_eq!(charts(Page::Status)[0].file_name, "24hr_signal");
        assert_eq!(charts(Page::Status)[0].title, "RSSI - Last 24 Hours");
    }
}
