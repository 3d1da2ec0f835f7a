use std::path::Path;

pub const CHART_WIDTH: u32 = 600;
pub const CHART_HEIGHT: u32 = 150;

const DATA_LINE: &str = "LINE1:dSeries#0400ff";
const TREND_LINE: &str = "LINE3:smoothed#ff0000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    FourWeeks,
    Year,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Day, Period::FourWeeks, Period::Year];

    pub fn start(&self) -> &'static str {
        match self {
            Period::Day => "end-1day",
            Period::FourWeeks => "end-4weeks",
            Period::Year => "end-12months",
        }
    }

    // moving average window in seconds
    pub fn trend_window(&self) -> u32 {
        match self {
            Period::Day => 7200,
            Period::FourWeeks => 172800,
            Period::Year => 604800,
        }
    }

    pub fn file_prefix(&self) -> &'static str {
        match self {
            Period::Day => "24hr",
            Period::FourWeeks => "4wk",
            Period::Year => "12m",
        }
    }

    pub fn title_suffix(&self) -> &'static str {
        match self {
            Period::Day => "Last 24 Hours",
            Period::FourWeeks => "Last 4 Weeks",
            Period::Year => "Past Year",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    DataOnly,
    TrendOnly,
    DataAndTrend,
}

#[derive(Debug, Clone)]
pub struct ChartSpec {
    pub file_name: String,
    pub data_source: String,
    pub label: String,
    pub title: String,
    pub period: Period,
    pub lower: f64,
    pub upper: f64,
    pub trend: Trend,
    pub auto_scale: bool,
}

impl ChartSpec {
    /// The stock chart: data plus trend line, y axis bounds left to rrdtool.
    /// File name and title are derived from the period, e.g.
    /// `24hr_signal` and `RSSI - Last 24 Hours`.
    pub fn stock(period: Period, name: &str, data_source: &str, label: &str, title: &str) -> Self {
        Self {
            file_name: format!("{}_{}", period.file_prefix(), name),
            data_source: data_source.into(),
            label: label.into(),
            title: format!("{} - {}", title, period.title_suffix()),
            period,
            lower: 0.0,
            upper: 0.0,
            trend: Trend::DataAndTrend,
            auto_scale: false,
        }
    }

    pub fn args(&self, rrd_path: &str, dir: &Path) -> Vec<String> {
        let png = dir.join(format!("{}.png", self.file_name));
        let mut args: Vec<String> = vec![
            "graph".into(),
            png.to_string_lossy().into_owned(),
            "-a".into(),
            "PNG".into(),
            "-s".into(),
            self.period.start().into(),
            "-e".into(),
            "now".into(),
            "-w".into(),
            CHART_WIDTH.to_string(),
            "-h".into(),
            CHART_HEIGHT.to_string(),
        ];
        if self.lower < self.upper {
            args.extend([
                "-l".into(),
                self.lower.to_string(),
                "-u".into(),
                self.upper.to_string(),
                "-r".into(),
            ]);
        } else if self.auto_scale {
            args.push("-A".into());
        }
        args.push("-Y".into());
        args.extend([
            "-v".into(),
            self.label.clone(),
            "-t".into(),
            self.title.clone(),
        ]);
        args.push(format!("DEF:dSeries={}:{}:LAST", rrd_path, self.data_source));
        let smoothed = format!("CDEF:smoothed=dSeries,{},TREND", self.period.trend_window());
        match self.trend {
            Trend::DataOnly => args.push(DATA_LINE.into()),
            Trend::TrendOnly => {
                args.push(smoothed);
                args.push(TREND_LINE.into());
            }
            Trend::DataAndTrend => {
                args.push(DATA_LINE.into());
                args.push(smoothed);
                args.push(TREND_LINE.into());
            }
        }
        args
    }
}
