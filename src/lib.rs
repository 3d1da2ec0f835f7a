pub mod agent;
pub mod aprs;
pub mod config;
pub mod ft991;
pub mod rrdtool;
pub mod sensor;

use chrono::prelude::*;

pub type Timestamp = DateTime<Utc>;

// Date formats expected by the web pages reading the snapshots
pub const SNAPSHOT_DATE: &str = "%m.%d.%Y %T";
pub const SAMPLE_TIME: &str = "%m/%d/%Y %T";

pub fn local_time(tstamp: &Timestamp, fmt: &str) -> String {
    tstamp.with_timezone(&Local).format(fmt).to_string()
}
