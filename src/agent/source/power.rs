// Node power supply: an INA260 power monitor plus two TMP102 sensors,
// one on the battery and one for the ambient temperature.

use crate::rrdtool::{ChartSpec, DatabaseSpec, Period, Update};
use crate::sensor::{self, bus_error, Ina260, Mux, Tmp102};
use crate::{local_time, Timestamp, SAMPLE_TIME};
use anyhow::{Context, Result};
use chrono::prelude::*;
use embedded_hal::i2c::I2c;
use linux_embedded_hal::I2cdev;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

pub const SITE: &str = "power";
pub const DATABASE: &str = "powerData.rrd";
pub const SNAPSHOT: &str = "powerData.js";

pub const DEFAULT_BUS: &str = "/dev/i2c-1";
pub const BATTERY_ADDRESS: u8 = 0x48;
pub const AMBIENT_ADDRESS: u8 = 0x4B;

#[derive(Debug, Clone, PartialEq)]
pub struct Power {
    pub time: Timestamp,
    pub current: f64, // mA
    pub voltage: f64, // V
    pub power: f64,   // mW
    pub battemp: f64, // deg C
    pub ambtemp: f64, // deg C
}

impl Power {
    fn values(&self) -> [String; 5] {
        [
            self.current,
            self.voltage,
            self.power,
            self.battemp,
            self.ambtemp,
        ]
        .map(|v| format!("{v:.2}"))
    }

    pub fn update(&self) -> Update {
        Update::new(self.time.timestamp(), self.values().to_vec())
    }
}

#[derive(Serialize, Debug)]
struct Snapshot {
    period: String,
    time: String,
    current: String,
    voltage: String,
    power: String,
    battemp: String,
    ambtemp: String,
}

pub fn snapshot(latest: &Power, period: u64) -> Result<String> {
    let [current, voltage, power, battemp, ambtemp] = latest.values();
    let snapshot = Snapshot {
        period: period.to_string(),
        time: local_time(&latest.time, SAMPLE_TIME),
        current,
        voltage,
        power,
        battemp,
        ambtemp,
    };
    let mut text = serde_json::to_string(&[snapshot])?;
    text.push('\n');
    Ok(text)
}

/// The sensors sharing one bus, possibly behind a multiplexer channel.
pub struct Sensors<I2C> {
    bus: Mux<I2C>,
    monitor: Ina260,
    battery: Tmp102,
    ambient: Tmp102,
}

impl<I2C: I2c> Sensors<I2C> {
    pub fn new(bus: Mux<I2C>) -> Self {
        Self {
            bus,
            monitor: Ina260::default(),
            battery: Tmp102::new(BATTERY_ADDRESS),
            ambient: Tmp102::new(AMBIENT_ADDRESS),
        }
    }

    pub fn init(&mut self) -> Result<()> {
        self.monitor
            .init(&mut self.bus, sensor::ina260::DEFAULT_CONFIG)
            .map_err(bus_error)
            .context("initialize power monitor")?;
        let (id, config) = self.monitor.info(&mut self.bus).map_err(bus_error)?;
        debug!("INA260 manufacturer id {id:#06x}, config {config:#06x}");
        for sensor in [&self.battery, &self.ambient] {
            sensor
                .init(&mut self.bus)
                .map_err(bus_error)
                .context("initialize temperature sensor")?;
            let config = sensor.config(&mut self.bus).map_err(bus_error)?;
            debug!("TMP102 config {config:#06x}");
        }
        Ok(())
    }
}

/// Anything producing power samples, the sensors on a bus in the field.
pub trait Meter: Send {
    fn read(&mut self, tstamp: Timestamp) -> Result<Power>;
}

impl<I2C: I2c + Send> Meter for Sensors<I2C> {
    fn read(&mut self, tstamp: Timestamp) -> Result<Power> {
        let bus = &mut self.bus;
        let sample = Power {
            time: tstamp,
            current: self.monitor.current(bus).map_err(bus_error)?,
            voltage: self.monitor.voltage(bus).map_err(bus_error)?,
            power: self.monitor.power(bus).map_err(bus_error)?,
            battemp: self.battery.celsius(bus).map_err(bus_error)?,
            ambtemp: self.ambient.celsius(bus).map_err(bus_error)?,
        };
        Ok(sample)
    }
}

pub struct Source {
    meter: Arc<Mutex<dyn Meter>>,
}

impl Source {
    /// Opens the I2C bus device, e.g. `/dev/i2c-1`, and initializes the sensors.
    pub fn open(path: &str, mux_channel: Option<u8>) -> Result<Self> {
        let dev = I2cdev::new(path).with_context(|| format!("open I2C bus {path}"))?;
        let bus = match mux_channel {
            Some(channel) => Mux::new(dev, sensor::mux::DEFAULT_ADDRESS, channel)?,
            None => Mux::passthrough(dev),
        };
        info!("using I2C bus {path}, mux channel {mux_channel:?}");
        let mut sensors = Sensors::new(bus);
        sensors.init()?;
        Ok(Self::new(sensors))
    }

    pub fn new(meter: impl Meter + 'static) -> Self {
        Self {
            meter: Arc::new(Mutex::new(meter)),
        }
    }

    pub async fn poll(&self) -> Result<Power> {
        let meter = Arc::clone(&self.meter);
        tokio::task::spawn_blocking(move || {
            let mut meter = meter
                .lock()
                .map_err(|_| anyhow::anyhow!("sensor bus lock poisoned"))?;
            meter.read(Utc::now())
        })
        .await?
    }
}

pub fn database() -> DatabaseSpec {
    DatabaseSpec::new(30, 740, 1440, &["CUR", "VOLT", "PWR", "BTMP", "ATMP"])
}

pub fn charts() -> Vec<ChartSpec> {
    let items = [
        ("current", "CUR", "mA", "Current"),
        ("voltage", "VOLT", "V", "Voltage"),
        ("power", "PWR", "mW", "Power"),
        ("battemp", "BTMP", "deg C", "Battery Temperature"),
        ("ambtemp", "ATMP", "deg C", "Ambient Temperature"),
    ];
    Period::ALL
        .iter()
        .flat_map(|period| {
            items
                .iter()
                .map(|(name, ds, label, title)| ChartSpec::stock(*period, name, ds, label, title))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::mock::Bus;

    fn bus() -> Bus {
        let mut bus = Bus::default();
        bus.set(0x40, 0x01, &[0x00, 0x50]); // 80 * 1.25 mA
        bus.set(0x40, 0x02, &[0x27, 0x10]); // 10000 * 1.25 mV
        bus.set(0x40, 0x03, &[0x00, 0x64]); // 100 * 10 mW
        bus.set(0x48, 0x00, &[0x19, 0x00]); // 25 deg C
        bus.set(0x4B, 0x00, &[0xFF, 0x00]); // -1 deg C
        bus
    }

    #[test]
    fn sensors_are_read_and_formatted() {
        let mut sensors = Sensors::new(Mux::passthrough(bus()));
        sensors.init().unwrap();
        let tstamp = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let sample = sensors.read(tstamp).unwrap();
        assert_eq!(
            sample.update(),
            Update::new(
                1_700_000_000,
                vec![
                    "100.00".into(),
                    "12.50".into(),
                    "1000.00".into(),
                    "25.00".into(),
                    "-1.00".into()
                ]
            )
        );
    }

    #[test]
    fn missing_sensor_fails_initialization() {
        let mut bus = bus();
        bus.absent.push(AMBIENT_ADDRESS);
        let mut sensors = Sensors::new(Mux::passthrough(bus));
        assert!(sensors.init().is_err());
    }

    #[tokio::test]
    async fn poll_runs_on_the_blocking_pool() {
        let mut sensors = Sensors::new(Mux::passthrough(bus()));
        sensors.init().unwrap();
        let source = Source::new(sensors);
        let sample = source.poll().await.unwrap();
        assert!((sample.voltage - 12.5).abs() < 1e-9);
    }

    #[test]
    fn snapshot_format() {
        let sample = Power {
            time: Utc::now(),
            current: 101.25,
            voltage: 12.5,
            power: 1260.0,
            battemp: 21.5,
            ambtemp: 19.0,
        };
        let text = snapshot(&sample, 600).unwrap();
        assert!(text.starts_with("[{\"period\":\"600\",\"time\":\""));
        assert!(text.ends_with(
            "\",\"current\":\"101.25\",\"voltage\":\"12.50\",\"power\":\"1260.00\",\"battemp\":\"21.50\",\"ambtemp\":\"19.00\"}]\n"
        ));
    }

    #[test]
    fn chart_set() {
        let charts = charts();
        assert_eq!(charts.len(), 15);
        assert_eq!(charts[4].file_name, "24hr_ambtemp");
        assert_eq!(charts[14].title, "Ambient Temperature - Past Year");
    }
}
