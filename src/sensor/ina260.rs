// TI INA260 current, voltage and power monitor.

use super::{read_word, write_word};
use embedded_hal::i2c::I2c;

pub const DEFAULT_ADDRESS: u8 = 0x40;

const CONFIG_REG: u8 = 0x00;
const CURRENT_REG: u8 = 0x01;
const VOLTAGE_REG: u8 = 0x02;
const POWER_REG: u8 = 0x03;
const ID_REG: u8 = 0xFE;

// Continuous shunt and bus conversion, 1.1 ms conversion times, 16 averages
pub const DEFAULT_CONFIG: u16 = 0xE027;

const CURRENT_LSB: f64 = 1.25; // mA
const VOLTAGE_LSB: f64 = 0.00125; // V
const POWER_LSB: f64 = 10.0; // mW

#[derive(Debug, Clone, Copy)]
pub struct Ina260 {
    address: u8,
}

impl Ina260 {
    pub fn new(address: u8) -> Self {
        Self { address }
    }

    pub fn init<I2C: I2c>(&self, bus: &mut I2C, config: u16) -> Result<(), I2C::Error> {
        write_word(bus, self.address, CONFIG_REG, config)
    }

    /// Manufacturer id and configuration register, for diagnostics.
    pub fn info<I2C: I2c>(&self, bus: &mut I2C) -> Result<(u16, u16), I2C::Error> {
        let id = read_word(bus, self.address, ID_REG)?;
        let config = read_word(bus, self.address, CONFIG_REG)?;
        Ok((id, config))
    }

    /// Current in mA, negative when flowing backwards through the shunt.
    pub fn current<I2C: I2c>(&self, bus: &mut I2C) -> Result<f64, I2C::Error> {
        let raw = read_word(bus, self.address, CURRENT_REG)? as i16;
        Ok(raw as f64 * CURRENT_LSB)
    }

    /// Bus voltage in V.
    pub fn voltage<I2C: I2c>(&self, bus: &mut I2C) -> Result<f64, I2C::Error> {
        let raw = read_word(bus, self.address, VOLTAGE_REG)?;
        Ok(raw as f64 * VOLTAGE_LSB)
    }

    /// Power in mW.
    pub fn power<I2C: I2c>(&self, bus: &mut I2C) -> Result<f64, I2C::Error> {
        let raw = read_word(bus, self.address, POWER_REG)?;
        Ok(raw as f64 * POWER_LSB)
    }
}

impl Default for Ina260 {
    fn default() -> Self {
        Self::new(DEFAULT_ADDRESS)
    }
}
