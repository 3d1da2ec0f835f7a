// TI TMP102 temperature sensor.

use super::{read_word, write_word};
use embedded_hal::i2c::I2c;

pub const DEFAULT_ADDRESS: u8 = 0x48;

const TEMP_REG: u8 = 0x00;
const CONFIG_REG: u8 = 0x01;

// 12 bit resolution, 4 Hz continuous conversion
const DEFAULT_CONFIG: u16 = 0x60A0;

const LSB: f64 = 0.0625; // deg C

#[derive(Debug, Clone, Copy)]
pub struct Tmp102 {
    address: u8,
}

impl Tmp102 {
    pub fn new(address: u8) -> Self {
        Self { address }
    }

    pub fn init<I2C: I2c>(&self, bus: &mut I2C) -> Result<(), I2C::Error> {
        write_word(bus, self.address, CONFIG_REG, DEFAULT_CONFIG)
    }

    pub fn config<I2C: I2c>(&self, bus: &mut I2C) -> Result<u16, I2C::Error> {
        read_word(bus, self.address, CONFIG_REG)
    }

    pub fn celsius<I2C: I2c>(&self, bus: &mut I2C) -> Result<f64, I2C::Error> {
        let raw = read_word(bus, self.address, TEMP_REG)?;
        // 12 bit two's complement left aligned in the word
        let value = (raw as i16) >> 4;
        Ok(value as f64 * LSB)
    }

    pub fn fahrenheit<I2C: I2c>(&self, bus: &mut I2C) -> Result<f64, I2C::Error> {
        Ok(self.celsius(bus)? * 9.0 / 5.0 + 32.0)
    }
}

impl Default for Tmp102 {
    fn default() -> Self {
        Self::new(DEFAULT_ADDRESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::mock;

    #[test]
    fn positive_and_negative_temperatures() {
        let mut bus = mock::Bus::default();
        let sensor = Tmp102::new(0x4B);
        bus.set(0x4B, TEMP_REG, &[0x19, 0x00]); // 0x190 = 400
        assert_eq!(sensor.celsius(&mut bus).unwrap(), 25.0);
        assert_eq!(sensor.fahrenheit(&mut bus).unwrap(), 77.0);
        bus.set(0x4B, TEMP_REG, &[0xE7, 0x00]); // 0xE70 = -400
        assert_eq!(sensor.celsius(&mut bus).unwrap(), -25.0);
    }

    #[test]
    fn init_writes_config_register() {
        let mut bus = mock::Bus::default();
        Tmp102::default().init(&mut bus).unwrap();
        assert_eq!(bus.writes, vec![(0x48, vec![0x01, 0x60, 0xA0])]);
    }
}
