pub mod ina260;
pub mod mux;
pub mod tmp102;

pub use ina260::Ina260;
pub use mux::Mux;
pub use tmp102::Tmp102;

use embedded_hal::i2c::{Error, I2c};

/// I2C failures reduced to something `anyhow` can carry.
pub fn bus_error<E: Error>(e: E) -> anyhow::Error {
    anyhow::anyhow!("I2C bus error: {:?}", e.kind())
}

// Two bytes, most significant first, as every register on these sensors.
fn read_word<I2C: I2c>(bus: &mut I2C, address: u8, register: u8) -> Result<u16, I2C::Error> {
    let mut data = [0u8; 2];
    bus.write_read(address, &[register], &mut data)?;
    Ok(u16::from_be_bytes(data))
}

fn write_word<I2C: I2c>(bus: &mut I2C, address: u8, register: u8, word: u16) -> Result<(), I2C::Error> {
    let [hi, lo] = word.to_be_bytes();
    bus.write(address, &[register, hi, lo])
}
