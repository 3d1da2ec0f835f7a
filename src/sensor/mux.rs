// TI TCA9548A eight channel I2C multiplexer.
//
// `Mux` is itself an I2C bus: every transaction is bracketed by selecting
// the channel the sensors hang from and deselecting all channels afterwards.
// Without a channel it passes transactions straight through.

use embedded_hal::i2c::{ErrorType, I2c, Operation};
use std::thread;
use std::time::Duration;

pub const DEFAULT_ADDRESS: u8 = 0x70;
pub const CHANNELS: u8 = 8;

const SETTLE: Duration = Duration::from_millis(1);

pub struct Mux<I2C> {
    bus: I2C,
    address: u8,
    channel: Option<u8>,
}

impl<I2C: I2c> Mux<I2C> {
    pub fn passthrough(bus: I2C) -> Self {
        Self {
            bus,
            address: DEFAULT_ADDRESS,
            channel: None,
        }
    }

    pub fn new(bus: I2C, address: u8, channel: u8) -> anyhow::Result<Self> {
        if channel >= CHANNELS {
            anyhow::bail!("mux channel must be between 0 and {}", CHANNELS - 1);
        }
        let mut mux = Self {
            bus,
            address,
            channel: Some(channel),
        };
        // start with every channel disabled
        mux.bus.write(address, &[0]).map_err(super::bus_error)?;
        Ok(mux)
    }

    pub fn release(self) -> I2C {
        self.bus
    }
}

impl<I2C: I2c> ErrorType for Mux<I2C> {
    type Error = I2C::Error;
}

impl<I2C: I2c> I2c for Mux<I2C> {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        let channel = match self.channel {
            Some(channel) => channel,
            None => return self.bus.transaction(address, operations),
        };
        self.bus.write(self.address, &[1 << channel])?;
        thread::sleep(SETTLE);
        let result = self.bus.transaction(address, operations);
        thread::sleep(SETTLE);
        self.bus.write(self.address, &[0])?;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::mock;
    use crate::sensor::Tmp102;

    #[test]
    fn transactions_are_bracketed_by_channel_select() {
        let mut bus = mock::Bus::default();
        bus.set(0x48, 0x00, &[0x19, 0x00]);
        let mut mux = Mux::new(bus, DEFAULT_ADDRESS, 3).unwrap();
        let celsius = Tmp102::default().celsius(&mut mux).unwrap();
        assert_eq!(celsius, 25.0);
        let bus = mux.release();
        assert_eq!(
            bus.writes,
            vec![
                (0x70, vec![0]),
                (0x70, vec![0b0000_1000]),
                (0x48, vec![0x00]),
                (0x70, vec![0]),
            ]
        );
    }

    #[test]
    fn out_of_range_channel_is_rejected() {
        assert!(Mux::new(mock::Bus::default(), DEFAULT_ADDRESS, 8).is_err());
    }

    #[test]
    fn passthrough_does_not_touch_the_mux() {
        let mut mux = Mux::passthrough(mock::Bus::default());
        Tmp102::default().init(&mut mux).unwrap();
        assert_eq!(mux.release().writes, vec![(0x48, vec![0x01, 0x60, 0xA0])]);
    }
}
