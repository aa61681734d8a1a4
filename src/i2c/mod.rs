//! I²C bus access as needed by EEPROM drivers

use std::thread;
use std::time::{
	Duration,
	Instant,
};

mod linux;

pub use self::linux::I2cDev;

pub fn reliable_sleep(mut duration: Duration) {
	loop {
		let now = Instant::now();
		thread::sleep(duration);
		let elapsed = now.elapsed();
		if elapsed >= duration {
			return;
		}
		duration -= elapsed;
	}
}

pub trait I2cBus {
	/// single write transaction: START - ADDR(W) - DATA - STOP
	fn write(&mut self, address: u8, data: &[u8]) -> crate::AResult<()>;

	/// write `data`, then fill `buffer` from the same device
	fn write_read(&mut self, address: u8, data: &[u8], buffer: &mut [u8]) -> crate::AResult<()>;

	// wait (at least) `duration`, e.g. for an internal write cycle
	fn delay(&mut self, duration: Duration) {
		reliable_sleep(duration);
	}
}

impl<'a, B: ?Sized + I2cBus> I2cBus for &'a mut B {
	fn write(&mut self, address: u8, data: &[u8]) -> crate::AResult<()> {
		(**self).write(address, data)
	}

	fn write_read(&mut self, address: u8, data: &[u8], buffer: &mut [u8]) -> crate::AResult<()> {
		(**self).write_read(address, data, buffer)
	}

	fn delay(&mut self, duration: Duration) {
		(**self).delay(duration)
	}
}
