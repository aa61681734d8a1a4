//! Driver for Atmel/Microchip AT24C32/AT24C64 style serial EEPROMs
//!
//! Memory addresses are sent as two bytes (high byte first) after the device
//! address. Reads are sequential and roll over at the end of the memory;
//! writes go into a page buffer and wrap around at the page boundary, so a
//! write must never cross into the next page. After the STOP condition the
//! chip is busy with its internal write cycle (tWR, max 5ms for AT24C32) and
//! doesn't acknowledge its address.
//!
//! Transactions:
//! - random read: START - ADDR(W) - ADDR_HI - ADDR_LO - START - ADDR(R) - DATA... - STOP
//! - page write:  START - ADDR(W) - ADDR_HI - ADDR_LO - DATA... - STOP

use std::time::Duration;

use crate::device::{
	Device,
	check_range,
};
use crate::i2c::I2cBus;

mod simulated;

pub use self::simulated::Simulated;

/// Address with A0..A2 pulled high, as found on the common DS3231/AT24C32 modules
pub const DEFAULT_ADDRESS: u8 = 0x57;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Config {
	/// 7-bit I2C address
	pub address: u8,
	pub page_size: usize,
	/// size in bytes
	pub capacity: usize,
	pub write_cycle: Duration,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			address: DEFAULT_ADDRESS,
			page_size: 32,
			capacity: 4096,
			write_cycle: Duration::from_millis(5),
		}
	}
}

impl Config {
	pub fn validate(&self) -> crate::AResult<()> {
		ensure!(self.address < 0x80, "invalid 7-bit I2C address 0x{:02x}", self.address);
		ensure!(self.page_size.is_power_of_two(), "page size must be a power of two: {}", self.page_size);
		ensure!(self.capacity <= 0x1_0000, "capacity 0x{:x} not addressable with two address bytes", self.capacity);
		ensure!(self.capacity % self.page_size == 0,
			"capacity {} is not a multiple of the page size {}", self.capacity, self.page_size
		);
		Ok(())
	}
}

fn address_bytes(offset: usize) -> [u8; 2] {
	[(offset >> 8) as u8, offset as u8]
}

pub struct At24cx<B: I2cBus> {
	bus: B,
	config: Config,
}

impl<B: I2cBus> At24cx<B> {
	pub fn new(bus: B, config: Config) -> crate::AResult<Self> {
		config.validate()?;
		Ok(At24cx { bus, config })
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn bus_mut(&mut self) -> &mut B {
		&mut self.bus
	}

	pub fn into_inner(self) -> B {
		self.bus
	}

	// bytes left in the page containing `offset`
	fn page_remaining(&self, offset: usize) -> usize {
		self.config.page_size - (offset & (self.config.page_size - 1))
	}

	fn write_page(&mut self, offset: usize, data: &[u8]) -> crate::AResult<()> {
		debug_assert!(data.len() <= self.page_remaining(offset));
		let mut buf = Vec::with_capacity(2 + data.len());
		buf.extend_from_slice(&address_bytes(offset));
		buf.extend_from_slice(data);
		trace!("AT24Cx 0x{:02x}: page write {} bytes @0x{:04x}", self.config.address, data.len(), offset);
		self.bus.write(self.config.address, &buf)?;
		self.bus.delay(self.config.write_cycle);
		Ok(())
	}
}

impl<B: I2cBus> Device for At24cx<B> {
	fn read_range(&mut self, offset: usize, target: &mut [u8]) -> crate::AResult<()> {
		check_range(self.config.capacity, offset, target.len())?;
		if target.is_empty() {
			return Ok(());
		}
		trace!("AT24Cx 0x{:02x}: read {} bytes @0x{:04x}", self.config.address, target.len(), offset);
		self.bus.write_read(self.config.address, &address_bytes(offset), target)
	}

	fn write_range(&mut self, offset: usize, data: &[u8]) -> crate::AResult<()> {
		check_range(self.config.capacity, offset, data.len())?;
		let mut offset = offset;
		let mut data = data;
		while !data.is_empty() {
			let chunk = data.len().min(self.page_remaining(offset));
			self.write_page(offset, &data[..chunk])?;
			offset += chunk;
			data = &data[chunk..];
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::device::ERASED;

	fn eeprom() -> At24cx<Simulated> {
		let config = Config::default();
		At24cx::new(Simulated::new(config), config).unwrap()
	}

	#[test]
	fn config() {
		assert!(Config::default().validate().is_ok());
		assert!(Config { address: 0x80, ..Config::default() }.validate().is_err());
		assert!(Config { page_size: 24, ..Config::default() }.validate().is_err());
		assert!(Config { capacity: 0x2_0000, ..Config::default() }.validate().is_err());
		assert!(Config { capacity: 4100, ..Config::default() }.validate().is_err());
	}

	#[test]
	fn address_bytes_big_endian() {
		assert_eq!(address_bytes(0x0f21), [0x0f, 0x21]);
	}

	#[test]
	fn write_within_page() {
		let mut ee = eeprom();
		ee.write_range(0, b"Example eeprom toy").unwrap();
		assert_eq!(ee.bus_mut().page_writes(), 1);

		let mut buf = [0u8; 20];
		ee.read_range(0, &mut buf).unwrap();
		assert_eq!(&buf[..18], b"Example eeprom toy");
		assert_eq!(&buf[18..], &[ERASED; 2]);
	}

	#[test]
	fn write_across_pages() {
		let mut ee = eeprom();
		let data: Vec<u8> = (0..100u8).collect();
		ee.write_range(30, &data).unwrap();
		// 2 + 32 + 32 + 32 + 2
		assert_eq!(ee.bus_mut().page_writes(), 5);

		let mut buf = vec![0u8; 100];
		ee.read_range(30, &mut buf).unwrap();
		assert_eq!(buf, data);
		assert_eq!(ee.read_byte(29).unwrap(), ERASED);
		assert_eq!(ee.read_byte(130).unwrap(), ERASED);
	}

	#[test]
	fn waits_for_write_cycle() {
		// the simulated chip NACKs while its write cycle runs
		let mut ee = eeprom();
		ee.write_range(0, &[1]).unwrap();
		ee.write_range(1, &[2]).unwrap();
		assert_eq!(ee.read_byte(0).unwrap(), 1);
		assert_eq!(ee.read_byte(1).unwrap(), 2);
	}

	#[test]
	fn last_byte() {
		let mut ee = eeprom();
		ee.write_range(4095, &[0x42]).unwrap();
		assert_eq!(ee.read_byte(4095).unwrap(), 0x42);
		assert!(ee.read_byte(4096).is_err());
		assert!(ee.write_range(4090, &[0; 7]).is_err());
		assert_eq!(ee.bus_mut().page_writes(), 1);
	}

	#[test]
	fn wrong_address_fails() {
		let config = Config::default();
		let chip = Simulated::new(Config { address: 0x50, ..config });
		let mut ee = At24cx::new(chip, config).unwrap();
		assert!(ee.read_byte(0).is_err());
		assert!(ee.write_range(0, b"x").is_err());
	}
}
