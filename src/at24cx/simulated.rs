use std::io;
use std::time::Duration;

use crate::device::ERASED;
use crate::i2c::I2cBus;

use super::Config;

/// AT24Cx chip behind a simulated I2C bus
///
/// Models the behaviour the driver depends on: the two-byte address pointer,
/// page wrap on writes, roll over on reads, and no ACK while the write cycle
/// is running (time only passes through `delay`).
#[derive(Clone, Debug)]
pub struct Simulated {
	config: Config,
	memory: Vec<u8>,
	pointer: usize,
	busy: Duration,
	page_writes: usize,
}

fn nack(address: u8, reason: &str) -> failure::Error {
	io::Error::new(io::ErrorKind::Other, format!("no ACK from 0x{:02x} ({})", address, reason)).into()
}

impl Simulated {
	pub fn new(config: Config) -> Self {
		Simulated {
			config,
			memory: vec![ERASED; config.capacity],
			pointer: 0,
			busy: Duration::from_secs(0),
			page_writes: 0,
		}
	}

	pub fn memory(&self) -> &[u8] {
		&self.memory
	}

	/// number of completed page write transactions
	pub fn page_writes(&self) -> usize {
		self.page_writes
	}

	fn select(&self, address: u8) -> crate::AResult<()> {
		if address != self.config.address {
			return Err(nack(address, "no such device"));
		}
		if self.busy > Duration::from_secs(0) {
			return Err(nack(address, "write cycle in progress"));
		}
		Ok(())
	}

	fn set_pointer(&mut self, address_bytes: &[u8]) -> crate::AResult<()> {
		ensure!(address_bytes.len() >= 2, "expected two address bytes, got {}", address_bytes.len());
		// unused high address bits are ignored by the chip
		let pointer = (address_bytes[0] as usize) << 8 | address_bytes[1] as usize;
		self.pointer = pointer % self.config.capacity;
		Ok(())
	}
}

impl I2cBus for Simulated {
	fn write(&mut self, address: u8, data: &[u8]) -> crate::AResult<()> {
		self.select(address)?;
		self.set_pointer(data)?;
		let payload = &data[2..];
		if payload.is_empty() {
			// address only: sets pointer for a following current address read
			return Ok(());
		}

		let page_size = self.config.page_size;
		let page = self.pointer & !(page_size - 1);
		let mut column = self.pointer & (page_size - 1);
		for b in payload {
			self.memory[page + column] = *b;
			column = (column + 1) % page_size;
		}
		self.pointer = page + column;
		self.busy = self.config.write_cycle;
		self.page_writes += 1;
		Ok(())
	}

	fn write_read(&mut self, address: u8, data: &[u8], buffer: &mut [u8]) -> crate::AResult<()> {
		self.select(address)?;
		ensure!(data.len() == 2, "random read expects exactly two address bytes, got {}", data.len());
		self.set_pointer(data)?;
		for b in buffer.iter_mut() {
			*b = self.memory[self.pointer];
			self.pointer = (self.pointer + 1) % self.config.capacity;
		}
		Ok(())
	}

	fn delay(&mut self, duration: Duration) {
		self.busy = self.busy.checked_sub(duration).unwrap_or_default();
	}
}
