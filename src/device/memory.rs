use super::{
	Device,
	check_range,
};

/// erased EEPROM cells read as all ones
pub const ERASED: u8 = 0xff;

/// EEPROM contents kept in memory
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Memory {
	data: Vec<u8>,
}

impl Memory {
	pub fn new(size: usize) -> Self {
		Memory {
			data: vec![ERASED; size],
		}
	}

	pub fn len(&self) -> usize {
		self.data.len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	pub fn as_slice(&self) -> &[u8] {
		&self.data
	}

	pub fn into_vec(self) -> Vec<u8> {
		self.data
	}
}

impl From<Vec<u8>> for Memory {
	fn from(data: Vec<u8>) -> Self {
		Memory { data }
	}
}

impl Device for Memory {
	fn read_range(&mut self, offset: usize, target: &mut [u8]) -> crate::AResult<()> {
		check_range(self.data.len(), offset, target.len())?;
		target.copy_from_slice(&self.data[offset..offset + target.len()]);
		Ok(())
	}

	fn write_range(&mut self, offset: usize, data: &[u8]) -> crate::AResult<()> {
		check_range(self.data.len(), offset, data.len())?;
		self.data[offset..offset + data.len()].copy_from_slice(data);
		Ok(())
	}

	fn read_byte(&mut self, offset: usize) -> crate::AResult<u8> {
		check_range(self.data.len(), offset, 1)?;
		Ok(self.data[offset])
	}
}
