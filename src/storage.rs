use crate::device::Device;
use crate::entry::{
	Entry,
	EntryError,
	Registry,
};

/// Named fields on an EEPROM.
///
/// Owns the device; the device must be fully configured before it is handed
/// over. Every operation looks up its key first and fails with
/// [`EntryError::KeyNotFound`] before touching the device.
pub struct Eeprom<D: Device> {
	entries: Registry,
	device: D,
}

impl<D: Device> Eeprom<D> {
	pub fn new<R: Into<Registry>>(device: D, entries: R) -> Self {
		Eeprom {
			entries: entries.into(),
			device,
		}
	}

	pub fn entries(&self) -> &Registry {
		&self.entries
	}

	pub fn device_mut(&mut self) -> &mut D {
		&mut self.device
	}

	pub fn into_inner(self) -> D {
		self.device
	}

	fn find_entry(&self, key: &str) -> Result<Entry, EntryError> {
		self.entries.find_entry(key).map(Entry::clone)
	}

	/// Read the full width of the field, whatever was stored in it.
	pub fn read(&mut self, key: &str) -> crate::AResult<Vec<u8>> {
		let entry = self.find_entry(key)?;
		let mut value = vec![0u8; entry.length as usize];
		trace!("read {} ({} bytes @0x{:04x})", key, entry.length, entry.offset);
		self.device.read_range(entry.offset as usize, &mut value)?;
		Ok(value)
	}

	/// Write `value` at the start of the field.
	///
	/// Shorter values leave the remaining bytes of the field untouched.
	pub fn write(&mut self, key: &str, value: &[u8]) -> crate::AResult<()> {
		let entry = self.find_entry(key)?;
		if value.len() > entry.length as usize {
			return Err(EntryError::ValueTooLong {
				key: entry.key,
				max_length: entry.length,
				actual_length: value.len(),
			}.into());
		}
		debug!("write {} ({} of {} bytes @0x{:04x})", key, value.len(), entry.length, entry.offset);
		self.device.write_range(entry.offset as usize, value)
	}

	/// Declared width of the field (not the length of the stored data).
	pub fn length(&self, key: &str) -> crate::AResult<u16> {
		Ok(self.entries.find_entry(key)?.length)
	}

	/// Interpret a single byte field as boolean: 0 is false, 1 is true.
	///
	/// Any other stored byte (e.g. 0xff in erased cells) fails with
	/// [`EntryError::UnexpectedByteValue`].
	pub fn is(&mut self, key: &str) -> crate::AResult<bool> {
		let entry = self.find_entry(key)?;
		// never interpret part of a wider value
		if entry.length > 1 {
			return Err(EntryError::NotBooleanKey { key: entry.key }.into());
		}
		match self.device.read_byte(entry.offset as usize)? {
			0 => Ok(false),
			1 => Ok(true),
			raw_byte => Err(EntryError::UnexpectedByteValue { raw_byte }.into()),
		}
	}
}
