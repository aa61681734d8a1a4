//! Byte addressable storage devices the named entries live on.

mod file;
mod memory;

pub use self::file::ImageFile;
pub use self::memory::{
	ERASED,
	Memory,
};

pub trait Device {
	/// fill the whole `target` with data starting at `offset`
	fn read_range(&mut self, offset: usize, target: &mut [u8]) -> crate::AResult<()>;

	fn write_range(&mut self, offset: usize, data: &[u8]) -> crate::AResult<()>;

	fn read_byte(&mut self, offset: usize) -> crate::AResult<u8> {
		let mut buf = [0u8];
		self.read_range(offset, &mut buf)?;
		Ok(buf[0])
	}
}

impl<'a, D: ?Sized + Device> Device for &'a mut D {
	fn read_range(&mut self, offset: usize, target: &mut [u8]) -> crate::AResult<()> {
		(**self).read_range(offset, target)
	}

	fn write_range(&mut self, offset: usize, data: &[u8]) -> crate::AResult<()> {
		(**self).write_range(offset, data)
	}

	fn read_byte(&mut self, offset: usize) -> crate::AResult<u8> {
		(**self).read_byte(offset)
	}
}

impl<D: ?Sized + Device> Device for Box<D> {
	fn read_range(&mut self, offset: usize, target: &mut [u8]) -> crate::AResult<()> {
		(**self).read_range(offset, target)
	}

	fn write_range(&mut self, offset: usize, data: &[u8]) -> crate::AResult<()> {
		(**self).write_range(offset, data)
	}

	fn read_byte(&mut self, offset: usize) -> crate::AResult<u8> {
		(**self).read_byte(offset)
	}
}

/// Reject ranges not fully inside a device of `len` bytes.
pub(crate) fn check_range(len: usize, offset: usize, count: usize) -> crate::AResult<()> {
	let end = offset.checked_add(count);
	ensure!(end.map_or(false, |end| end <= len),
		"range 0x{:x}+{} outside of device (size 0x{:x})", offset, count, len
	);
	Ok(())
}
