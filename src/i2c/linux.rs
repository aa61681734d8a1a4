use std::fs;
use std::io::{
	self,
	Read,
	Write,
};
use std::os::unix::io::AsRawFd;
use std::path::{
	Path,
	PathBuf,
};

use super::I2cBus;

// from <linux/i2c-dev.h>
const I2C_SLAVE: libc::c_ulong = 0x0703;

/// Linux i2c-dev bus (`/dev/i2c-N`)
pub struct I2cDev {
	file: fs::File,
	path: PathBuf,
	slave: Option<u8>,
}

impl I2cDev {
	pub fn open<P: AsRef<Path>>(path: P) -> crate::AResult<Self> {
		let path = path.as_ref();
		let file = with_context!(("couldn't open I2C bus {}", path.display()),
			Ok(fs::OpenOptions::new().read(true).write(true).open(path)?)
		)?;
		Ok(I2cDev {
			file,
			path: path.into(),
			slave: None,
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn select(&mut self, address: u8) -> crate::AResult<()> {
		ensure!(address < 0x80, "invalid 7-bit I2C address 0x{:02x}", address);
		if self.slave == Some(address) {
			return Ok(());
		}
		let r = unsafe {
			libc::ioctl(self.file.as_raw_fd(), I2C_SLAVE as _, libc::c_ulong::from(address))
		};
		if r < 0 {
			let e = failure::Error::from(io::Error::last_os_error());
			let msg = format!("{}: couldn't select slave 0x{:02x}: {}", self.path.display(), address, e);
			return Err(e.context(msg).into());
		}
		trace!("{}: selected slave 0x{:02x}", self.path.display(), address);
		self.slave = Some(address);
		Ok(())
	}

	// each write/read syscall is one bus transaction, so it must not be split
	fn transfer_out(&mut self, data: &[u8]) -> io::Result<()> {
		let l = self.file.write(data)?;
		if l != data.len() {
			Err(io::Error::new(io::ErrorKind::Other, "failed to write whole buffer"))
		} else {
			Ok(())
		}
	}

	fn transfer_in(&mut self, buffer: &mut [u8]) -> io::Result<()> {
		let l = self.file.read(buffer)?;
		if l != buffer.len() {
			Err(io::Error::new(io::ErrorKind::UnexpectedEof, "failed to fill whole buffer"))
		} else {
			Ok(())
		}
	}
}

impl I2cBus for I2cDev {
	fn write(&mut self, address: u8, data: &[u8]) -> crate::AResult<()> {
		self.select(address)?;
		self.transfer_out(data)?;
		Ok(())
	}

	fn write_read(&mut self, address: u8, data: &[u8], buffer: &mut [u8]) -> crate::AResult<()> {
		self.select(address)?;
		self.transfer_out(data)?;
		if !buffer.is_empty() {
			self.transfer_in(buffer)?;
		}
		Ok(())
	}
}
