use std::fs;
use std::io;
use std::os::unix::fs::FileExt;
use std::os::unix::io::AsRawFd;
use std::path::{
	Path,
	PathBuf,
};

use super::{
	Device,
	check_range,
	memory::ERASED,
};

/// EEPROM image stored in a regular file; the file size is the device size.
///
/// The file is locked exclusively (`flock`) while opened.
pub struct ImageFile {
	file: fs::File,
	len: usize,
	path: PathBuf,
}

fn lock_exclusive(file: &fs::File) -> io::Result<()> {
	let r = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
	if r != 0 {
		return Err(io::Error::last_os_error());
	}
	Ok(())
}

impl ImageFile {
	pub fn open<P: AsRef<Path>>(path: P, writable: bool) -> crate::AResult<Self> {
		let path = path.as_ref();
		with_context!(("couldn't open EEPROM image {}", path.display()), {
			let file = fs::OpenOptions::new()
				.read(true)
				.write(writable)
				.open(path)?;
			Self::inner_new(file, path)
		})
	}

	/// create a new image of `size` erased bytes; fails if the file exists
	pub fn create<P: AsRef<Path>>(path: P, size: usize) -> crate::AResult<Self> {
		let path = path.as_ref();
		with_context!(("couldn't create EEPROM image {}", path.display()), {
			let file = fs::OpenOptions::new()
				.read(true)
				.write(true)
				.create_new(true)
				.open(path)?;
			file.write_all_at(&vec![ERASED; size], 0)?;
			Self::inner_new(file, path)
		})
	}

	fn inner_new(file: fs::File, path: &Path) -> crate::AResult<Self> {
		if let Err(e) = lock_exclusive(&file) {
			if e.kind() == io::ErrorKind::WouldBlock {
				bail!("image is in use by another process");
			}
			return Err(e.into());
		}

		let size = file.metadata()?.len();
		ensure!(size <= usize::max_value() as u64, "image too large: {} bytes", size);
		debug!("opened EEPROM image {} ({} bytes)", path.display(), size);

		Ok(ImageFile {
			file,
			len: size as usize,
			path: path.into(),
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	pub fn sync(&self) -> crate::AResult<()> {
		self.file.sync_data()?;
		Ok(())
	}
}

impl Device for ImageFile {
	fn read_range(&mut self, offset: usize, target: &mut [u8]) -> crate::AResult<()> {
		check_range(self.len, offset, target.len())?;
		// a short read (file truncated behind our back) is an UnexpectedEof error
		self.file.read_exact_at(target, offset as u64)?;
		Ok(())
	}

	fn write_range(&mut self, offset: usize, data: &[u8]) -> crate::AResult<()> {
		check_range(self.len, offset, data.len())?;
		self.file.write_all_at(data, offset as u64)?;
		Ok(())
	}
}
