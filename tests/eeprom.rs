use eep::at24cx::{
	self,
	At24cx,
	Simulated,
};
use eep::device::{
	ImageFile,
	Memory,
	ERASED,
};
use eep::{
	Device,
	Eeprom,
	Entry,
	EntryError,
};

fn entries() -> Vec<Entry> {
	vec![
		Entry::new("NAME", 0, 32),
		Entry::new("FLAG", 32, 1),
	]
}

fn entry_error(e: failure::Error) -> EntryError {
	e.downcast::<EntryError>().expect("expected an EntryError")
}

fn scenario<D: Device>(ee: &mut Eeprom<D>) {
	ee.write("NAME", b"eep").unwrap();
	let name = ee.read("NAME").unwrap();
	assert_eq!(name.len(), 32);
	assert_eq!(&name[..3], b"eep");

	ee.write("FLAG", &[1]).unwrap();
	assert!(ee.is("FLAG").unwrap());
	ee.write("FLAG", &[0]).unwrap();
	assert!(!ee.is("FLAG").unwrap());

	assert_eq!(entry_error(ee.read("MISSING").unwrap_err()), EntryError::KeyNotFound { key: "MISSING".into() });
	assert_eq!(entry_error(ee.is("NAME").unwrap_err()), EntryError::NotBooleanKey { key: "NAME".into() });

	// exact width is fine, one more byte is not
	ee.write("NAME", &[b'n'; 32]).unwrap();
	assert_eq!(ee.read("NAME").unwrap(), vec![b'n'; 32]);
	assert_eq!(entry_error(ee.write("NAME", &[b'n'; 33]).unwrap_err()), EntryError::ValueTooLong {
		key: "NAME".into(),
		max_length: 32,
		actual_length: 33,
	});

	// writing twice reads the same
	ee.write("NAME", b"twice").unwrap();
	let first = ee.read("NAME").unwrap();
	ee.write("NAME", b"twice").unwrap();
	assert_eq!(ee.read("NAME").unwrap(), first);
}

#[test]
fn memory() {
	let mut ee = Eeprom::new(Memory::new(64), entries());
	scenario(&mut ee);
	let memory = ee.into_inner();
	assert_eq!(&memory.as_slice()[..5], b"twice");
	assert_eq!(memory.as_slice()[32], 0);
	assert_eq!(memory.as_slice()[33], ERASED);
}

#[test]
fn at24cx() {
	let config = at24cx::Config::default();
	let device = At24cx::new(Simulated::new(config), config).unwrap();
	let mut ee = Eeprom::new(device, entries());
	scenario(&mut ee);
	let chip = ee.into_inner().into_inner();
	assert_eq!(&chip.memory()[5..32], &[b'n'; 27][..]);
}

#[test]
fn image_file() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("eeprom.bin");
	{
		let mut ee = Eeprom::new(ImageFile::create(&path, 64).unwrap(), entries());
		scenario(&mut ee);
	}

	// contents persist
	let mut ee = Eeprom::new(ImageFile::open(&path, false).unwrap(), entries());
	assert_eq!(&ee.read("NAME").unwrap()[..6], b"twicen");
	assert_eq!(ee.is("FLAG").unwrap(), false);
}

#[test]
fn borrowed_device() {
	let mut memory = Memory::new(64);
	{
		let mut ee = Eeprom::new(&mut memory, entries());
		ee.write("FLAG", &[1]).unwrap();
	}
	assert_eq!(memory.as_slice()[32], 1);
}

#[test]
fn entries_from_table() {
	let table = "NAME 0 32\nFLAG 0x20 1\n";
	let mut ee = Eeprom::new(Memory::new(64), eep::entry::parse_table(table).unwrap());
	assert_eq!(ee.length("FLAG").unwrap(), 1);
	assert_eq!(ee.entries().len(), 2);
	scenario(&mut ee);
}
