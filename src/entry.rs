use std::fmt;
use std::fs;
use std::iter::FromIterator;
use std::path::Path;
use std::slice;
use std::str;

/// Largest address (exclusive) a field may reach with 16-bit offsets
const ADDRESS_SPACE: usize = 0x1_0000;

#[derive(Clone, PartialEq, Eq, Debug, Fail)]
pub enum EntryError {
	#[fail(display = "({}) key not found in list of eeprom entries", key)]
	KeyNotFound {
		key: String,
	},
	#[fail(display = "({}) could not write value to eeprom; max length {} for key exceeded (got {} bytes)", key, max_length, actual_length)]
	ValueTooLong {
		key: String,
		max_length: u16,
		actual_length: usize,
	},
	#[fail(display = "({}) key is not a boolean style entry", key)]
	NotBooleanKey {
		key: String,
	},
	#[fail(display = "unexpected byte value {} (0x{:02x}) for boolean entry", raw_byte, raw_byte)]
	UnexpectedByteValue {
		raw_byte: u8,
	},
}

/// A named field in the EEPROM address space
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Entry {
	pub key: String,
	pub offset: u16,
	/// maximum length of the stored value in bytes; `1` marks boolean fields
	pub length: u16,
}

impl Entry {
	pub fn new<K: Into<String>>(key: K, offset: u16, length: u16) -> Self {
		Entry {
			key: key.into(),
			offset,
			length,
		}
	}

	// first address after the field
	pub fn end(&self) -> usize {
		self.offset as usize + self.length as usize
	}

	pub fn is_boolean(&self) -> bool {
		self.length == 1
	}

	pub fn overlaps(&self, other: &Entry) -> bool {
		(self.offset as usize) < other.end() && (other.offset as usize) < self.end()
	}
}

impl fmt::Display for Entry {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}:{}:{}", self.key, self.offset, self.length)
	}
}

// accepts decimal and 0x-prefixed hex
fn parse_u16(s: &str) -> crate::AResult<u16> {
	if s.starts_with("0x") || s.starts_with("0X") {
		Ok(u16::from_str_radix(&s[2..], 16)?)
	} else {
		Ok(s.parse::<u16>()?)
	}
}

fn parse_fields(key: &str, offset: &str, length: &str) -> crate::AResult<Entry> {
	ensure!(!key.is_empty(), "empty key");
	let offset = with_context!(("invalid offset for {}: {:?}", key, offset),
		parse_u16(offset)
	)?;
	let length = with_context!(("invalid length for {}: {:?}", key, length),
		parse_u16(length)
	)?;
	ensure!(length > 0, "length for {} must not be zero", key);

	let entry = Entry::new(key, offset, length);
	ensure!(entry.end() <= ADDRESS_SPACE,
		"entry {} ends at 0x{:x}, beyond the 16-bit address space", key, entry.end()
	);
	Ok(entry)
}

/// Parses `KEY:OFFSET:LENGTH`
impl str::FromStr for Entry {
	type Err = ::failure::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		// key is allowed to contain ':'
		let mut parts = s.rsplitn(3, ':');
		let (length, offset, key) = match (parts.next(), parts.next(), parts.next()) {
			(Some(l), Some(o), Some(k)) => (l, o, k),
			_ => bail!("expected KEY:OFFSET:LENGTH, got {:?}", s),
		};
		parse_fields(key, offset, length)
	}
}

/// Parses an entry table: one `KEY OFFSET LENGTH` triple per line, `#`
/// starts a comment.
pub fn parse_table(table: &str) -> crate::AResult<Vec<Entry>> {
	let mut entries = Vec::new();
	for (index, line) in table.lines().enumerate() {
		let line = match line.find('#') {
			Some(pos) => &line[..pos],
			None => line,
		};
		let fields: Vec<&str> = line.split_whitespace().collect();
		if fields.is_empty() {
			continue;
		}
		let entry = with_context!(("line {}", index + 1), {
			ensure!(fields.len() == 3, "expected KEY OFFSET LENGTH, got {} fields", fields.len());
			parse_fields(fields[0], fields[1], fields[2])
		})?;
		entries.push(entry);
	}
	Ok(entries)
}

pub fn load_table<P: AsRef<Path>>(path: P) -> crate::AResult<Vec<Entry>> {
	let path = path.as_ref();
	with_context!(("couldn't load entry table {}", path.display()), {
		let table = fs::read_to_string(path)?;
		parse_table(&table)
	})
}

/// Fixed list of entries, searched in the order given
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Registry {
	entries: Vec<Entry>,
}

impl Registry {
	pub fn new(entries: Vec<Entry>) -> Self {
		Registry { entries }
	}

	/// first entry with exactly this key
	pub fn find_entry(&self, key: &str) -> Result<&Entry, EntryError> {
		self.entries.iter()
			.find(|entry| entry.key == key)
			.ok_or_else(|| EntryError::KeyNotFound { key: key.into() })
	}

	pub fn iter(&self) -> slice::Iter<Entry> {
		self.entries.iter()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// pairs of entries sharing at least one byte
	pub fn overlaps(&self) -> Vec<(&Entry, &Entry)> {
		let mut result = Vec::new();
		for (i, a) in self.entries.iter().enumerate() {
			for b in &self.entries[i + 1..] {
				if a.overlaps(b) {
					result.push((a, b));
				}
			}
		}
		result
	}
}

impl From<Vec<Entry>> for Registry {
	fn from(entries: Vec<Entry>) -> Self {
		Registry::new(entries)
	}
}

impl FromIterator<Entry> for Registry {
	fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
		Registry::new(iter.into_iter().collect())
	}
}

impl<'a> IntoIterator for &'a Registry {
	type Item = &'a Entry;
	type IntoIter = slice::Iter<'a, Entry>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.iter()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn registry() -> Registry {
		Registry::new(vec![
			Entry::new("NAME", 0, 32),
			Entry::new("FLAG", 32, 1),
			Entry::new("FLAG", 40, 1),
		])
	}

	#[test]
	fn find_entry_returns_first_match() {
		let registry = registry();
		assert_eq!(registry.find_entry("NAME").unwrap(), &Entry::new("NAME", 0, 32));
		assert_eq!(registry.find_entry("FLAG").unwrap().offset, 32);
	}

	#[test]
	fn find_entry_is_exact() {
		let registry = registry();
		for key in &["name", "NAM", "NAME ", ""] {
			assert_eq!(
				registry.find_entry(key),
				Err(EntryError::KeyNotFound { key: key.to_string() })
			);
		}
	}

	#[test]
	fn parse_entry() {
		assert_eq!("NAME:0:32".parse::<Entry>().unwrap(), Entry::new("NAME", 0, 32));
		assert_eq!("a:b:0x20:0x1".parse::<Entry>().unwrap(), Entry::new("a:b", 32, 1));
		assert_eq!(Entry::new("FLAG", 32, 1).to_string(), "FLAG:32:1");
	}

	#[test]
	fn parse_entry_rejects_garbage() {
		for s in &["NAME:0", ":0:1", "NAME:x:1", "NAME:0:0", "NAME:65535:2", "NAME:0:-1"] {
			assert!(s.parse::<Entry>().is_err(), "{:?} should not parse", s);
		}
		assert!("NAME:65535:1".parse::<Entry>().is_ok());
	}

	#[test]
	fn table() {
		let table = "\
# nickname of the device
DEVICE_NICKNAME 0 32

TINYGO_COOL 0x20 1 # bool
BYTE 33 1
";
		let entries = parse_table(table).unwrap();
		assert_eq!(entries, vec![
			Entry::new("DEVICE_NICKNAME", 0, 32),
			Entry::new("TINYGO_COOL", 32, 1),
			Entry::new("BYTE", 33, 1),
		]);
	}

	#[test]
	fn table_error_names_line() {
		let err = parse_table("A 0 1\nB 1\n").unwrap_err();
		assert!(err.to_string().starts_with("line 2"), "{}", err);
	}

	#[test]
	fn overlaps() {
		let registry = Registry::new(vec![
			Entry::new("A", 0, 4),
			Entry::new("B", 4, 1),
			Entry::new("C", 3, 2),
		]);
		let pairs: Vec<(&str, &str)> = registry.overlaps().into_iter()
			.map(|(a, b)| (a.key.as_str(), b.key.as_str()))
			.collect();
		assert_eq!(pairs, vec![("A", "C"), ("B", "C")]);
	}
}
