#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

use eep::*;

use std::io::{
	self,
	Write,
};
use std::num::ParseIntError;
use std::process::exit;
use std::time::Duration;

use eep::at24cx::{
	self,
	At24cx,
};
use eep::device::{
	ImageFile,
	Memory,
};
use eep::i2c::I2cDev;

fn get_param<T>(matches: &clap::ArgMatches, name: &str) -> AResult<T>
where
	T: std::str::FromStr,
	failure::Error: From<<T as std::str::FromStr>::Err>,
{
	let param = match matches.value_of(name) {
		Some(p) => p,
		None => bail!("missing parameter {}", name),
	};
	param.parse::<T>().map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid paramater {}: {}", name, e);
		e.context(msg).into()
	})
}

// decimal or 0x-prefixed hex
fn get_int_param<T>(matches: &clap::ArgMatches, name: &str, from_str_radix: fn(&str, u32) -> Result<T, ParseIntError>) -> AResult<Option<T>> {
	let param = match matches.value_of(name) {
		Some(p) => p,
		None => return Ok(None),
	};
	let result = if param.starts_with("0x") {
		from_str_radix(&param[2..], 16)
	} else {
		from_str_radix(param, 10)
	};
	result.map(Some).map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid paramater {}: {}", name, e);
		e.context(msg).into()
	})
}

fn parse_hex(s: &str) -> AResult<Vec<u8>> {
	let s: String = s.chars().filter(|c| !c.is_whitespace()).collect();
	ensure!(s.is_ascii(), "invalid hex string {:?}", s);
	ensure!(s.len() % 2 == 0, "odd number of hex digits in {:?}", s);
	let mut result = Vec::with_capacity(s.len() / 2);
	for i in (0..s.len()).step_by(2) {
		let b = u8::from_str_radix(&s[i..i + 2], 16)
			.map_err(|e| format_err!("invalid hex string {:?}: {}", s, e))?;
		result.push(b);
	}
	Ok(result)
}

fn hex_dump(offset: usize, data: &[u8]) {
	for (line, chunk) in data.chunks(16).enumerate() {
		print!("@{:04x}:", offset + line * 16);
		for b in chunk {
			print!(" {:02x}", b);
		}
		for _ in chunk.len()..16 {
			print!("   ");
		}
		let text: String = chunk.iter()
			.map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
			.collect();
		println!("  |{}|", text);
	}
}

fn registry(matches: &clap::ArgMatches) -> AResult<Registry> {
	let mut entries = Vec::new();
	if let Some(table) = matches.value_of("table") {
		entries.extend(entry::load_table(table)?);
	}
	if let Some(values) = matches.values_of("entry") {
		for value in values {
			entries.push(value.parse::<Entry>()?);
		}
	}
	if entries.is_empty() {
		warn!("No entries defined (use --table or --entry)");
	}

	let registry = Registry::new(entries);
	for (a, b) in registry.overlaps() {
		warn!("Entries {} and {} overlap", a, b);
	}
	Ok(registry)
}

fn at24cx_config(matches: &clap::ArgMatches) -> AResult<at24cx::Config> {
	let mut config = at24cx::Config::default();
	if let Some(address) = get_int_param(matches, "address", u8::from_str_radix)? {
		config.address = address;
	}
	if let Some(capacity) = get_int_param(matches, "capacity", usize::from_str_radix)? {
		config.capacity = capacity;
	}
	if let Some(page_size) = get_int_param(matches, "page_size", usize::from_str_radix)? {
		config.page_size = page_size;
	}
	if let Some(write_cycle) = get_int_param(matches, "write_cycle", u64::from_str_radix)? {
		config.write_cycle = Duration::from_millis(write_cycle);
	}
	Ok(config)
}

fn open_device(matches: &clap::ArgMatches, writable: bool) -> AResult<Box<dyn Device>> {
	match (matches.value_of("image"), matches.value_of("i2c")) {
		(Some(image), None) => {
			Ok(Box::new(ImageFile::open(image, writable)?))
		},
		(None, Some(bus)) => {
			let config = at24cx_config(matches)?;
			let bus = I2cDev::open(bus)?;
			Ok(Box::new(At24cx::new(bus, config)?))
		},
		(Some(_), Some(_)) => bail!("--image and --i2c are mutually exclusive"),
		(None, None) => bail!("need a device: --image FILE or --i2c DEVICE"),
	}
}

fn open_eeprom(matches: &clap::ArgMatches, writable: bool) -> AResult<Eeprom<Box<dyn Device>>> {
	let registry = registry(matches)?;
	let device = open_device(matches, writable)?;
	Ok(Eeprom::new(device, registry))
}

fn list(matches: &clap::ArgMatches) -> AResult<()> {
	let registry = registry(matches)?;
	for entry in &registry {
		let kind = if entry.is_boolean() { " (bool)" } else { "" };
		println!("{:<24} @0x{:04x} {:>5} bytes{}", entry.key, entry.offset, entry.length, kind);
	}
	Ok(())
}

fn read(matches: &clap::ArgMatches, sub_m: &clap::ArgMatches) -> AResult<()> {
	let key: String = get_param(sub_m, "KEY")?;
	let mut ee = open_eeprom(matches, false)?;
	let value = ee.read(&key)?;

	if sub_m.is_present("raw") {
		io::stdout().write_all(&value)?;
	} else {
		let offset = ee.entries().find_entry(&key)?.offset;
		hex_dump(offset as usize, &value);
	}
	Ok(())
}

fn write(matches: &clap::ArgMatches, sub_m: &clap::ArgMatches) -> AResult<()> {
	let key: String = get_param(sub_m, "KEY")?;
	let value: String = get_param(sub_m, "VALUE")?;
	let value = if sub_m.is_present("hex") {
		parse_hex(&value)?
	} else {
		value.into_bytes()
	};

	let mut ee = open_eeprom(matches, true)?;
	ee.write(&key, &value)?;
	info!("Wrote {} bytes to {}", value.len(), key);
	Ok(())
}

fn length(matches: &clap::ArgMatches, sub_m: &clap::ArgMatches) -> AResult<()> {
	let key: String = get_param(sub_m, "KEY")?;
	let registry = registry(matches)?;
	// no device access needed
	let ee = Eeprom::new(Memory::new(0), registry);
	println!("{}", ee.length(&key)?);
	Ok(())
}

fn is(matches: &clap::ArgMatches, sub_m: &clap::ArgMatches) -> AResult<()> {
	let key: String = get_param(sub_m, "KEY")?;
	let mut ee = open_eeprom(matches, false)?;
	let value = ee.is(&key)?;
	println!("{}", value);
	if !value {
		exit(2);
	}
	Ok(())
}

fn create_image(sub_m: &clap::ArgMatches) -> AResult<()> {
	let size = match get_int_param(sub_m, "SIZE", usize::from_str_radix)? {
		Some(size) => size,
		None => bail!("missing parameter SIZE"),
	};
	let image = ImageFile::create(get_param::<String>(sub_m, "FILE")?, size)?;
	image.sync()?;
	info!("Created erased image {} ({} bytes)", image.path().display(), image.len());
	Ok(())
}

fn report<T: std::fmt::Debug>(what: &str, result: AResult<T>) {
	match result {
		Ok(v) => println!("{}: {:?}", what, v),
		Err(e) => println!("{}: error: {}", what, e),
	}
}

fn demo() -> AResult<()> {
	let registry = Registry::new(vec![
		Entry::new("DEVICE_NICKNAME", 0, 32),
		Entry::new("TINYGO_COOL", 32, 1),
		Entry::new("BYTE", 33, 1),
	]);
	let config = at24cx::Config {
		write_cycle: Duration::from_millis(0),
		..at24cx::Config::default()
	};
	let device = At24cx::new(at24cx::Simulated::new(config), config)?;
	let mut ee = Eeprom::new(device, registry);

	report("write DEVICE_NICKNAME", ee.write("DEVICE_NICKNAME", b"Example eeprom toy"));
	// misspelled key: not in the table
	report("write TINYGO_IS_COOL", ee.write("TINYGO_IS_COOL", &[1]));
	report("write TINYGO_COOL", ee.write("TINYGO_COOL", &[1]));
	report("write BYTE", ee.write("BYTE", &[42]));

	let nickname = ee.read("DEVICE_NICKNAME")?;
	let end = nickname.iter().position(|&b| b == 0xff).unwrap_or(nickname.len());
	println!("Device Nickname: {}", String::from_utf8_lossy(&nickname[..end]));
	report("TinyGo is cool", ee.is("TINYGO_COOL"));
	report("Byte as bool", ee.is("BYTE"));
	report("Nickname as bool", ee.is("DEVICE_NICKNAME"));
	report("Nonexistent key", ee.read("NONEXISTENT"));
	report("Too long nickname", ee.write("DEVICE_NICKNAME", &[b'x'; 33]));

	Ok(())
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(@setting SubcommandRequiredElseHelp)
		(global_setting: clap::AppSettings::VersionlessSubcommands)
		(@arg table: -t --table +takes_value "entry table file (KEY OFFSET LENGTH per line)")
		(@arg entry: -e --entry +takes_value +multiple number_of_values(1) "entry KEY:OFFSET:LENGTH (repeatable)")
		(@arg image: -i --image +takes_value "EEPROM image file")
		(@arg i2c: --i2c +takes_value "I2C bus device with an AT24Cx EEPROM (e.g. /dev/i2c-1)")
		(@arg address: -a --address +takes_value "7-bit I2C address of the EEPROM (default 0x57)")
		(@arg capacity: --capacity +takes_value "EEPROM size in bytes (default 4096)")
		(@arg page_size: --page_size +takes_value "EEPROM page size in bytes (default 32)")
		(@arg write_cycle: --write_cycle +takes_value "EEPROM write cycle time in ms (default 5)")
		(@subcommand list =>
			(about: "list entries")
		)
		(@subcommand read =>
			(about: "read value of an entry (hexdump)")
			(@arg raw: -r --raw "write raw bytes to stdout")
			(@arg KEY: +required "entry key")
		)
		(@subcommand write =>
			(about: "write value of an entry")
			(@arg hex: -x --hex "VALUE is hex encoded")
			(@arg KEY: +required "entry key")
			(@arg VALUE: +required "value to write")
		)
		(@subcommand length =>
			(about: "show maximum length of an entry")
			(@arg KEY: +required "entry key")
		)
		(@subcommand is =>
			(about: "read boolean entry (exit code 2 if false)")
			(@arg KEY: +required "entry key")
		)
		(@subcommand create_image =>
			(about: "create new erased EEPROM image file")
			(@arg FILE: +required "image file to create")
			(@arg SIZE: +required "size in bytes")
		)
		(@subcommand demo =>
			(about: "run example against a simulated AT24C32")
		)
	).get_matches();

	match matches.subcommand() {
		("list", _) => {
			list(&matches)
		},
		("read", Some(sub_m)) => {
			read(&matches, sub_m)
		},
		("write", Some(sub_m)) => {
			write(&matches, sub_m)
		},
		("length", Some(sub_m)) => {
			length(&matches, sub_m)
		},
		("is", Some(sub_m)) => {
			is(&matches, sub_m)
		},
		("create_image", Some(sub_m)) => {
			create_image(sub_m)
		},
		("demo", _) => {
			demo()
		},
		("", _) => bail!("no subcommand"),
		(cmd, _) => bail!("not implemented subcommand {:?}", cmd),
	}
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		exit(1);
	}
}
