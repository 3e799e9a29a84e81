//! `User_Setup.h` text form of a [`BoardSetup`].
//!
//! Only `#define NAME [VALUE]` and `#undef NAME` lines are read. `//` and
//! `/* */` comments are removed first, so commented-out defines stay inactive.
//! Conditionals (`#if`, `#ifdef`, `#else`, `#endif`) are not evaluated: every
//! define outside a comment counts, whatever block it sits in.

use crate::config::SPI_TOUCH_FREQUENCY;
use crate::error::SetupError;
use crate::model::Backlight;
use crate::model::BoardSetup;
use crate::model::ColorOrder;
use crate::model::DisplayDriver;
use crate::model::FontSet;
use crate::model::Level;
use crate::model::Pin;
use crate::model::SpiClocks;
use crate::model::SpiPins;
use crate::model::TouchSetup;
use log::debug;
use log::trace;
use log::warn;
use std::fmt;

/// Parse header text into a setup.
///
/// Conflicts between defines (two drivers, colliding pins, ...) are not
/// rejected here, see [`crate::validate::validate`].
pub fn parse(text: &str) -> Result<BoardSetup, SetupError> {
	let mut defines = Defines::default();
	let mut in_block = false;

	for (num, line) in text.lines().enumerate() {
		let line = strip_comments(line, &mut in_block);
		let line = line.trim();
		let Some(rest) = line.strip_prefix('#') else {
			if !line.is_empty() {
				debug!("#[line {}] not a directive, skip: {:?}", num + 1, line);
			}
			continue;
		};

		let rest = rest.trim_start();
		let (directive, rest) = match rest.split_once(char::is_whitespace) {
			Some((directive, rest)) => (directive, rest.trim()),
			None => (rest, ""),
		};
		let (name, value) = match rest.split_once(char::is_whitespace) {
			Some((name, value)) => (name, value.trim()),
			None => (rest, ""),
		};

		match directive {
			"define" if !name.is_empty() => {
				trace!("#[line {}] {} = {:?}", num + 1, name, value);
				defines.set(num + 1, name, value)?;
			}
			"undef" if !name.is_empty() => defines.unset(num + 1, name),
			_ => debug!("#[line {}] directive ignored: {:?}", num + 1, line),
		}
	}
	if in_block {
		warn!("unterminated /* comment at end of setup");
	}

	defines.finish()
}

/// Render a setup as header text, [`parse`] reads it back unchanged.
#[inline]
pub fn emit(setup: &BoardSetup) -> String {
	Header(setup).to_string()
}

pub struct Header<'a>(pub &'a BoardSetup);

impl fmt::Display for Header<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let setup = self.0;
		const RULE: &str = "// ----------------------------------------------------";

		writeln!(f, "{}", RULE)?;
		match &setup.info {
			Some(info) => {
				writeln!(f, "// {}", info)?;
				writeln!(f, "{}", RULE)?;
				writeln!(f, "#define USER_SETUP_INFO \"{}\"", info)?;
			}
			None => writeln!(f, "{}", RULE)?,
		}

		writeln!(f)?;
		writeln!(f, "// ---- Display Driver ----")?;
		for driver in setup.drivers.iter() {
			writeln!(f, "#define {}", driver.define())?;
		}
		writeln!(f)?;
		writeln!(f, "#define TFT_WIDTH  {}", setup.width)?;
		writeln!(f, "#define TFT_HEIGHT {}", setup.height)?;
		writeln!(f, "#define TFT_RGB_ORDER {}", setup.color_order.define())?;

		let pins = &setup.pins;
		writeln!(f)?;
		writeln!(f, "// ---- SPI PINS ----")?;
		writeln!(f, "#define TFT_MISO {}", Pin::to_define(pins.miso))?;
		writeln!(f, "#define TFT_MOSI {}", pins.mosi.num())?;
		writeln!(f, "#define TFT_SCLK {}", pins.sclk.num())?;
		writeln!(f, "#define TFT_CS   {}", pins.cs.num())?;
		writeln!(f, "#define TFT_DC   {}", pins.dc.num())?;
		match pins.rst {
			Some(a) => writeln!(f, "#define TFT_RST  {}", a.num())?,
			None => writeln!(f, "#define TFT_RST  -1    // Not driven, tied to EN")?,
		}

		writeln!(f)?;
		writeln!(f, "// ---- Backlight ----")?;
		writeln!(f, "#define TFT_BL   {}", Pin::to_define(setup.backlight.pin))?;
		writeln!(f, "#define TFT_BACKLIGHT_ON {}", setup.backlight.on.define())?;

		if let Some(touch) = &setup.touch {
			writeln!(f)?;
			writeln!(f, "// ---- Touch ----")?;
			writeln!(f, "#define TOUCH_CS  {}", touch.cs.num())?;
			writeln!(f, "#define TOUCH_IRQ {}", Pin::to_define(touch.irq))?;
			writeln!(f, "#define SPI_TOUCH_FREQUENCY {}", touch.frequency)?;
		}

		writeln!(f)?;
		writeln!(f, "// ---- Fonts ----")?;
		for font in setup.fonts.defines() {
			writeln!(f, "#define {}", font)?;
		}

		writeln!(f)?;
		writeln!(f, "// ---- SPI Clock ----")?;
		writeln!(f, "#define SPI_FREQUENCY       {}", setup.clocks.write)?;
		writeln!(f, "#define SPI_READ_FREQUENCY  {}", setup.clocks.read)
	}
}

/// Remove `//` and `/* */` comments, ignoring both inside a string literal.
/// `in_block` carries an open `/*` over to the next line.
fn strip_comments(line: &str, in_block: &mut bool) -> String {
	let mut result = String::with_capacity(line.len());
	let mut in_str = false;
	let mut chars = line.chars().peekable();

	while let Some(a) = chars.next() {
		if *in_block {
			if a == '*' && chars.peek() == Some(&'/') {
				chars.next();
				*in_block = false;
				result.push(' ');
			}
			continue;
		}

		match a {
			'"' => in_str = !in_str,
			'/' if !in_str && chars.peek() == Some(&'/') => break,
			'/' if !in_str && chars.peek() == Some(&'*') => {
				chars.next();
				*in_block = true;
				continue;
			}
			_ => {}
		}
		result.push(a);
	}

	result
}

#[derive(Default)]
struct Defines {
	info: Option<String>,
	drivers: Vec<DisplayDriver>,
	width: Option<u16>,
	height: Option<u16>,
	color_order: Option<ColorOrder>,

	miso: Option<Option<Pin>>,
	mosi: Option<Option<Pin>>,
	sclk: Option<Option<Pin>>,
	cs: Option<Option<Pin>>,
	dc: Option<Option<Pin>>,
	rst: Option<Option<Pin>>,

	bl: Option<Option<Pin>>,
	bl_on: Option<Level>,

	touch_cs: Option<Option<Pin>>,
	touch_irq: Option<Option<Pin>>,
	touch_frequency: Option<u32>,

	fonts: FontSet,
	write_frequency: Option<u32>,
	read_frequency: Option<u32>,
}

impl Defines {
	fn set(&mut self, line: usize, name: &str, value: &str) -> Result<(), SetupError> {
		let invalid = || SetupError::InvalidValue {
			line,
			name: name.to_string(),
			value: value.to_string(),
		};
		let num = |max: i64| -> Result<i64, SetupError> {
			value
				.replace('_', "")
				.parse::<i64>()
				.ok()
				.filter(|a| (0..=max).contains(a))
				.ok_or_else(invalid)
		};
		let pin = || -> Result<Option<Pin>, SetupError> {
			let a: i16 = value.parse().map_err(|_| invalid())?;
			Pin::from_define(a).map_err(|_| invalid())
		};
		let flag = || {
			if !value.is_empty() {
				warn!("#[line {}] {} is a flag, value {:?} ignored", line, name, value);
			}
		};

		macro_rules! store {
			($field:expr, $value:expr) => {{
				let value = $value;
				if $field.replace(value).is_some() {
					warn!("#[line {}] {} redefined", line, name);
				}
			}};
		}

		match name {
			"USER_SETUP_INFO" => {
				let info = value
					.strip_prefix('"')
					.and_then(|a| a.strip_suffix('"'))
					.ok_or_else(invalid)?;
				store!(self.info, info.to_string());
			}
			"TFT_WIDTH" => store!(self.width, num(u16::MAX as _)? as u16),
			"TFT_HEIGHT" => store!(self.height, num(u16::MAX as _)? as u16),
			"TFT_RGB_ORDER" => {
				let order = ColorOrder::from_define(value)
					.ok_or_else(|| SetupError::UnsupportedColorOrder(value.to_string()))?;
				store!(self.color_order, order);
			}

			"TFT_MISO" => store!(self.miso, pin()?),
			"TFT_MOSI" => store!(self.mosi, pin()?),
			"TFT_SCLK" => store!(self.sclk, pin()?),
			"TFT_CS" => store!(self.cs, pin()?),
			"TFT_DC" => store!(self.dc, pin()?),
			"TFT_RST" => store!(self.rst, pin()?),

			"TFT_BL" => store!(self.bl, pin()?),
			"TFT_BACKLIGHT_ON" => store!(self.bl_on, Level::from_define(value).ok_or_else(invalid)?),

			"TOUCH_CS" => store!(self.touch_cs, pin()?),
			"TOUCH_IRQ" => store!(self.touch_irq, pin()?),
			"SPI_TOUCH_FREQUENCY" => store!(self.touch_frequency, num(u32::MAX as _)? as u32),

			"SPI_FREQUENCY" => store!(self.write_frequency, num(u32::MAX as _)? as u32),
			"SPI_READ_FREQUENCY" => store!(self.read_frequency, num(u32::MAX as _)? as u32),

			name => {
				if let Some(driver) = DisplayDriver::from_define(name) {
					flag();
					if self.drivers.contains(&driver) {
						warn!("#[line {}] {} redefined", line, name);
					} else {
						self.drivers.push(driver);
					}
				} else if let Some(font) = FontSet::from_define(name) {
					flag();
					self.fonts.insert(font);
				} else {
					debug!("#[line {}] unknown define {}, skip", line, name);
				}
			}
		}

		Ok(())
	}

	fn unset(&mut self, line: usize, name: &str) {
		match name {
			"USER_SETUP_INFO" => self.info = None,
			"TFT_WIDTH" => self.width = None,
			"TFT_HEIGHT" => self.height = None,
			"TFT_RGB_ORDER" => self.color_order = None,

			"TFT_MISO" => self.miso = None,
			"TFT_MOSI" => self.mosi = None,
			"TFT_SCLK" => self.sclk = None,
			"TFT_CS" => self.cs = None,
			"TFT_DC" => self.dc = None,
			"TFT_RST" => self.rst = None,

			"TFT_BL" => self.bl = None,
			"TFT_BACKLIGHT_ON" => self.bl_on = None,

			"TOUCH_CS" => self.touch_cs = None,
			"TOUCH_IRQ" => self.touch_irq = None,
			"SPI_TOUCH_FREQUENCY" => self.touch_frequency = None,

			"SPI_FREQUENCY" => self.write_frequency = None,
			"SPI_READ_FREQUENCY" => self.read_frequency = None,

			name => {
				if let Some(driver) = DisplayDriver::from_define(name) {
					self.drivers.retain(|a| *a != driver);
				} else if let Some(font) = FontSet::from_define(name) {
					self.fonts.remove(font);
				} else {
					debug!("#[line {}] unknown undef {}, skip", line, name);
					return;
				}
			}
		}
		trace!("#[line {}] {} undefined", line, name);
	}

	fn finish(self) -> Result<BoardSetup, SetupError> {
		fn required(pin: Option<Option<Pin>>, name: &'static str) -> Result<Pin, SetupError> {
			pin.flatten().ok_or(SetupError::MissingKey(name))
		}

		let native = self.drivers.first().map(|a| a.panel_sizes()[0]);
		let width = self
			.width
			.or(native.map(|(w, _)| w))
			.ok_or(SetupError::MissingKey("TFT_WIDTH"))?;
		let height = self
			.height
			.or(native.map(|(_, h)| h))
			.ok_or(SetupError::MissingKey("TFT_HEIGHT"))?;

		let write = self
			.write_frequency
			.ok_or(SetupError::MissingKey("SPI_FREQUENCY"))?;

		let touch = self.touch_cs.flatten().map(|cs| TouchSetup {
			cs,
			irq: self.touch_irq.flatten(),
			frequency: self.touch_frequency.unwrap_or(SPI_TOUCH_FREQUENCY),
		});
		if touch.is_none() && (self.touch_irq.is_some() || self.touch_frequency.is_some()) {
			warn!("TOUCH_CS is not defined, touch settings ignored");
		}

		Ok(BoardSetup {
			info: self.info,
			drivers: self.drivers,
			width,
			height,
			color_order: self.color_order.unwrap_or(ColorOrder::Rgb),
			pins: SpiPins {
				miso: self.miso.flatten(),
				mosi: required(self.mosi, "TFT_MOSI")?,
				sclk: required(self.sclk, "TFT_SCLK")?,
				cs: required(self.cs, "TFT_CS")?,
				dc: required(self.dc, "TFT_DC")?,
				rst: self.rst.flatten(),
			},
			backlight: Backlight {
				pin: self.bl.flatten(),
				on: self.bl_on.unwrap_or(Level::High),
			},
			touch,
			fonts: self.fonts,
			clocks: SpiClocks {
				write,
				read: self.read_frequency.unwrap_or(write),
			},
		})
	}
}

#[cfg(test)]
const BOARD_HEADER: &str = r#"// ----------------------------------------------------
// Freenove ESP32-32E 4.0" LCD (320x480) SPI ST7796 + XPT2046
// ----------------------------------------------------
#define USER_SETUP_INFO "ESP32-32E_ST7796_SPI"

// ---- Display Driver ----
#define ST7796_DRIVER
//#define ILI9488_DRIVER   // leave commented

// Optional but recommended:
#define TFT_WIDTH  320
#define TFT_HEIGHT 480
#define TFT_RGB_ORDER TFT_BGR   // typical for ST7796

// ---- SPI PINS ----
#define TFT_MISO 12
#define TFT_MOSI 13
#define TFT_SCLK 14
#define TFT_CS   15
#define TFT_DC    2
#define TFT_RST  -1    // Uses EN pin

// ---- Backlight ----
#define TFT_BL   27
#define TFT_BACKLIGHT_ON HIGH

// ---- Touch ----
#define TOUCH_CS  33
#define TOUCH_IRQ 36
#define SPI_TOUCH_FREQUENCY 2500000

// ---- Fonts ----
#define LOAD_GLCD
#define LOAD_FONT2
#define LOAD_FONT4
#define LOAD_GFXFF
#define SMOOTH_FONT

// ---- SPI Clock ----
#define SPI_FREQUENCY       27000000
#define SPI_READ_FREQUENCY  20000000
"#;

#[cfg(test)]
#[test]
fn parse_board_header() {
	let setup = parse(BOARD_HEADER).unwrap();
	assert_eq!(setup, BoardSetup::freenove_esp32_32e());
}

#[cfg(test)]
#[test]
fn emit_then_parse_is_identity() {
	let setup = BoardSetup::freenove_esp32_32e();
	let text = emit(&setup);

	assert!(text.contains("#define ST7796_DRIVER\n"));
	assert!(text.contains("#define TFT_RST  -1"));
	assert_eq!(parse(&text).unwrap(), setup);
	assert_eq!(emit(&parse(&text).unwrap()), text);
}

#[cfg(test)]
#[test]
fn parse_keeps_second_driver() {
	let text = BOARD_HEADER.replace("//#define ILI9488_DRIVER", "#define ILI9488_DRIVER");
	let setup = parse(&text).unwrap();

	assert_eq!(
		setup.drivers,
		[DisplayDriver::St7796, DisplayDriver::Ili9488]
	);
	assert_eq!(setup.driver(), None);
}

#[cfg(test)]
#[test]
fn parse_defaults() {
	let text = "\
#define ILI9341_DRIVER
#define TFT_MOSI 23
#define TFT_SCLK 18
#define TFT_CS 5
#define TFT_DC 4
#define SPI_FREQUENCY 40000000
";
	let setup = parse(text).unwrap();

	assert_eq!(setup.info, None);
	assert_eq!((setup.width, setup.height), (240, 320));
	assert_eq!(setup.color_order, ColorOrder::Rgb);
	assert_eq!(setup.pins.miso, None);
	assert_eq!(setup.pins.rst, None);
	assert_eq!(setup.backlight.pin, None);
	assert_eq!(setup.backlight.on, Level::High);
	assert_eq!(setup.touch, None);
	assert!(setup.fonts.is_empty());
	assert_eq!(setup.clocks.read, 40_000_000);
}

#[cfg(test)]
#[test]
fn parse_touch_default_frequency() {
	let text = BOARD_HEADER.replace("#define SPI_TOUCH_FREQUENCY 2500000", "");
	let setup = parse(&text).unwrap();

	assert_eq!(setup.touch.map(|a| a.frequency), Some(2_500_000));
}

#[cfg(test)]
#[test]
fn parse_errors() {
	let text = BOARD_HEADER.replace("TFT_RGB_ORDER TFT_BGR", "TFT_RGB_ORDER TFT_GRB");
	assert_eq!(
		parse(&text),
		Err(SetupError::UnsupportedColorOrder("TFT_GRB".to_string()))
	);

	let text = BOARD_HEADER.replace("#define TFT_DC    2", "");
	assert_eq!(parse(&text), Err(SetupError::MissingKey("TFT_DC")));

	let text = BOARD_HEADER.replace("#define TFT_CS   15", "#define TFT_CS   -1");
	assert_eq!(parse(&text), Err(SetupError::MissingKey("TFT_CS")));

	let text = BOARD_HEADER.replace("TFT_BACKLIGHT_ON HIGH", "TFT_BACKLIGHT_ON MAYBE");
	assert!(matches!(
		parse(&text),
		Err(SetupError::InvalidValue { line: 25, .. })
	));

	let text = BOARD_HEADER.replace("SPI_FREQUENCY       27000000", "SPI_FREQUENCY 27MHz");
	assert!(matches!(parse(&text), Err(SetupError::InvalidValue { .. })));
}

#[cfg(test)]
#[test]
fn comments_and_strings() {
	let mut in_block = false;
	assert_eq!(
		strip_comments("#define TFT_CS 15 // cs", &mut in_block),
		"#define TFT_CS 15 "
	);
	assert_eq!(
		strip_comments("#define USER_SETUP_INFO \"a//b/*c*/\" // x", &mut in_block),
		"#define USER_SETUP_INFO \"a//b/*c*/\" "
	);
	assert_eq!(strip_comments("//#define ILI9488_DRIVER", &mut in_block), "");
	assert_eq!(
		strip_comments("#define TFT_DC /* dc */ 2", &mut in_block),
		"#define TFT_DC   2"
	);
	assert!(!in_block);

	assert_eq!(strip_comments("#define TFT_BL 27 /* open", &mut in_block), "#define TFT_BL 27 ");
	assert!(in_block);
	assert_eq!(strip_comments("#define TFT_BL 4", &mut in_block), "");
	assert_eq!(strip_comments("end */#define X", &mut in_block), " #define X");
	assert!(!in_block);
}

#[cfg(test)]
#[test]
fn parse_block_comments() {
	let text = BOARD_HEADER
		.replace(
			"//#define ILI9488_DRIVER   // leave commented",
			"/*\n#define ILI9488_DRIVER\n#define TFT_WIDTH 240\n*/",
		)
		.replace("#define TFT_CS   15", "#define TFT_CS   15 /* display cs */");
	let setup = parse(&text).unwrap();

	assert_eq!(setup, BoardSetup::freenove_esp32_32e());
	assert_eq!(setup.driver(), Some(DisplayDriver::St7796));
}

#[cfg(test)]
#[test]
fn parse_undef() {
	let text = format!(
		"{}#undef SMOOTH_FONT\n#undef TFT_BL\n#define ILI9488_DRIVER\n#undef ILI9488_DRIVER\n",
		BOARD_HEADER
	);
	let setup = parse(&text).unwrap();

	assert_eq!(setup.driver(), Some(DisplayDriver::St7796));
	assert_eq!(setup.backlight.pin, None);
	assert!(!setup.fonts.contains(FontSet::SMOOTH));
	assert!(setup.fonts.contains(FontSet::GLCD));

	let text = format!("{}#undef TFT_MOSI\n", BOARD_HEADER);
	assert_eq!(parse(&text), Err(SetupError::MissingKey("TFT_MOSI")));
}

#[cfg(test)]
#[test]
fn conditionals_are_not_evaluated() {
	let text = format!("{}#if 0\n#define TFT_BL 4\n#endif\n", BOARD_HEADER);
	let setup = parse(&text).unwrap();

	assert_eq!(setup.backlight.pin, Some(Pin(4)));
}

#[cfg(test)]
#[test]
fn parse_redefinitions() {
	let text = format!(
		"{}#define SPI_FREQUENCY 40000000\n#define TFT_BL 4\n#define ST7796_DRIVER\n",
		BOARD_HEADER
	);
	let setup = parse(&text).unwrap();

	assert_eq!(setup.clocks.write, 40_000_000);
	assert_eq!(setup.backlight.pin, Some(Pin(4)));
	assert_eq!(setup.drivers, [DisplayDriver::St7796]);
	assert_eq!(setup.driver(), Some(DisplayDriver::St7796));
}

#[cfg(test)]
#[test]
fn parse_touch_without_cs() {
	let text = BOARD_HEADER.replace("#define TOUCH_CS  33", "");
	let setup = parse(&text).unwrap();
	assert_eq!(setup.touch, None);

	let text = BOARD_HEADER.replace("#define TOUCH_CS  33", "#define TOUCH_CS  -1");
	assert_eq!(parse(&text).unwrap().touch, None);
}
