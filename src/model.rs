use crate::config::FONTS;
use crate::config::SPI_FREQUENCY;
use crate::config::SPI_READ_FREQUENCY;
use crate::config::SPI_TOUCH_FREQUENCY;
use crate::config::TFT_BACKLIGHT_ON;
use crate::config::TFT_BL;
use crate::config::TFT_CS;
use crate::config::TFT_DC;
use crate::config::TFT_DRIVER;
use crate::config::TFT_HEIGHT;
use crate::config::TFT_MISO;
use crate::config::TFT_MOSI;
use crate::config::TFT_RGB_ORDER;
use crate::config::TFT_RST;
use crate::config::TFT_SCLK;
use crate::config::TFT_WIDTH;
use crate::config::TOUCH_CS;
use crate::config::TOUCH_IRQ;
use crate::config::USER_SETUP_INFO;
use bitflags::bitflags;
use std::fmt;

/// Display controller variant, one `*_DRIVER` flag of the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayDriver {
	Ili9341,
	St7735,
	Ili9481,
	Ili9486,
	Ili9488,
	St7789,
	St7796,
	Gc9a01,
	Hx8357d,
}

impl DisplayDriver {
	pub const ALL: [Self; 9] = [
		Self::Ili9341,
		Self::St7735,
		Self::Ili9481,
		Self::Ili9486,
		Self::Ili9488,
		Self::St7789,
		Self::St7796,
		Self::Gc9a01,
		Self::Hx8357d,
	];

	pub const fn define(&self) -> &'static str {
		match self {
			Self::Ili9341 => "ILI9341_DRIVER",
			Self::St7735 => "ST7735_DRIVER",
			Self::Ili9481 => "ILI9481_DRIVER",
			Self::Ili9486 => "ILI9486_DRIVER",
			Self::Ili9488 => "ILI9488_DRIVER",
			Self::St7789 => "ST7789_DRIVER",
			Self::St7796 => "ST7796_DRIVER",
			Self::Gc9a01 => "GC9A01_DRIVER",
			Self::Hx8357d => "HX8357D_DRIVER",
		}
	}

	pub fn from_define(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|a| a.define() == name)
	}

	/// Panel sizes the controller is sold with, portrait (width, height).
	/// The first entry is the full controller RAM size.
	pub const fn panel_sizes(&self) -> &'static [(u16, u16)] {
		match self {
			Self::Ili9341 => &[(240, 320)],
			Self::St7789 => &[(240, 320), (240, 240), (135, 240), (170, 320), (240, 280)],
			Self::St7735 => &[(128, 160), (128, 128), (80, 160)],
			Self::Gc9a01 => &[(240, 240)],
			Self::Ili9481 | Self::Ili9486 | Self::Ili9488 | Self::St7796 | Self::Hx8357d => {
				&[(320, 480)]
			}
		}
	}

	#[inline]
	pub fn supports_size(&self, width: u16, height: u16) -> bool {
		self.panel_sizes().contains(&(width, height))
	}

	/// Highest SPI write clock the controller accepts.
	pub const fn max_write_frequency(&self) -> u32 {
		match self {
			Self::Ili9341 | Self::St7789 | Self::St7796 | Self::Gc9a01 => 80_000_000,
			Self::St7735 | Self::Ili9481 | Self::Ili9488 | Self::Hx8357d => 40_000_000,
			Self::Ili9486 => 20_000_000,
		}
	}
}

impl fmt::Display for DisplayDriver {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.define())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorOrder {
	Rgb,
	Bgr,
}

impl ColorOrder {
	#[inline]
	pub const fn define(&self) -> &'static str {
		match self {
			Self::Rgb => "TFT_RGB",
			Self::Bgr => "TFT_BGR",
		}
	}

	pub fn from_define(value: &str) -> Option<Self> {
		match value {
			"TFT_RGB" => Some(Self::Rgb),
			"TFT_BGR" => Some(Self::Bgr),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
	Low,
	High,
}

impl Level {
	#[inline]
	pub const fn define(&self) -> &'static str {
		match self {
			Self::Low => "LOW",
			Self::High => "HIGH",
		}
	}

	pub fn from_define(value: &str) -> Option<Self> {
		match value {
			"LOW" | "0" => Some(Self::Low),
			"HIGH" | "1" => Some(Self::High),
			_ => None,
		}
	}
}

/// ESP32 GPIO number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pin(pub u8);

impl Pin {
	#[inline]
	pub const fn num(&self) -> u8 {
		self.0
	}

	/// Header form of an optional pin, -1 if unused.
	#[inline]
	pub const fn to_define(pin: Option<Pin>) -> i16 {
		match pin {
			Some(Pin(a)) => a as i16,
			None => -1,
		}
	}

	/// Reverse of [`Pin::to_define`]. Any negative number means unused.
	pub const fn from_define(num: i16) -> Result<Option<Pin>, i16> {
		match num {
			a if a < 0 => Ok(None),
			a if a <= u8::MAX as i16 => Ok(Some(Pin(a as u8))),
			a => Err(a),
		}
	}
}

impl fmt::Display for Pin {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "GPIO{}", self.0)
	}
}

/// What a pin is used for, named after its header define.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinRole {
	Miso,
	Mosi,
	Sclk,
	Cs,
	Dc,
	Rst,
	Backlight,
	TouchCs,
	TouchIrq,
}

impl PinRole {
	pub const fn define(&self) -> &'static str {
		match self {
			Self::Miso => "TFT_MISO",
			Self::Mosi => "TFT_MOSI",
			Self::Sclk => "TFT_SCLK",
			Self::Cs => "TFT_CS",
			Self::Dc => "TFT_DC",
			Self::Rst => "TFT_RST",
			Self::Backlight => "TFT_BL",
			Self::TouchCs => "TOUCH_CS",
			Self::TouchIrq => "TOUCH_IRQ",
		}
	}

	/// Roles that are only ever read by the MCU.
	#[inline]
	pub const fn is_input(&self) -> bool {
		matches!(self, Self::Miso | Self::TouchIrq)
	}
}

impl fmt::Display for PinRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.define())
	}
}

bitflags! {
	/// Independently enabled font resources.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
	pub struct FontSet: u8 {
		/// Adafruit 8 pixel font
		const GLCD = 1 << 0;
		/// 16 pixel
		const FONT2 = 1 << 1;
		/// 26 pixel
		const FONT4 = 1 << 2;
		/// 48 pixel, digits only
		const FONT6 = 1 << 3;
		/// 7 segment 48 pixel
		const FONT7 = 1 << 4;
		/// 75 pixel, digits only
		const FONT8 = 1 << 5;
		/// FreeFonts
		const GFXFF = 1 << 6;
		/// Anti-aliased fonts
		const SMOOTH = 1 << 7;
	}
}

impl FontSet {
	/// Header define of each font flag, in header order.
	pub const DEFINES: [(Self, &'static str); 8] = [
		(Self::GLCD, "LOAD_GLCD"),
		(Self::FONT2, "LOAD_FONT2"),
		(Self::FONT4, "LOAD_FONT4"),
		(Self::FONT6, "LOAD_FONT6"),
		(Self::FONT7, "LOAD_FONT7"),
		(Self::FONT8, "LOAD_FONT8"),
		(Self::GFXFF, "LOAD_GFXFF"),
		(Self::SMOOTH, "SMOOTH_FONT"),
	];

	pub fn from_define(name: &str) -> Option<Self> {
		Self::DEFINES
			.iter()
			.find(|(_, a)| *a == name)
			.map(|(a, _)| *a)
	}

	/// Header defines of the enabled fonts, in header order.
	pub fn defines(&self) -> impl Iterator<Item = &'static str> + '_ {
		Self::DEFINES
			.iter()
			.filter(move |(a, _)| self.contains(*a))
			.map(|(_, name)| *name)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiPins {
	pub miso: Option<Pin>,
	pub mosi: Pin,
	pub sclk: Pin,
	pub cs: Pin,
	pub dc: Pin,
	/// None: reset is not driven from the MCU (tied to EN or a pull-up).
	pub rst: Option<Pin>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backlight {
	pub pin: Option<Pin>,
	pub on: Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchSetup {
	pub cs: Pin,
	pub irq: Option<Pin>,
	pub frequency: u32, // Hz
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiClocks {
	pub write: u32, // Hz
	pub read: u32,  // Hz
}

/// Everything the graphics library reads from its user setup header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSetup {
	pub info: Option<String>,
	/// Active `*_DRIVER` flags in header order. Exactly one for a usable setup.
	pub drivers: Vec<DisplayDriver>,
	pub width: u16,
	pub height: u16,
	pub color_order: ColorOrder,
	pub pins: SpiPins,
	pub backlight: Backlight,
	pub touch: Option<TouchSetup>,
	pub fonts: FontSet,
	pub clocks: SpiClocks,
}

impl BoardSetup {
	/// Freenove ESP32-32E 4.0" ST7796 board, see `config.rs`.
	pub fn freenove_esp32_32e() -> Self {
		#[inline]
		const fn pin(a: Option<u8>) -> Option<Pin> {
			match a {
				Some(a) => Some(Pin(a)),
				None => None,
			}
		}

		Self {
			info: Some(USER_SETUP_INFO.to_string()),
			drivers: vec![TFT_DRIVER],
			width: TFT_WIDTH,
			height: TFT_HEIGHT,
			color_order: TFT_RGB_ORDER,
			pins: SpiPins {
				miso: pin(TFT_MISO),
				mosi: Pin(TFT_MOSI),
				sclk: Pin(TFT_SCLK),
				cs: Pin(TFT_CS),
				dc: Pin(TFT_DC),
				rst: pin(TFT_RST),
			},
			backlight: Backlight {
				pin: pin(TFT_BL),
				on: TFT_BACKLIGHT_ON,
			},
			touch: Some(TouchSetup {
				cs: Pin(TOUCH_CS),
				irq: pin(TOUCH_IRQ),
				frequency: SPI_TOUCH_FREQUENCY,
			}),
			fonts: FONTS,
			clocks: SpiClocks {
				write: SPI_FREQUENCY,
				read: SPI_READ_FREQUENCY,
			},
		}
	}

	/// The single active driver, None if zero or several are selected.
	pub fn driver(&self) -> Option<DisplayDriver> {
		match self.drivers.as_slice() {
			[a] => Some(*a),
			_ => None,
		}
	}

	/// Every assigned pin with its role. Unused (-1) pins are left out.
	pub fn assigned_pins(&self) -> Vec<(PinRole, Pin)> {
		let SpiPins {
			miso,
			mosi,
			sclk,
			cs,
			dc,
			rst,
		} = self.pins;

		let mut result = Vec::with_capacity(9);
		if let Some(a) = miso {
			result.push((PinRole::Miso, a));
		}
		result.push((PinRole::Mosi, mosi));
		result.push((PinRole::Sclk, sclk));
		result.push((PinRole::Cs, cs));
		result.push((PinRole::Dc, dc));
		if let Some(a) = rst {
			result.push((PinRole::Rst, a));
		}
		if let Some(a) = self.backlight.pin {
			result.push((PinRole::Backlight, a));
		}
		if let Some(touch) = self.touch {
			result.push((PinRole::TouchCs, touch.cs));
			if let Some(a) = touch.irq {
				result.push((PinRole::TouchIrq, a));
			}
		}

		result
	}
}

#[cfg(test)]
#[test]
fn fixture_matches_board() {
	let setup = BoardSetup::freenove_esp32_32e();

	assert_eq!(setup.info.as_deref(), Some("ESP32-32E_ST7796_SPI"));
	assert_eq!(setup.driver(), Some(DisplayDriver::St7796));
	assert_eq!((setup.width, setup.height), (320, 480));
	assert_eq!(setup.color_order, ColorOrder::Bgr);
	assert_eq!(setup.pins.rst, None);
	assert_eq!(setup.backlight.on, Level::High);
	assert_eq!(setup.touch.map(|a| a.frequency), Some(2_500_000));
	assert_eq!(
		setup.fonts.defines().collect::<Vec<_>>(),
		[
			"LOAD_GLCD",
			"LOAD_FONT2",
			"LOAD_FONT4",
			"LOAD_GFXFF",
			"SMOOTH_FONT"
		]
	);
	assert_eq!(setup.clocks.write, 27_000_000);
	assert_eq!(setup.clocks.read, 20_000_000);
}

#[cfg(test)]
#[test]
fn assigned_pins_skip_unused() {
	let mut setup = BoardSetup::freenove_esp32_32e();
	assert_eq!(setup.assigned_pins().len(), 8);

	setup.pins.rst = Some(Pin(4));
	setup.backlight.pin = None;
	setup.touch = None;

	let pins = setup.assigned_pins();
	assert_eq!(pins.len(), 6);
	assert!(pins.contains(&(PinRole::Rst, Pin(4))));
	assert!(!pins.iter().any(|(role, _)| *role == PinRole::Backlight));
}

#[cfg(test)]
#[test]
fn driver_needs_exactly_one_flag() {
	let mut setup = BoardSetup::freenove_esp32_32e();
	setup.drivers.push(DisplayDriver::Ili9488);
	assert_eq!(setup.driver(), None);

	setup.drivers.clear();
	assert_eq!(setup.driver(), None);
}

#[cfg(test)]
#[test]
fn define_names() {
	assert_eq!(
		DisplayDriver::from_define("ILI9488_DRIVER"),
		Some(DisplayDriver::Ili9488)
	);
	assert_eq!(DisplayDriver::from_define("ST7796"), None);
	assert_eq!(ColorOrder::from_define("TFT_BGR"), Some(ColorOrder::Bgr));
	assert_eq!(ColorOrder::from_define("TFT_GRB"), None);
	assert_eq!(FontSet::from_define("SMOOTH_FONT"), Some(FontSet::SMOOTH));

	assert_eq!(Pin::to_define(None), -1);
	assert_eq!(Pin::from_define(-1), Ok(None));
	assert_eq!(Pin::from_define(36), Ok(Some(Pin(36))));
	assert_eq!(Pin::from_define(300), Err(300));
}

#[cfg(test)]
#[test]
fn font_set_ops() {
	let fonts = FontSet::GLCD | FontSet::FONT4;
	assert!(fonts.contains(FontSet::GLCD));
	assert!(!fonts.contains(FontSet::FONT2));
	assert_eq!(
		fonts.defines().collect::<Vec<_>>(),
		["LOAD_GLCD", "LOAD_FONT4"]
	);
	assert!(!fonts.is_empty());
	assert!(FontSet::default().is_empty());
}
