use crate::model::ColorOrder;
use crate::model::DisplayDriver;
use crate::model::FontSet;
use crate::model::Level;

// Freenove ESP32-32E 4.0" LCD (320x480), SPI ST7796 + XPT2046.
pub const USER_SETUP_INFO: &str = "ESP32-32E_ST7796_SPI";

pub const TFT_DRIVER: DisplayDriver = DisplayDriver::St7796;
// ILI9488_DRIVER also fits this connector, leave it out.

pub const TFT_WIDTH: u16 = 320; // Panel width in pixels.
pub const TFT_HEIGHT: u16 = 480; // Panel height in pixels.
pub const TFT_RGB_ORDER: ColorOrder = ColorOrder::Bgr; // Typical for ST7796.

// SPI pins
pub const TFT_MISO: Option<u8> = Some(12);
pub const TFT_MOSI: u8 = 13;
pub const TFT_SCLK: u8 = 14;
pub const TFT_CS: u8 = 15;
pub const TFT_DC: u8 = 2;
// Reset is wired to the EN line of the module, it is never driven from here.
pub const TFT_RST: Option<u8> = None;

// Backlight
pub const TFT_BL: Option<u8> = Some(27);
pub const TFT_BACKLIGHT_ON: Level = Level::High;

// Touch
pub const TOUCH_CS: u8 = 33;
pub const TOUCH_IRQ: Option<u8> = Some(36);
pub const SPI_TOUCH_FREQUENCY: u32 = 2_500_000;

pub const FONTS: FontSet = FontSet::GLCD
	.union(FontSet::FONT2)
	.union(FontSet::FONT4)
	.union(FontSet::GFXFF)
	.union(FontSet::SMOOTH);

// SPI clock
pub const SPI_FREQUENCY: u32 = 27_000_000;
pub const SPI_READ_FREQUENCY: u32 = 20_000_000;

// XPT2046 datasheet: 2.5 MHz maximum DCLK.
pub const XPT2046_MAX_FREQUENCY: u32 = 2_500_000;
// ESP32 SPI peripheral clock ceiling (IO_MUX routed pins).
pub const ESP32_SPI_MAX_FREQUENCY: u32 = 80_000_000;

pub const ESP32_MAX_GPIO: u8 = 39;
// GPIO34..=39 have no output driver.
pub const ESP32_INPUT_ONLY: core::ops::RangeInclusive<u8> = 34..=39;
// GPIO6..=11 are connected to the integrated SPI flash.
pub const ESP32_FLASH_PINS: core::ops::RangeInclusive<u8> = 6..=11;

// Path of a header to load instead of the built-in setup.
pub const ENV_SETUP_PATH: &str = "TFT_SETUP";
// If "1"/"true", print the normalized header after validation.
pub const ENV_EMIT: &str = "TFT_SETUP_EMIT";
