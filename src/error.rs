use crate::model::DisplayDriver;
use crate::model::Pin;
use crate::model::PinRole;
use thiserror::Error;

/// A setup the graphics library must not be built with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
	#[error("several display drivers selected: {}", join(.0))]
	ConflictingDriverSelection(Vec<DisplayDriver>),

	#[error("no display driver selected")]
	MissingDriver,

	#[error("{pin} is used by both {first} and {second}")]
	PinCollision {
		pin: Pin,
		first: PinRole,
		second: PinRole,
	},

	#[error("{name} = {value} Hz is outside 1..={max} Hz")]
	OutOfRangeFrequency {
		name: &'static str,
		value: u32,
		max: u32,
	},

	#[error("unsupported color order {0:?}, expected TFT_RGB or TFT_BGR")]
	UnsupportedColorOrder(String),

	#[error("{driver} has no {width}x{height} panel, expected one of {}", sizes(.driver))]
	GeometryMismatch {
		driver: DisplayDriver,
		width: u16,
		height: u16,
	},

	#[error("{role} = {pin} does not exist on the ESP32")]
	InvalidPin { role: PinRole, pin: Pin },

	#[error("{role} = {pin} is input-only and cannot be driven")]
	InputOnlyPin { role: PinRole, pin: Pin },

	#[error("{role} = {pin} is reserved for the SPI flash")]
	ReservedPin { role: PinRole, pin: Pin },

	#[error("missing required define {0}")]
	MissingKey(&'static str),

	#[error("line {line}: invalid value {value:?} for {name}")]
	InvalidValue {
		line: usize,
		name: String,
		value: String,
	},
}

/// Non-fatal: the library builds, but probably not as intended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SetupWarning {
	#[error("no font enabled, text rendering has no glyphs")]
	NoFontsEnabled,

	#[error("SPI_READ_FREQUENCY = {read} Hz is above SPI_FREQUENCY = {write} Hz")]
	ReadFasterThanWrite { write: u32, read: u32 },
}

fn sizes(driver: &DisplayDriver) -> String {
	driver
		.panel_sizes()
		.iter()
		.map(|(w, h)| format!("{}x{}", w, h))
		.collect::<Vec<_>>()
		.join(", ")
}

fn join(drivers: &[DisplayDriver]) -> String {
	drivers
		.iter()
		.map(DisplayDriver::define)
		.collect::<Vec<_>>()
		.join(", ")
}

#[cfg(test)]
#[test]
fn messages_name_roles() {
	let e = SetupError::PinCollision {
		pin: Pin(15),
		first: PinRole::Cs,
		second: PinRole::TouchCs,
	};
	assert_eq!(e.to_string(), "GPIO15 is used by both TFT_CS and TOUCH_CS");

	let e = SetupError::ConflictingDriverSelection(vec![
		DisplayDriver::St7796,
		DisplayDriver::Ili9488,
	]);
	assert_eq!(
		e.to_string(),
		"several display drivers selected: ST7796_DRIVER, ILI9488_DRIVER"
	);

	let e = SetupError::GeometryMismatch {
		driver: DisplayDriver::St7735,
		width: 240,
		height: 240,
	};
	assert_eq!(
		e.to_string(),
		"ST7735_DRIVER has no 240x240 panel, expected one of 128x160, 128x128, 80x160"
	);
}
