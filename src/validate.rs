use crate::config::ESP32_FLASH_PINS;
use crate::config::ESP32_INPUT_ONLY;
use crate::config::ESP32_MAX_GPIO;
use crate::config::ESP32_SPI_MAX_FREQUENCY;
use crate::config::XPT2046_MAX_FREQUENCY;
use crate::error::SetupError;
use crate::error::SetupWarning;
use crate::model::BoardSetup;
use log::error;
use log::info;
use log::warn;

/// Outcome of [`validate`]. Errors make the setup unusable, warnings do not.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
	pub errors: Vec<SetupError>,
	pub warnings: Vec<SetupWarning>,
}

impl Report {
	#[inline]
	pub fn is_ok(&self) -> bool {
		self.errors.is_empty()
	}

	#[inline]
	pub fn is_clean(&self) -> bool {
		self.errors.is_empty() && self.warnings.is_empty()
	}

	pub fn log(&self) {
		for e in self.errors.iter() {
			error!("#[setup] {}", e);
		}
		for w in self.warnings.iter() {
			warn!("#[setup] {}", w);
		}
		info!(
			"#[setup] {} error(s), {} warning(s)",
			self.errors.len(),
			self.warnings.len()
		);
	}
}

/// Run every check on `setup` and collect all findings.
pub fn validate(setup: &BoardSetup) -> Report {
	let mut report = Report::default();

	check_driver(setup, &mut report);
	check_pins(setup, &mut report);
	check_clocks(setup, &mut report);

	if setup.fonts.is_empty() {
		report.warnings.push(SetupWarning::NoFontsEnabled);
	}

	report
}

fn check_driver(setup: &BoardSetup, report: &mut Report) {
	let driver = match setup.drivers.as_slice() {
		[] => {
			report.errors.push(SetupError::MissingDriver);
			return;
		}
		[driver] => *driver,
		drivers => {
			report
				.errors
				.push(SetupError::ConflictingDriverSelection(drivers.to_vec()));
			return;
		}
	};

	if !driver.supports_size(setup.width, setup.height) {
		report.errors.push(SetupError::GeometryMismatch {
			driver,
			width: setup.width,
			height: setup.height,
		});
	}
}

fn check_pins(setup: &BoardSetup, report: &mut Report) {
	let pins = setup.assigned_pins();

	for &(role, pin) in pins.iter() {
		let num = pin.num();
		if num > ESP32_MAX_GPIO {
			report.errors.push(SetupError::InvalidPin { role, pin });
		} else if ESP32_INPUT_ONLY.contains(&num) && !role.is_input() {
			report.errors.push(SetupError::InputOnlyPin { role, pin });
		} else if ESP32_FLASH_PINS.contains(&num) {
			report.errors.push(SetupError::ReservedPin { role, pin });
		}
	}

	for (i, &(first, pin)) in pins.iter().enumerate() {
		for &(second, _) in pins[i + 1..].iter().filter(|(_, a)| *a == pin) {
			report.errors.push(SetupError::PinCollision { pin, first, second });
		}
	}
}

fn check_clocks(setup: &BoardSetup, report: &mut Report) {
	let max = setup
		.driver()
		.map_or(ESP32_SPI_MAX_FREQUENCY, |a| {
			a.max_write_frequency().min(ESP32_SPI_MAX_FREQUENCY)
		});

	let mut check = |name: &'static str, value: u32, max: u32| {
		if value == 0 || value > max {
			report
				.errors
				.push(SetupError::OutOfRangeFrequency { name, value, max });
		}
	};
	check("SPI_FREQUENCY", setup.clocks.write, max);
	check("SPI_READ_FREQUENCY", setup.clocks.read, max);
	if let Some(touch) = &setup.touch {
		check("SPI_TOUCH_FREQUENCY", touch.frequency, XPT2046_MAX_FREQUENCY);
	}

	if setup.clocks.read > setup.clocks.write {
		report.warnings.push(SetupWarning::ReadFasterThanWrite {
			write: setup.clocks.write,
			read: setup.clocks.read,
		});
	}
}

#[cfg(test)]
use crate::model::DisplayDriver;
#[cfg(test)]
use crate::model::FontSet;
#[cfg(test)]
use crate::model::Pin;
#[cfg(test)]
use crate::model::PinRole;

#[cfg(test)]
#[test]
fn fixture_is_clean() {
	let report = validate(&BoardSetup::freenove_esp32_32e());
	assert!(report.is_clean(), "{:?}", report);
}

#[cfg(test)]
#[test]
fn touch_cs_on_display_cs() {
	let mut setup = BoardSetup::freenove_esp32_32e();
	if let Some(touch) = setup.touch.as_mut() {
		touch.cs = Pin(15);
	}

	let report = validate(&setup);
	assert_eq!(
		report.errors,
		[SetupError::PinCollision {
			pin: Pin(15),
			first: PinRole::Cs,
			second: PinRole::TouchCs,
		}]
	);
}

#[cfg(test)]
#[test]
fn backlight_and_reset_on_bus_pins() {
	let mut setup = BoardSetup::freenove_esp32_32e();
	setup.backlight.pin = Some(Pin(14));
	setup.pins.rst = Some(Pin(2));

	let report = validate(&setup);
	assert_eq!(report.errors.len(), 2);
	assert!(
		report
			.errors
			.iter()
			.all(|a| matches!(a, SetupError::PinCollision { .. }))
	);
	assert!(report.errors.contains(&SetupError::PinCollision {
		pin: Pin(14),
		first: PinRole::Sclk,
		second: PinRole::Backlight,
	}));
	assert!(report.errors.contains(&SetupError::PinCollision {
		pin: Pin(2),
		first: PinRole::Dc,
		second: PinRole::Rst,
	}));
}

#[cfg(test)]
#[test]
fn second_driver_conflicts() {
	let mut setup = BoardSetup::freenove_esp32_32e();
	setup.drivers.push(DisplayDriver::Ili9488);

	let report = validate(&setup);
	assert_eq!(
		report.errors,
		[SetupError::ConflictingDriverSelection(vec![
			DisplayDriver::St7796,
			DisplayDriver::Ili9488
		])]
	);

	setup.drivers.clear();
	assert_eq!(validate(&setup).errors, [SetupError::MissingDriver]);
}

#[cfg(test)]
#[test]
fn touch_frequency_above_xpt2046() {
	let mut setup = BoardSetup::freenove_esp32_32e();
	if let Some(touch) = setup.touch.as_mut() {
		touch.frequency = 10_000_000;
	}

	let report = validate(&setup);
	assert_eq!(
		report.errors,
		[SetupError::OutOfRangeFrequency {
			name: "SPI_TOUCH_FREQUENCY",
			value: 10_000_000,
			max: 2_500_000,
		}]
	);
}

#[cfg(test)]
#[test]
fn spi_clock_limits() {
	let mut setup = BoardSetup::freenove_esp32_32e();
	setup.clocks.write = 10_000_000;
	setup.clocks.read = 20_000_000;

	let report = validate(&setup);
	assert!(report.is_ok());
	assert_eq!(
		report.warnings,
		[SetupWarning::ReadFasterThanWrite {
			write: 10_000_000,
			read: 20_000_000,
		}]
	);

	setup.clocks.write = 90_000_000;
	setup.clocks.read = 0;
	let report = validate(&setup);
	assert_eq!(report.errors.len(), 2);
	assert!(
		report
			.errors
			.iter()
			.all(|a| matches!(a, SetupError::OutOfRangeFrequency { .. }))
	);
}

#[cfg(test)]
#[test]
fn driver_specific_clock() {
	let mut setup = BoardSetup::freenove_esp32_32e();
	setup.drivers = vec![DisplayDriver::Ili9486];

	let report = validate(&setup);
	assert!(report.errors.contains(&SetupError::OutOfRangeFrequency {
		name: "SPI_FREQUENCY",
		value: 27_000_000,
		max: 20_000_000,
	}));
	assert!(!report.errors.iter().any(|a| matches!(
		a,
		SetupError::OutOfRangeFrequency {
			name: "SPI_READ_FREQUENCY",
			..
		}
	)));
}

#[cfg(test)]
#[test]
fn geometry_follows_driver() {
	let mut setup = BoardSetup::freenove_esp32_32e();
	setup.width = 240;
	setup.height = 320;

	let report = validate(&setup);
	assert_eq!(
		report.errors,
		[SetupError::GeometryMismatch {
			driver: DisplayDriver::St7796,
			width: 240,
			height: 320,
		}]
	);
}

#[cfg(test)]
#[test]
fn geometry_accepts_any_panel_of_driver() {
	let mut setup = BoardSetup::freenove_esp32_32e();
	setup.drivers = vec![DisplayDriver::St7789];

	for (width, height) in [(240, 240), (135, 240), (240, 320)] {
		setup.width = width;
		setup.height = height;
		assert!(validate(&setup).is_clean(), "{}x{}", width, height);
	}

	setup.drivers = vec![DisplayDriver::St7735];
	setup.width = 80;
	setup.height = 160;
	assert!(validate(&setup).is_clean());

	setup.width = 240;
	setup.height = 240;
	assert_eq!(
		validate(&setup).errors,
		[SetupError::GeometryMismatch {
			driver: DisplayDriver::St7735,
			width: 240,
			height: 240,
		}]
	);
}

#[cfg(test)]
#[test]
fn esp32_pin_capabilities() {
	let mut setup = BoardSetup::freenove_esp32_32e();
	setup.pins.dc = Pin(35);
	setup.backlight.pin = Some(Pin(7));
	setup.pins.rst = Some(Pin(40));

	let report = validate(&setup);
	assert_eq!(report.errors.len(), 3);
	assert!(report.errors.contains(&SetupError::InputOnlyPin {
		role: PinRole::Dc,
		pin: Pin(35),
	}));
	assert!(report.errors.contains(&SetupError::ReservedPin {
		role: PinRole::Backlight,
		pin: Pin(7),
	}));
	assert!(report.errors.contains(&SetupError::InvalidPin {
		role: PinRole::Rst,
		pin: Pin(40),
	}));

	// MISO and TOUCH_IRQ only read, input-only pins are fine.
	let mut setup = BoardSetup::freenove_esp32_32e();
	setup.pins.miso = Some(Pin(39));
	assert!(validate(&setup).is_clean());
}

#[cfg(test)]
#[test]
fn no_fonts_is_a_warning() {
	let mut setup = BoardSetup::freenove_esp32_32e();
	setup.fonts = FontSet::default();

	let report = validate(&setup);
	assert!(report.is_ok());
	assert_eq!(report.warnings, [SetupWarning::NoFontsEnabled]);
}
