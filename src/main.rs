use crate::config::ENV_EMIT;
use crate::config::ENV_SETUP_PATH;
use crate::model::BoardSetup;
use anyhow::Context;
use anyhow::bail;
use log::info;
use std::env::var_os;
use std::ffi::OsStr;
use std::fs::read_to_string;
use std::path::Path;

mod config;
mod error;
mod header;
mod model;
mod validate;

/// Setup from the header at `path`.
fn load(path: &Path) -> anyhow::Result<BoardSetup> {
	let text = read_to_string(path).with_context(|| format!("read setup {:?}", path))?;
	let setup = header::parse(&text).with_context(|| format!("parse setup {:?}", path))?;

	Ok(setup)
}

#[inline]
fn is_enabled(a: &OsStr) -> bool {
	a == "1" || a.eq_ignore_ascii_case("true")
}

fn main() -> anyhow::Result<()> {
	env_logger::try_init()?;
	info!("tft_setup_rs: ");

	let setup = match var_os(ENV_SETUP_PATH) {
		Some(path) => {
			info!("{}={:?}", ENV_SETUP_PATH, path);
			load(Path::new(&path))?
		}
		None => {
			info!("{} not set, built-in setup", ENV_SETUP_PATH);
			BoardSetup::freenove_esp32_32e()
		}
	};

	info!(
		"#[setup] {}",
		setup.info.as_deref().unwrap_or("<no USER_SETUP_INFO>")
	);
	match setup.driver() {
		Some(driver) => info!(
			"#[setup] {} {}x{}, {}",
			driver,
			setup.width,
			setup.height,
			setup.color_order.define()
		),
		None => info!("#[setup] drivers: {:?}", setup.drivers),
	}
	for (role, pin) in setup.assigned_pins() {
		info!("#[pin, {}] {}", pin, role);
	}
	info!(
		"#[spi] write: {}hz, read: {}hz",
		setup.clocks.write, setup.clocks.read
	);
	if let Some(touch) = &setup.touch {
		info!("#[touch] {}hz", touch.frequency);
	}

	let report = validate::validate(&setup);
	report.log();
	if report.is_clean() {
		info!("#[setup] ok");
	}

	if var_os(ENV_EMIT).is_some_and(|a| is_enabled(&a)) {
		print!("{}", header::emit(&setup));
	}

	if !report.is_ok() {
		bail!("setup rejected, {} error(s)", report.errors.len());
	}

	Ok(())
}

#[cfg(test)]
#[test]
fn emit_flag_values() {
	assert!(is_enabled(OsStr::new("1")));
	assert!(is_enabled(OsStr::new("TRUE")));
	assert!(!is_enabled(OsStr::new("0")));
	assert!(!is_enabled(OsStr::new("")));
}
