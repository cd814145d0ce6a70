#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

extern crate mlx90614_twi;
use mlx90614_twi::*;

use std::process::exit;

use mlx90614_twi::twi::{
	BusClock,
	RetryPolicy,
	TwiBus,
};

// decimal or 0x-prefixed hex
fn parse_int(value: &str) -> AResult<u32> {
	let parsed = if value.starts_with("0x") || value.starts_with("0X") {
		u32::from_str_radix(&value[2..], 16)
	} else {
		value.parse::<u32>()
	};
	parsed.map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid number {:?}: {}", value, e);
		e.context(msg).into()
	})
}

fn get_param(matches: &clap::ArgMatches, name: &str, default: u32) -> AResult<u32> {
	match matches.value_of(name) {
		None => Ok(default),
		Some(p) => with_param_context(name, parse_int(p)),
	}
}

fn with_param_context<T>(name: &str, r: AResult<T>) -> AResult<T> {
	r.map_err(|e| {
		let msg = format!("invalid parameter {}: {}", name, e);
		e.context(msg).into()
	})
}

fn report<B: TwiBus>(mut sensor: Mlx90614<B>, source: TemperatureSource, raw: bool) -> AResult<()> {
	if raw {
		let word = sensor.read_raw(source)?;
		println!("0x{:04x}", word);
	} else {
		let temperature = sensor.read_temperature(source)?;
		info!("{:?} temperature: {}", source, temperature);
		println!("{}", temperature.hundredths());
	}
	Ok(())
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(@arg object: -o --object "read the object temperature instead of the ambient one")
		(@arg raw: -r --raw "print the raw sensor word instead of hundredths of °C")
		(@arg window: -w --window +takes_value "register window to map (data space of the MCU, e.g. /dev/uio0)")
		(@arg simulate: -s --simulate +takes_value conflicts_with[window] "use the simulated bus with a sensor reporting RAW for both cells")
		(@arg address: -a --address +takes_value "7-bit sensor address (default 0x5a)")
		(@arg cpu: --cpu +takes_value "CPU clock in Hz (default 16000000)")
		(@arg scl: --scl +takes_value "bus clock in Hz (default 100000)")
		(@arg attempts: --attempts +takes_value "START attempts before giving up (default 8)")
	).get_matches();

	let source = TemperatureSource::from(!matches.is_present("object"));
	let raw = matches.is_present("raw");

	let address = get_param(&matches, "address", mlx90614::MLX90614_ADDRESS as u32)?;
	ensure!(address < 0x80, "address 0x{:x} doesn't fit in 7 bits", address);
	let cpu = get_param(&matches, "cpu", twi::F_CPU)?;
	let scl = get_param(&matches, "scl", twi::SCL_FREQUENCY)?;
	let attempts = get_param(&matches, "attempts", RetryPolicy::DEFAULT_ATTEMPTS as u32)?;

	let config = SensorConfig {
		address: address as u8,
		clock: BusClock::new(cpu, scl)?,
		retry: RetryPolicy::new(attempts as usize),
	};
	info!("sensor 0x{:02x}, bus clock {} Hz from {} Hz CPU (bit rate divisor {}, effective {} Hz)",
		config.address,
		config.clock.scl_frequency(),
		config.clock.cpu_frequency(),
		config.clock.divisor(),
		config.clock.effective_frequency(),
	);

	if let Some(word) = matches.value_of("simulate") {
		let word = with_param_context("simulate", parse_int(word))?;
		ensure!(word <= 0xffff, "raw word 0x{:x} doesn't fit in 16 bits", word);
		let model = sim::Mlx90614Model::new(config.address, word as u16, word as u16);
		let bus = sim::SimulatedBus::new(Box::new(model));
		report(Mlx90614::new(bus, config), source, raw)
	} else if let Some(path) = matches.value_of("window") {
		let window = hardware::linux::open_register_window(path)?;
		report(Mlx90614::new(window, config), source, raw)
	} else {
		bail!("either --window or --simulate is required")
	}
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		exit(1);
	}
}
