#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

macro_rules! with_context {
	(( $fmt:tt $($t:tt)* ), $e:expr) => {{
		use failure::Error;

		match (|| { $e })() {
			Ok(v) => Ok(v),
			Err(e) => {
				let e: Error = e;
				let msg = format!(concat!($fmt, ": {}") $($t)*, e);
				Err(Error::from(e.context(msg)))
			}
		}
	}};

	($msg:expr, $e:expr) => {
		with_context!(("{}", $msg), $e)
	};
}

pub type AResult<T> = Result<T, failure::Error>;

pub mod hardware;
pub mod mlx90614;
pub mod sim;
pub mod twi;

pub use self::mlx90614::{
	Mlx90614,
	SensorConfig,
	TemperatureSource,
	SENSOR_NOT_CONNECTED,
};

/// Read a temperature from the sensor wired to `hardware`, using the
/// default bus clock, address and retry policy.
///
/// Returns hundredths of a degree Celsius, or [`SENSOR_NOT_CONNECTED`].
pub fn get_celsius_temp<H: hardware::Hardware>(hardware: &mut H, source: TemperatureSource) -> i16 {
	Mlx90614::new(hardware, SensorConfig::default()).get_celsius_temp(source)
}
