use std::fmt;

/// 0 °C in hundredths of a kelvin
const ZERO_CELSIUS: i16 = 27315;

/// Returned by `get_celsius_temp` when the sensor doesn't respond.
///
/// The same value results from a raw word of 0x0001 (0.02 K), which the
/// sensor can't report.
pub const SENSOR_NOT_CONNECTED: i16 = -27313;

/// Convert a raw temperature word (0.02 K per bit) to hundredths of a
/// degree Celsius: `(msb << 8 | lsb) as i16 * 2 - 27315`.
///
/// The arithmetic wraps in 16 bits. Words up to 0x7559 (327.67 °C) fit,
/// which covers the ambient range (-40 °C to 125 °C) and most object
/// readings. Hotter objects and malformed words wrap: 0x9600 gives 49485,
/// which ends up as -16051.
pub fn convert_raw(lsb: u8, msb: u8) -> i16 {
	let raw = i16::from_le_bytes([lsb, msb]);
	raw.wrapping_mul(2).wrapping_sub(ZERO_CELSIUS)
}

/// Hundredths of a degree Celsius
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Temperature(pub i16);

impl Temperature {
	pub fn hundredths(&self) -> i16 {
		self.0
	}
}

impl fmt::Display for Temperature {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let v = self.0 as i32;
		let sign = if v < 0 { "-" } else { "" };
		write!(f, "{}{}.{:02} °C", sign, v.abs() / 100, v.abs() % 100)
	}
}
