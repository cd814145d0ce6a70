/// Melexis MLX90614 infrared thermometer on the TWI bus
///
/// Both temperatures live in RAM cells read with the SMBus "read word"
/// transfer:
/// - START, 0x5a + W, command (0x06 ambient / 0x07 object)
/// - REPEATED START, 0x5a + R, LSB (ACK), MSB (ACK), PEC (NACK), STOP
///
/// The word is in units of 0.02 K.

use crate::twi::{
	BusClock,
	BusError,
	Direction,
	RetryPolicy,
	TwiBus,
	address_byte,
};

mod temperature;

pub use self::temperature::{
	Temperature,
	convert_raw,
	SENSOR_NOT_CONNECTED,
};

pub const MLX90614_ADDRESS: u8 = 0x5a;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum TemperatureSource {
	Ambient,
	Object,
}

impl TemperatureSource {
	/// RAM access command for the cell
	pub fn command(self) -> u8 {
		match self {
			TemperatureSource::Ambient => 0x06,
			TemperatureSource::Object => 0x07,
		}
	}
}

// true selects the ambient temperature
impl From<bool> for TemperatureSource {
	fn from(ambient: bool) -> Self {
		match ambient {
			true => TemperatureSource::Ambient,
			false => TemperatureSource::Object,
		}
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SensorConfig {
	/// 7-bit slave address
	pub address: u8,
	pub clock: BusClock,
	pub retry: RetryPolicy,
}

impl Default for SensorConfig {
	fn default() -> Self {
		SensorConfig {
			address: MLX90614_ADDRESS,
			clock: BusClock::default(),
			retry: RetryPolicy::default(),
		}
	}
}

pub struct Mlx90614<B: TwiBus> {
	bus: B,
	config: SensorConfig,
}

impl<B: TwiBus> Mlx90614<B> {
	pub fn new(bus: B, config: SensorConfig) -> Self {
		Mlx90614 { bus, config }
	}

	pub fn into_inner(self) -> B {
		self.bus
	}

	/// Run one read-word transfer and return the raw cell content.
	///
	/// If the sensor doesn't acknowledge the addressed write nothing else
	/// is sent.
	pub fn read_raw(&mut self, source: TemperatureSource) -> Result<u16, BusError> {
		let retry = self.config.retry;
		self.bus.init(&self.config.clock);

		self.bus.start_wait(address_byte(self.config.address, Direction::Write), &retry)?;

		if let Err(e) = self.bus.write(source.command()) {
			// the sensor answers anyway once addressed for reading
			warn!("command 0x{:02x} for {:?} temperature: {}", source.command(), source, e);
		}

		if let Err(e) = self.bus.start_wait(address_byte(self.config.address, Direction::Read), &retry) {
			self.bus.stop();
			return Err(e);
		}

		let lsb = self.bus.read_ack();
		let msb = self.bus.read_ack();
		let pec = self.bus.read_nack();
		self.bus.stop();

		let raw = u16::from_le_bytes([lsb, msb]);
		debug!("{:?} temperature: raw 0x{:04x} (PEC 0x{:02x})", source, raw, pec);
		Ok(raw)
	}

	pub fn read_temperature(&mut self, source: TemperatureSource) -> Result<Temperature, BusError> {
		let [lsb, msb] = self.read_raw(source)?.to_le_bytes();
		Ok(Temperature(convert_raw(lsb, msb)))
	}

	/// Temperature in hundredths of a degree Celsius, or
	/// [`SENSOR_NOT_CONNECTED`] if the sensor didn't respond.
	pub fn get_celsius_temp(&mut self, source: TemperatureSource) -> i16 {
		match self.read_temperature(source) {
			Ok(t) => t.0,
			Err(e) => {
				warn!("MLX90614 at 0x{:02x} not responding: {}", self.config.address, e);
				SENSOR_NOT_CONNECTED
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::VecDeque;

	use crate::twi::Status;

	#[derive(Clone, Copy, PartialEq, Eq, Debug)]
	enum Call {
		Init(u8),
		StartWait(u8),
		Write(u8),
		ReadAck,
		ReadNack,
		Stop,
	}

	#[derive(Default)]
	struct ScriptedBus {
		calls: Vec<Call>,
		starts: VecDeque<Result<Status, BusError>>,
		data: VecDeque<u8>,
		write_ack: bool,
	}

	impl ScriptedBus {
		fn answering(lsb: u8, msb: u8) -> Self {
			ScriptedBus {
				starts: vec![Ok(Status::MtSlaAck), Ok(Status::MrSlaAck)].into_iter().collect(),
				data: vec![lsb, msb, 0xaa].into_iter().collect(),
				write_ack: true,
				..Default::default()
			}
		}

		fn next_byte(&mut self) -> u8 {
			self.data.pop_front().expect("unexpected read")
		}
	}

	impl TwiBus for ScriptedBus {
		fn init(&mut self, clock: &BusClock) {
			self.calls.push(Call::Init(clock.divisor()));
		}

		fn start(&mut self, _address: u8) -> Result<Status, BusError> {
			panic!("non-waiting start used");
		}

		fn start_wait(&mut self, address: u8, _retry: &RetryPolicy) -> Result<Status, BusError> {
			self.calls.push(Call::StartWait(address));
			self.starts.pop_front().expect("unexpected start")
		}

		fn write(&mut self, data: u8) -> Result<(), BusError> {
			self.calls.push(Call::Write(data));
			if self.write_ack { Ok(()) } else { Err(BusError::DataNack { status: 0x30 }) }
		}

		fn read_ack(&mut self) -> u8 {
			self.calls.push(Call::ReadAck);
			self.next_byte()
		}

		fn read_nack(&mut self) -> u8 {
			self.calls.push(Call::ReadNack);
			self.next_byte()
		}

		fn stop(&mut self) {
			self.calls.push(Call::Stop);
		}
	}

	#[test]
	fn ambient_transfer_sequence() {
		let mut sensor = Mlx90614::new(ScriptedBus::answering(0x1c, 0x3a), SensorConfig::default());
		assert_eq!(sensor.get_celsius_temp(TemperatureSource::Ambient), convert_raw(0x1c, 0x3a));
		assert_eq!(sensor.into_inner().calls, vec![
			Call::Init(72),
			Call::StartWait(0xb4),
			Call::Write(0x06),
			Call::StartWait(0xb5),
			Call::ReadAck,
			Call::ReadAck,
			Call::ReadNack,
			Call::Stop,
		]);
	}

	#[test]
	fn object_uses_command_7() {
		let mut sensor = Mlx90614::new(ScriptedBus::answering(0x00, 0x3b), SensorConfig::default());
		sensor.get_celsius_temp(TemperatureSource::from(false));
		assert!(sensor.into_inner().calls.contains(&Call::Write(0x07)));
	}

	#[test]
	fn absent_sensor_returns_sentinel_without_further_io() {
		let bus = ScriptedBus {
			starts: vec![Err(BusError::NotResponding { address: 0xb4, attempts: 8, last: 0x20 })].into_iter().collect(),
			..Default::default()
		};
		let mut sensor = Mlx90614::new(bus, SensorConfig::default());
		assert_eq!(sensor.get_celsius_temp(TemperatureSource::Ambient), SENSOR_NOT_CONNECTED);
		assert_eq!(sensor.into_inner().calls, vec![Call::Init(72), Call::StartWait(0xb4)]);
	}

	#[test]
	fn failed_read_phase_stops_and_returns_sentinel() {
		let bus = ScriptedBus {
			starts: vec![
				Ok(Status::MtSlaAck),
				Err(BusError::NotResponding { address: 0xb5, attempts: 8, last: 0x48 }),
			].into_iter().collect(),
			write_ack: true,
			..Default::default()
		};
		let mut sensor = Mlx90614::new(bus, SensorConfig::default());
		assert_eq!(sensor.get_celsius_temp(TemperatureSource::Object), SENSOR_NOT_CONNECTED);
		let calls = sensor.into_inner().calls;
		assert_eq!(calls.last(), Some(&Call::Stop));
		assert!(!calls.contains(&Call::ReadAck));
	}

	#[test]
	fn nacked_command_still_reads() {
		let mut bus = ScriptedBus::answering(0x00, 0x3a);
		bus.write_ack = false;
		let mut sensor = Mlx90614::new(bus, SensorConfig::default());
		assert_eq!(sensor.read_raw(TemperatureSource::Ambient), Ok(0x3a00));
	}

	#[test]
	fn configured_address_is_framed() {
		let config = SensorConfig { address: 0x2b, ..SensorConfig::default() };
		let mut sensor = Mlx90614::new(ScriptedBus::answering(0, 0), config);
		sensor.read_raw(TemperatureSource::Ambient).unwrap();
		let calls = sensor.into_inner().calls;
		assert!(calls.contains(&Call::StartWait(0x56)));
		assert!(calls.contains(&Call::StartWait(0x57)));
	}
}
