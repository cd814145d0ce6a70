use failure::Fail;

use crate::hardware::{
	Hardware,
	Register,
};

use super::{
	BusClock,
	Status,
	TwiControlRead,
	TwiControlWrite,
	TwiStatusRead,
	PORTC_PULLUPS,
};

/// R/W bit of the address byte
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Direction {
	Write = 0,
	Read = 1,
}

/// 7-bit slave address shifted into place with the direction bit
pub fn address_byte(address: u8, direction: Direction) -> u8 {
	(address << 1) | direction as u8
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Fail)]
pub enum BusError {
	#[fail(display = "START condition not transmitted (status 0x{:02x})", status)]
	StartFailed { status: u8 },
	#[fail(display = "address byte 0x{:02x} not acknowledged (status 0x{:02x})", address, status)]
	AddressNack { address: u8, status: u8 },
	#[fail(display = "unexpected status 0x{:02x} after address byte 0x{:02x}", status, address)]
	UnexpectedStatus { address: u8, status: u8 },
	#[fail(display = "data byte not acknowledged (status 0x{:02x})", status)]
	DataNack { status: u8 },
	#[fail(display = "no response from address byte 0x{:02x} after {} attempts (last status 0x{:02x})", address, attempts, last)]
	NotResponding { address: u8, attempts: usize, last: u8 },
}

/// How often `start_wait` repeats the START + address sequence.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct RetryPolicy {
	max_attempts: usize,
}

impl RetryPolicy {
	pub const DEFAULT_ATTEMPTS: usize = 8;

	// at least one attempt is always made
	pub fn new(max_attempts: usize) -> Self {
		RetryPolicy {
			max_attempts: max_attempts.max(1),
		}
	}

	pub fn attempts(&self) -> usize {
		self.max_attempts
	}
}

impl Default for RetryPolicy {
	fn default() -> Self {
		RetryPolicy::new(Self::DEFAULT_ATTEMPTS)
	}
}

trait InternalLowLevel: Hardware {
	fn control_read(&mut self) -> TwiControlRead {
		TwiControlRead(self.read_register(Register::TWCR))
	}

	fn control_write(&mut self, data: TwiControlWrite) {
		self.write_register(Register::TWCR, data.0);
	}

	fn status_read(&mut self) -> TwiStatusRead {
		TwiStatusRead(self.read_register(Register::TWSR))
	}

	// spin until the hardware finished the current phase
	fn wait_for_interrupt(&mut self) {
		while !self.control_read().is_interrupt() {
			self.relax();
		}
	}

	fn send_address(&mut self, address: u8) -> TwiStatusRead {
		self.write_register(Register::TWDR, address);
		self.control_write(TwiControlWrite::transmit());
		self.wait_for_interrupt();
		self.status_read()
	}

	fn receive(&mut self, ack: bool) -> u8 {
		self.control_write(TwiControlWrite::receive(ack));
		self.wait_for_interrupt();
		let data = self.read_register(Register::TWDR);
		debug!("received 0x{:02x} ({})", data, if ack { "ACK" } else { "NACK" });
		data
	}
}

impl<H: Hardware + ?Sized> InternalLowLevel for H {
}

/// Single bus phases in master mode.
///
/// Only `start_wait` retries; every other phase reports its outcome once.
pub trait TwiBus {
	/// Enable the SDA/SCL pull-ups, set the bit rate for `clock` (prescaler
	/// 1) and enable the unit with ACK generation on. Repeated calls leave
	/// the registers unchanged.
	fn init(&mut self, clock: &BusClock);

	/// Request START, check the status once, then send `address` (already
	/// including the direction bit) and check once more. Never waits for
	/// the hardware.
	fn start(&mut self, address: u8) -> Result<Status, BusError>;

	/// Like `start`, but waits for each phase to finish and repeats the
	/// whole sequence (with STOP after an address NACK) until the slave
	/// acknowledges or `retry` is exhausted.
	fn start_wait(&mut self, address: u8, retry: &RetryPolicy) -> Result<Status, BusError>;

	fn write(&mut self, data: u8) -> Result<(), BusError>;

	/// read a byte and ACK it: more bytes wanted
	fn read_ack(&mut self) -> u8;

	/// read a byte and NACK it: last byte of the transfer
	fn read_nack(&mut self) -> u8;

	/// Send STOP and wait until the hardware completed it.
	fn stop(&mut self);
}

impl<H: Hardware + ?Sized> TwiBus for H {
	fn init(&mut self, clock: &BusClock) {
		let portc = self.read_register(Register::PORTC);
		self.write_register(Register::PORTC, portc | PORTC_PULLUPS);

		let sr = self.status_read();
		self.write_register(Register::TWSR, sr.without_prescaler());
		self.write_register(Register::TWBR, clock.divisor());

		self.control_write(TwiControlWrite::enable());
		debug!("TWI enabled: bit rate divisor {} ({} Hz)", clock.divisor(), clock.effective_frequency());
	}

	fn start(&mut self, address: u8) -> Result<Status, BusError> {
		self.control_write(TwiControlWrite::start());
		let sr = self.status_read();
		match sr.status() {
			Some(status) if status.is_start() => (),
			_ => return Err(BusError::StartFailed { status: sr.status_bits() }),
		}

		self.write_register(Register::TWDR, address);
		self.control_write(TwiControlWrite::transmit());
		let sr = self.status_read();
		match sr.status() {
			Some(status) if status.is_address_ack() => Ok(status),
			Some(status) if status.is_address_nack() => Err(BusError::AddressNack { address, status: sr.status_bits() }),
			_ => Err(BusError::UnexpectedStatus { address, status: sr.status_bits() }),
		}
	}

	fn start_wait(&mut self, address: u8, retry: &RetryPolicy) -> Result<Status, BusError> {
		let mut last = Status::NoInfo.bits();

		for attempt in 1..=retry.attempts() {
			self.control_write(TwiControlWrite::start());
			self.wait_for_interrupt();
			let sr = self.status_read();
			last = sr.status_bits();
			match sr.status() {
				Some(status) if status.is_start() => (),
				_ => {
					debug!("START not transmitted: {:?} (attempt {}/{})", sr, attempt, retry.attempts());
					continue;
				}
			}

			let sr = self.send_address(address);
			last = sr.status_bits();
			match sr.status() {
				Some(status) if status.is_address_ack() => {
					debug!("address 0x{:02x} acknowledged: {}", address, status);
					return Ok(status);
				}
				Some(status) if status.is_address_nack() => {
					warn!("address 0x{:02x} not acknowledged (attempt {}/{})", address, attempt, retry.attempts());
					self.stop();
				}
				_ => {
					warn!("unexpected status after address 0x{:02x}: {:?} (attempt {}/{})", address, sr, attempt, retry.attempts());
				}
			}
		}

		Err(BusError::NotResponding {
			address,
			attempts: retry.attempts(),
			last,
		})
	}

	fn write(&mut self, data: u8) -> Result<(), BusError> {
		self.write_register(Register::TWDR, data);
		self.control_write(TwiControlWrite::transmit());
		self.wait_for_interrupt();

		let sr = self.status_read();
		match sr.status() {
			Some(Status::MtDataAck) => {
				debug!("sent 0x{:02x}", data);
				Ok(())
			}
			_ => Err(BusError::DataNack { status: sr.status_bits() }),
		}
	}

	fn read_ack(&mut self) -> u8 {
		self.receive(true)
	}

	fn read_nack(&mut self) -> u8 {
		self.receive(false)
	}

	fn stop(&mut self) {
		self.control_write(TwiControlWrite::stop());
		while self.control_read().is_stop() {
			self.relax();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sim::{
		BusEvent,
		Mlx90614Model,
		SimulatedBus,
	};

	const SENSOR: u8 = 0x5a;

	fn bus() -> SimulatedBus {
		SimulatedBus::new(Box::new(Mlx90614Model::new(SENSOR, 0x3a00, 0x3b00)))
	}

	#[test]
	fn address_framing() {
		assert_eq!(address_byte(SENSOR, Direction::Write), 0xb4);
		assert_eq!(address_byte(SENSOR, Direction::Read), 0xb5);
	}

	#[test]
	fn init_is_idempotent() {
		let mut once = bus();
		once.init(&BusClock::default());

		let mut twice = bus();
		twice.init(&BusClock::default());
		twice.init(&BusClock::default());

		for register in Register::ALL.iter() {
			assert_eq!(once.read_register(*register), twice.read_register(*register), "{}", register);
		}
		assert_eq!(twice.read_register(Register::TWBR), 72);
		assert_eq!(twice.read_register(Register::TWCR), TwiControlWrite::enable().0);
		assert_eq!(twice.read_register(Register::PORTC) & PORTC_PULLUPS, PORTC_PULLUPS);
		assert_eq!(TwiStatusRead(twice.read_register(Register::TWSR)).prescaler(), 1);
	}

	#[test]
	fn init_clears_prescaler_and_keeps_other_port_bits() {
		let mut bus = bus();
		bus.write_register(Register::TWSR, 0x03);
		bus.write_register(Register::PORTC, 0x01);
		bus.init(&BusClock::default());
		assert_eq!(TwiStatusRead(bus.read_register(Register::TWSR)).prescaler_bits(), 0);
		assert_eq!(bus.read_register(Register::PORTC), 0x31);
	}

	#[test]
	fn start_accepts_both_address_acks() {
		let mut bus = bus();
		bus.init(&BusClock::default());
		assert_eq!(bus.start(address_byte(SENSOR, Direction::Write)), Ok(Status::MtSlaAck));
		assert_eq!(bus.start(address_byte(SENSOR, Direction::Read)), Ok(Status::MrSlaAck));
	}

	#[test]
	fn start_reports_nack_without_retrying() {
		let mut bus = bus();
		bus.set_absent(true);
		bus.init(&BusClock::default());
		let address = address_byte(SENSOR, Direction::Write);
		assert_eq!(bus.start(address), Err(BusError::AddressNack { address, status: 0x20 }));
		assert_eq!(bus.events(), &[BusEvent::Start, BusEvent::Address(address)]);
	}

	#[test]
	fn start_fails_once_when_start_not_transmitted() {
		let mut bus = bus();
		bus.fail_starts(1);
		bus.init(&BusClock::default());
		assert_eq!(bus.start(address_byte(SENSOR, Direction::Write)), Err(BusError::StartFailed { status: 0x00 }));
		assert!(bus.events().is_empty());
	}

	#[test]
	fn start_wait_retries_busy_slave() {
		let mut bus = bus();
		bus.set_busy(2);
		bus.init(&BusClock::default());
		let address = address_byte(SENSOR, Direction::Write);
		assert_eq!(bus.start_wait(address, &RetryPolicy::default()), Ok(Status::MtSlaAck));
		assert_eq!(bus.events(), &[
			BusEvent::Start, BusEvent::Address(address), BusEvent::Stop,
			BusEvent::Start, BusEvent::Address(address), BusEvent::Stop,
			BusEvent::Start, BusEvent::Address(address),
		]);
	}

	#[test]
	fn start_wait_retries_failed_start() {
		let mut bus = bus();
		bus.fail_starts(3);
		bus.init(&BusClock::default());
		let address = address_byte(SENSOR, Direction::Write);
		assert_eq!(bus.start_wait(address, &RetryPolicy::new(4)), Ok(Status::MtSlaAck));
		assert_eq!(bus.events(), &[BusEvent::Start, BusEvent::Address(address)]);
	}

	#[test]
	fn start_wait_gives_up() {
		let mut bus = bus();
		bus.set_absent(true);
		bus.init(&BusClock::default());
		let address = address_byte(SENSOR, Direction::Write);
		assert_eq!(
			bus.start_wait(address, &RetryPolicy::new(3)),
			Err(BusError::NotResponding { address, attempts: 3, last: 0x20 })
		);
		let stops = bus.events().iter().filter(|e| **e == BusEvent::Stop).count();
		assert_eq!(stops, 3);
	}

	#[test]
	fn start_wait_stops_after_read_address_nack() {
		let mut bus = bus();
		bus.init(&BusClock::default());
		bus.start_wait(address_byte(SENSOR, Direction::Write), &RetryPolicy::default()).unwrap();
		bus.write(0x06).unwrap();

		bus.set_absent(true);
		let address = address_byte(SENSOR, Direction::Read);
		assert_eq!(
			bus.start_wait(address, &RetryPolicy::new(2)),
			Err(BusError::NotResponding { address, attempts: 2, last: 0x48 })
		);
		assert_eq!(&bus.events()[3..], &[
			BusEvent::RepeatedStart, BusEvent::Address(address), BusEvent::Stop,
			BusEvent::Start, BusEvent::Address(address), BusEvent::Stop,
		]);
	}

	#[test]
	fn start_wait_retries_lost_arbitration_without_stop() {
		let mut bus = bus();
		bus.lose_arbitration(1);
		bus.init(&BusClock::default());
		let address = address_byte(SENSOR, Direction::Write);
		assert_eq!(bus.start_wait(address, &RetryPolicy::default()), Ok(Status::MtSlaAck));
		assert_eq!(bus.events(), &[
			BusEvent::Start, BusEvent::Address(address),
			BusEvent::Start, BusEvent::Address(address),
		]);
	}

	#[test]
	fn start_reports_lost_arbitration() {
		let mut bus = bus();
		bus.lose_arbitration(1);
		bus.init(&BusClock::default());
		let address = address_byte(SENSOR, Direction::Write);
		assert_eq!(bus.start(address), Err(BusError::UnexpectedStatus { address, status: 0x38 }));
	}

	#[test]
	fn retry_policy_makes_at_least_one_attempt() {
		assert_eq!(RetryPolicy::new(0).attempts(), 1);
	}

	#[test]
	fn write_reports_data_nack() {
		let mut bus = bus();
		bus.init(&BusClock::default());
		bus.start_wait(address_byte(SENSOR, Direction::Write), &RetryPolicy::default()).unwrap();
		assert_eq!(bus.write(0x07), Ok(()));
		// the model accepts a single command byte
		assert_eq!(bus.write(0x07), Err(BusError::DataNack { status: 0x30 }));
	}

	#[test]
	fn stop_completes() {
		let mut bus = bus();
		bus.init(&BusClock::default());
		bus.start_wait(address_byte(SENSOR, Direction::Write), &RetryPolicy::default()).unwrap();
		bus.stop();
		assert!(!TwiControlRead(bus.read_register(Register::TWCR)).is_stop());
		assert_eq!(bus.events().last(), Some(&BusEvent::Stop));
	}
}
