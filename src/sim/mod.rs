//! Simulated TWI unit.
//!
//! [`SimulatedBus`] is a register file that reacts to TWCR writes like the
//! ATmega328P two-wire interface: each phase request completes at once,
//! drives the attached [`SlaveDevice`] and leaves TWINT set with the
//! matching status code. Every bus-level action is appended to an event
//! log, so tests can check exactly what went over the wire.

use crate::hardware::{
	Hardware,
	Register,
};
use crate::twi::{
	Direction,
	Status,
	TwiControlWrite,
};

mod mlx90614;

pub use self::mlx90614::{
	Mlx90614Model,
	smbus_pec,
};

const TWCR_TWINT: u8 = 0x80;
const TWCR_TWSTO: u8 = 0x10;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BusEvent {
	Start,
	RepeatedStart,
	/// address byte including the direction bit
	Address(u8),
	Write(u8),
	Read { ack: bool },
	Stop,
}

/// A slave on the simulated bus.
pub trait SlaveDevice {
	/// 7-bit address
	fn address(&self) -> u8;

	/// addressed with `direction` and acknowledged
	fn addressed(&mut self, direction: Direction);

	/// returns whether the byte is acknowledged
	fn write(&mut self, data: u8) -> bool;

	fn read(&mut self) -> u8;

	fn stop(&mut self) {
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Phase {
	Idle,
	AddressPending,
	Transmit,
	Receive,
	// slave didn't answer; bus held until STOP or repeated START
	Unaddressed,
}

pub struct SimulatedBus {
	data: [u8; 0x100],
	device: Box<dyn SlaveDevice>,
	phase: Phase,
	events: Vec<BusEvent>,
	start_failures: usize,
	arbitration_losses: usize,
	busy: usize,
	absent: bool,
}

impl SimulatedBus {
	pub fn new(device: Box<dyn SlaveDevice>) -> Self {
		let mut data = [0u8; 0x100];
		data[Register::TWSR.offset()] = Status::NoInfo.bits();
		data[Register::TWBR.offset()] = 0xff;
		SimulatedBus {
			data,
			device,
			phase: Phase::Idle,
			events: Vec::new(),
			start_failures: 0,
			arbitration_losses: 0,
			busy: 0,
			absent: false,
		}
	}

	/// bus-level actions so far
	pub fn events(&self) -> &[BusEvent] {
		&self.events
	}

	/// the next `count` START requests end in a bus error
	pub fn fail_starts(&mut self, count: usize) {
		self.start_failures = count;
	}

	/// another master wins the bus during the next `count` address bytes
	pub fn lose_arbitration(&mut self, count: usize) {
		self.arbitration_losses = count;
	}

	/// the device NACKs the next `count` address bytes
	pub fn set_busy(&mut self, count: usize) {
		self.busy = count;
	}

	/// the device NACKs every address byte
	pub fn set_absent(&mut self, absent: bool) {
		self.absent = absent;
	}

	fn set_status(&mut self, status: Status) {
		let sr = &mut self.data[Register::TWSR.offset()];
		*sr = (*sr & 0x07) | status.bits();
	}

	fn control(&mut self, value: u8) {
		let request = TwiControlWrite(value);
		let twcr = Register::TWCR.offset();

		if !request.is_interrupt() {
			// writing 0 to TWINT leaves it alone
			self.data[twcr] = (value & !TWCR_TWINT) | (self.data[twcr] & TWCR_TWINT);
			return;
		}

		if request.is_stop() {
			self.events.push(BusEvent::Stop);
			self.device.stop();
			self.phase = Phase::Idle;
			self.set_status(Status::NoInfo);
			// STOP completes immediately and doesn't set TWINT
			self.data[twcr] = value & !(TWCR_TWINT | TWCR_TWSTO);
			return;
		}

		if request.is_start() {
			if self.start_failures > 0 {
				self.start_failures -= 1;
				self.set_status(Status::BusError);
			} else {
				let repeated = self.phase != Phase::Idle;
				self.events.push(if repeated { BusEvent::RepeatedStart } else { BusEvent::Start });
				self.set_status(if repeated { Status::RepeatedStart } else { Status::Start });
				self.phase = Phase::AddressPending;
			}
		} else {
			self.transfer(request);
		}

		self.data[twcr] = value | TWCR_TWINT;
	}

	fn transfer(&mut self, request: TwiControlWrite) {
		let twdr = Register::TWDR.offset();

		match self.phase {
			Phase::AddressPending => {
				let address = self.data[twdr];
				self.events.push(BusEvent::Address(address));
				if self.arbitration_losses > 0 {
					// bus released, no STOP needed
					self.arbitration_losses -= 1;
					self.set_status(Status::ArbitrationLost);
					self.phase = Phase::Idle;
					return;
				}
				let direction = if 0 != address & 1 { Direction::Read } else { Direction::Write };
				let matching = address >> 1 == self.device.address();

				let ack = matching && !self.absent && self.busy == 0;
				if matching && self.busy > 0 {
					self.busy -= 1;
				}

				let (status, phase) = match (direction, ack) {
					(Direction::Write, true) => (Status::MtSlaAck, Phase::Transmit),
					(Direction::Write, false) => (Status::MtSlaNack, Phase::Unaddressed),
					(Direction::Read, true) => (Status::MrSlaAck, Phase::Receive),
					(Direction::Read, false) => (Status::MrSlaNack, Phase::Unaddressed),
				};
				if ack {
					self.device.addressed(direction);
				}
				self.set_status(status);
				self.phase = phase;
			}
			Phase::Transmit => {
				let data = self.data[twdr];
				self.events.push(BusEvent::Write(data));
				let status = if self.device.write(data) { Status::MtDataAck } else { Status::MtDataNack };
				self.set_status(status);
			}
			Phase::Receive => {
				let ack = request.is_enable_ack();
				self.events.push(BusEvent::Read { ack });
				self.data[twdr] = self.device.read();
				self.set_status(if ack { Status::MrDataAck } else { Status::MrDataNack });
			}
			Phase::Idle | Phase::Unaddressed => {
				self.set_status(Status::NoInfo);
			}
		}
	}
}

impl Hardware for SimulatedBus {
	fn read_register(&mut self, register: Register) -> u8 {
		self.data[register.offset()]
	}

	fn write_register(&mut self, register: Register, value: u8) {
		match register {
			Register::TWCR => self.control(value),
			// status bits are read only
			Register::TWSR => {
				let sr = &mut self.data[register.offset()];
				*sr = (*sr & 0xfc) | (value & 0x03);
			}
			_ => self.data[register.offset()] = value,
		}
	}
}
