//! Register access for the two-wire interface.
//!
//! Everything above this module talks to the TWI unit only through
//! [`Hardware`], so the protocol code runs the same against the real data
//! space, a mapped register window or the simulator in [`crate::sim`].

use std::fmt;

mod mmio;
pub mod linux;

pub use self::mmio::Mmio;

/// Registers used by the driver.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Register {
	/// bit rate
	TWBR,
	/// status (bits 7..3) and prescaler (bits 1..0)
	TWSR,
	/// data
	TWDR,
	/// control
	TWCR,
	/// port C output; bits 4/5 enable the pull-ups on SDA/SCL
	PORTC,
}

impl Register {
	pub const ALL: [Register; 5] = [
		Register::TWBR,
		Register::TWSR,
		Register::TWDR,
		Register::TWCR,
		Register::PORTC,
	];

	/// Address in the ATmega328P data space
	pub fn offset(self) -> usize {
		match self {
			Register::TWBR => 0xb8,
			Register::TWSR => 0xb9,
			Register::TWDR => 0xbb,
			Register::TWCR => 0xbc,
			Register::PORTC => 0x28,
		}
	}

	// smallest window covering all registers
	pub fn window_len() -> usize {
		Register::ALL.iter().map(|r| r.offset() + 1).max().unwrap_or(0)
	}
}

impl fmt::Display for Register {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{:?}@0x{:02x}", self, self.offset())
	}
}

pub trait Hardware {
	fn read_register(&mut self, register: Register) -> u8;
	fn write_register(&mut self, register: Register, value: u8);

	// called once per iteration while busy-waiting on a status bit
	fn relax(&mut self) {
		std::hint::spin_loop();
	}
}

impl<'a, H: ?Sized + Hardware> Hardware for &'a mut H {
	fn read_register(&mut self, register: Register) -> u8 {
		H::read_register(*self, register)
	}

	fn write_register(&mut self, register: Register, value: u8) {
		H::write_register(*self, register, value)
	}

	fn relax(&mut self) {
		H::relax(*self)
	}
}
