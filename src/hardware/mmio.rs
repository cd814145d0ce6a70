use std::ptr;

use super::{
	Hardware,
	Register,
};

/// Volatile access to the registers at `base + Register::offset()`.
#[derive(Debug)]
pub struct Mmio {
	base: usize,
}

impl Mmio {
	/// Bind to the data space of the running ATmega328P.
	///
	/// # Safety
	///
	/// Only valid on the target itself; nothing else may drive the TWI
	/// unit while the returned value is in use.
	pub unsafe fn atmega328p() -> Self {
		Mmio { base: 0 }
	}

	/// # Safety
	///
	/// `base + Register::window_len()` bytes starting at `base` must be
	/// mapped device memory laid out like the ATmega328P data space.
	pub unsafe fn new(base: usize) -> Self {
		Mmio { base }
	}

	fn address(&self, register: Register) -> *mut u8 {
		(self.base + register.offset()) as *mut u8
	}
}

impl Hardware for Mmio {
	fn read_register(&mut self, register: Register) -> u8 {
		unsafe { ptr::read_volatile(self.address(register)) }
	}

	fn write_register(&mut self, register: Register, value: u8) {
		unsafe { ptr::write_volatile(self.address(register), value) }
	}
}
