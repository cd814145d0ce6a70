/// Master-mode driver for the ATmega328P two-wire interface (TWI, I²C)
///
/// Every bus phase is started by writing TWCR with TWINT set (writing a
/// one clears the flag), then polling until the hardware sets TWINT again
/// and reading the phase result from the status bits of TWSR.
///
/// A read transaction against a register-addressed slave:
/// - START, address + write bit (expect 0x08 then 0x18)
/// - command byte (expect 0x28)
/// - REPEATED START, address + read bit (expect 0x10 then 0x40)
/// - data bytes, ACKed while more are wanted (0x50), the last one NACKed (0x58)
/// - STOP (hardware clears TWSTO when done)
///
/// STOP is the only phase that doesn't set TWINT.

mod clock;
mod low_level;
mod registers;
mod status;

pub use self::clock::{
	BusClock,
	F_CPU,
	SCL_FREQUENCY,
	scl_frequency_for,
};

pub use self::low_level::{
	BusError,
	Direction,
	RetryPolicy,
	TwiBus,
	address_byte,
};

pub use self::registers::{
	TwiControlRead,
	TwiControlWrite,
	TwiStatusRead,
	PORTC_PULLUPS,
};

pub use self::status::Status;
