use std::fmt;

use super::Status;

// TWCR flags
const TWCR_TWINT: u8 = 0x80; // interrupt flag; write 1 to clear and start the next phase
const TWCR_TWEA:  u8 = 0x40; // enable acknowledge
const TWCR_TWSTA: u8 = 0x20; // START condition
const TWCR_TWSTO: u8 = 0x10; // STOP condition; cleared by hardware
const TWCR_TWWC:  u8 = 0x08; // write collision (read only)
const TWCR_TWEN:  u8 = 0x04; // enable
const TWCR_TWIE:  u8 = 0x01; // interrupt enable

// TWSR
const TWSR_STATUS_MASK:    u8 = 0xf8;
const TWSR_PRESCALER_MASK: u8 = 0x03;

// pull-ups for SDA (PC4) and SCL (PC5)
pub const PORTC_PULLUPS: u8 = (1 << 4) | (1 << 5);

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TwiControlRead(pub u8);

impl TwiControlRead {
	pub fn is_interrupt(&self) -> bool {
		0 != self.0 & TWCR_TWINT
	}
	pub fn is_enable_ack(&self) -> bool {
		0 != self.0 & TWCR_TWEA
	}
	pub fn is_start(&self) -> bool {
		0 != self.0 & TWCR_TWSTA
	}
	pub fn is_stop(&self) -> bool {
		0 != self.0 & TWCR_TWSTO
	}
	pub fn is_write_collision(&self) -> bool {
		0 != self.0 & TWCR_TWWC
	}
	pub fn is_enabled(&self) -> bool {
		0 != self.0 & TWCR_TWEN
	}
	pub fn is_interrupt_enable(&self) -> bool {
		0 != self.0 & TWCR_TWIE
	}
}

impl fmt::Display for TwiControlRead {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:02x}", self.0)
	}
}

impl fmt::Debug for TwiControlRead {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:02x} (", self.0)?;
		if self.is_interrupt() { write!(f, " [INT]")?; }
		if self.is_enable_ack() { write!(f, " [EA]")?; }
		if self.is_start() { write!(f, " [STA]")?; }
		if self.is_stop() { write!(f, " [STO]")?; }
		if self.is_write_collision() { write!(f, " [WC]")?; }
		if self.is_enabled() { write!(f, " [EN]")?; }
		if self.is_interrupt_enable() { write!(f, " [IE]")?; }
		write!(f, " )")
	}
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TwiControlWrite(pub u8);

impl TwiControlWrite {
	/// enabled, ACK generation on; no phase started
	pub fn enable() -> Self {
		*TwiControlWrite(0)
			.set_enable()
			.set_enable_ack()
	}

	pub fn start() -> Self {
		*TwiControlWrite(0)
			.set_interrupt()
			.set_start()
			.set_enable()
	}

	pub fn stop() -> Self {
		*TwiControlWrite(0)
			.set_interrupt()
			.set_stop()
			.set_enable()
	}

	/// send TWDR (address or data)
	pub fn transmit() -> Self {
		*TwiControlWrite(0)
			.set_interrupt()
			.set_enable()
	}

	/// receive a byte and answer with ACK (`true`) or NACK
	pub fn receive(ack: bool) -> Self {
		let mut w = TwiControlWrite::transmit();
		if ack {
			w.set_enable_ack();
		}
		w
	}

	pub fn is_interrupt(&self) -> bool {
		0 != self.0 & TWCR_TWINT
	}
	pub fn set_interrupt(&mut self) -> &mut Self {
		self.0 |= TWCR_TWINT;
		self
	}

	pub fn is_enable_ack(&self) -> bool {
		0 != self.0 & TWCR_TWEA
	}
	pub fn set_enable_ack(&mut self) -> &mut Self {
		self.0 |= TWCR_TWEA;
		self
	}

	pub fn is_start(&self) -> bool {
		0 != self.0 & TWCR_TWSTA
	}
	pub fn set_start(&mut self) -> &mut Self {
		self.0 |= TWCR_TWSTA;
		self
	}

	pub fn is_stop(&self) -> bool {
		0 != self.0 & TWCR_TWSTO
	}
	pub fn set_stop(&mut self) -> &mut Self {
		self.0 |= TWCR_TWSTO;
		self
	}

	pub fn is_enabled(&self) -> bool {
		0 != self.0 & TWCR_TWEN
	}
	pub fn set_enable(&mut self) -> &mut Self {
		self.0 |= TWCR_TWEN;
		self
	}
}

impl fmt::Display for TwiControlWrite {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:02x}", self.0)
	}
}

impl fmt::Debug for TwiControlWrite {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:02x} (", self.0)?;
		if self.is_interrupt() { write!(f, " [INT]")?; }
		if self.is_enable_ack() { write!(f, " [EA]")?; }
		if self.is_start() { write!(f, " [STA]")?; }
		if self.is_stop() { write!(f, " [STO]")?; }
		if self.is_enabled() { write!(f, " [EN]")?; }
		write!(f, " )")
	}
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TwiStatusRead(pub u8);

impl TwiStatusRead {
	pub fn status_bits(&self) -> u8 {
		self.0 & TWSR_STATUS_MASK
	}

	pub fn status(&self) -> Option<Status> {
		Status::from_bits(self.status_bits())
	}

	pub fn prescaler_bits(&self) -> u8 {
		self.0 & TWSR_PRESCALER_MASK
	}

	// TWSR value with both prescaler bits cleared (divide by 1)
	pub fn without_prescaler(&self) -> u8 {
		self.0 & !TWSR_PRESCALER_MASK
	}

	pub fn prescaler(&self) -> u32 {
		match self.prescaler_bits() {
			0 => 1,
			1 => 4,
			2 => 16,
			3 => 64,
			_ => unreachable!(),
		}
	}
}

impl fmt::Display for TwiStatusRead {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:02x}", self.0)
	}
}

impl fmt::Debug for TwiStatusRead {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self.status() {
			Some(status) => write!(f, "0x{:02x} ({:?}, prescaler {})", self.0, status, self.prescaler()),
			None => write!(f, "0x{:02x} (unknown status 0x{:02x}, prescaler {})", self.0, self.status_bits(), self.prescaler()),
		}
	}
}
