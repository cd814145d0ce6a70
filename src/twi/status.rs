use std::fmt;

/// Master-mode phase codes from the status bits of TWSR (already masked
/// with 0xf8).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Status {
	BusError,
	Start,
	RepeatedStart,
	MtSlaAck,
	MtSlaNack,
	MtDataAck,
	MtDataNack,
	ArbitrationLost,
	MrSlaAck,
	MrSlaNack,
	MrDataAck,
	MrDataNack,
	NoInfo,
}

impl Status {
	pub fn bits(self) -> u8 {
		match self {
			Status::BusError => 0x00,
			Status::Start => 0x08,
			Status::RepeatedStart => 0x10,
			Status::MtSlaAck => 0x18,
			Status::MtSlaNack => 0x20,
			Status::MtDataAck => 0x28,
			Status::MtDataNack => 0x30,
			Status::ArbitrationLost => 0x38,
			Status::MrSlaAck => 0x40,
			Status::MrSlaNack => 0x48,
			Status::MrDataAck => 0x50,
			Status::MrDataNack => 0x58,
			Status::NoInfo => 0xf8,
		}
	}

	// slave-mode codes are not modelled
	pub fn from_bits(bits: u8) -> Option<Self> {
		match bits {
			0x00 => Some(Status::BusError),
			0x08 => Some(Status::Start),
			0x10 => Some(Status::RepeatedStart),
			0x18 => Some(Status::MtSlaAck),
			0x20 => Some(Status::MtSlaNack),
			0x28 => Some(Status::MtDataAck),
			0x30 => Some(Status::MtDataNack),
			0x38 => Some(Status::ArbitrationLost),
			0x40 => Some(Status::MrSlaAck),
			0x48 => Some(Status::MrSlaNack),
			0x50 => Some(Status::MrDataAck),
			0x58 => Some(Status::MrDataNack),
			0xf8 => Some(Status::NoInfo),
			_ => None,
		}
	}

	pub fn is_start(self) -> bool {
		self == Status::Start || self == Status::RepeatedStart
	}

	pub fn is_address_ack(self) -> bool {
		self == Status::MtSlaAck || self == Status::MrSlaAck
	}

	pub fn is_address_nack(self) -> bool {
		self == Status::MtSlaNack || self == Status::MrSlaNack
	}
}

impl fmt::Display for Status {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{:?} (0x{:02x})", self, self.bits())
	}
}
