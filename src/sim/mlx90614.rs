use crc::{
	Crc,
	CRC_8_SMBUS,
};

use crate::twi::{
	Direction,
	address_byte,
};

use super::SlaveDevice;

const COMMAND_AMBIENT: u8 = 0x06;
const COMMAND_OBJECT: u8 = 0x07;

const PEC: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);

/// CRC-8 over all bytes of an SMBus transfer
pub fn smbus_pec(data: &[u8]) -> u8 {
	PEC.checksum(data)
}

/// MLX90614 answering "read word" for its two temperature RAM cells.
///
/// Sends the addressed word LSB first, then the PEC byte, then 0xff.
#[derive(Clone, Debug)]
pub struct Mlx90614Model {
	address: u8,
	ambient_raw: u16,
	object_raw: u16,
	command: Option<u8>,
	response: Vec<u8>,
}

impl Mlx90614Model {
	pub fn new(address: u8, ambient_raw: u16, object_raw: u16) -> Self {
		Mlx90614Model {
			address,
			ambient_raw,
			object_raw,
			command: None,
			response: Vec::new(),
		}
	}

	fn prepare_response(&mut self) {
		let word = match self.command {
			Some(COMMAND_AMBIENT) => self.ambient_raw,
			Some(COMMAND_OBJECT) => self.object_raw,
			_ => {
				self.response.clear();
				return;
			}
		};
		let [lsb, msb] = word.to_le_bytes();
		let pec = smbus_pec(&[
			address_byte(self.address, Direction::Write),
			self.command.unwrap_or(0),
			address_byte(self.address, Direction::Read),
			lsb,
			msb,
		]);
		// popped from the back
		self.response = vec![pec, msb, lsb];
	}
}

impl SlaveDevice for Mlx90614Model {
	fn address(&self) -> u8 {
		self.address
	}

	fn addressed(&mut self, direction: Direction) {
		match direction {
			Direction::Write => self.command = None,
			Direction::Read => self.prepare_response(),
		}
	}

	fn write(&mut self, data: u8) -> bool {
		match (self.command, data) {
			(None, COMMAND_AMBIENT) | (None, COMMAND_OBJECT) => {
				self.command = Some(data);
				true
			}
			_ => false,
		}
	}

	fn read(&mut self) -> u8 {
		self.response.pop().unwrap_or(0xff)
	}

	fn stop(&mut self) {
		self.command = None;
		self.response.clear();
	}
}
