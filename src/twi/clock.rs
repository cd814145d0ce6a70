/// CPU clock of the target board
pub const F_CPU: u32 = 16_000_000;
/// Standard-mode bus clock
pub const SCL_FREQUENCY: u32 = 100_000;

/// Bus speed settings; `divisor` is the TWBR value for prescaler 1.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct BusClock {
	cpu_frequency: u32,
	scl_frequency: u32,
	divisor: u8,
}

impl BusClock {
	/// SCL = F_CPU / (16 + 2 * TWBR) with prescaler 1
	pub fn new(cpu_frequency: u32, scl_frequency: u32) -> crate::AResult<Self> {
		ensure!(scl_frequency > 0, "bus frequency must not be zero");
		let ratio = cpu_frequency / scl_frequency;
		ensure!(ratio >= 16,
			"bus frequency {} Hz too high for CPU clock {} Hz", scl_frequency, cpu_frequency
		);
		let divisor = (ratio - 16) / 2;
		ensure!(divisor <= 0xff,
			"bus frequency {} Hz too low for CPU clock {} Hz (bit rate divisor {})", scl_frequency, cpu_frequency, divisor
		);

		Ok(BusClock {
			cpu_frequency,
			scl_frequency,
			divisor: divisor as u8,
		})
	}

	pub fn cpu_frequency(&self) -> u32 {
		self.cpu_frequency
	}

	pub fn scl_frequency(&self) -> u32 {
		self.scl_frequency
	}

	pub fn divisor(&self) -> u8 {
		self.divisor
	}

	/// bus frequency actually produced by `divisor`
	pub fn effective_frequency(&self) -> u32 {
		scl_frequency_for(self.cpu_frequency, self.divisor, 1)
	}
}

impl Default for BusClock {
	fn default() -> Self {
		BusClock {
			cpu_frequency: F_CPU,
			scl_frequency: SCL_FREQUENCY,
			divisor: ((F_CPU / SCL_FREQUENCY - 16) / 2) as u8,
		}
	}
}

pub fn scl_frequency_for(cpu_frequency: u32, divisor: u8, prescaler: u32) -> u32 {
	cpu_frequency / (16 + 2 * divisor as u32 * prescaler)
}
