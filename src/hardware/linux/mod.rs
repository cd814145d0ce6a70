//! Register windows exposed to Linux userspace.
//!
//! A bench bridge (UIO device node) or an emulator can publish the
//! ATmega328P data space as a file; mapping it lets the driver run
//! unchanged on the host.

mod mapped;

pub use self::mapped::Mapped;

use std::path::Path;

pub fn open_register_window<P: AsRef<Path>>(path: P) -> crate::AResult<Mapped> {
	let path = path.as_ref();
	with_context!(("open register window {}", path.display()), {
		Ok(mapped::inner_open(path, super::Register::window_len())?)
	})
}
