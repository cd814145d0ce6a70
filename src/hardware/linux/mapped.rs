use std::ffi::CString;
use std::fs;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::{
	FromRawFd,
};
use std::path::Path;
use std::ptr;

use libc::{
	MAP_SHARED,
	O_CLOEXEC,
	O_RDWR,
	O_SYNC,
	PROT_READ,
	PROT_WRITE,
	c_void,
	mmap,
	munmap,
	open,
};

use crate::hardware::{
	Hardware,
	Register,
};

#[derive(Debug)]
pub struct Mapped {
	ptr: ptr::NonNull<u8>, // u8 instead of void for easier offset operations
	len: usize,
}

impl Drop for Mapped {
	fn drop(&mut self) {
		unsafe {
			let res = munmap(
				self.ptr.as_ptr() as *mut c_void,
				self.len,
			);
			if 0 != res {
				error!("munmap failed: {}", io::Error::last_os_error());
			}
		}
	}
}

impl Mapped {
	pub fn read_byte(&self, offset: usize) -> u8 {
		assert!(offset < self.len);
		unsafe { ptr::read_volatile(self.ptr.as_ptr().add(offset)) }
	}

	pub fn write_byte(&mut self, offset: usize, data: u8) {
		assert!(offset < self.len);
		unsafe { ptr::write_volatile(self.ptr.as_ptr().add(offset), data) }
	}
}

impl Hardware for Mapped {
	fn read_register(&mut self, register: Register) -> u8 {
		let value = self.read_byte(register.offset());
		trace!("{} -> 0x{:02x}", register, value);
		value
	}

	fn write_register(&mut self, register: Register, value: u8) {
		trace!("{} <- 0x{:02x}", register, value);
		self.write_byte(register.offset(), value);
	}
}

// TODO: exclusive open / file locking?
pub fn inner_open(path: &Path, len: usize) -> io::Result<Mapped> {
	let path = CString::new(path.as_os_str().as_bytes())?;

	let fd = unsafe { open(path.as_ptr(), O_RDWR | O_CLOEXEC | O_SYNC) };
	if -1 == fd {
		return Err(io::Error::last_os_error());
	}
	// now get fd managed to prevent resource leak
	let f = unsafe { fs::File::from_raw_fd(fd) };

	// device nodes report size 0; only regular files can be checked
	let meta = f.metadata()?;
	if meta.is_file() && (meta.len() as usize) < len {
		return Err(io::Error::new(
			io::ErrorKind::InvalidInput,
			format!("register window too small: {} bytes, need {}", meta.len(), len),
		));
	}

	let area = unsafe {
		mmap(
			ptr::null_mut(),
			len,
			PROT_READ | PROT_WRITE,
			MAP_SHARED,
			fd,
			0,
		)
	};

	if area as usize == !0usize {
		return Err(io::Error::last_os_error());
	}
	match ptr::NonNull::new(area as *mut u8) {
		None => Err(io::Error::new(io::ErrorKind::Other, "mmap returned NULL")),
		Some(area) => {
			debug!("mapped {} register bytes", len);
			Ok(Mapped{
				ptr: area,
				len,
			})
		},
	}
}
