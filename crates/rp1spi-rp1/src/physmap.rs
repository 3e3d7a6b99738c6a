//! Physical memory mapping for MMIO access
//!
//! Maps a window of physical address space through `/dev/mem`. On a
//! Raspberry Pi 5 the RP1 south bridge exposes all of its peripherals in PCI
//! BAR1, so one mapping covers every SSI instance and the GPIO banks.
//!
//! # Safety
//!
//! Accessing physical memory is inherently unsafe and requires root
//! privileges. Offsets are checked against the mapping size in debug builds.

use crate::error::{Result, Rp1Error};

/// A mapped region of physical memory
#[cfg(target_os = "linux")]
pub struct PhysMap {
    /// Pointer to the first requested byte (after page alignment)
    ptr: *mut u8,
    /// Requested size
    size: usize,
    /// Size actually passed to mmap
    map_size: usize,
    /// Offset of `ptr` into the first mapped page
    page_offset: usize,
    phys_addr: u64,
}

#[cfg(target_os = "linux")]
impl PhysMap {
    /// Map `size` bytes of physical memory starting at `phys_addr`
    ///
    /// The region must be MMIO (not RAM) and nothing else in the process may
    /// access it concurrently.
    pub fn new(phys_addr: u64, size: usize) -> Result<Self> {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;
        use std::os::unix::io::AsRawFd;

        let map_err = |source| Rp1Error::MemoryMap {
            address: phys_addr,
            size,
            source,
        };

        // O_SYNC for uncached access
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open("/dev/mem")
            .map_err(map_err)?;

        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
        let page_mask = page_size - 1;
        let page_offset = (phys_addr as usize) & page_mask;
        let aligned_addr = phys_addr & !(page_mask as u64);
        let map_size = (size + page_offset + page_mask) & !page_mask;

        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                map_size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                aligned_addr as libc::off_t,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(map_err(std::io::Error::last_os_error()));
        }

        log::debug!(
            "mapped {:#x} bytes of physical memory at {:#x}",
            map_size,
            aligned_addr
        );

        Ok(Self {
            ptr: unsafe { (ptr as *mut u8).add(page_offset) },
            size,
            map_size,
            page_offset,
            phys_addr,
        })
    }

    /// Read a 32-bit value at `offset` from the start of the mapping
    #[inline]
    pub fn read32(&self, offset: usize) -> u32 {
        debug_assert!(offset + 4 <= self.size);
        debug_assert!(offset & 3 == 0, "unaligned 32-bit read");
        unsafe { core::ptr::read_volatile(self.ptr.add(offset) as *const u32) }
    }

    /// Write a 32-bit value at `offset` from the start of the mapping
    #[inline]
    pub fn write32(&self, offset: usize, value: u32) {
        debug_assert!(offset + 4 <= self.size);
        debug_assert!(offset & 3 == 0, "unaligned 32-bit write");
        unsafe { core::ptr::write_volatile(self.ptr.add(offset) as *mut u32, value) }
    }

    /// Physical address of this mapping
    pub fn phys_addr(&self) -> u64 {
        self.phys_addr
    }

    /// Size of this mapping
    pub fn size(&self) -> usize {
        self.size
    }
}

#[cfg(target_os = "linux")]
impl Drop for PhysMap {
    fn drop(&mut self) {
        unsafe {
            let original = self.ptr.sub(self.page_offset);
            libc::munmap(original as *mut libc::c_void, self.map_size);
        }
    }
}

// MMIO registers have no memory aliasing concerns
#[cfg(target_os = "linux")]
unsafe impl Send for PhysMap {}
#[cfg(target_os = "linux")]
unsafe impl Sync for PhysMap {}

/// Stub for platforms without `/dev/mem`
#[cfg(not(target_os = "linux"))]
pub struct PhysMap {
    _private: (),
}

#[cfg(not(target_os = "linux"))]
impl PhysMap {
    /// Always fails
    pub fn new(_phys_addr: u64, _size: usize) -> Result<Self> {
        Err(Rp1Error::NotSupported(
            "Physical memory mapping only supported on Linux",
        ))
    }

    /// Unreachable without a mapping
    pub fn read32(&self, _offset: usize) -> u32 {
        0
    }

    /// Unreachable without a mapping
    pub fn write32(&self, _offset: usize, _value: u32) {}

    /// Unreachable without a mapping
    pub fn phys_addr(&self) -> u64 {
        0
    }

    /// Unreachable without a mapping
    pub fn size(&self) -> usize {
        0
    }
}
