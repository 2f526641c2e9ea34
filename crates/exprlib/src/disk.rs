//! Filesystem usage queries for `disk()`.

use std::{ffi::CString, mem::MaybeUninit};

/// Raw block counts for one mounted filesystem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskStats {
    /// Total blocks, in `fragment_size` units.
    pub blocks: u64,
    /// Free blocks, in `block_size` units.
    pub free: u64,
    /// Blocks available to unprivileged users, in `block_size` units.
    pub available: u64,
    /// Filesystem block size.
    pub block_size: u64,
    /// Fragment size.
    pub fragment_size: u64,
}

impl DiskStats {
    /// Value for a `disk()` selector (ASCII case-insensitive); 0 for unknown selectors.
    pub fn select(&self, selector: &str) -> f64 {
        let total = self.blocks as f64 * self.fragment_size as f64;
        let free = self.free as f64 * self.block_size as f64;
        let available = self.available as f64 * self.block_size as f64;
        match selector.to_ascii_lowercase().as_str() {
            "total" => total,
            "avail" => available,
            "free" => free,
            "%avail" if total > 0.0 => free / total * 100.0,
            "%used" if total > 0.0 => (1.0 - free / total) * 100.0,
            _ => 0.0,
        }
    }
}

/// `statvfs(3)` for `path`. `None` when the path cannot be queried.
#[allow(clippy::unnecessary_cast)]
pub fn stat(path: &str) -> Option<DiskStats> {
    let c_path = CString::new(path).ok()?;
    let mut raw = MaybeUninit::<libc::statvfs>::zeroed();
    // SAFETY: `c_path` is NUL-terminated and `raw` is valid for writes of one `statvfs`.
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), raw.as_mut_ptr()) };
    if rc != 0 {
        return None;
    }
    // SAFETY: statvfs returned 0, so the struct is initialized.
    let raw = unsafe { raw.assume_init() };
    Some(DiskStats {
        blocks: raw.f_blocks as u64,
        free: raw.f_bfree as u64,
        available: raw.f_bavail as u64,
        block_size: raw.f_bsize as u64,
        fragment_size: raw.f_frsize as u64,
    })
}
