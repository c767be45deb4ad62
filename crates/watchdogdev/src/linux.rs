//! Linux watchdog backend over `/dev/watchdog*`.
//!
//! This module talks to the kernel watchdog core using:
//! - `WDIOC_*` ioctls for capabilities, timeouts and keep-alives
//! - a plain write as keep-alive fallback for drivers without `KEEPALIVEPING`
//! - the `'V'` magic character before release

#![expect(unsafe_code, reason = "watchdog ioctls have no safe std wrapper")]

use crate::device::WatchdogDevice;
use crate::error::{DeviceError, DeviceResult};
use crate::options::{DeviceCapabilities, WatchdogOptions};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use tracing::debug;

const WATCHDOG_IOCTL_BASE: u8 = b'W';

const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = 8;
const IOC_SIZESHIFT: u32 = 16;
const IOC_DIRSHIFT: u32 = 30;
const IOC_WRITE: u32 = 1;
const IOC_READ: u32 = 2;
const IOC_READ_WRITE: u32 = IOC_READ | IOC_WRITE;

const WDIOC_NR_GETSUPPORT: u8 = 0;
const WDIOC_NR_GETBOOTSTATUS: u8 = 2;
const WDIOC_NR_KEEPALIVE: u8 = 5;
const WDIOC_NR_SETTIMEOUT: u8 = 6;
const WDIOC_NR_GETTIMEOUT: u8 = 7;
const WDIOC_NR_GETTIMELEFT: u8 = 10;

const IDENTITY_LEN: usize = 32;
const MAGIC_CLOSE_CHAR: &[u8] = b"V";
const PING_CHAR: &[u8] = b"k";

/// Mirror of the kernel's `struct watchdog_info`.
#[repr(C)]
#[derive(Clone, Copy, Default)]
struct WatchdogInfo {
    options: u32,
    firmware_version: u32,
    identity: [u8; IDENTITY_LEN],
}

/// Request argument type of `libc::ioctl`, which differs between C libraries.
#[cfg(not(target_env = "musl"))]
type IoctlRequest = libc::c_ulong;
#[cfg(target_env = "musl")]
type IoctlRequest = libc::c_int;

const fn ioctl_code(direction: u32, kind: u8, nr: u8, size: usize) -> u32 {
    (direction << IOC_DIRSHIFT)
        | ((kind as u32) << IOC_TYPESHIFT)
        | ((nr as u32) << IOC_NRSHIFT)
        | ((size as u32) << IOC_SIZESHIFT)
}

const fn ior<T>(nr: u8) -> u32 {
    ioctl_code(IOC_READ, WATCHDOG_IOCTL_BASE, nr, size_of::<T>())
}

const fn iowr<T>(nr: u8) -> u32 {
    ioctl_code(IOC_READ_WRITE, WATCHDOG_IOCTL_BASE, nr, size_of::<T>())
}

/// Reinterpret a request code as the C library's request type.
///
/// musl declares the argument as `int`, so codes with the read bit set
/// become negative there, matching what the kernel receives.
const fn request(code: u32) -> IoctlRequest {
    code as IoctlRequest
}

const WDIOC_GETSUPPORT: u32 = ior::<WatchdogInfo>(WDIOC_NR_GETSUPPORT);
const WDIOC_GETBOOTSTATUS: u32 = ior::<libc::c_int>(WDIOC_NR_GETBOOTSTATUS);
const WDIOC_KEEPALIVE: u32 = ior::<libc::c_int>(WDIOC_NR_KEEPALIVE);
const WDIOC_SETTIMEOUT: u32 = iowr::<libc::c_int>(WDIOC_NR_SETTIMEOUT);
const WDIOC_GETTIMEOUT: u32 = ior::<libc::c_int>(WDIOC_NR_GETTIMEOUT);
const WDIOC_GETTIMELEFT: u32 = ior::<libc::c_int>(WDIOC_NR_GETTIMELEFT);

fn parse_identity(bytes: &[u8]) -> String {
    let raw = bytes.split(|b| *b == 0).next().unwrap_or_default();
    String::from_utf8_lossy(raw).trim().to_string()
}

fn classify(operation: &'static str, err: io::Error) -> DeviceError {
    match err.raw_os_error() {
        Some(libc::EINVAL | libc::EOPNOTSUPP | libc::ENOTTY) => DeviceError::unsupported(operation),
        _ => DeviceError::io(operation, err),
    }
}

fn seconds_from_raw(value: libc::c_int) -> u32 {
    u32::try_from(value).unwrap_or_default()
}

/// A watchdog character device opened through the Linux watchdog core.
#[derive(Debug)]
pub struct LinuxWatchdog {
    path: PathBuf,
    file: Option<File>,
}

impl LinuxWatchdog {
    /// Open a watchdog device node.
    ///
    /// Most drivers arm the watchdog as soon as the node is opened.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::Unavailable` if the node is missing, not
    /// accessible, or already held by another process.
    pub fn open(path: &Path) -> DeviceResult<Self> {
        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|source| DeviceError::unavailable(path, source))?;
        debug!(path = %path.display(), "Opened watchdog device");
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
        })
    }

    /// Path the device was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file(&mut self, operation: &'static str) -> DeviceResult<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| DeviceError::closed(operation))
    }

    fn ioctl_int(
        &mut self,
        operation: &'static str,
        code: u32,
        value: &mut libc::c_int,
    ) -> DeviceResult<()> {
        let fd = self.file(operation)?.as_raw_fd();
        // SAFETY: `fd` is owned by `self.file`, which stays open for the whole
        // call, and `value` is an exclusive pointer to a `c_int`, the argument
        // size encoded in `code`.
        let rc = unsafe { libc::ioctl(fd, request(code), core::ptr::from_mut(value)) };
        if rc < 0 {
            return Err(classify(operation, io::Error::last_os_error()));
        }
        Ok(())
    }
}

impl WatchdogDevice for LinuxWatchdog {
    fn support(&mut self) -> DeviceResult<DeviceCapabilities> {
        let fd = self.file("support")?.as_raw_fd();
        let mut info = WatchdogInfo::default();
        // SAFETY: `fd` stays open for the call and `info` is a `#[repr(C)]`
        // mirror of `struct watchdog_info`, whose size is encoded in the
        // request.
        let rc = unsafe { libc::ioctl(fd, request(WDIOC_GETSUPPORT), core::ptr::from_mut(&mut info)) };
        if rc < 0 {
            return Err(classify("support", io::Error::last_os_error()));
        }
        Ok(DeviceCapabilities::new(
            parse_identity(&info.identity),
            info.firmware_version,
            WatchdogOptions::from_bits_retain(info.options),
        ))
    }

    fn timeout(&mut self) -> DeviceResult<u32> {
        let mut value: libc::c_int = 0;
        self.ioctl_int("timeout", WDIOC_GETTIMEOUT, &mut value)?;
        Ok(seconds_from_raw(value))
    }

    fn set_timeout(&mut self, seconds: u32) -> DeviceResult<u32> {
        let Ok(mut value) = libc::c_int::try_from(seconds) else {
            return Err(DeviceError::unsupported("set_timeout"));
        };
        self.ioctl_int("set_timeout", WDIOC_SETTIMEOUT, &mut value)?;
        Ok(seconds_from_raw(value))
    }

    fn time_left(&mut self) -> DeviceResult<u32> {
        let mut value: libc::c_int = 0;
        self.ioctl_int("time_left", WDIOC_GETTIMELEFT, &mut value)?;
        Ok(seconds_from_raw(value))
    }

    fn keep_alive(&mut self) -> DeviceResult<()> {
        let mut dummy: libc::c_int = 0;
        match self.ioctl_int("keep_alive", WDIOC_KEEPALIVE, &mut dummy) {
            Err(DeviceError::Unsupported { .. }) => self
                .file("keep_alive")?
                .write_all(PING_CHAR)
                .map_err(|source| DeviceError::io("keep_alive", source)),
            other => other,
        }
    }

    fn magic_close(&mut self) -> DeviceResult<()> {
        self.file("magic_close")?
            .write_all(MAGIC_CLOSE_CHAR)
            .map_err(|source| DeviceError::io("magic_close", source))
    }

    fn close(&mut self) -> DeviceResult<()> {
        if let Some(file) = self.file.take() {
            drop(file);
            debug!(path = %self.path.display(), "Closed watchdog device");
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    fn boot_status(&mut self) -> DeviceResult<WatchdogOptions> {
        let mut value: libc::c_int = 0;
        self.ioctl_int("boot_status", WDIOC_GETBOOTSTATUS, &mut value)?;
        Ok(WatchdogOptions::from_bits_retain(u32::from_ne_bytes(
            value.to_ne_bytes(),
        )))
    }
}
