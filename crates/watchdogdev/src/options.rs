//! Capability metadata reported by a watchdog device.
//!
//! The option bits mirror the `WDIOF_*` flags of the Linux watchdog API.
//! They are reported both by `WDIOC_GETSUPPORT` (what the card can do) and
//! by `WDIOC_GETBOOTSTATUS` (what caused the last reboot).

use core::fmt;

/// Bitmask of watchdog option flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct WatchdogOptions(u32);

impl WatchdogOptions {
    /// Reset due to CPU overheat.
    pub const OVERHEAT: Self = Self(0x0001);
    /// Fan failed.
    pub const FANFAULT: Self = Self(0x0002);
    /// External relay 1.
    pub const EXTERN1: Self = Self(0x0004);
    /// External relay 2.
    pub const EXTERN2: Self = Self(0x0008);
    /// Power bad/power fault.
    pub const POWERUNDER: Self = Self(0x0010);
    /// Card previously reset the CPU.
    pub const CARDRESET: Self = Self(0x0020);
    /// Power over voltage.
    pub const POWEROVER: Self = Self(0x0040);
    /// Timeout can be set.
    pub const SETTIMEOUT: Self = Self(0x0080);
    /// Closing the handle disarms the card only after the magic character.
    pub const MAGICCLOSE: Self = Self(0x0100);
    /// Pretimeout (in seconds) can be set.
    pub const PRETIMEOUT: Self = Self(0x0200);
    /// Watchdog triggers a management or other external alarm, not a reboot.
    pub const ALARMONLY: Self = Self(0x0400);
    /// Keep-alive ping reply.
    pub const KEEPALIVEPING: Self = Self(0x8000);

    const NAMED: [(Self, &'static str); 12] = [
        (Self::OVERHEAT, "OVERHEAT"),
        (Self::FANFAULT, "FANFAULT"),
        (Self::EXTERN1, "EXTERN1"),
        (Self::EXTERN2, "EXTERN2"),
        (Self::POWERUNDER, "POWERUNDER"),
        (Self::CARDRESET, "CARDRESET"),
        (Self::POWEROVER, "POWEROVER"),
        (Self::SETTIMEOUT, "SETTIMEOUT"),
        (Self::MAGICCLOSE, "MAGICCLOSE"),
        (Self::PRETIMEOUT, "PRETIMEOUT"),
        (Self::ALARMONLY, "ALARMONLY"),
        (Self::KEEPALIVEPING, "KEEPALIVEPING"),
    ];

    /// An empty set of options.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Wrap a raw bitmask. Unknown bits are retained.
    #[must_use]
    pub const fn from_bits_retain(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bitmask.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no bit is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Union of two option sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl core::ops::BitOr for WatchdogOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl core::ops::BitOrAssign for WatchdogOptions {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl fmt::Display for WatchdogOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("(none)");
        }

        let mut remaining = self.0;
        let mut first = true;
        for (flag, name) in Self::NAMED {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                remaining &= !flag.0;
                first = false;
            }
        }
        if remaining != 0 {
            if !first {
                f.write_str("|")?;
            }
            write!(f, "{remaining:#06x}")?;
        }
        Ok(())
    }
}

/// Identity and capability information read once when a device is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCapabilities {
    /// Driver identity string.
    pub identity: String,
    /// Firmware version reported by the driver.
    pub firmware_version: u32,
    /// Supported options.
    pub options: WatchdogOptions,
}

impl DeviceCapabilities {
    /// Create a capability record.
    #[must_use]
    pub fn new(identity: impl Into<String>, firmware_version: u32, options: WatchdogOptions) -> Self {
        Self {
            identity: identity.into(),
            firmware_version,
            options,
        }
    }

    /// Whether releasing the handle must be preceded by the magic close
    /// character to avoid a reset.
    #[must_use]
    pub fn requires_magic_close(&self) -> bool {
        self.options.contains(WatchdogOptions::MAGICCLOSE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains() {
        let options = WatchdogOptions::MAGICCLOSE | WatchdogOptions::SETTIMEOUT;
        assert!(options.contains(WatchdogOptions::MAGICCLOSE));
        assert!(options.contains(WatchdogOptions::SETTIMEOUT));
        assert!(!options.contains(WatchdogOptions::KEEPALIVEPING));
        assert!(options.contains(WatchdogOptions::empty()));
    }

    #[test]
    fn test_display() {
        assert_eq!(WatchdogOptions::empty().to_string(), "(none)");
        assert_eq!(
            (WatchdogOptions::SETTIMEOUT | WatchdogOptions::MAGICCLOSE | WatchdogOptions::KEEPALIVEPING)
                .to_string(),
            "SETTIMEOUT|MAGICCLOSE|KEEPALIVEPING"
        );
        assert_eq!(
            WatchdogOptions::from_bits_retain(0x0100 | 0x1000).to_string(),
            "MAGICCLOSE|0x1000"
        );
    }

    #[test]
    fn test_requires_magic_close() {
        let caps = DeviceCapabilities::new("iTCO_wdt", 6, WatchdogOptions::MAGICCLOSE);
        assert!(caps.requires_magic_close());

        let caps = DeviceCapabilities::new("softdog", 0, WatchdogOptions::SETTIMEOUT);
        assert!(!caps.requires_magic_close());
    }
}
