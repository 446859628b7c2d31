//! Human-readable byte sizes for probes and progress output

use std::fmt;

/// Byte count rendered with binary units
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ByteSize(pub u64);

impl ByteSize {
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn to_human_readable(&self) -> String {
        const UNITS: &[(&str, u64)] = &[
            ("B", 1),
            ("KB", 1024),
            ("MB", 1024 * 1024),
            ("GB", 1024 * 1024 * 1024),
            ("TB", 1024 * 1024 * 1024 * 1024),
        ];

        for &(unit, divisor) in UNITS.iter().rev() {
            if self.0 >= divisor {
                let whole = self.0 / divisor;
                if divisor == 1 {
                    return format!("{}{}", whole, unit);
                }
                let tenths = (self.0 % divisor) * 10 / divisor;
                if tenths > 0 {
                    return format!("{}.{}{}", whole, tenths, unit);
                }
                return format!("{}{}", whole, unit);
            }
        }

        format!("{}B", self.0)
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_human_readable())
    }
}

impl From<u64> for ByteSize {
    fn from(value: u64) -> Self {
        ByteSize(value)
    }
}
