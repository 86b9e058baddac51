use std::{fmt, ops::BitOr, str::FromStr};

use crate::{error::Error, status::PdhStatus};

/// Flags passed as `dwFormat` to `PdhGetFormattedCounterValue` and
/// `PdhGetFormattedCounterArrayW`.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct FormatFlags(pub u32);

impl FormatFlags {
    pub const NONE: Self = Self(0);
    pub const RAW: Self = Self(0x00000010);
    pub const ANSI: Self = Self(0x00000020);
    pub const UNICODE: Self = Self(0x00000040);
    pub const LONG: Self = Self(0x00000100);
    pub const DOUBLE: Self = Self(0x00000200);
    pub const LARGE: Self = Self(0x00000400);
    /// Do not apply the counter's default scaling factor.
    pub const NOSCALE: Self = Self(0x00001000);
    /// Multiply the actual value by 1,000.
    pub const MULTIPLY_1000: Self = Self(0x00002000);
    pub const NODATA: Self = Self(0x00004000);
    /// Do not cap values > 100.
    pub const NOCAP100: Self = Self(0x00008000);
    pub const PERF_DETAIL_COSTLY: Self = Self(0x00010000);
    pub const PERF_DETAIL_STANDARD: Self = Self(0x0000FFFF);

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for FormatFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub struct CounterValue<T> {
    pub status: PdhStatus,
    pub value: T,
}

#[derive(Clone, PartialEq, Debug)]
pub struct CounterItem<T> {
    pub name: String,
    pub value: CounterValue<T>,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum ValueKind {
    #[default]
    Double,
    Large,
    Long,
}

impl ValueKind {
    pub fn flags(self) -> FormatFlags {
        match self {
            ValueKind::Double => FormatFlags::DOUBLE,
            ValueKind::Large => FormatFlags::LARGE,
            ValueKind::Long => FormatFlags::LONG,
        }
    }
}

impl FromStr for ValueKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "double" => Ok(ValueKind::Double),
            "large" => Ok(ValueKind::Large),
            "long" => Ok(ValueKind::Long),
            _ => Err(Error::UnknownValueKind(s.to_owned())),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Double => "double",
            ValueKind::Large => "large",
            ValueKind::Long => "long",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_combine() {
        let flags = FormatFlags::DOUBLE | FormatFlags::NOCAP100;
        assert_eq!(flags.bits(), 0x00008200);
        assert!(flags.contains(FormatFlags::DOUBLE));
        assert!(flags.contains(FormatFlags::NOCAP100));
        assert!(!flags.contains(FormatFlags::LARGE));
    }

    #[test]
    fn value_kind_parses_case_insensitively() {
        assert_eq!("double".parse::<ValueKind>().unwrap(), ValueKind::Double);
        assert_eq!("LARGE".parse::<ValueKind>().unwrap(), ValueKind::Large);
        assert_eq!("Long".parse::<ValueKind>().unwrap(), ValueKind::Long);
    }

    #[test]
    fn value_kind_rejects_unknown() {
        let err = "float".parse::<ValueKind>().unwrap_err();
        assert!(matches!(err, Error::UnknownValueKind(ref s) if s == "float"));
    }

    #[test]
    fn value_kind_maps_to_format_flag() {
        assert_eq!(ValueKind::Double.flags(), FormatFlags::DOUBLE);
        assert_eq!(ValueKind::Large.flags(), FormatFlags::LARGE);
        assert_eq!(ValueKind::Long.flags(), FormatFlags::LONG);
        assert_eq!(ValueKind::Large.to_string(), "large");
    }
}
