use std::fmt;

use crate::error::{Error, Result};

/// A status code returned by a PDH function, or stored in the `CStatus`
/// field of a formatted counter value.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct PdhStatus(pub u32);

macro_rules! pdh_statuses {
    ($($name:ident = $code:literal,)*) => {
        impl PdhStatus {
            $(pub const $name: Self = Self($code);)*

            /// The symbolic name from `pdhmsg.h`, e.g. `PDH_MORE_DATA`.
            pub fn name(self) -> Option<&'static str> {
                match self.0 {
                    $($code => Some(concat!("PDH_", stringify!($name))),)*
                    _ => None,
                }
            }
        }
    };
}

// PDH Error Values, taken from pdhmsg.h
pdh_statuses! {
    CSTATUS_VALID_DATA = 0x00000000,
    CSTATUS_NEW_DATA = 0x00000001,
    CSTATUS_NO_MACHINE = 0x800007D0,
    CSTATUS_NO_INSTANCE = 0x800007D1,
    MORE_DATA = 0x800007D2,
    CSTATUS_ITEM_NOT_VALIDATED = 0x800007D3,
    RETRY = 0x800007D4,
    NO_DATA = 0x800007D5,
    CALC_NEGATIVE_DENOMINATOR = 0x800007D6,
    CALC_NEGATIVE_TIMEBASE = 0x800007D7,
    CALC_NEGATIVE_VALUE = 0x800007D8,
    DIALOG_CANCELLED = 0x800007D9,
    END_OF_LOG_FILE = 0x800007DA,
    ASYNC_QUERY_TIMEOUT = 0x800007DB,
    CANNOT_SET_DEFAULT_REALTIME_DATASOURCE = 0x800007DC,
    CSTATUS_NO_OBJECT = 0xC0000BB8,
    CSTATUS_NO_COUNTER = 0xC0000BB9,
    CSTATUS_INVALID_DATA = 0xC0000BBA,
    MEMORY_ALLOCATION_FAILURE = 0xC0000BBB,
    INVALID_HANDLE = 0xC0000BBC,
    INVALID_ARGUMENT = 0xC0000BBD,
    FUNCTION_NOT_FOUND = 0xC0000BBE,
    CSTATUS_NO_COUNTERNAME = 0xC0000BBF,
    CSTATUS_BAD_COUNTERNAME = 0xC0000BC0,
    INVALID_BUFFER = 0xC0000BC1,
    INSUFFICIENT_BUFFER = 0xC0000BC2,
    CANNOT_CONNECT_MACHINE = 0xC0000BC3,
    INVALID_PATH = 0xC0000BC4,
    INVALID_INSTANCE = 0xC0000BC5,
    INVALID_DATA = 0xC0000BC6,
    NO_DIALOG_DATA = 0xC0000BC7,
    CANNOT_READ_NAME_STRINGS = 0xC0000BC8,
    LOG_FILE_CREATE_ERROR = 0xC0000BC9,
    LOG_FILE_OPEN_ERROR = 0xC0000BCA,
    LOG_TYPE_NOT_FOUND = 0xC0000BCB,
    NO_MORE_DATA = 0xC0000BCC,
    ENTRY_NOT_IN_LOG_FILE = 0xC0000BCD,
    DATA_SOURCE_IS_LOG_FILE = 0xC0000BCE,
    DATA_SOURCE_IS_REAL_TIME = 0xC0000BCF,
    UNABLE_READ_LOG_HEADER = 0xC0000BD0,
    FILE_NOT_FOUND = 0xC0000BD1,
    FILE_ALREADY_EXISTS = 0xC0000BD2,
    NOT_IMPLEMENTED = 0xC0000BD3,
    STRING_NOT_FOUND = 0xC0000BD4,
    UNABLE_MAP_NAME_FILES = 0x80000BD5,
    UNKNOWN_LOG_FORMAT = 0xC0000BD6,
    UNKNOWN_LOGSVC_COMMAND = 0xC0000BD7,
    LOGSVC_QUERY_NOT_FOUND = 0xC0000BD8,
    LOGSVC_NOT_OPENED = 0xC0000BD9,
    WBEM_ERROR = 0xC0000BDA,
    ACCESS_DENIED = 0xC0000BDB,
    LOG_FILE_TOO_SMALL = 0xC0000BDC,
    INVALID_DATASOURCE = 0xC0000BDD,
    INVALID_SQLDB = 0xC0000BDE,
    NO_COUNTERS = 0xC0000BDF,
    SQL_ALLOC_FAILED = 0xC0000BE0,
    SQL_ALLOCCON_FAILED = 0xC0000BE1,
    SQL_EXEC_DIRECT_FAILED = 0xC0000BE2,
    SQL_FETCH_FAILED = 0xC0000BE3,
    SQL_ROWCOUNT_FAILED = 0xC0000BE4,
    SQL_MORE_RESULTS_FAILED = 0xC0000BE5,
    SQL_CONNECT_FAILED = 0xC0000BE6,
    SQL_BIND_FAILED = 0xC0000BE7,
    CANNOT_CONNECT_WMI_SERVER = 0xC0000BE8,
    PLA_COLLECTION_ALREADY_RUNNING = 0xC0000BE9,
    PLA_ERROR_SCHEDULE_OVERLAP = 0xC0000BEA,
    PLA_COLLECTION_NOT_FOUND = 0xC0000BEB,
    PLA_ERROR_SCHEDULE_ELAPSED = 0xC0000BEC,
    PLA_ERROR_NOSTART = 0xC0000BED,
    PLA_ERROR_ALREADY_EXISTS = 0xC0000BEE,
    PLA_ERROR_TYPE_MISMATCH = 0xC0000BEF,
    PLA_ERROR_FILEPATH = 0xC0000BF0,
    PLA_SERVICE_ERROR = 0xC0000BF1,
    PLA_VALIDATION_ERROR = 0xC0000BF2,
    PLA_VALIDATION_WARNING = 0x80000BF3,
    PLA_ERROR_NAME_TOO_LONG = 0xC0000BF4,
    INVALID_SQL_LOG_FORMAT = 0xC0000BF5,
    COUNTER_ALREADY_IN_QUERY = 0xC0000BF6,
    BINARY_LOG_CORRUPT = 0xC0000BF7,
    LOG_SAMPLE_TOO_SMALL = 0xC0000BF8,
    OS_LATER_VERSION = 0xC0000BF9,
    OS_EARLIER_VERSION = 0xC0000BFA,
    INCORRECT_APPEND_TIME = 0xC0000BFB,
    UNMATCHED_APPEND_COUNTER = 0xC0000BFC,
    SQL_ALTER_DETAIL_FAILED = 0xC0000BFD,
    QUERY_PERF_DATA_TIMEOUT = 0xC0000BFE,
}

impl PdhStatus {
    pub const ERROR_SUCCESS: Self = Self(0x0);
    pub const ERROR_INVALID_FUNCTION: Self = Self(0x1);

    #[inline]
    pub const fn is_ok(self) -> bool {
        self.0 == Self::ERROR_SUCCESS.0
    }

    #[inline]
    pub const fn is_err(self) -> bool {
        !self.is_ok()
    }

    /// Whether a counter's `CStatus` says its value can be used.
    #[inline]
    pub const fn is_valid_data(self) -> bool {
        self.0 == Self::CSTATUS_VALID_DATA.0 || self.0 == Self::CSTATUS_NEW_DATA.0
    }

    /// Fails with [`Error::Pdh`] unless the call succeeded.
    pub fn check(self, call: &'static str) -> Result<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(Error::Pdh { call, status: self })
        }
    }

    /// Fails with [`Error::UnexpectedStatus`] unless the call returned `expected`.
    /// Used for the buffer size queries, which must answer `PDH_MORE_DATA`.
    pub fn expect(self, call: &'static str, expected: PdhStatus) -> Result<()> {
        if self == expected {
            Ok(())
        } else {
            Err(Error::UnexpectedStatus {
                call,
                status: self,
                expected,
            })
        }
    }
}

impl From<u32> for PdhStatus {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for PdhStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} (0x{:08X})", name, self.0),
            None => write!(f, "unknown status (0x{:08X})", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_known_codes() {
        assert_eq!(PdhStatus(0x800007D2).name(), Some("PDH_MORE_DATA"));
        assert_eq!(
            PdhStatus(0xC0000BC0).name(),
            Some("PDH_CSTATUS_BAD_COUNTERNAME")
        );
        assert_eq!(PdhStatus(0).name(), Some("PDH_CSTATUS_VALID_DATA"));
        assert_eq!(
            PdhStatus::QUERY_PERF_DATA_TIMEOUT.name(),
            Some("PDH_QUERY_PERF_DATA_TIMEOUT")
        );
    }

    #[test]
    fn unknown_code_has_no_name() {
        assert_eq!(PdhStatus(0xDEADBEEF).name(), None);
        assert_eq!(
            PdhStatus(0xDEADBEEF).to_string(),
            "unknown status (0xDEADBEEF)"
        );
    }

    #[test]
    fn display_includes_name_and_hex() {
        assert_eq!(
            PdhStatus::MORE_DATA.to_string(),
            "PDH_MORE_DATA (0x800007D2)"
        );
        assert_eq!(
            PdhStatus::CSTATUS_NO_COUNTER.to_string(),
            "PDH_CSTATUS_NO_COUNTER (0xC0000BB9)"
        );
    }

    #[test]
    fn check_passes_success_only() {
        assert!(PdhStatus::ERROR_SUCCESS.check("PdhCollectQueryData").is_ok());

        let err = PdhStatus::INVALID_HANDLE
            .check("PdhCollectQueryData")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "PdhCollectQueryData returned PDH_INVALID_HANDLE (0xC0000BBC)"
        );
    }

    #[test]
    fn expect_requires_exact_status() {
        assert!(
            PdhStatus::MORE_DATA
                .expect("First GetCounterInfo", PdhStatus::MORE_DATA)
                .is_ok()
        );

        // Success is still a failure for a buffer size query.
        let err = PdhStatus::ERROR_SUCCESS
            .expect("First GetCounterInfo", PdhStatus::MORE_DATA)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedStatus {
                status: PdhStatus::ERROR_SUCCESS,
                expected: PdhStatus::MORE_DATA,
                ..
            }
        ));
    }

    #[test]
    fn valid_data_accepts_new_data() {
        assert!(PdhStatus::CSTATUS_VALID_DATA.is_valid_data());
        assert!(PdhStatus::CSTATUS_NEW_DATA.is_valid_data());
        assert!(!PdhStatus::CSTATUS_INVALID_DATA.is_valid_data());
        assert!(!PdhStatus::CSTATUS_NO_INSTANCE.is_valid_data());
    }
}
