use std::mem::size_of;

use windows::{
    Win32::System::Performance::{
        PDH_COUNTER_INFO_W, PDH_FMT, PDH_FMT_COUNTERVALUE, PDH_FMT_COUNTERVALUE_ITEM_W,
        PDH_HCOUNTER, PDH_HQUERY, PdhAddCounterW, PdhAddEnglishCounterW, PdhCloseQuery,
        PdhCollectQueryData, PdhExpandWildCardPathW, PdhGetCounterInfoW,
        PdhGetFormattedCounterArrayW, PdhGetFormattedCounterValue, PdhOpenQueryW,
        PdhRemoveCounter, PdhValidatePathW,
    },
    core::{PCWSTR, PWSTR},
};

use crate::{
    error::{Error, Result},
    format::{CounterItem, CounterValue, FormatFlags},
    multi_sz::{parse_multi_sz, to_wide},
    status::PdhStatus,
};

/// How many times a fetch that answers `PDH_MORE_DATA` is retried with a
/// larger buffer. Instances can appear between the size query and the fetch.
pub const EXPAND_RETRIES: usize = 4;

fn wide_or_null(wide: &Option<Vec<u16>>) -> PCWSTR {
    match wide {
        Some(wide) => PCWSTR(wide.as_ptr()),
        None => PCWSTR::null(),
    }
}

unsafe fn read_pwstr(s: PWSTR) -> Result<Option<String>> {
    if s.is_null() {
        Ok(None)
    } else {
        Ok(Some(unsafe { s.to_string() }?))
    }
}

/// Creates a query. `None` collects from the real-time data source, `Some`
/// names a log file.
pub fn open_query(data_source: Option<&str>, user_data: usize) -> Result<PDH_HQUERY> {
    let data_source = data_source.map(to_wide);
    let mut query = PDH_HQUERY::default();
    unsafe {
        PdhStatus(PdhOpenQueryW(
            wide_or_null(&data_source),
            user_data,
            &mut query,
        ))
        .check("PdhOpenQueryW")?;
    }
    Ok(query)
}

/// Closes every counter in the query and frees the query itself.
pub fn close_query(query: PDH_HQUERY) -> Result<()> {
    unsafe { PdhStatus(PdhCloseQuery(query)).check("PdhCloseQuery") }
}

/// Adds a counter by its localized path, e.g. `\Processor(_Total)\% Idle Time`
/// on an English system.
pub fn add_counter(query: PDH_HQUERY, path: &str, user_data: usize) -> Result<PDH_HCOUNTER> {
    let path_w = to_wide(path);
    let mut counter = PDH_HCOUNTER::default();
    let status = PdhStatus(unsafe {
        PdhAddCounterW(query, PCWSTR(path_w.as_ptr()), user_data, &mut counter)
    });
    log::trace!("PdhAddCounterW('{}') -> {}", path, status);
    status.check("PdhAddCounterW")?;
    Ok(counter)
}

/// Adds a counter by its language-neutral (English) path. Works regardless of
/// the display language of the machine.
pub fn add_english_counter(
    query: PDH_HQUERY,
    path: &str,
    user_data: usize,
) -> Result<PDH_HCOUNTER> {
    let path_w = to_wide(path);
    let mut counter = PDH_HCOUNTER::default();
    let status = PdhStatus(unsafe {
        PdhAddEnglishCounterW(query, PCWSTR(path_w.as_ptr()), user_data, &mut counter)
    });
    log::trace!("PdhAddEnglishCounterW('{}') -> {}", path, status);
    status.check("PdhAddEnglishCounterW")?;
    Ok(counter)
}

pub fn remove_counter(counter: PDH_HCOUNTER) -> Result<()> {
    unsafe { PdhStatus(PdhRemoveCounter(counter)).check("PdhRemoveCounter") }
}

/// Collects the current raw value of every counter in the query. Rate
/// counters need two collections before they format as valid data.
pub fn collect_query_data(query: PDH_HQUERY) -> Result<()> {
    unsafe { PdhStatus(PdhCollectQueryData(query)).check("PdhCollectQueryData") }
}

/// Returns `PDH_CSTATUS_BAD_COUNTERNAME` (as an error) and friends when the
/// path does not name an existing counter.
pub fn validate_path(path: &str) -> Result<()> {
    let path_w = to_wide(path);
    let status = PdhStatus(unsafe { PdhValidatePathW(PCWSTR(path_w.as_ptr())) });
    log::trace!("PdhValidatePathW('{}') -> {}", path, status);
    status.check("PdhValidatePathW")
}

#[derive(Clone, Debug)]
pub struct CounterInfo {
    pub counter_type: u32,
    pub version: u32,
    pub status: PdhStatus,
    pub scale: i32,
    pub default_scale: i32,
    pub user_data: usize,
    pub query_user_data: usize,
    pub full_path: String,
    pub machine_name: Option<String>,
    pub object_name: Option<String>,
    pub instance_name: Option<String>,
    pub parent_instance: Option<String>,
    pub instance_index: u32,
    pub counter_name: Option<String>,
    pub explain_text: Option<String>,
}

impl CounterInfo {
    unsafe fn from_native(info: &PDH_COUNTER_INFO_W) -> Result<Self> {
        unsafe {
            let elements = &info.Anonymous.CounterPath;
            Ok(Self {
                counter_type: info.dwType,
                version: info.CVersion,
                status: PdhStatus(info.CStatus),
                scale: info.lScale,
                default_scale: info.lDefaultScale,
                user_data: info.dwUserData,
                query_user_data: info.dwQueryUserData,
                full_path: read_pwstr(info.szFullPath)?.unwrap_or_default(),
                machine_name: read_pwstr(elements.szMachineName)?,
                object_name: read_pwstr(elements.szObjectName)?,
                instance_name: read_pwstr(elements.szInstanceName)?,
                parent_instance: read_pwstr(elements.szParentInstance)?,
                instance_index: elements.dwInstanceIndex,
                counter_name: read_pwstr(elements.szCounterName)?,
                explain_text: read_pwstr(info.szExplainText)?,
            })
        }
    }
}

/// Reads a counter's description. The first call only asks for the buffer
/// size and must answer `PDH_MORE_DATA`.
pub fn counter_info(counter: PDH_HCOUNTER, retrieve_explain_text: bool) -> Result<CounterInfo> {
    let mut buffer_size = 0;
    let status = PdhStatus(unsafe {
        PdhGetCounterInfoW(
            counter,
            retrieve_explain_text.into(),
            &mut buffer_size,
            None,
        )
    });
    log::trace!(
        "PdhGetCounterInfoW(size query) -> {}, required={}",
        status,
        buffer_size
    );
    status.expect("First PdhGetCounterInfoW", PdhStatus::MORE_DATA)?;

    // u64 storage keeps the header aligned for its pointer fields.
    let mut buffer = vec![0u64; (buffer_size as usize).div_ceil(size_of::<u64>())];
    unsafe {
        PdhStatus(PdhGetCounterInfoW(
            counter,
            retrieve_explain_text.into(),
            &mut buffer_size,
            Some(buffer.as_mut_ptr() as *mut PDH_COUNTER_INFO_W),
        ))
        .check("Second PdhGetCounterInfoW")?;
        let header = &*(buffer.as_ptr() as *const PDH_COUNTER_INFO_W);
        CounterInfo::from_native(header)
    }
}

/// Resolves a counter path containing wildcards into every concrete path it
/// matches on the data source (`None` is the local machine).
pub fn expand_wildcard_path(data_source: Option<&str>, path: &str) -> Result<Vec<String>> {
    let data_source_w = data_source.map(to_wide);
    let data_source = wide_or_null(&data_source_w);
    let path_w = to_wide(path);

    let mut length = 0;
    let status = PdhStatus(unsafe {
        PdhExpandWildCardPathW(data_source, PCWSTR(path_w.as_ptr()), None, &mut length, 0)
    });
    log::trace!(
        "PdhExpandWildCardPathW(size query) for '{}' -> {}, required={}",
        path,
        status,
        length
    );
    status.expect("First PdhExpandWildCardPathW", PdhStatus::MORE_DATA)?;
    if length < 1 {
        return Err(Error::EmptyPathList {
            call: "PdhExpandWildCardPathW",
        });
    }

    let mut attempts = 0;
    loop {
        let capacity = length;
        let mut buffer = vec![0u16; capacity as usize];
        let status = PdhStatus(unsafe {
            PdhExpandWildCardPathW(
                data_source,
                PCWSTR(path_w.as_ptr()),
                Some(PWSTR(buffer.as_mut_ptr())),
                &mut length,
                0,
            )
        });
        log::trace!(
            "PdhExpandWildCardPathW(get data) for '{}' -> {}, length={}",
            path,
            status,
            length
        );
        if status == PdhStatus::MORE_DATA && attempts < EXPAND_RETRIES {
            attempts += 1;
            // The reported size is unreliable after a short buffer.
            length = length.max(capacity.saturating_mul(2));
            continue;
        }
        status.check("Second PdhExpandWildCardPathW")?;

        buffer.truncate(length as usize);
        let paths = parse_multi_sz(&buffer)?;
        log::debug!("Expanded '{}' to {} paths", path, paths.len());
        return Ok(paths);
    }
}

/// A value type `PdhGetFormattedCounterValue` can produce, and the union
/// member it lands in.
pub trait FormattedKind: Copy {
    const FLAG: FormatFlags;

    /// # Safety
    /// `value` must have been formatted with `Self::FLAG`.
    unsafe fn read(value: &PDH_FMT_COUNTERVALUE) -> Self;
}

impl FormattedKind for f64 {
    const FLAG: FormatFlags = FormatFlags::DOUBLE;

    unsafe fn read(value: &PDH_FMT_COUNTERVALUE) -> Self {
        unsafe { value.Anonymous.doubleValue }
    }
}

impl FormattedKind for i64 {
    const FLAG: FormatFlags = FormatFlags::LARGE;

    unsafe fn read(value: &PDH_FMT_COUNTERVALUE) -> Self {
        unsafe { value.Anonymous.largeValue }
    }
}

impl FormattedKind for i32 {
    const FLAG: FormatFlags = FormatFlags::LONG;

    unsafe fn read(value: &PDH_FMT_COUNTERVALUE) -> Self {
        unsafe { value.Anonymous.longValue }
    }
}

fn native_format<T: FormattedKind>(flags: FormatFlags) -> PDH_FMT {
    PDH_FMT((flags | T::FLAG).bits())
}

/// Formats a counter's current value. Returns the counter type alongside the
/// value. `flags` may add modifiers such as [`FormatFlags::NOCAP100`].
pub fn formatted_value<T: FormattedKind>(
    counter: PDH_HCOUNTER,
    flags: FormatFlags,
) -> Result<(u32, CounterValue<T>)> {
    let mut counter_type = 0;
    let mut value = PDH_FMT_COUNTERVALUE::default();
    unsafe {
        PdhStatus(PdhGetFormattedCounterValue(
            counter,
            native_format::<T>(flags),
            Some(&mut counter_type),
            &mut value,
        ))
        .check("PdhGetFormattedCounterValue")?;
        Ok((
            counter_type,
            CounterValue {
                status: PdhStatus(value.CStatus),
                value: T::read(&value),
            },
        ))
    }
}

pub fn formatted_value_double(
    counter: PDH_HCOUNTER,
    flags: FormatFlags,
) -> Result<(u32, CounterValue<f64>)> {
    formatted_value(counter, flags)
}

pub fn formatted_value_large(
    counter: PDH_HCOUNTER,
    flags: FormatFlags,
) -> Result<(u32, CounterValue<i64>)> {
    formatted_value(counter, flags)
}

pub fn formatted_value_long(
    counter: PDH_HCOUNTER,
    flags: FormatFlags,
) -> Result<(u32, CounterValue<i32>)> {
    formatted_value(counter, flags)
}

/// Formats every instance of a wildcard counter in one call.
pub fn formatted_array<T: FormattedKind>(
    counter: PDH_HCOUNTER,
    flags: FormatFlags,
) -> Result<Vec<CounterItem<T>>> {
    let format = native_format::<T>(flags);
    let mut buffer_size = 0;
    let mut item_count = 0;
    let status = PdhStatus(unsafe {
        PdhGetFormattedCounterArrayW(counter, format, &mut buffer_size, &mut item_count, None)
    });
    log::trace!(
        "PdhGetFormattedCounterArrayW(size query) -> {}, bytes={}, items={}",
        status,
        buffer_size,
        item_count
    );
    if status.is_ok() {
        return Ok(Vec::new());
    }
    status.expect("First PdhGetFormattedCounterArrayW", PdhStatus::MORE_DATA)?;

    let item_size = size_of::<PDH_FMT_COUNTERVALUE_ITEM_W>();
    let mut attempts = 0;
    loop {
        // Item names are stored in the same buffer, after the items.
        let mut buffer =
            vec![PDH_FMT_COUNTERVALUE_ITEM_W::default(); (buffer_size as usize).div_ceil(item_size)];
        buffer_size = (buffer.len() * item_size) as u32;
        let status = PdhStatus(unsafe {
            PdhGetFormattedCounterArrayW(
                counter,
                format,
                &mut buffer_size,
                &mut item_count,
                Some(buffer.as_mut_ptr()),
            )
        });
        if status == PdhStatus::MORE_DATA && attempts < EXPAND_RETRIES {
            attempts += 1;
            continue;
        }
        status.check("Second PdhGetFormattedCounterArrayW")?;

        let mut items = Vec::with_capacity(item_count as usize);
        for item in buffer.iter().take(item_count as usize) {
            unsafe {
                items.push(CounterItem {
                    name: read_pwstr(item.szName)?.unwrap_or_default(),
                    value: CounterValue {
                        status: PdhStatus(item.FmtValue.CStatus),
                        value: T::read(&item.FmtValue),
                    },
                });
            }
        }
        return Ok(items);
    }
}

pub fn formatted_array_double(
    counter: PDH_HCOUNTER,
    flags: FormatFlags,
) -> Result<Vec<CounterItem<f64>>> {
    formatted_array(counter, flags)
}

pub fn formatted_array_large(
    counter: PDH_HCOUNTER,
    flags: FormatFlags,
) -> Result<Vec<CounterItem<i64>>> {
    formatted_array(counter, flags)
}

pub fn formatted_array_long(
    counter: PDH_HCOUNTER,
    flags: FormatFlags,
) -> Result<Vec<CounterItem<i32>>> {
    formatted_array(counter, flags)
}

/// Owns a real-time query and closes it on drop.
pub struct PerfQueryHandle(Option<PDH_HQUERY>);

// SAFETY: PDH query handles are not tied to the thread that opened them, and
//         every use of the global query is serialized by its mutex.
unsafe impl Send for PerfQueryHandle {}

impl PerfQueryHandle {
    pub fn open_query() -> Result<Self> {
        let query = open_query(None, 0)?;
        Ok(Self(Some(query)))
    }

    pub fn handle(&self) -> PDH_HQUERY {
        self.0.unwrap_or_default()
    }

    pub fn is_open(&self) -> bool {
        self.0.is_some()
    }

    pub fn add_english_counter(&self, path: &str) -> Result<PDH_HCOUNTER> {
        add_english_counter(self.handle(), path, 0)
    }

    pub fn add_counter(&self, path: &str) -> Result<PDH_HCOUNTER> {
        add_counter(self.handle(), path, 0)
    }

    pub fn collect_query_data(&self) -> Result<()> {
        collect_query_data(self.handle())
    }

    pub fn close_query(&mut self) -> Result<()> {
        if let Some(query) = self.0.take() {
            close_query(query)?;
        }
        Ok(())
    }
}

impl Drop for PerfQueryHandle {
    fn drop(&mut self) {
        if let Err(error) = self.close_query() {
            log::warn!("Failed to close PDH query: {}", error);
        }
    }
}
