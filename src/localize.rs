use parking_lot::{Mutex, const_mutex};
use windows::Win32::System::Performance::PDH_HCOUNTER;

use crate::{
    counter_path::{ExpandedCounter, select_instances},
    error::{Error, Result},
    pdh::{PerfQueryHandle, counter_info, expand_wildcard_path, remove_counter},
};

// Process-wide query shared by the helpers below. Opened on first use.
static QUERY: Mutex<Option<PerfQueryHandle>> = const_mutex(None);

fn with_global_query<T>(f: impl FnOnce(&PerfQueryHandle) -> Result<T>) -> Result<T> {
    let mut slot = QUERY.lock();
    let query = match slot.take() {
        Some(query) => query,
        None => {
            log::debug!("Attempting to open PDH query.");
            let query = PerfQueryHandle::open_query().map_err(|error| {
                log::error!("Failed to open PDH query: {}", error);
                Error::OpenQuery(Box::new(error))
            })?;
            log::debug!("Opened PDH query successfully.");
            query
        }
    };
    let result = f(&query);
    *slot = Some(query);
    result
}

/// Resolves an English wildcard path, e.g. `\Processor(*)\% Idle Time`, into
/// the localized concrete path of every instance except `_Total`. The
/// process-wide query is opened if needed.
pub fn localize_and_expand_counter(path: &str) -> Result<Vec<ExpandedCounter>> {
    with_global_query(|query| expand_on_query(query, path))
}

/// Same as [`localize_and_expand_counter`] on a caller-owned query.
pub fn expand_on_query(query: &PerfQueryHandle, path: &str) -> Result<Vec<ExpandedCounter>> {
    // The English counter is only used to look up the localized path.
    let counter = query.add_english_counter(path)?;
    let info = counter_info(counter, false);
    if let Err(error) = remove_counter(counter) {
        log::warn!("Failed to remove lookup counter for '{}': {}", path, error);
    }
    let info = info?;
    log::debug!("Localized '{}' to '{}'", path, info.full_path);

    let paths = expand_wildcard_path(None, &info.full_path)?;
    Ok(select_instances(paths))
}

/// Adds a localized counter to the process-wide query.
pub fn add_counter(path: &str) -> Result<PDH_HCOUNTER> {
    with_global_query(|query| query.add_counter(path))
}

/// Collects every counter added to the process-wide query.
pub fn collect_query_data() -> Result<()> {
    with_global_query(|query| query.collect_query_data())
}

/// Closes the process-wide query. Counter handles obtained from
/// [`add_counter`] become invalid; the next call reopens the query.
pub fn close_query() -> Result<()> {
    match QUERY.lock().take() {
        Some(mut query) => query.close_query(),
        None => Ok(()),
    }
}
