use windows::Win32::System::Performance::PDH_HCOUNTER;

use crate::{
    error::Result,
    format::{CounterValue, FormatFlags, ValueKind},
    localize::expand_on_query,
    pdh::{PerfQueryHandle, formatted_value_double, formatted_value_large, formatted_value_long},
    status::PdhStatus,
};

#[derive(Copy, Clone, PartialEq, Debug)]
pub enum SampleValue {
    Double(f64),
    Large(i64),
    Long(i32),
    /// The counter had no usable data for this collection.
    Invalid(PdhStatus),
}

impl SampleValue {
    fn from_counter<T>(value: CounterValue<T>, wrap: fn(T) -> SampleValue) -> Self {
        if value.status.is_valid_data() {
            wrap(value.value)
        } else {
            SampleValue::Invalid(value.status)
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            SampleValue::Double(value) => Some(value),
            SampleValue::Large(value) => Some(value as f64),
            SampleValue::Long(value) => Some(value as f64),
            SampleValue::Invalid(_) => None,
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Sample {
    pub instance: String,
    pub path: String,
    pub value: SampleValue,
}

struct TrackedCounter {
    instance: String,
    path: String,
    handle: PDH_HCOUNTER,
}

/// Tracks every concrete instance of a wildcard counter on its own query.
pub struct PerfTracker {
    query_handle: PerfQueryHandle,
    counters: Vec<TrackedCounter>,
}

impl PerfTracker {
    pub fn new(counter_path: &str) -> Result<Self> {
        log::debug!("Search path: {}", counter_path);

        let query_handle = PerfQueryHandle::open_query()?;
        let mut counters = Vec::new();
        for expanded in expand_on_query(&query_handle, counter_path)? {
            let handle = query_handle.add_counter(&expanded.path)?;
            counters.push(TrackedCounter {
                instance: expanded.instance,
                path: expanded.path,
                handle,
            });
        }
        log::debug!("Tracking {} instances of '{}'", counters.len(), counter_path);

        Ok(Self {
            query_handle,
            counters,
        })
    }

    pub fn instance_count(&self) -> usize {
        self.counters.len()
    }

    /// Takes the baseline collection rate counters are computed against.
    pub fn start(&self) -> Result<()> {
        self.query_handle.collect_query_data()
    }

    pub fn sample(&self, kind: ValueKind) -> Result<Vec<Sample>> {
        self.query_handle.collect_query_data()?;

        let mut samples = Vec::with_capacity(self.counters.len());
        for counter in &self.counters {
            let value = match read_value(counter.handle, kind) {
                Ok(value) => value,
                // Instances can disappear between collections.
                Err(error) => match error.status() {
                    Some(status) => {
                        log::debug!("No value for '{}': {}", counter.path, error);
                        SampleValue::Invalid(status)
                    }
                    None => return Err(error),
                },
            };
            samples.push(Sample {
                instance: counter.instance.clone(),
                path: counter.path.clone(),
                value,
            });
        }
        Ok(samples)
    }

    /// Sum of every valid instance, read as doubles.
    pub fn total(&self) -> Result<f64> {
        let samples = self.sample(ValueKind::Double)?;
        Ok(samples.iter().filter_map(|x| x.value.as_f64()).sum())
    }

    pub fn close(mut self) -> Result<()> {
        self.query_handle.close_query()
    }
}

fn read_value(counter: PDH_HCOUNTER, kind: ValueKind) -> Result<SampleValue> {
    let flags = FormatFlags::NONE;
    let value = match kind {
        ValueKind::Double => {
            SampleValue::from_counter(formatted_value_double(counter, flags)?.1, SampleValue::Double)
        }
        ValueKind::Large => {
            SampleValue::from_counter(formatted_value_large(counter, flags)?.1, SampleValue::Large)
        }
        ValueKind::Long => {
            SampleValue::from_counter(formatted_value_long(counter, flags)?.1, SampleValue::Long)
        }
    };
    Ok(value)
}
