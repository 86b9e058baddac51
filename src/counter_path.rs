use std::fmt;

use crate::error::{Error, Result};

/// The aggregate instance PDH adds to most multi-instance objects. Callers
/// compute totals themselves.
pub const TOTAL_INSTANCE: &str = "_Total";

/// A concrete counter path produced by wildcard expansion, with the instance
/// it refers to.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ExpandedCounter {
    pub path: String,
    pub instance: String,
}

/// Elements of `[\\machine]\object[(parent/instance#index)]\counter`.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct CounterPath {
    pub machine: Option<String>,
    pub object: String,
    pub parent_instance: Option<String>,
    pub instance: Option<String>,
    pub instance_index: Option<u32>,
    pub counter: String,
}

// Byte range of the instance text, parens excluded. Only a '(' inside the
// object segment opens an instance, so counters such as "Lifetime (s)" are
// left alone. The instance closes at the last ")\" so that names like
// "Setup (x86)" survive.
fn instance_span(path: &str) -> Option<(usize, usize)> {
    let object_start = match path.strip_prefix(r"\\") {
        Some(stripped) => 2 + stripped.find('\\')? + 1,
        None if path.starts_with('\\') => 1,
        None => 0,
    };
    let object = &path[object_start..];
    let open = object.find('(')?;
    if object[..open].contains('\\') {
        return None;
    }
    let close = object.rfind(")\\").or_else(|| object.rfind(')'))?;
    if open < close {
        Some((object_start + open + 1, object_start + close))
    } else {
        None
    }
}

/// The raw instance text of `Object(Instance)\Counter`, or `None` when the
/// path has no well-formed instance.
pub fn instance_of(path: &str) -> Option<&str> {
    instance_span(path).map(|(start, end)| &path[start..end])
}

/// Keeps the expanded paths that name a concrete instance. `_Total` and
/// paths without a parseable instance are dropped.
pub fn select_instances<I>(paths: I) -> Vec<ExpandedCounter>
where
    I: IntoIterator<Item = String>,
{
    let mut counters = Vec::new();
    for path in paths {
        let instance = match instance_of(&path) {
            Some(instance) => instance.to_owned(),
            None => {
                log::error!("Unable to parse PDH counter instance from '{}'", path);
                continue;
            }
        };
        if instance == TOTAL_INSTANCE {
            log::debug!("Skipping instance '{}' for path '{}'", TOTAL_INSTANCE, path);
            continue;
        }
        counters.push(ExpandedCounter { path, instance });
    }
    counters
}

impl CounterPath {
    pub fn new(object: &str, counter: &str) -> Self {
        Self {
            object: object.to_owned(),
            counter: counter.to_owned(),
            ..Default::default()
        }
    }

    pub fn with_instance(mut self, instance: &str) -> Self {
        self.instance = Some(instance.to_owned());
        self
    }

    pub fn parse(path: &str) -> Result<Self> {
        let malformed = || Error::MalformedPath(path.to_owned());

        let (machine, rest) = match path.strip_prefix(r"\\") {
            Some(stripped) => {
                let end = stripped.find('\\').ok_or_else(malformed)?;
                (Some(stripped[..end].to_owned()), &stripped[end..])
            }
            None => (None, path),
        };
        let rest = rest.strip_prefix('\\').ok_or_else(malformed)?;

        let mut result = Self {
            machine,
            ..Default::default()
        };
        let counter = match instance_span(rest) {
            Some((start, end)) => {
                result.object = rest[..start - 1].to_owned();
                result.split_instance(&rest[start..end]);
                rest[end + 1..].strip_prefix('\\').ok_or_else(malformed)?
            }
            None => {
                let (object, counter) = rest.split_once('\\').ok_or_else(malformed)?;
                if object.contains(['(', ')']) {
                    return Err(malformed());
                }
                result.object = object.to_owned();
                counter
            }
        };
        if result.object.is_empty() || counter.is_empty() {
            return Err(malformed());
        }
        result.counter = counter.to_owned();
        Ok(result)
    }

    fn split_instance(&mut self, text: &str) {
        let (parent, instance) = match text.split_once('/') {
            Some((parent, instance)) => (Some(parent.to_owned()), instance),
            None => (None, text),
        };
        let (instance, index) = match instance.rsplit_once('#') {
            Some((name, index))
                if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) =>
            {
                (name, index.parse().ok())
            }
            _ => (instance, None),
        };
        self.parent_instance = parent;
        self.instance = Some(instance.to_owned());
        self.instance_index = index;
    }

    pub fn is_wildcard(&self) -> bool {
        self.instance.as_deref().is_some_and(|x| x.contains('*'))
            || self.object.contains('*')
            || self.counter.contains('*')
    }
}

impl fmt::Display for CounterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(machine) = &self.machine {
            write!(f, r"\\{}", machine)?;
        }
        write!(f, r"\{}", self.object)?;
        if let Some(instance) = &self.instance {
            f.write_str("(")?;
            if let Some(parent) = &self.parent_instance {
                write!(f, "{}/", parent)?;
            }
            f.write_str(instance)?;
            if let Some(index) = self.instance_index {
                write!(f, "#{}", index)?;
            }
            f.write_str(")")?;
        }
        write!(f, r"\{}", self.counter)
    }
}
