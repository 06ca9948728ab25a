use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{Error, Result};

/// Named collection of shared implementations (candle storages, order
/// storages). Passed explicitly to whoever needs to resolve names.
pub struct Registry<T: ?Sized> {
    kind: &'static str,
    entries: BTreeMap<String, Arc<T>>,
}

impl<T: ?Sized> Registry<T> {
    /// `kind` names the registered things in error messages.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, entry: Arc<T>) {
        self.entries.insert(name.into(), entry);
    }

    pub fn get(&self, name: &str) -> Result<Arc<T>> {
        self.entries.get(name).cloned().ok_or_else(|| {
            Error::Config(format!(
                "{} '{name}' not found, available: [{}]",
                self.kind,
                self.names().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        let mut registry: Registry<str> = Registry::new("candle storage");
        registry.register("memory", Arc::from("in-memory"));

        assert_eq!(&*registry.get("memory").unwrap(), "in-memory");
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["memory"]);
    }

    #[test]
    fn unknown_name_is_a_configuration_error() {
        let registry: Registry<str> = Registry::new("order storage");
        let err = registry.get("influx_db").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("order storage 'influx_db'"));
    }
}
