//! Addon registry for lookup and ordered iteration.
//!
//! The registry owns every [`AddonRecord`] of one load cycle. Membership is
//! fixed once loaded; resolution only flips `enabled` flags, so consumers must
//! always filter on them. Lookups by name deliberately ignore disabled addons.

use std::collections::HashMap;

use super::record::AddonRecord;

/// Ordered collection of addon records, unique by name.
#[derive(Debug, Clone, Default)]
pub struct AddonRegistry {
    addons: Vec<AddonRecord>,
}

impl AddonRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from records, sorted by priority.
    pub fn from_records(records: impl IntoIterator<Item = AddonRecord>) -> Self {
        let mut registry = Self::new();
        registry.load(records);
        registry.sort_by_priority();
        registry
    }

    /// Replace the registry contents with `records`.
    ///
    /// Prior contents are dropped first. When two records share a name the
    /// later one wins and takes over the earlier record's position.
    pub fn load(&mut self, records: impl IntoIterator<Item = AddonRecord>) {
        self.addons.clear();
        let mut index: HashMap<String, usize> = HashMap::new();

        for record in records {
            if let Some(&slot) = index.get(&record.name) {
                tracing::warn!(
                    addon = %record.name,
                    "Duplicate addon name, later descriptor replaces earlier one"
                );
                self.addons[slot] = record;
                continue;
            }

            tracing::debug!(
                addon = %record.name,
                enabled = record.enabled,
                "Registered addon"
            );
            index.insert(record.name.clone(), self.addons.len());
            self.addons.push(record);
        }
    }

    /// Order records by ascending priority.
    ///
    /// The sort is stable: equal priorities keep discovery order.
    pub fn sort_by_priority(&mut self) {
        self.addons.sort_by_key(|addon| addon.priority);
    }

    /// First enabled addon named `name`, in registry order.
    pub fn find_by_name(&self, name: &str) -> Option<&AddonRecord> {
        self.addons
            .iter()
            .find(|addon| addon.enabled && addon.name == name)
    }

    /// Whether `name` is present and currently enabled.
    ///
    /// This is the only test used for dependency satisfaction.
    pub fn is_available(&self, name: &str) -> bool {
        self.find_by_name(name).is_some()
    }

    /// Look up a record regardless of its enabled flag.
    pub fn get(&self, name: &str) -> Option<&AddonRecord> {
        self.addons.iter().find(|addon| addon.name == name)
    }

    /// Mutable lookup regardless of the enabled flag.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut AddonRecord> {
        self.addons.iter_mut().find(|addon| addon.name == name)
    }

    /// Mark `name` disabled. Returns `true` if it was enabled before.
    pub fn disable(&mut self, name: &str) -> bool {
        match self.get_mut(name) {
            Some(addon) if addon.enabled => {
                addon.enabled = false;
                true
            }
            _ => false,
        }
    }

    /// All records in registry order.
    pub fn iter(&self) -> std::slice::Iter<'_, AddonRecord> {
        self.addons.iter()
    }

    /// Enabled records in registry order.
    pub fn enabled(&self) -> impl Iterator<Item = &AddonRecord> {
        self.addons.iter().filter(|addon| addon.enabled)
    }

    pub fn len(&self) -> usize {
        self.addons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addons.is_empty()
    }

    /// Names of all records in registry order.
    pub fn names(&self) -> Vec<&str> {
        self.addons.iter().map(|addon| addon.name.as_str()).collect()
    }

    pub(crate) fn records(&self) -> &[AddonRecord] {
        &self.addons
    }

    pub(crate) fn records_mut(&mut self) -> &mut [AddonRecord] {
        &mut self.addons
    }
}

impl<'a> IntoIterator for &'a AddonRegistry {
    type Item = &'a AddonRecord;
    type IntoIter = std::slice::Iter<'a, AddonRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
