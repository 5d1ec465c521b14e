//! Built-in key/value provider
//!
//! Persists a named settings bag per workspace:
//!
//! ```xml
//! <settings>
//!   <property name="theme">dark</property>
//!   <property name="tab-width">4</property>
//! </settings>
//! ```

use super::{FragmentProvider, ProviderError};
use crate::fragment::{FragmentReader, FragmentWriter};
use crate::workspace::Workspace;
use std::collections::{BTreeMap, HashMap};

const PROPERTY_ELEMENT: &str = "property";
const NAME_ATTRIBUTE: &str = "name";

/// Ordered string properties
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySet {
    values: BTreeMap<String, String>,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set a property, returning the previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Workspace state slot: one [`PropertySet`] per provider identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    sets: HashMap<String, PropertySet>,
}

impl Properties {
    pub fn get(&self, identifier: &str) -> Option<&PropertySet> {
        self.sets.get(identifier)
    }

    /// Set for `identifier`, created empty if missing
    pub fn entry(&mut self, identifier: &str) -> &mut PropertySet {
        self.sets.entry(identifier.to_string()).or_default()
    }

    pub fn insert(
        &mut self,
        identifier: impl Into<String>,
        set: PropertySet,
    ) -> Option<PropertySet> {
        self.sets.insert(identifier.into(), set)
    }

    pub fn remove(&mut self, identifier: &str) -> Option<PropertySet> {
        self.sets.remove(identifier)
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

/// Generic provider persisting a [`PropertySet`] under its identifier
#[derive(Debug, Clone)]
pub struct PropertiesProvider {
    identifier: String,
}

impl PropertiesProvider {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }

    /// Properties stored for `identifier` in `workspace`
    pub fn get<'w>(workspace: &'w Workspace, identifier: &str) -> Option<&'w PropertySet> {
        workspace.get::<Properties>()?.get(identifier)
    }

    /// Mutable properties for `identifier`, created on first use
    pub fn get_mut<'w>(workspace: &'w mut Workspace, identifier: &str) -> &'w mut PropertySet {
        workspace.get_or_default::<Properties>().entry(identifier)
    }
}

impl FragmentProvider for PropertiesProvider {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn write(&self, out: &mut FragmentWriter, workspace: &Workspace) -> Result<(), ProviderError> {
        let Some(set) = Self::get(workspace, &self.identifier) else {
            return Ok(());
        };
        for (key, value) in set.iter() {
            out.start_element_with(PROPERTY_ELEMENT, &[(NAME_ATTRIBUTE, key)])?;
            out.text(value);
            out.end_element()?;
        }
        Ok(())
    }

    fn read(
        &self,
        input: &mut FragmentReader<'_>,
        workspace: &mut Workspace,
    ) -> Result<(), ProviderError> {
        let mut set = PropertySet::new();
        while let Some(child) = input.next_child()? {
            if !child.is_start_of(PROPERTY_ELEMENT) {
                tracing::debug!(
                    provider = %self.identifier,
                    element = child.element_name().unwrap_or_default(),
                    "ignoring unknown element"
                );
                input.skip_element()?;
                continue;
            }
            let key = match child.attribute(NAME_ATTRIBUTE) {
                Some(key) => key.to_string(),
                None => {
                    return Err(ProviderError::invalid_data(format!(
                        "<{}> without a '{}' attribute",
                        PROPERTY_ELEMENT, NAME_ATTRIBUTE
                    )))
                }
            };
            let value = input.read_text()?;
            set.set(key, value);
        }

        workspace
            .get_or_default::<Properties>()
            .insert(self.identifier.clone(), set);
        Ok(())
    }
}
