//! Descriptor reading
//!
//! The descriptor is the main section of a jar-style manifest: `Name: value`
//! lines, where a line starting with a single space continues the previous
//! value. Attribute names compare case-insensitively.
//!
//! When several descriptors are visible to a loader (a nested container may
//! carry its own), the first one the loader enumerates is used. Loaders do
//! not promise that the outermost descriptor comes first.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::BootConfig;
use crate::error::{NestError, Result};
use crate::loader::ResourceLoader;

/// Parsed descriptor attributes, immutable once read
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContainerMetadata {
    /// Attributes keyed by lower-cased name
    attributes: BTreeMap<String, String>,
}

impl ContainerMetadata {
    /// Parse the main section of a descriptor
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        let mut attributes = BTreeMap::new();
        let mut current: Option<(String, String)> = None;

        for (index, line) in text.lines().enumerate() {
            if line.is_empty() {
                break;
            }

            if let Some(continuation) = line.strip_prefix(' ') {
                match current.as_mut() {
                    Some((_, value)) => value.push_str(continuation),
                    None => {
                        return Err(NestError::DescriptorMalformed {
                            line: index + 1,
                            message: "continuation without a preceding attribute".to_string(),
                        })
                    }
                }
                continue;
            }

            let (name, value) = line.split_once(':').ok_or_else(|| NestError::DescriptorMalformed {
                line: index + 1,
                message: format!("invalid header field '{}'", line),
            })?;

            let name = name.trim();
            if name.is_empty() {
                return Err(NestError::DescriptorMalformed {
                    line: index + 1,
                    message: "empty attribute name".to_string(),
                });
            }

            if let Some((name, value)) = current.take() {
                attributes.insert(name, value);
            }
            let value = value.strip_prefix(' ').unwrap_or(value);
            current = Some((name.to_ascii_lowercase(), value.to_string()));
        }

        if let Some((name, value)) = current {
            attributes.insert(name, value);
        }

        Ok(Self { attributes })
    }

    /// Look up an attribute by name, ignoring case
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Declared entry-point name, if any
    pub fn entry_point(&self, config: &BootConfig) -> Option<&str> {
        self.get(&config.entry_point_key)
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Declared nested containers, in order; empty when the key is absent
    pub fn nested_containers(&self, config: &BootConfig) -> Vec<String> {
        self.get(&config.nested_list_key)
            .map(|list| list.split_whitespace().map(String::from).collect())
            .unwrap_or_default()
    }
}

/// Read the first descriptor visible to `loader`.
///
/// Returns `Ok(None)` when the loader sees no descriptor at all.
pub fn read_metadata(loader: &dyn ResourceLoader, config: &BootConfig) -> Result<Option<ContainerMetadata>> {
    let mut found = loader.fetch_all(&config.descriptor_name)?;
    if found.is_empty() {
        debug!("no {} visible", config.descriptor_name);
        return Ok(None);
    }
    if found.len() > 1 {
        warn!(
            "{} descriptors named {} are visible; using the first one enumerated",
            found.len(),
            config.descriptor_name
        );
    }

    let bytes = found.swap_remove(0);
    let text = String::from_utf8(bytes).map_err(|e| {
        let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
        NestError::DescriptorMalformed {
            line: valid.iter().filter(|b| **b == b'\n').count() + 1,
            message: "descriptor is not valid UTF-8".to_string(),
        }
    })?;
    ContainerMetadata::parse(&text).map(Some)
}
