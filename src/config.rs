//! Bootstrap configuration
//!
//! Names the descriptor resource and the attribute keys the sequencer reads.
//! The defaults match the layout produced by the usual packaging tools.

/// Resource name of the descriptor inside a container
pub const DESCRIPTOR_NAME: &str = "META-INF/MANIFEST.MF";

/// Attribute holding the entry-point name
pub const ENTRY_POINT_KEY: &str = "app-main-class";

/// Attribute holding the space-separated nested container list
pub const NESTED_LIST_KEY: &str = "inside-jars";

/// Settings used by the bootstrap sequencer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootConfig {
    /// Descriptor resource to look up on the host's search path
    pub descriptor_name: String,
    /// Attribute naming the entry point
    pub entry_point_key: String,
    /// Attribute listing nested containers
    pub nested_list_key: String,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            descriptor_name: DESCRIPTOR_NAME.to_string(),
            entry_point_key: ENTRY_POINT_KEY.to_string(),
            nested_list_key: NESTED_LIST_KEY.to_string(),
        }
    }
}
