use serde::{Deserialize, Serialize};

/// An opaque serialization of a runtime's execution state.
///
/// The engine never looks inside: it only stores snapshots, hands them back
/// to the runtime that produced them, and compares them byte-for-byte to
/// detect revisited states. Runtimes must therefore serialize canonically:
/// two identical execution states produce identical blobs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateSnapshot(String);

impl StateSnapshot {
    /// Wrap a serialized state blob.
    pub fn new(blob: impl Into<String>) -> Self {
        Self(blob.into())
    }

    /// The raw blob, for the runtime that produced it to decode.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
