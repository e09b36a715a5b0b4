//! Boundary to the record-level asset database.
//!
//! Parsing Unity's serialized-object format is left to an external
//! collaborator. The pipeline and the mutations only talk to it through
//! [`RecordEditor`], whose handles are opaque associated types.

#[cfg(feature = "process-editor")]
mod process;

#[cfg(feature = "process-editor")]
pub use process::{ProcessEditor, RemoteFields, RemoteRecord, RemoteReplacer};

use std::fmt;
use std::path::{Path, PathBuf};

use crate::Result;
use crate::format::detect::Classification;

/// How the editor should open a record file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// A bare serialized file such as `globalgamemanagers`.
    Asset,
    /// An asset bundle whose first serialized file holds the records.
    Bundle,
}

impl RecordKind {
    /// Maps a classification to the kind the editor expects.
    ///
    /// Returns `None` for classifications that are not record files.
    pub fn from_classification(classification: Classification) -> Option<Self> {
        match classification {
            Classification::RawAsset => Some(Self::Asset),
            Classification::RawBundle => Some(Self::Bundle),
            _ => None,
        }
    }

    /// Returns the wire name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Bundle => "bundle",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Record classes the mutations touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordClass {
    /// Build-level flags such as `hasPROVersion`.
    BuildSettings,
    /// Player-level settings including the splash screen.
    PlayerSettings,
}

impl RecordClass {
    /// Returns the Unity class name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BuildSettings => "BuildSettings",
            Self::PlayerSettings => "PlayerSettings",
        }
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One element of an array field, as seen through the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayElement {
    /// Position in the array.
    pub index: usize,
    /// Display name of whatever the element refers to, if the editor could
    /// resolve one (for splash logos, the referenced sprite's name).
    pub name: Option<String>,
}

impl ArrayElement {
    /// Returns true if the element name contains `pattern`, ignoring case.
    pub fn name_contains(&self, pattern: &str) -> bool {
        let pattern = pattern.to_lowercase();
        self.name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(&pattern))
    }
}

/// Record-level editing operations the core depends on.
///
/// A session is `open`, any number of reads/writes/commits, an optional
/// `write_changes`, then `close`. Implementations must tolerate `close`
/// being called after a failure at any point.
pub trait RecordEditor {
    /// Handle to a located record.
    type Record;
    /// Handle to a record's mutable field tree.
    type Fields;
    /// Token describing a committed change, consumed by `write_changes`.
    type Replacer;

    /// Opens the record file at `source`.
    fn open(&mut self, source: &Path, kind: RecordKind) -> Result<()>;

    /// Finds the first record of `class`.
    ///
    /// Fails with [`Error::MutationUnsupported`](crate::Error::MutationUnsupported)
    /// if the record is missing or cannot be parsed.
    fn locate(&mut self, class: RecordClass) -> Result<Self::Record>;

    /// Reads the field tree of `record`.
    fn base_fields(&mut self, record: &Self::Record) -> Result<Self::Fields>;

    /// Reads a boolean field.
    fn read_bool(&mut self, fields: &Self::Fields, name: &str) -> Result<bool>;

    /// Sets a boolean field.
    fn write_bool(&mut self, fields: &mut Self::Fields, name: &str, value: bool) -> Result<()>;

    /// Lists the elements of an array field.
    fn array_elements(&mut self, fields: &Self::Fields, name: &str) -> Result<Vec<ArrayElement>>;

    /// Removes the element at `index` from an array field.
    fn remove_array_element(
        &mut self,
        fields: &mut Self::Fields,
        name: &str,
        index: usize,
    ) -> Result<()>;

    /// Serializes `fields` back into `record` and returns the change token.
    fn commit(&mut self, record: &Self::Record, fields: Self::Fields) -> Result<Self::Replacer>;

    /// Writes the opened file with `replacers` applied to `dest`.
    fn write_changes(&mut self, dest: &Path, replacers: Vec<Self::Replacer>) -> Result<()>;

    /// Releases the opened file.
    fn close(&mut self);

    /// Files or directories the editor created on the side since the last
    /// call. The editor forgets them once they are handed out.
    fn take_scratch_paths(&mut self) -> Vec<PathBuf> {
        Vec::new()
    }
}
