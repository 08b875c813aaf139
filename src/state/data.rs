/// Shared data structures for the session state
///
/// These structs represent the data model that flows between
/// the backend client, the review queue and the UI layer.

use std::fmt;

use super::vin;

/// Stable identifier for a queue entry, assigned at load time.
///
/// Filenames can change (rename) or even repeat after a rename race, so
/// completions and display ordering key on this instead of the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(pub u64);

/// Represents a single photo awaiting (or done with) VIN tagging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub id: RecordId,
    /// Filename only (e.g., "IMG_0001.jpg")
    pub filename: String,
}

impl ImageRecord {
    pub fn new(id: RecordId, filename: impl Into<String>) -> Self {
        Self {
            id,
            filename: filename.into(),
        }
    }

    /// VIN suggested by the filename, if any
    pub fn candidate_vin(&self) -> Option<String> {
        vin::extract_vin(&self.filename)
    }
}

/// File extension including the dot, or empty if none
pub fn file_extension(filename: &str) -> &str {
    filename.rfind('.').map(|i| &filename[i..]).unwrap_or("")
}

/// Rendering parameter passed through to the image endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DisplayMode {
    #[default]
    Original,
    Inverted,
}

impl DisplayMode {
    pub const ALL: [DisplayMode; 2] = [DisplayMode::Original, DisplayMode::Inverted];

    /// Value of the `mode` query parameter
    pub fn as_param(self) -> &'static str {
        match self {
            DisplayMode::Original => "original",
            DisplayMode::Inverted => "inverted",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayMode::Original => write!(f, "Original"),
            DisplayMode::Inverted => write!(f, "Inverted"),
        }
    }
}
