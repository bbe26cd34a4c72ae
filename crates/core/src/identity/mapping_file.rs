//! Semicolon-separated identity mapping file reader.
//!
//! The mapping file format:
//!
//! ```text
//! mo_uuid;ad_guid
//! 4a3c2b1e-...;7f0e9d8c-...
//! ```
//!
//! Other columns may be present and are ignored.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::IdentityError;

/// One row of the mapping file.
#[derive(Debug, Deserialize)]
struct MappingRow {
    mo_uuid: String,
    ad_guid: String,
}

/// OS2mo person uuid -> directory GUID.
#[derive(Debug, Clone, Default)]
pub struct IdentityMapping {
    entries: HashMap<String, String>,
}

impl IdentityMapping {
    /// Look up the directory GUID for an OS2mo person.
    pub fn get(&self, mo_uuid: &str) -> Option<&str> {
        self.entries.get(mo_uuid).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for IdentityMapping {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Loader for the mapping file.
pub struct MappingFile;

impl MappingFile {
    /// Load the mapping file from disk.
    ///
    /// Rows with an empty `ad_guid` are skipped. When a `mo_uuid` occurs
    /// more than once, the last row wins.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<IdentityMapping, IdentityError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading identity mapping file");

        if !path.exists() {
            return Err(IdentityError::MappingFileError {
                path: path.display().to_string(),
                detail: "file not found".into(),
            });
        }

        let file = std::fs::File::open(path).map_err(|e| IdentityError::MappingFileError {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;

        Self::from_reader(file).map_err(|detail| IdentityError::ParseError {
            path: path.display().to_string(),
            detail,
        })
    }

    fn from_reader<R: std::io::Read>(reader: R) -> Result<IdentityMapping, String> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut entries = HashMap::new();
        for row in csv_reader.deserialize::<MappingRow>() {
            let row = row.map_err(|e| e.to_string())?;
            if row.ad_guid.is_empty() {
                debug!(mo_uuid = %row.mo_uuid, "skipping mapping row without ad_guid");
                continue;
            }
            if let Some(previous) = entries.insert(row.mo_uuid.clone(), row.ad_guid) {
                debug!(mo_uuid = %row.mo_uuid, previous = %previous, "duplicate mapping row overrides earlier one");
            }
        }

        debug!(count = entries.len(), "loaded identity mappings");
        Ok(IdentityMapping { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("mapping.csv");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_mapping_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "mo_uuid;ad_guid\nA;X\nB;Y\n");

        let mapping = MappingFile::load(&path).unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.get("A"), Some("X"));
        assert_eq!(mapping.get("B"), Some("Y"));
        assert_eq!(mapping.get("C"), None);
    }

    #[test]
    fn test_extra_columns_and_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "cpr;mo_uuid;ad_guid;sam_account_name\n0101;  A ; X ;jane\n0202;B;Y;john\n",
        );

        let mapping = MappingFile::load(&path).unwrap();
        assert_eq!(mapping.get("A"), Some("X"));
        assert_eq!(mapping.get("B"), Some("Y"));
    }

    #[test]
    fn test_last_duplicate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "mo_uuid;ad_guid\nA;X\nA;Z\n");

        let mapping = MappingFile::load(&path).unwrap();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.get("A"), Some("Z"));
    }

    #[test]
    fn test_empty_guid_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "mo_uuid;ad_guid\nA;\nB;Y\n");

        let mapping = MappingFile::load(&path).unwrap();
        assert_eq!(mapping.get("A"), None);
        assert_eq!(mapping.get("B"), Some("Y"));
    }

    #[test]
    fn test_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "mo_uuid;guid\nA;X\n");

        let result = MappingFile::load(&path);
        assert!(matches!(result, Err(IdentityError::ParseError { .. })));
    }

    #[test]
    fn test_load_nonexistent() {
        let result = MappingFile::load("/nonexistent/mapping.csv");
        assert!(matches!(
            result,
            Err(IdentityError::MappingFileError { .. })
        ));
    }

    #[test]
    fn test_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "mo_uuid;ad_guid\n");

        let mapping = MappingFile::load(&path).unwrap();
        assert!(mapping.is_empty());
    }
}
