//! Batch download selections stored as TOML.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Selection {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    ids_to_download: Vec<String>,
    #[serde(default)]
    files: Vec<FileChoice>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct FileChoice {
    /// File label, e.g. `B4.TIF`.
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub download: bool,
}

impl Selection {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let selection: Self = toml::from_str(&content)?;
        Ok(selection)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn from_template(table: &toml::Table) -> Result<Self> {
        let selection: Self = toml::from_str(&table.to_string())?;
        Ok(selection)
    }

    /// Product IDs in first-seen order, without duplicates.
    pub fn ids_to_download(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.ids_to_download
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect()
    }

    /// Labels flagged for download. Empty means every available file.
    pub fn files_to_download(&self) -> Vec<String> {
        self.files
            .iter()
            .filter(|f| f.download)
            .map(|f| f.id.clone())
            .collect()
    }
}

/// Starting point for a selection file.
pub fn template() -> toml::Table {
    toml::toml! {
        name = "Landsat 8 true colour"

        description = "Visible bands and metadata of a few Landsat 8 acquisitions."

        ids_to_download = [
            "LC08_L1TP_193027_20200712_20200722_01_T1",
            "LC08_L1TP_193027_20200712_20200722_01_T1",
            "LC08_L1GT_044034_20130330_20170310_01_T2",
        ]

        [[files]]
        id = "B2.TIF"
        name = "Blue"
        download = true

        [[files]]
        id = "B3.TIF"
        name = "Green"
        download = true

        [[files]]
        id = "B4.TIF"
        name = "Red"
        download = true

        [[files]]
        id = "B5.TIF"
        name = "Near Infrared"
        download = false

        [[files]]
        id = "MTL.txt"
        name = "Metadata"
        download = true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_template() {
        let selection = Selection::from_template(&template()).unwrap();
        assert_eq!(selection.name, "Landsat 8 true colour");
        assert_eq!(selection.files.len(), 5);
        assert_eq!(
            selection.ids_to_download(),
            vec![
                "LC08_L1TP_193027_20200712_20200722_01_T1",
                "LC08_L1GT_044034_20130330_20170310_01_T2",
            ]
        );
        assert_eq!(
            selection.files_to_download(),
            vec!["B2.TIF", "B3.TIF", "B4.TIF", "MTL.txt"]
        );
    }

    #[test]
    fn test_write_read_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("selection.toml");
        let selection = Selection::from_template(&template()).unwrap();
        selection.write(&path).unwrap();

        let read = Selection::read(&path).unwrap();
        assert_eq!(read, selection);
    }

    #[test]
    fn test_minimal() {
        let selection: Selection =
            toml::from_str("ids_to_download = [\"LT05_L1TP_195051_19950807_20170107_01_T1\"]")
                .unwrap();
        assert!(selection.files_to_download().is_empty());
        assert_eq!(selection.ids_to_download().len(), 1);
    }
}
