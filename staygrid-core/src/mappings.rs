//! Persistence of the property name and vendor mappings.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cleaning::VendorMap;
use crate::error::{StayGridError, StayGridResult};
use crate::names::PropertyNames;

const NAMES_FILE: &str = "property-names.json";
const VENDORS_FILE: &str = "property-vendors.json";

/// Where operator-edited mappings are kept between runs.
pub trait MappingStore: Send + Sync + 'static {
    fn load_names(&self) -> StayGridResult<PropertyNames>;
    fn save_names(&self, names: &PropertyNames) -> StayGridResult<()>;
    fn load_vendors(&self) -> StayGridResult<VendorMap>;
    fn save_vendors(&self, vendors: &VendorMap) -> StayGridResult<()>;
}

/// Pretty-printed JSON files in one directory.
#[derive(Debug, Clone)]
pub struct JsonMappingStore {
    dir: PathBuf,
}

impl JsonMappingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonMappingStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load<T: DeserializeOwned + Default>(&self, file: &str) -> StayGridResult<T> {
        let path = self.dir.join(file);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no mapping file, starting empty");
            return Ok(T::default());
        }
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content)
            .map_err(|e| StayGridError::Config(format!("{}: {e}", path.display())))
    }

    /// Write through a temp file and rename so readers never see half a file.
    fn save<T: Serialize>(&self, file: &str, value: &T) -> StayGridResult<()> {
        let write_error = |e: std::io::Error| StayGridError::ConfigWrite(format!("{file}: {e}"));

        std::fs::create_dir_all(&self.dir).map_err(write_error)?;

        let path = self.dir.join(file);
        let temp = self.dir.join(format!("{file}.tmp"));
        let content = serde_json::to_string_pretty(value)
            .map_err(|e| StayGridError::Serialization(e.to_string()))?;

        std::fs::write(&temp, content).map_err(write_error)?;
        std::fs::rename(&temp, &path).map_err(write_error)?;
        Ok(())
    }
}

impl MappingStore for JsonMappingStore {
    fn load_names(&self) -> StayGridResult<PropertyNames> {
        self.load(NAMES_FILE)
    }

    fn save_names(&self, names: &PropertyNames) -> StayGridResult<()> {
        self.save(NAMES_FILE, names)
    }

    fn load_vendors(&self) -> StayGridResult<VendorMap> {
        self.load(VENDORS_FILE)
    }

    fn save_vendors(&self, vendors: &VendorMap) -> StayGridResult<()> {
        self.save(VENDORS_FILE, vendors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaning::{CleaningOffset, VendorAssignment};

    #[test]
    fn missing_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonMappingStore::new(dir.path().join("not-yet"));
        assert!(store.load_names().unwrap().is_empty());
        assert!(store.load_vendors().unwrap().is_empty());
    }

    #[test]
    fn saves_and_reloads_mappings() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonMappingStore::new(dir.path());

        let mut names = PropertyNames::new();
        names.insert("logement-1".into(), "Studio Vieux Port".into());
        store.save_names(&names).unwrap();

        let mut vendors = VendorMap::new();
        vendors.insert(
            "logement-1".into(),
            VendorAssignment::new("Portos Nettoyage").with_offset(CleaningOffset::hours(3)),
        );
        store.save_vendors(&vendors).unwrap();

        assert_eq!(store.load_names().unwrap(), names);
        assert_eq!(store.load_vendors().unwrap(), vendors);
        assert!(!dir.path().join("property-names.json.tmp").exists());
    }

    #[test]
    fn reads_legacy_vendor_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("property-vendors.json"),
            r#"{ "logement-1": "Cleansud", "logement-2": "Naira" }"#,
        )
        .unwrap();
        let vendors = JsonMappingStore::new(dir.path()).load_vendors().unwrap();
        assert_eq!(vendors["logement-2"].vendor, "Naira");
    }

    #[test]
    fn unwritable_directory_is_a_config_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();

        let store = JsonMappingStore::new(&blocker);
        let err = store.save_names(&PropertyNames::new()).unwrap_err();
        assert!(matches!(err, StayGridError::ConfigWrite(_)));
    }
}
