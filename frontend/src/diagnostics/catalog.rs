use serde::{Deserialize, Serialize};
use shared::PlantType;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read disease catalog {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid disease catalog: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reference information about one model class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiseaseRecord {
    pub class_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub photo_url: String,
    #[serde(default)]
    pub reference_url: String,
}

#[derive(Debug, Deserialize)]
struct PlantEntry {
    #[serde(default)]
    diseases: Vec<DiseaseRecord>,
}

/// Disease tables keyed by plant, read once at startup.
#[derive(Debug, Clone, Default)]
pub struct DiseaseCatalog {
    plants: HashMap<PlantType, Vec<DiseaseRecord>>,
}

impl DiseaseCatalog {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&json)?;
        log::info!(
            "Loaded disease catalog from {} ({} plants)",
            path.display(),
            catalog.plants.len()
        );
        Ok(catalog)
    }

    /// Plant keys that are not known plant types are skipped.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let entries: HashMap<String, PlantEntry> = serde_json::from_str(json)?;
        let mut plants = HashMap::new();
        for (key, entry) in entries {
            match PlantType::from_str(&key) {
                Ok(plant) => {
                    plants.insert(plant, entry.diseases);
                }
                Err(_) => log::warn!("Skipping unknown plant {:?} in disease catalog", key),
            }
        }
        Ok(Self { plants })
    }

    pub fn diseases(&self, plant: PlantType) -> &[DiseaseRecord] {
        self.plants.get(&plant).map(Vec::as_slice).unwrap_or_default()
    }

    /// Case-insensitive lookup of `class_name` in the plant's table.
    pub fn lookup(&self, plant: PlantType, class_name: &str) -> Option<&DiseaseRecord> {
        let wanted = class_name.to_lowercase();
        self.diseases(plant)
            .iter()
            .find(|record| record.class_name.to_lowercase() == wanted)
    }
}
