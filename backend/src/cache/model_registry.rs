use shared::PlantType;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

use crate::inference::model::{ModelLoadError, ModelLoader};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no model configured for plant type {0}")]
    UnknownPlantType(PlantType),
    #[error("failed to load {plant} model from {path}: {source}")]
    ModelLoad {
        plant: PlantType,
        path: PathBuf,
        #[source]
        source: ModelLoadError,
    },
}

type Slot<M> = Arc<OnceCell<Arc<M>>>;

/// Per-plant model cache.
///
/// Each plant owns a one-shot cell. The registry-wide mutex only guards
/// creation of the cells, so a slow load for one plant never blocks lookups
/// of another, and concurrent first requests for the same plant all wait on
/// a single load. Entries are never evicted.
pub struct ModelRegistry<L: ModelLoader> {
    loader: Arc<L>,
    paths: HashMap<PlantType, PathBuf>,
    slots: Mutex<HashMap<PlantType, Slot<L::Model>>>,
}

impl<L: ModelLoader> ModelRegistry<L> {
    pub fn new(loader: L, paths: HashMap<PlantType, PathBuf>) -> Self {
        Self {
            loader: Arc::new(loader),
            paths,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached model for `plant`, loading it on first use.
    pub async fn get_or_create(&self, plant: PlantType) -> Result<Arc<L::Model>, RegistryError> {
        let path = self
            .paths
            .get(&plant)
            .ok_or(RegistryError::UnknownPlantType(plant))?;

        let slot = self.slot(plant);
        if let Some(model) = slot.get() {
            log::debug!("Model cache hit for {}", plant);
            return Ok(model.clone());
        }

        let model = slot.get_or_try_init(|| self.load(plant, path.clone())).await?;
        Ok(model.clone())
    }

    /// Loads every listed plant up front.
    pub async fn preload(&self, plants: &[PlantType]) -> Result<(), RegistryError> {
        for plant in plants {
            self.get_or_create(*plant).await?;
        }
        Ok(())
    }

    pub fn is_loaded(&self, plant: PlantType) -> bool {
        self.lock_slots()
            .get(&plant)
            .is_some_and(|slot| slot.initialized())
    }

    /// Plants whose models are currently resident, in enum order.
    pub fn loaded(&self) -> Vec<PlantType> {
        let mut plants: Vec<PlantType> = self
            .lock_slots()
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(plant, _)| *plant)
            .collect();
        plants.sort();
        plants
    }

    fn slot(&self, plant: PlantType) -> Slot<L::Model> {
        self.lock_slots().entry(plant).or_default().clone()
    }

    fn lock_slots(&self) -> std::sync::MutexGuard<'_, HashMap<PlantType, Slot<L::Model>>> {
        // The map only ever gains empty cells, so a poisoned guard is still consistent.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn load(&self, plant: PlantType, path: PathBuf) -> Result<Arc<L::Model>, RegistryError> {
        log::info!("Loading {} model from {}", plant, path.display());
        let loader = self.loader.clone();
        let load_path = path.clone();

        let loaded = tokio::task::spawn_blocking(move || loader.load(&load_path))
            .await
            .map_err(|e| ModelLoadError::Task(e.to_string()))
            .and_then(|result| result);

        match loaded {
            Ok(model) => {
                log::info!("{} model ready", plant);
                Ok(Arc::new(model))
            }
            Err(source) => {
                log::error!("Failed to load {} model from {}: {}", plant, path.display(), source);
                Err(RegistryError::ModelLoad { plant, path, source })
            }
        }
    }
}
