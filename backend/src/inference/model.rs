use ndarray::ArrayView3;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("model file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read class labels from {path}: {source}")]
    Labels {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("class label file {0} is empty")]
    NoLabels(PathBuf),
    #[error("failed to deserialize model: {0}")]
    Deserialize(String),
    #[error("model loading task failed: {0}")]
    Task(String),
}

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("model error: {0}")]
    Model(String),
}

/// A loaded classifier. Handles are shared between concurrent calls once
/// loaded, so implementations must be usable through `&self`.
pub trait ClassificationModel: Send + Sync + 'static {
    /// Class labels, index-aligned with the output of [`forward`](Self::forward).
    fn class_names(&self) -> &[String];

    /// Side length of the square RGB input the model expects.
    fn input_size(&self) -> u32;

    /// Runs the model on a CHW tensor with values in `[0, 1]`.
    ///
    /// `Ok(None)` means the model produced no probabilities for this input.
    fn forward(&self, input: ArrayView3<'_, f32>) -> Result<Option<Vec<f32>>, InferenceError>;
}

/// Loads a model from disk. Called at most once per plant type by the
/// registry, on the blocking thread pool.
pub trait ModelLoader: Send + Sync + 'static {
    type Model: ClassificationModel;

    fn load(&self, path: &Path) -> Result<Self::Model, ModelLoadError>;
}

/// Reads the sidecar `<model>.labels` file, one class name per line.
pub fn read_labels(model_path: &Path) -> Result<Vec<String>, ModelLoadError> {
    let labels_path = model_path.with_extension("labels");
    let contents = std::fs::read_to_string(&labels_path).map_err(|source| ModelLoadError::Labels {
        path: labels_path.clone(),
        source,
    })?;

    let labels: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if labels.is_empty() {
        return Err(ModelLoadError::NoLabels(labels_path));
    }
    Ok(labels)
}

#[cfg(feature = "torch")]
pub use torch::{TorchModel, TorchModelLoader};

#[cfg(feature = "torch")]
mod torch {
    use super::{ClassificationModel, InferenceError, ModelLoadError, ModelLoader, read_labels};
    use ndarray::ArrayView3;
    use std::path::Path;
    use std::sync::Mutex;
    use tch::{CModule, Device, Kind, Tensor};

    #[derive(Clone)]
    pub struct TorchModelLoader {
        device: Device,
        input_size: u32,
    }

    impl TorchModelLoader {
        pub fn new(input_size: u32) -> Self {
            Self {
                device: Device::cuda_if_available(),
                input_size,
            }
        }
    }

    impl ModelLoader for TorchModelLoader {
        type Model = TorchModel;

        fn load(&self, path: &Path) -> Result<TorchModel, ModelLoadError> {
            if !path.exists() {
                return Err(ModelLoadError::NotFound(path.to_path_buf()));
            }
            let class_names = read_labels(path)?;
            let module = CModule::load_on_device(path, self.device)
                .map_err(|e| ModelLoadError::Deserialize(e.to_string()))?;
            log::info!(
                "Loaded TorchScript model {} ({} classes) on {:?}",
                path.display(),
                class_names.len(),
                self.device
            );
            Ok(TorchModel {
                module: Mutex::new(module),
                class_names,
                input_size: self.input_size,
                device: self.device,
            })
        }
    }

    pub struct TorchModel {
        module: Mutex<CModule>,
        class_names: Vec<String>,
        input_size: u32,
        device: Device,
    }

    impl ClassificationModel for TorchModel {
        fn class_names(&self) -> &[String] {
            &self.class_names
        }

        fn input_size(&self) -> u32 {
            self.input_size
        }

        fn forward(&self, input: ArrayView3<'_, f32>) -> Result<Option<Vec<f32>>, InferenceError> {
            let (channels, height, width) = input.dim();
            let data: Vec<f32> = input.iter().copied().collect();
            let tensor = Tensor::from_slice(&data)
                .view([1, channels as i64, height as i64, width as i64])
                .to_device(self.device);

            let output = {
                let module = self
                    .module
                    .lock()
                    .map_err(|_| InferenceError::Model("model lock poisoned".to_string()))?;
                module
                    .forward_ts(&[tensor])
                    .map_err(|e| InferenceError::Model(e.to_string()))?
            };

            if output.numel() == 0 {
                return Ok(None);
            }

            let output = output.softmax(-1, Kind::Float);
            let output_flat = output.to_kind(Kind::Float).view([-1]).to_device(Device::Cpu);
            let num_elements = output_flat.size()[0] as usize;
            let mut output_vec = vec![0.0f32; num_elements];
            output_flat.copy_data(&mut output_vec, num_elements);
            Ok(Some(output_vec))
        }
    }
}
