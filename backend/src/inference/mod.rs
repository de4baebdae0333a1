pub mod engine;
pub mod model;
pub mod preprocess;

pub use engine::{ClassificationError, classify};
pub use model::{ClassificationModel, InferenceError, ModelLoadError, ModelLoader};
pub use preprocess::{DecodeError, decode_image, preprocess};

#[cfg(feature = "torch")]
pub use model::{TorchModel, TorchModelLoader};
