use image::DynamicImage;
use shared::{ClassProbability, ImageResults};

use super::model::{ClassificationModel, InferenceError};
use super::preprocess::preprocess;

#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("model returned {outputs} probabilities for {labels} classes")]
    LabelMismatch { outputs: usize, labels: usize },
    #[error("model returned a non-finite probability for class {0}")]
    NonFinite(String),
}

/// Runs one model against one decoded image.
///
/// A model that yields no probabilities produces an empty [`ImageResults`];
/// that is an expected outcome for degenerate crops, not an error.
pub fn classify<M>(model: &M, image: &DynamicImage) -> Result<ImageResults, ClassificationError>
where
    M: ClassificationModel + ?Sized,
{
    let input = preprocess(image, model.input_size());
    let Some(probabilities) = model.forward(input.view())? else {
        log::warn!("Model produced no probabilities for a {}x{} crop", image.width(), image.height());
        return Ok(ImageResults::default());
    };

    let labels = model.class_names();
    if probabilities.len() != labels.len() {
        return Err(ClassificationError::LabelMismatch {
            outputs: probabilities.len(),
            labels: labels.len(),
        });
    }

    labels
        .iter()
        .zip(probabilities)
        .map(|(label, probability)| {
            if !probability.is_finite() {
                return Err(ClassificationError::NonFinite(label.clone()));
            }
            Ok(ClassProbability::new(label.as_str(), probability.clamp(0.0, 1.0)))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(ImageResults::from)
}
