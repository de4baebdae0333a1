//! In-memory model doubles used by the unit tests.

use ndarray::ArrayView3;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::inference::model::{ClassificationModel, InferenceError, ModelLoadError, ModelLoader};

#[derive(Debug, Clone)]
pub enum FakeOutput {
    Probabilities(Vec<f32>),
    Nothing,
    Fail(String),
}

pub struct FakeModel {
    pub path: PathBuf,
    labels: Vec<String>,
    output: FakeOutput,
    last_input: Mutex<Option<(usize, usize, usize)>>,
}

impl FakeModel {
    pub fn new(labels: &[&str], output: FakeOutput) -> Self {
        Self {
            path: PathBuf::new(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            output,
            last_input: Mutex::new(None),
        }
    }

    pub fn last_input_dim(&self) -> Option<(usize, usize, usize)> {
        *self.last_input.lock().unwrap()
    }
}

impl ClassificationModel for FakeModel {
    fn class_names(&self) -> &[String] {
        &self.labels
    }

    fn input_size(&self) -> u32 {
        4
    }

    fn forward(&self, input: ArrayView3<'_, f32>) -> Result<Option<Vec<f32>>, InferenceError> {
        *self.last_input.lock().unwrap() = Some(input.dim());
        match &self.output {
            FakeOutput::Probabilities(p) => Ok(Some(p.clone())),
            FakeOutput::Nothing => Ok(None),
            FakeOutput::Fail(message) => Err(InferenceError::Model(message.clone())),
        }
    }
}

/// Counts loads and can be slowed down to widen race windows.
#[derive(Clone)]
pub struct FakeLoader {
    pub loads: Arc<AtomicUsize>,
    labels: Vec<&'static str>,
    output: FakeOutput,
    delay: Duration,
    fail_loads: usize,
}

impl FakeLoader {
    pub fn new(labels: Vec<&'static str>, output: FakeOutput) -> Self {
        Self {
            loads: Arc::new(AtomicUsize::new(0)),
            labels,
            output,
            delay: Duration::ZERO,
            fail_loads: 0,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// The first `count` loads fail with a deserialization error.
    pub fn failing_first(mut self, count: usize) -> Self {
        self.fail_loads = count;
        self
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl ModelLoader for FakeLoader {
    type Model = FakeModel;

    fn load(&self, path: &Path) -> Result<FakeModel, ModelLoadError> {
        let attempt = self.loads.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        if attempt < self.fail_loads {
            return Err(ModelLoadError::Deserialize(format!(
                "corrupt archive {}",
                path.display()
            )));
        }
        let mut model = FakeModel::new(&self.labels, self.output.clone());
        model.path = path.to_path_buf();
        Ok(model)
    }
}

/// A small solid-color PNG crop.
pub fn encoded_png(color: [u8; 3]) -> Vec<u8> {
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb(color)));
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}
