use shared::proto::predictor_server::{Predictor, PredictorServer};
use shared::{ImageResults, PlantType, PredictorReply, PredictorRequest, UnknownPlant};
use std::sync::Arc;
use std::time::Instant;
use tonic::{Request, Response, Status};
use uuid::Uuid;

use crate::cache::{ModelRegistry, RegistryError};
use crate::inference::{ClassificationError, ClassificationModel, DecodeError, ModelLoader, classify, decode_image};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    UnknownPlantType(#[from] UnknownPlant),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("image {index}: {source}")]
    Decode {
        index: usize,
        #[source]
        source: DecodeError,
    },
    #[error("image {index}: {source}")]
    Classification {
        index: usize,
        #[source]
        source: ClassificationError,
    },
    #[error("classification task failed: {0}")]
    Task(String),
}

impl From<ServiceError> for Status {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::UnknownPlantType(_) | ServiceError::Registry(_) => {
                Status::invalid_argument(format!("Invalid plant type: {err}"))
            }
            ServiceError::Decode { .. }
            | ServiceError::Classification { .. }
            | ServiceError::Task(_) => Status::internal(format!("Error processing image: {err}")),
        }
    }
}

/// gRPC handler for `plant.Predictor`.
///
/// Every call is all-or-nothing: once the model is resolved the images are
/// classified in request order and the first failure discards the results
/// gathered so far.
pub struct PredictionService<L: ModelLoader> {
    registry: Arc<ModelRegistry<L>>,
}

impl<L: ModelLoader> Clone for PredictionService<L> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}

impl<L: ModelLoader> PredictionService<L> {
    pub fn new(registry: Arc<ModelRegistry<L>>) -> Self {
        Self { registry }
    }

    pub fn into_server(self) -> PredictorServer<Self> {
        PredictorServer::new(self)
    }

    pub async fn handle(&self, request: PredictorRequest) -> Result<PredictorReply, ServiceError> {
        let plant = PlantType::try_from(request.plant)?;
        let model = self.registry.get_or_create(plant).await?;

        let images = request.image_data;
        if images.is_empty() {
            return Ok(PredictorReply::default());
        }

        let result = tokio::task::spawn_blocking(move || classify_all(&*model, &images))
            .await
            .map_err(|e| ServiceError::Task(e.to_string()))??;

        Ok(PredictorReply { result })
    }
}

fn classify_all<M>(model: &M, images: &[Vec<u8>]) -> Result<Vec<ImageResults>, ServiceError>
where
    M: ClassificationModel + ?Sized,
{
    images
        .iter()
        .enumerate()
        .map(|(index, bytes)| {
            let image = decode_image(bytes).map_err(|source| ServiceError::Decode { index, source })?;
            classify(model, &image).map_err(|source| ServiceError::Classification { index, source })
        })
        .collect()
}

#[tonic::async_trait]
impl<L: ModelLoader> Predictor for PredictionService<L> {
    async fn predict(
        &self,
        request: Request<PredictorRequest>,
    ) -> Result<Response<PredictorReply>, Status> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        let request = request.into_inner();
        let plant = request.plant;
        let image_count = request.image_data.len();

        log::info!(
            "[{}] Predict: plant={} images={}",
            request_id,
            plant,
            image_count
        );

        match self.handle(request).await {
            Ok(reply) => {
                log::info!(
                    "[{}] Classified {} images in {:?}",
                    request_id,
                    reply.result.len(),
                    started.elapsed()
                );
                Ok(Response::new(reply))
            }
            Err(e) => {
                log::error!("[{}] Predict failed after {:?}: {}", request_id, started.elapsed(), e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeLoader, FakeOutput, encoded_png};
    use shared::{ClassProbability, Plant};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use tonic::Code;

    fn service(loader: FakeLoader, plants: &[PlantType]) -> PredictionService<FakeLoader> {
        let paths: HashMap<PlantType, PathBuf> = plants
            .iter()
            .map(|p| (*p, PathBuf::from(p.model_file_name())))
            .collect();
        PredictionService::new(Arc::new(ModelRegistry::new(loader, paths)))
    }

    fn tomato_loader() -> FakeLoader {
        FakeLoader::new(
            vec!["healthy", "diseased"],
            FakeOutput::Probabilities(vec![0.9, 0.1]),
        )
    }

    fn request(plant: i32, image_data: Vec<Vec<u8>>) -> Request<PredictorRequest> {
        Request::new(PredictorRequest { plant, image_data })
    }

    #[tokio::test]
    async fn classifies_every_image_in_order() {
        let service = service(tomato_loader(), &[PlantType::Tomato]);
        let images = vec![encoded_png([200, 10, 10]), encoded_png([10, 200, 10])];

        let reply = service
            .predict(request(Plant::Tomato as i32, images))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(reply.result.len(), 2);
        for image in &reply.result {
            assert_eq!(
                image.results,
                vec![
                    ClassProbability::new("healthy", 0.9),
                    ClassProbability::new("diseased", 0.1),
                ]
            );
        }
    }

    #[tokio::test]
    async fn empty_image_list_is_ok_and_empty() {
        let service = service(tomato_loader(), &[PlantType::Tomato]);
        let reply = service
            .predict(request(Plant::Tomato as i32, Vec::new()))
            .await
            .unwrap()
            .into_inner();
        assert!(reply.result.is_empty());
    }

    #[tokio::test]
    async fn unknown_plant_values_are_invalid_arguments() {
        let loader = tomato_loader();
        let service = service(loader.clone(), &[PlantType::Tomato]);

        for value in [Plant::Unspecified as i32, 99] {
            let status = service
                .predict(request(value, vec![encoded_png([1, 2, 3])]))
                .await
                .unwrap_err();
            assert_eq!(status.code(), Code::InvalidArgument);
            assert!(status.message().starts_with("Invalid plant type: "));
        }
        assert_eq!(loader.load_count(), 0);
    }

    #[tokio::test]
    async fn plant_without_model_is_an_invalid_argument() {
        let loader = tomato_loader();
        let service = service(loader.clone(), &[PlantType::Tomato]);

        let status = service
            .predict(request(Plant::Salad as i32, vec![encoded_png([1, 2, 3])]))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
        assert!(status.message().contains("salad"));
        assert_eq!(loader.load_count(), 0);
    }

    #[tokio::test]
    async fn model_load_failure_is_an_invalid_argument() {
        let service = service(tomato_loader().failing_first(1), &[PlantType::Tomato]);
        let status = service
            .predict(request(Plant::Tomato as i32, vec![encoded_png([1, 2, 3])]))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
        assert!(status.message().contains("corrupt archive"));
    }

    #[tokio::test]
    async fn undecodable_image_aborts_the_whole_call() {
        let service = service(tomato_loader(), &[PlantType::Tomato]);
        let images = vec![encoded_png([1, 2, 3]), b"fake_2".to_vec()];

        let status = service
            .predict(request(Plant::Tomato as i32, images))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::Internal);
        assert!(status.message().starts_with("Error processing image: image 1"));
    }

    #[tokio::test]
    async fn model_run_failure_is_internal() {
        let loader = FakeLoader::new(vec!["healthy"], FakeOutput::Fail("Model run failed".into()));
        let service = service(loader, &[PlantType::Tomato]);

        let status = service
            .predict(request(Plant::Tomato as i32, vec![encoded_png([1, 2, 3])]))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::Internal);
        assert!(status.message().contains("Model run failed"));
    }

    #[tokio::test]
    async fn degenerate_output_yields_an_empty_image_result() {
        let loader = FakeLoader::new(vec!["healthy"], FakeOutput::Nothing);
        let service = service(loader, &[PlantType::Pepper]);

        let reply = service
            .predict(request(Plant::Pepper as i32, vec![encoded_png([1, 2, 3])]))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(reply.result, vec![ImageResults::default()]);
    }
}
