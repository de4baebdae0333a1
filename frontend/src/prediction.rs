use shared::PlantType;

use crate::client::{Connector, PredictionClient};
use crate::diagnostics::{DiagnosticReport, DiseaseCatalog, aggregate};
use crate::error::ClientError;

/// Classifies the leaf crops of one photo set and builds the report for it.
pub async fn diagnose<C: Connector>(
    client: &PredictionClient<C>,
    catalog: &DiseaseCatalog,
    plant: PlantType,
    images: Vec<Vec<u8>>,
) -> Result<DiagnosticReport, ClientError> {
    let reply = client.predict(images, plant).await?;
    let aggregated = aggregate(&reply.result, plant, catalog);
    log::debug!(
        "Aggregated {} classes for {}, healthy: {}",
        aggregated.classes.len(),
        plant,
        aggregated.is_healthy()
    );
    Ok(DiagnosticReport::from_aggregate(&aggregated))
}
