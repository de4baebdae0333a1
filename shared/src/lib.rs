pub mod plant;
pub mod proto;

pub use plant::{PlantType, UnknownPlant};
pub use proto::{ClassProbability, ImageResults, Plant, PredictorReply, PredictorRequest};
