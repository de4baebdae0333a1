//! Wire types of the `plant.Predictor` gRPC service.
//!
//! Field tags follow `predict.proto`:
//!
//! ```text
//! service Predictor { rpc Predict(PredictorRequest) returns (PredictorReply); }
//! message PredictorRequest { Plant plant = 1; repeated bytes image_data = 2; }
//! message ClassProbability { string class_name = 1; float probability = 2; }
//! message ImageResults { repeated ClassProbability results = 1; }
//! message PredictorReply { repeated ImageResults result = 1; }
//! ```

mod generated {
    include!(concat!(env!("OUT_DIR"), "/plant.Predictor.rs"));
}

pub use generated::{predictor_client, predictor_server};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum Plant {
    Unspecified = 0,
    Tomato = 1,
    Cucumber = 2,
    Melon = 3,
    Watermelon = 4,
    Strawberry = 5,
    Pepper = 6,
    Salad = 7,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct PredictorRequest {
    #[prost(enumeration = "Plant", tag = "1")]
    pub plant: i32,
    /// Encoded leaf crops (JPEG/PNG), one classification per entry.
    #[prost(bytes = "vec", repeated, tag = "2")]
    pub image_data: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ClassProbability {
    #[prost(string, tag = "1")]
    pub class_name: String,
    #[prost(float, tag = "2")]
    pub probability: f32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ImageResults {
    #[prost(message, repeated, tag = "1")]
    pub results: Vec<ClassProbability>,
}

/// Index-aligned with `PredictorRequest.image_data`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct PredictorReply {
    #[prost(message, repeated, tag = "1")]
    pub result: Vec<ImageResults>,
}

impl ClassProbability {
    pub fn new(class_name: impl Into<String>, probability: f32) -> Self {
        Self {
            class_name: class_name.into(),
            probability,
        }
    }
}

impl From<Vec<ClassProbability>> for ImageResults {
    fn from(results: Vec<ClassProbability>) -> Self {
        Self { results }
    }
}
