use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::proto::Plant;

/// Crop category selected by the user. Picks the classification model on the
/// server and the disease table on the client.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PlantType {
    Tomato,
    Cucumber,
    Melon,
    Watermelon,
    Strawberry,
    Pepper,
    Salad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown plant type value {0}")]
pub struct UnknownPlant(pub i32);

impl PlantType {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// File name of the classification model shipped for this plant.
    pub fn model_file_name(&self) -> &'static str {
        match self {
            PlantType::Tomato => "tomato_cls_model.pt",
            PlantType::Cucumber => "cucumber_cls_model.pt",
            PlantType::Melon => "melon_cls_model.pt",
            PlantType::Watermelon => "watermelon_cls_model.pt",
            PlantType::Strawberry => "strawberry_cls_model.pt",
            PlantType::Pepper => "pepper_cls_model.pt",
            PlantType::Salad => "salad_cls_model.pt",
        }
    }
}

impl From<PlantType> for Plant {
    fn from(plant: PlantType) -> Self {
        match plant {
            PlantType::Tomato => Plant::Tomato,
            PlantType::Cucumber => Plant::Cucumber,
            PlantType::Melon => Plant::Melon,
            PlantType::Watermelon => Plant::Watermelon,
            PlantType::Strawberry => Plant::Strawberry,
            PlantType::Pepper => Plant::Pepper,
            PlantType::Salad => Plant::Salad,
        }
    }
}

impl From<PlantType> for i32 {
    fn from(plant: PlantType) -> Self {
        Plant::from(plant) as i32
    }
}

impl TryFrom<Plant> for PlantType {
    type Error = UnknownPlant;

    fn try_from(plant: Plant) -> Result<Self, Self::Error> {
        match plant {
            Plant::Unspecified => Err(UnknownPlant(Plant::Unspecified as i32)),
            Plant::Tomato => Ok(PlantType::Tomato),
            Plant::Cucumber => Ok(PlantType::Cucumber),
            Plant::Melon => Ok(PlantType::Melon),
            Plant::Watermelon => Ok(PlantType::Watermelon),
            Plant::Strawberry => Ok(PlantType::Strawberry),
            Plant::Pepper => Ok(PlantType::Pepper),
            Plant::Salad => Ok(PlantType::Salad),
        }
    }
}

/// Decodes the raw wire value of `PredictorRequest.plant`.
impl TryFrom<i32> for PlantType {
    type Error = UnknownPlant;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        let plant = Plant::try_from(value).map_err(|_| UnknownPlant(value))?;
        PlantType::try_from(plant)
    }
}
