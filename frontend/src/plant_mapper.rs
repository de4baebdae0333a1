use shared::PlantType;
use std::str::FromStr;

use crate::error::ClientError;

/// Labels of the plant buttons in the chat UI.
const UI_LABELS: [(&str, PlantType); 7] = [
    ("помидор", PlantType::Tomato),
    ("огурец", PlantType::Cucumber),
    ("дыня", PlantType::Melon),
    ("арбуз", PlantType::Watermelon),
    ("клубника", PlantType::Strawberry),
    ("перец", PlantType::Pepper),
    ("салат", PlantType::Salad),
];

/// Maps a user-entered plant name to a [`PlantType`].
pub fn parse_plant(text: &str) -> Result<PlantType, ClientError> {
    let name = text.trim();
    if let Ok(plant) = PlantType::from_str(name) {
        return Ok(plant);
    }

    let lowered = name.to_lowercase();
    UI_LABELS
        .iter()
        .find(|(label, _)| *label == lowered)
        .map(|(_, plant)| *plant)
        .ok_or_else(|| ClientError::UnknownPlant(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn english_names_in_any_case() {
        assert_eq!(parse_plant("tomato").unwrap(), PlantType::Tomato);
        assert_eq!(parse_plant("  Watermelon ").unwrap(), PlantType::Watermelon);
        assert_eq!(parse_plant("SALAD").unwrap(), PlantType::Salad);
    }

    #[test]
    fn every_plant_has_a_ui_label() {
        for plant in PlantType::iter() {
            let (label, _) = UI_LABELS.iter().find(|(_, p)| *p == plant).unwrap();
            assert_eq!(parse_plant(label).unwrap(), plant);
        }
        assert_eq!(parse_plant("Помидор").unwrap(), PlantType::Tomato);
        assert_eq!(parse_plant(" клубника ").unwrap(), PlantType::Strawberry);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = parse_plant(" potato ").unwrap_err();
        assert!(matches!(err, ClientError::UnknownPlant(ref name) if name == "potato"));
        assert!(parse_plant("").is_err());
    }
}
