use shared::{ImageResults, PlantType};
use std::collections::BTreeMap;

use super::catalog::{DiseaseCatalog, DiseaseRecord};

/// A plant is healthy only when its healthy class is strictly above this share.
pub const HEALTHY_THRESHOLD: f32 = 0.9;
/// Number of diseases listed in a report.
pub const MAX_FINDINGS: usize = 3;
/// Findings at or above this share are reported as high severity.
pub const HIGH_SEVERITY_FROM: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedClass {
    pub class_name: String,
    /// Sum over all images before normalization.
    pub summed_probability: f32,
    /// Share of the grand total over all images, in `[0, 1]`.
    pub probability: f32,
    /// Catalog entry; empty fields when the class is not in the catalog.
    pub record: DiseaseRecord,
}

impl AggregatedClass {
    pub fn is_healthy_class(&self) -> bool {
        is_healthy_class(&self.class_name)
    }
}

/// Per-class totals over all images of one request, in class name order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedResult {
    pub classes: Vec<AggregatedClass>,
}

pub fn is_healthy_class(class_name: &str) -> bool {
    class_name.to_lowercase().contains("healthy")
}

fn exceeds_healthy_threshold(probability: f32) -> bool {
    probability > HEALTHY_THRESHOLD
}

/// Merges the per-image results of one request into normalized class shares.
///
/// The result does not depend on the order of `results` or of the classes
/// inside each image.
pub fn aggregate(
    results: &[ImageResults],
    plant: PlantType,
    catalog: &DiseaseCatalog,
) -> AggregatedResult {
    let mut samples: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for class in results.iter().flat_map(|image| &image.results) {
        samples
            .entry(class.class_name.as_str())
            .or_default()
            .push(f64::from(class.probability.max(0.0)));
    }

    let totals: Vec<(&str, f64)> = samples
        .into_iter()
        .map(|(class_name, mut values)| {
            values.sort_by(f64::total_cmp);
            (class_name, values.iter().sum())
        })
        .collect();
    let grand_total: f64 = totals.iter().map(|(_, total)| total).sum();

    let classes = totals
        .into_iter()
        .map(|(class_name, total)| {
            let probability = if grand_total > 0.0 {
                (total / grand_total) as f32
            } else {
                0.0
            };
            let record = catalog
                .lookup(plant, class_name)
                .cloned()
                .unwrap_or_else(|| DiseaseRecord {
                    class_name: class_name.to_string(),
                    ..DiseaseRecord::default()
                });
            AggregatedClass {
                class_name: class_name.to_string(),
                summed_probability: total as f32,
                probability,
                record,
            }
        })
        .collect();

    AggregatedResult { classes }
}

impl AggregatedResult {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn get(&self, class_name: &str) -> Option<&AggregatedClass> {
        self.classes.iter().find(|c| c.class_name == class_name)
    }

    /// The healthy class with the highest share, if the model has one.
    pub fn healthy(&self) -> Option<&AggregatedClass> {
        self.classes
            .iter()
            .filter(|c| c.is_healthy_class())
            .max_by(|a, b| a.probability.total_cmp(&b.probability))
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy()
            .is_some_and(|c| exceeds_healthy_threshold(c.probability))
    }

    /// Up to [`MAX_FINDINGS`] non-healthy classes, most likely first.
    pub fn findings(&self) -> Vec<&AggregatedClass> {
        let mut diseases: Vec<&AggregatedClass> =
            self.classes.iter().filter(|c| !c.is_healthy_class()).collect();
        diseases.sort_by(|a, b| {
            b.probability
                .total_cmp(&a.probability)
                .then_with(|| a.class_name.cmp(&b.class_name))
        });
        diseases.truncate(MAX_FINDINGS);
        diseases
    }

    pub fn total_probability(&self) -> f32 {
        self.classes.iter().map(|c| c.probability).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ClassProbability;

    fn image(classes: &[(&str, f32)]) -> ImageResults {
        classes
            .iter()
            .map(|(name, p)| ClassProbability::new(*name, *p))
            .collect::<Vec<_>>()
            .into()
    }

    fn catalog() -> DiseaseCatalog {
        DiseaseCatalog::from_json_str(
            r#"{"tomato": {"diseases": [
                {"class_name": "blight", "description": "Late blight",
                 "photo_url": "https://example.org/blight.jpg",
                 "reference_url": "https://example.org/blight"}
            ]}}"#,
        )
        .unwrap()
    }

    #[test]
    fn tomato_scenario() {
        let results = vec![
            image(&[("healthy", 0.1), ("blight", 0.9)]),
            image(&[("blight", 0.3)]),
        ];
        let aggregated = aggregate(&results, PlantType::Tomato, &catalog());

        let healthy = aggregated.get("healthy").unwrap().probability;
        let blight = aggregated.get("blight").unwrap();
        assert!((healthy - 0.1 / 1.3).abs() < 1e-6);
        assert!((blight.probability - 1.2 / 1.3).abs() < 1e-6);
        assert!((blight.summed_probability - 1.2).abs() < 1e-6);
        assert_eq!(blight.record.description, "Late blight");
        assert!(!aggregated.is_healthy());

        let findings = aggregated.findings();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].class_name, "blight");
    }

    #[test]
    fn independent_of_image_and_class_order() {
        let a = image(&[("healthy", 0.2), ("rust", 0.7), ("mildew", 0.1)]);
        let b = image(&[("mildew", 0.6), ("healthy", 0.4)]);
        let c = image(&[("rust", 0.3333), ("spot", 0.6667)]);
        let reversed_b = image(&[("healthy", 0.4), ("mildew", 0.6)]);

        let forward = aggregate(&[a.clone(), b, c.clone()], PlantType::Pepper, &catalog());
        let backward = aggregate(&[c, reversed_b, a], PlantType::Pepper, &catalog());
        assert_eq!(forward, backward);
    }

    #[test]
    fn normalized_shares_sum_to_one() {
        let results = vec![
            image(&[("healthy", 0.91), ("a", 0.05), ("b", 0.04)]),
            image(&[("healthy", 0.2), ("c", 0.8)]),
            image(&[("d", 1.0)]),
        ];
        let aggregated = aggregate(&results, PlantType::Melon, &DiseaseCatalog::default());
        assert!((aggregated.total_probability() - 1.0).abs() < 1e-6);
        assert!(aggregated.classes.iter().all(|c| (0.0..=1.0).contains(&c.probability)));
    }

    #[test]
    fn zero_total_yields_zero_shares() {
        let results = vec![image(&[("healthy", 0.0), ("blight", 0.0)])];
        let aggregated = aggregate(&results, PlantType::Tomato, &catalog());
        assert!(aggregated.classes.iter().all(|c| c.probability == 0.0));
        assert!(!aggregated.is_healthy());

        assert!(aggregate(&[], PlantType::Tomato, &catalog()).is_empty());
    }

    #[test]
    fn healthy_threshold_is_strict() {
        assert!(!exceeds_healthy_threshold(0.9));
        assert!(exceeds_healthy_threshold(0.900_000_1));

        let aggregated = aggregate(&[image(&[("Healthy", 0.97)])], PlantType::Tomato, &catalog());
        assert!(aggregated.is_healthy());
    }

    #[test]
    fn merged_share_of_exactly_the_threshold_is_not_healthy() {
        let results = vec![image(&[("healthy", 0.9), ("rust", 0.1)])];
        let aggregated = aggregate(&results, PlantType::Tomato, &catalog());
        assert_eq!(aggregated.healthy().unwrap().probability, HEALTHY_THRESHOLD);
        assert!(!aggregated.is_healthy());

        let results = vec![
            image(&[("healthy", 0.9), ("rust", 0.1)]),
            image(&[("healthy", 0.92), ("rust", 0.08)]),
        ];
        let aggregated = aggregate(&results, PlantType::Tomato, &catalog());
        assert!(aggregated.healthy().unwrap().probability > HEALTHY_THRESHOLD);
        assert!(aggregated.is_healthy());
    }

    #[test]
    fn strongest_healthy_class_decides_the_verdict() {
        let results = vec![image(&[("healthy_leaf", 0.95), ("healthy_fruit", 0.01), ("blight", 0.04)])];
        let aggregated = aggregate(&results, PlantType::Tomato, &catalog());
        assert_eq!(aggregated.healthy().unwrap().class_name, "healthy_leaf");
        assert!(aggregated.is_healthy());
    }

    #[test]
    fn findings_are_top_three_non_healthy_in_descending_order() {
        let results = vec![image(&[
            ("healthy", 0.5),
            ("a", 0.1),
            ("b", 0.15),
            ("c", 0.15),
            ("d", 0.05),
            ("e", 0.05),
        ])];
        let aggregated = aggregate(&results, PlantType::Cucumber, &catalog());
        let findings = aggregated.findings();

        let names: Vec<&str> = findings.iter().map(|c| c.class_name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
        assert!(findings.windows(2).all(|w| w[0].probability >= w[1].probability));
        assert!(findings.iter().all(|c| !c.is_healthy_class()));
    }

    #[test]
    fn unknown_classes_get_empty_records() {
        let aggregated = aggregate(&[image(&[("mosaic", 1.0)])], PlantType::Tomato, &catalog());
        let mosaic = aggregated.get("mosaic").unwrap();
        assert_eq!(mosaic.record.class_name, "mosaic");
        assert!(mosaic.record.description.is_empty());
        assert!(mosaic.record.photo_url.is_empty());
    }
}
