use std::fmt;

use super::aggregator::{AggregatedClass, AggregatedResult, HIGH_SEVERITY_FROM};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Low,
    High,
}

impl Severity {
    pub fn from_probability(probability: f32) -> Self {
        if probability < HIGH_SEVERITY_FROM {
            Severity::Low
        } else {
            Severity::High
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => f.write_str("LOW"),
            Severity::High => f.write_str("HIGH"),
        }
    }
}

/// One message of a diagnostic report.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportSegment {
    Verdict {
        healthy: bool,
        /// Share of the deciding healthy class.
        probability: Option<f32>,
    },
    Disease {
        severity: Severity,
        class_name: String,
        description: String,
        probability: f32,
        photo_url: String,
        reference_url: String,
    },
}

impl ReportSegment {
    fn disease(class: &AggregatedClass) -> Self {
        ReportSegment::Disease {
            severity: Severity::from_probability(class.probability),
            class_name: class.class_name.clone(),
            description: class.record.description.clone(),
            probability: class.probability,
            photo_url: class.record.photo_url.clone(),
            reference_url: class.record.reference_url.clone(),
        }
    }
}

fn percent(probability: f32) -> String {
    format!("{:.1}%", probability * 100.0)
}

impl fmt::Display for ReportSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportSegment::Verdict {
                healthy: true,
                probability,
            } => match probability {
                Some(p) => write!(f, "Plant looks healthy ({}).", percent(*p)),
                None => f.write_str("Plant looks healthy."),
            },
            ReportSegment::Verdict { healthy: false, .. } => {
                f.write_str("Plant may be diseased. Details below:")
            }
            ReportSegment::Disease {
                severity,
                class_name,
                description,
                probability,
                photo_url,
                reference_url,
            } => {
                let name = if description.is_empty() {
                    class_name
                } else {
                    description
                };
                write!(f, "[{}] {} - probability {}", severity, name, percent(*probability))?;
                if !photo_url.is_empty() {
                    write!(f, "\nPhoto: {}", photo_url)?;
                }
                if !reference_url.is_empty() {
                    write!(f, "\nMore: {}", reference_url)?;
                }
                Ok(())
            }
        }
    }
}

/// Verdict first, then one segment per reported disease.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticReport {
    pub segments: Vec<ReportSegment>,
}

impl DiagnosticReport {
    pub fn from_aggregate(aggregated: &AggregatedResult) -> Self {
        let healthy = aggregated.is_healthy();
        let mut segments = vec![ReportSegment::Verdict {
            healthy,
            probability: aggregated.healthy().map(|c| c.probability),
        }];
        segments.extend(aggregated.findings().into_iter().map(ReportSegment::disease));
        Self { segments }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(
            self.segments.first(),
            Some(ReportSegment::Verdict { healthy: true, .. })
        )
    }

    /// The segments rendered as chat messages.
    pub fn messages(&self) -> Vec<String> {
        self.segments.iter().map(ToString::to_string).collect()
    }
}
