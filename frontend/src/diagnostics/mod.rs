pub mod aggregator;
pub mod catalog;
pub mod report;

pub use aggregator::{AggregatedClass, AggregatedResult, aggregate};
pub use catalog::{CatalogError, DiseaseCatalog, DiseaseRecord};
pub use report::{DiagnosticReport, ReportSegment, Severity};
