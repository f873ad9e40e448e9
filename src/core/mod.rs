pub mod baseline;
pub mod config;
pub mod impact;
pub mod profile;
pub mod scenario;
pub mod schedule;
pub mod uk;

// Flat public surface for domain types and functions.
pub use baseline::{compute_baseline, BaselineResult};
pub use config::{BandRates, DependentBenefit, Preset, TaxConfig};
pub use impact::{compute_impacts, compute_impacts_with_baseline, ImpactError, ImpactReport};
pub use profile::{
    CsvField, FieldIssue, FilingStatus, ProfileInput, Problem, TaxpayerProfile, ValidationError,
};
pub use scenario::{
    apply_scenario, Category, CategoryDeltas, DeltaRule, PolicyScenario, ScenarioSet, TaxBenefit,
};
pub use schedule::{
    ConfigurationError, EvaluateError, TaxBracketSchedule, Tier, MAX_AMOUNT, MAX_RATE,
};
pub use uk::TaxYear;
