//! Net change in tax liability under hypothetical policy scenarios.
//!
//! Everything lives in [`core`]: rate tables ([`core::TaxConfig`]), the
//! baseline calculation, scenario delta rules and the orchestrating
//! [`core::compute_impacts`].

pub mod core;
