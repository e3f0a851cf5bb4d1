//! Service catalog and pricing tiers.

pub mod catalog;
pub mod pricing;

pub use catalog::{Service, catalog, find_service};
pub use pricing::{PricingTier, TierAction, contact_mailto, find_tier, pricing_tiers};
