//! Procurement RFP management
//!
//! Vendors receive RFP invitations by mail, their replies become proposals,
//! and proposals are scored for requirement compliance and compared to pick
//! a recommended vendor.

pub mod config;
pub mod error;
pub mod extraction;
pub mod mail;
pub mod metrics;
pub mod procurement;
pub mod service;
pub mod store;
pub mod telemetry;

pub use config::Config;
pub use error::{Result, RfpError};
pub use procurement::{build_policy, ComparisonManager, RecommendationPolicy, RulesPolicy};
pub use service::ProcurementService;
pub use store::{InMemoryStore, RecordStore};
