#![forbid(unsafe_code)]

//! Core domain model and business logic for Gainz strength training.
//!
//! This crate provides:
//! - Domain types (exercises, sets, sessions, plans)
//! - The built-in exercise catalog
//! - Initial plan generation and periodization
//! - The live workout logging state machine
//! - Repository contracts with in-memory and file-backed stores
//! - Analytics, progression and CSV export

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod rng;
pub mod split;
pub mod plan;
pub mod periodization;
pub mod progression;
pub mod repository;
pub mod memory;
pub mod store;
pub mod workout;
pub mod rest_timer;
pub mod view_model;
pub mod analytics;
pub mod export;

// Re-export commonly used types
pub use error::{Error, RepositoryError, RepositoryResult, Result};
pub use types::*;
pub use catalog::{build_default_catalog, default_catalog};
pub use config::Config;
pub use repository::{AnalyticsRepository, ExerciseRepository, WorkoutRepository};
pub use memory::InMemoryStore;
pub use store::FileStore;
pub use plan::{GenerateInitialPlanUseCase, InitialPlanRequest};
pub use periodization::{LinearPeriodization, MesocycleTemplate, PlanMesocycleUseCase};
pub use workout::{FinishWorkoutUseCase, LogSetUseCase, StartWorkoutUseCase};
pub use view_model::{Action, WorkoutViewModel};
pub use analytics::{AnalyticsSummary, CalculateAnalyticsUseCase};
