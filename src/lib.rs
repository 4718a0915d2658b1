//! # Project Store
//!
//! Relational persistence for analysis projects. Every persisted object is a
//! record: the in-memory image of one SQLite row that keeps a working copy of
//! its fields next to the values last committed to storage.
//!
//! ## Features
//!
//! - **Staged edits**: change a record, then save or revert it as a unit
//! - **Ownership graph**: parents, children, resources and join records, with
//!   cascading removal inside one transaction
//! - **Polymorphic families**: variable records share one table and are told
//!   apart by discriminator columns
//! - **Path relocation**: move a project directory without breaking stored
//!   paths
//! - **Optimistic concurrency**: optionally refuse saves over rows another
//!   writer changed
//!
//! ## Quick Start
//!
//! ```rust
//! use project_store::prelude::*;
//!
//! # fn main() -> ProjectResult<()> {
//! let db = ProjectDatabase::open_in_memory()?;
//!
//! let problem = Problem::new("envelope")
//!     .with_variable(DiscreteVariable::new("insulation", vec![Measure::new("baseline")]));
//! let seed = FileReference::new("/proj/seed.osm", FileReferenceType::OSM);
//! let analysis = AnalysisRecord::new(&Analysis::new("study", problem, seed), &db)?;
//!
//! let mut problem = analysis.problem_record(&db)?;
//! problem.set_description("Wall and roof options");
//! problem.save(&db)?;
//!
//! let removed = analysis.remove(&db)?;
//! assert!(removed.len() >= 2);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod database;
pub mod errors;
pub mod prelude;
pub mod record;
pub mod records;
pub mod utils;
