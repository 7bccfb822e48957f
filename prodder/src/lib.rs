//! End-to-end smoke test for the auth, chat session, and knowledge-base
//! HTTP API.
//!
//! The crate wires the workspace pieces together: `ptransport` moves bytes,
//! `pharness` tracks results and sequences scenarios, `pobserve` traces and
//! counts, and the modules here describe the API under test.
//!
//! ```rust
//! use prodder::config::{ProbeConfig, RunMode, ScenarioName};
//! use prodder::suite::scenario_order;
//! use prodder::util::Credentials;
//!
//! let config = ProbeConfig::new("http://localhost:3000", Credentials::new("a@example.com", "pw"))
//!     .with_mode(RunMode::LoginOnly);
//!
//! assert_eq!(
//!     scenario_order(config.mode, config.include_diagnostics),
//!     vec![ScenarioName::Health, ScenarioName::Login]
//! );
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod console;
pub mod prelude;
pub mod scenarios;
pub mod suite;
pub mod util;

pub use pcommon;
pub use pharness;
pub use pobserve;
pub use ptransport;

pub use config::{ProbeConfig, RunMode, ScenarioName};
pub use console::ConsoleReporter;
pub use suite::{Probe, ProbeOutcome, scenario_order};
pub use util::Credentials;
