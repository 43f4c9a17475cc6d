//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → LoaderConfig (validated, immutable)
//!     → params::build_chain resolves `params` into middleware
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Middleware parameters are validated for shape here; resolving them
//!   into live middleware can still fail with a `ParamError`

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::HeaderValues;
pub use schema::LoaderConfig;
pub use schema::ObservabilityConfig;
pub use schema::ParamConfig;
pub use schema::TransportConfig;
