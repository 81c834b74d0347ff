//! Connectome engine for the assembly calculus.
//!
//! Builds on [`assembly_rng`] for weight initialization. Exposes brain
//! parts ([`parts`]), the sparse connection store ([`connection`]), the
//! projection engine that runs one simulation round ([`engine`]), the
//! scoped binding context ([`context`]), and the [`brain::Brain`] that
//! ties them together. The assembly layer (DAG, fire protocol, `project`/
//! `merge`/`associate`/`read`, recipes) builds on top of this crate.

pub mod brain;
pub mod connection;
pub mod context;
pub mod engine;
pub mod error;
pub mod parts;

pub use brain::Brain;
pub use connection::{Connection, ConnectionStore};
pub use context::{with_current_brain, BrainScope};
pub use error::{CoreError, Result};
pub use parts::{Area, AreaRole, BrainPart, PartId, Stimulus};
