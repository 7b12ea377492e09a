//! Binding/execution core for prepared-statement database client
//! protocols.
//!
//! The crate converts an abstract, type-tagged parameter/result exchange
//! model (scalars and homogeneous vectors) into the wire-level buffer
//! layout a prepared-statement protocol expects, drives the
//! prepare → bind → execute → fetch lifecycle over a [`protocol`]
//! collaborator, and converts results back. Connection lifecycle,
//! transactions and the transport itself stay outside, behind the
//! [`protocol::SessionHandle`] / [`protocol::StatementHandle`] seams.

pub mod binding;
pub mod error;
pub mod options;
pub mod prelude;
pub mod protocol;
pub mod rewrite;
pub mod statement;
pub mod types;
pub mod wire;

#[cfg(feature = "test-utils")]
pub mod testing;

pub use error::WirebindError;
pub use statement::StatementDriver;
