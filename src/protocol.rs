use thiserror::Error;

use crate::wire::{ParamBinding, ResultBinding, WireType};

/// Client error codes that mean the session itself is gone rather than the
/// statement failing (connection refused/lost family, plus the backend's
/// lost-connection code).
const CONNECTION_LOSS_CODES: [u32; 5] = [2002, 2003, 2006, 2013, 1927];

/// Coarse classification of a protocol failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Connection,
    Unknown,
}

/// Diagnostic reported by a failing protocol call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProtocolDiag {
    pub code: u32,
    pub message: String,
}

impl ProtocolDiag {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        if CONNECTION_LOSS_CODES.contains(&self.code) {
            ErrorCategory::Connection
        } else {
            ErrorCategory::Unknown
        }
    }
}

/// Result-set column metadata as reported by the protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    pub wire_type: WireType,
    /// Declared length in bytes; 0 when the protocol cannot bound it.
    pub length: usize,
}

/// Outcome of one fetch call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchReply {
    /// This many rows were written into the bound result buffers.
    Rows(usize),
    /// The result set is exhausted.
    NoData,
}

/// A live session able to allocate statement handles. Session lifecycle
/// (connect, authenticate, transactions) belongs to the collaborator.
pub trait SessionHandle {
    type Statement: StatementHandle;

    /// Allocate a fresh statement handle on this session.
    ///
    /// # Errors
    /// Returns the protocol's diagnostic when allocation fails.
    fn allocate_statement(&mut self) -> Result<Self::Statement, ProtocolDiag>;
}

/// Synchronous prepared-statement protocol surface consumed by the driver.
///
/// Every call blocks until the transport answers. Failures carry the
/// protocol's own diagnostic text; the driver adds operation context when
/// surfacing them.
pub trait StatementHandle {
    /// Compile the (already positional) statement text.
    ///
    /// # Errors
    /// Protocol diagnostic on rejection.
    fn prepare(&mut self, sql: &str) -> Result<(), ProtocolDiag>;

    /// Announce the input batch cardinality ahead of a bulk execute.
    ///
    /// # Errors
    /// Protocol diagnostic on rejection.
    fn set_input_batch(&mut self, rows: usize) -> Result<(), ProtocolDiag>;

    /// Bind the parameter descriptors and execute, as one unit.
    ///
    /// # Errors
    /// Protocol diagnostic on rejection.
    fn execute(&mut self, params: &[ParamBinding<'_>]) -> Result<(), ProtocolDiag>;

    /// Affected-row count of the last execute.
    ///
    /// # Errors
    /// Protocol diagnostic when the count is unavailable.
    fn affected_rows(&mut self) -> Result<u64, ProtocolDiag>;

    /// Number of result columns the prepared statement produces.
    fn field_count(&mut self) -> usize;

    /// Describe the pending result set.
    ///
    /// # Errors
    /// Protocol diagnostic when metadata cannot be read.
    fn result_metadata(&mut self) -> Result<Vec<ColumnMeta>, ProtocolDiag>;

    /// Fill the supplied result descriptors with as many rows as they can
    /// hold; `NoData` once the set is exhausted.
    ///
    /// # Errors
    /// Protocol diagnostic on a hard retrieval failure.
    fn fetch(&mut self, results: &mut [ResultBinding<'_>]) -> Result<FetchReply, ProtocolDiag>;

    /// Release the handle. Must be idempotent.
    fn close(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_loss_codes_are_categorized() {
        assert_eq!(
            ProtocolDiag::new(2013, "server has gone away").category(),
            ErrorCategory::Connection
        );
        assert_eq!(
            ProtocolDiag::new(1064, "syntax error").category(),
            ErrorCategory::Unknown
        );
    }
}
