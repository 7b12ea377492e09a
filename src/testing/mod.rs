//! In-memory protocol double for exercising the driver without a live
//! backend. Enabled through the `test-utils` feature.
//!
//! Two modes exist: a preloaded result set served on fetch, and an echo
//! mode that turns every execution's bound parameters into result rows so
//! round trips can be asserted end to end. Either way the double captures
//! the raw wire images it was handed, so tests can inspect exactly what
//! the binding layer produced.

use regex::Regex;

use crate::protocol::{ColumnMeta, FetchReply, ProtocolDiag, SessionHandle, StatementHandle};
use crate::wire::{ParamBinding, ParamIndicator, ResultBinding, WireType};

/// One cell served to (or echoed from) the wire layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryCell {
    /// Raw wire bytes; `None` is SQL NULL.
    pub bytes: Option<Vec<u8>>,
}

impl MemoryCell {
    #[must_use]
    pub fn null() -> Self {
        Self { bytes: None }
    }

    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Some(bytes.into()),
        }
    }

    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self::from_bytes(text.as_bytes().to_vec())
    }
}

/// Captured image of one bound parameter position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedParam {
    pub wire_type: WireType,
    /// Raw bytes per element, full slot.
    pub elements: Vec<Vec<u8>>,
    pub lengths: Vec<usize>,
    pub indicators: Vec<ParamIndicator>,
    pub is_unsigned: bool,
}

/// Session double handing out [`MemoryStatement`]s.
#[derive(Debug, Default)]
pub struct MemorySession {
    fail_allocation: Option<ProtocolDiag>,
}

impl MemorySession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_allocation(&mut self, diag: ProtocolDiag) {
        self.fail_allocation = Some(diag);
    }
}

impl SessionHandle for MemorySession {
    type Statement = MemoryStatement;

    fn allocate_statement(&mut self) -> Result<MemoryStatement, ProtocolDiag> {
        match self.fail_allocation.take() {
            Some(diag) => Err(diag),
            None => Ok(MemoryStatement::new()),
        }
    }
}

/// Scripted statement handle: serves preloaded rows, or echoes bound
/// parameters back as a result set.
#[derive(Debug, Default)]
pub struct MemoryStatement {
    prepared_sql: Option<String>,
    echo: bool,
    columns: Vec<ColumnMeta>,
    rows: Vec<Vec<MemoryCell>>,
    cursor: usize,
    input_batch: Option<usize>,
    executions: usize,
    captured: Vec<Vec<CapturedParam>>,
    affected_override: Option<u64>,
    fail_prepare: Option<ProtocolDiag>,
    fail_execute: Option<ProtocolDiag>,
    fail_fetch: Option<ProtocolDiag>,
    closed: bool,
}

impl MemoryStatement {
    /// Empty statement: no result columns, affected rows mirror the input
    /// cardinality.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Echo mode: every execute turns the bound parameters into result
    /// rows, one column per position.
    #[must_use]
    pub fn echo() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    /// Serve a fixed result set.
    #[must_use]
    pub fn with_result(columns: Vec<ColumnMeta>, rows: Vec<Vec<MemoryCell>>) -> Self {
        Self {
            columns,
            rows,
            ..Self::default()
        }
    }

    pub fn set_affected_rows(&mut self, rows: u64) {
        self.affected_override = Some(rows);
    }

    /// Re-script the served result set, e.g. to model a different query
    /// being prepared on the same handle.
    pub fn set_result(&mut self, columns: Vec<ColumnMeta>, rows: Vec<Vec<MemoryCell>>) {
        self.columns = columns;
        self.rows = rows;
        self.cursor = 0;
    }

    pub fn fail_next_prepare(&mut self, diag: ProtocolDiag) {
        self.fail_prepare = Some(diag);
    }

    pub fn fail_next_execute(&mut self, diag: ProtocolDiag) {
        self.fail_execute = Some(diag);
    }

    pub fn fail_next_fetch(&mut self, diag: ProtocolDiag) {
        self.fail_fetch = Some(diag);
    }

    /// Statement text received by the last prepare.
    #[must_use]
    pub fn prepared_sql(&self) -> Option<&str> {
        self.prepared_sql.as_deref()
    }

    /// Cardinality announced by the last `set_input_batch` call.
    #[must_use]
    pub fn input_batch(&self) -> Option<usize> {
        self.input_batch
    }

    #[must_use]
    pub fn executions(&self) -> usize {
        self.executions
    }

    /// Wire images captured per execution, in order.
    #[must_use]
    pub fn captured(&self) -> &[Vec<CapturedParam>] {
        &self.captured
    }

    #[must_use]
    pub fn last_captured(&self) -> Option<&[CapturedParam]> {
        self.captured.last().map(Vec::as_slice)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn placeholder_count(sql: &str) -> usize {
        // Good enough for a double; the driver's rewriter owns real
        // placeholder handling.
        Regex::new(r"\?")
            .map(|re| re.find_iter(sql).count())
            .unwrap_or(0)
    }
}

impl StatementHandle for MemoryStatement {
    fn prepare(&mut self, sql: &str) -> Result<(), ProtocolDiag> {
        if let Some(diag) = self.fail_prepare.take() {
            return Err(diag);
        }
        if self.closed {
            return Err(ProtocolDiag::new(2030, "statement handle is closed"));
        }
        self.prepared_sql = Some(sql.to_string());
        self.cursor = 0;
        Ok(())
    }

    fn set_input_batch(&mut self, rows: usize) -> Result<(), ProtocolDiag> {
        self.input_batch = Some(rows);
        Ok(())
    }

    fn execute(&mut self, params: &[ParamBinding<'_>]) -> Result<(), ProtocolDiag> {
        if let Some(diag) = self.fail_execute.take() {
            return Err(diag);
        }
        let Some(sql) = self.prepared_sql.clone() else {
            return Err(ProtocolDiag::new(2030, "execute without prepare"));
        };
        let expected = Self::placeholder_count(&sql);
        if expected != params.len() {
            return Err(ProtocolDiag::new(
                1210,
                format!("expected {expected} parameters, got {}", params.len()),
            ));
        }

        let captured: Vec<CapturedParam> = params.iter().map(capture_param).collect();
        if self.echo {
            self.columns = echo_columns(&captured);
            self.rows = echo_rows(&captured);
        }
        self.cursor = 0;
        self.captured.push(captured);
        self.executions += 1;
        Ok(())
    }

    fn affected_rows(&mut self) -> Result<u64, ProtocolDiag> {
        if let Some(n) = self.affected_override {
            return Ok(n);
        }
        if self.columns.is_empty() {
            Ok(self.input_batch.unwrap_or(1) as u64)
        } else {
            Ok(self.rows.len() as u64)
        }
    }

    fn field_count(&mut self) -> usize {
        self.columns.len()
    }

    fn result_metadata(&mut self) -> Result<Vec<ColumnMeta>, ProtocolDiag> {
        Ok(self.columns.clone())
    }

    fn fetch(&mut self, results: &mut [ResultBinding<'_>]) -> Result<FetchReply, ProtocolDiag> {
        if let Some(diag) = self.fail_fetch.take() {
            return Err(diag);
        }
        if results.is_empty() {
            return Err(ProtocolDiag::new(2031, "fetch without result bindings"));
        }
        if self.cursor >= self.rows.len() {
            return Ok(FetchReply::NoData);
        }
        let capacity = results
            .iter()
            .map(ResultBinding::capacity)
            .min()
            .unwrap_or(0);
        let available = self.rows.len() - self.cursor;
        let take = capacity.min(available);
        if take == 0 {
            return Ok(FetchReply::NoData);
        }
        for offset in 0..take {
            let row = &self.rows[self.cursor + offset];
            for (column, slot) in results.iter_mut().enumerate() {
                fill_slot(slot, offset, row.get(column));
            }
        }
        self.cursor += take;
        Ok(FetchReply::Rows(take))
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

fn fill_slot(slot: &mut ResultBinding<'_>, index: usize, cell: Option<&MemoryCell>) {
    let stride = slot.stride;
    match cell.and_then(|c| c.bytes.as_ref()) {
        None => {
            slot.is_null[index] = true;
            slot.is_error[index] = false;
            slot.lengths[index] = -1;
        }
        Some(bytes) => {
            let copy = bytes.len().min(stride);
            let target = slot.element_slot(index);
            target[..copy].copy_from_slice(&bytes[..copy]);
            for b in &mut target[copy..] {
                *b = 0;
            }
            slot.is_null[index] = false;
            slot.is_error[index] = bytes.len() > stride;
            slot.lengths[index] = bytes.len() as i64;
        }
    }
}

fn capture_param(binding: &ParamBinding<'_>) -> CapturedParam {
    let elements = (0..binding.element_count())
        .map(|i| {
            binding
                .element_bytes(i)
                .map(<[u8]>::to_vec)
                .unwrap_or_default()
        })
        .collect();
    CapturedParam {
        wire_type: binding.wire_type,
        elements,
        lengths: binding.lengths.clone(),
        indicators: binding.indicators.clone(),
        is_unsigned: binding.is_unsigned,
    }
}

fn echo_columns(params: &[CapturedParam]) -> Vec<ColumnMeta> {
    params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let length = match p.wire_type.fixed_size() {
                Some(size) => size,
                None => p.lengths.iter().copied().max().unwrap_or(0),
            };
            ColumnMeta {
                name: format!("c{}", i + 1),
                wire_type: p.wire_type,
                length,
            }
        })
        .collect()
}

fn echo_rows(params: &[CapturedParam]) -> Vec<Vec<MemoryCell>> {
    let rows = params.iter().map(|p| p.elements.len()).max().unwrap_or(0);
    (0..rows)
        .map(|row| {
            params
                .iter()
                .map(|p| {
                    let indicator = p.indicators.get(row).copied().unwrap_or_default();
                    if indicator == ParamIndicator::Null {
                        return MemoryCell::null();
                    }
                    let bytes = p.elements.get(row).cloned().unwrap_or_default();
                    let len = p
                        .lengths
                        .get(row)
                        .copied()
                        .unwrap_or(bytes.len())
                        .min(bytes.len());
                    MemoryCell {
                        bytes: Some(bytes[..len].to_vec()),
                    }
                })
                .collect()
        })
        .collect()
}
