pub mod describe;

use describe::{ColumnDescriber, ColumnInfo, ResultShape};

use crate::binding::{
    BindMode, BindTarget, ParamBinder, ResultBinder, ScalarParamBinder, ScalarResultBinder,
    VectorParamBinder, VectorResultBinder, resolve_target,
};
use crate::error::WirebindError;
use crate::options::{RewriteMode, StatementOptions};
use crate::protocol::{FetchReply, SessionHandle, StatementHandle};
use crate::rewrite::{QueryPlan, rewrite_named_placeholders};
use crate::types::{ExchangeType, ExchangeValue, Indicator, VectorValue};
use crate::wire::{ParamBinding, ResultBinding};

/// Statement lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementState {
    #[default]
    Unprepared,
    Prepared,
    Executed,
    Fetching,
    Exhausted,
}

/// Outcome of `execute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteResult {
    pub rows_affected: u64,
    pub has_result_set: bool,
}

/// Outcome of `fetch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchResult {
    pub rows_fetched: usize,
    pub exhausted: bool,
}

/// Drives one prepared statement through the prepare → bind → execute →
/// fetch lifecycle, owning the binder set and the protocol handle.
///
/// Descriptor arrays handed to the protocol are rebuilt wholesale before
/// every execute and fetch; binders keep ownership of the buffers the
/// descriptors reference. Not safe for concurrent use; callers serialize
/// access per statement.
#[derive(Debug)]
pub struct StatementDriver<H: StatementHandle> {
    handle: H,
    options: StatementOptions,
    state: StatementState,
    plan: Option<QueryPlan>,
    bind_mode: BindMode,
    params: Vec<ParamBinder>,
    results: Vec<ResultBinder>,
    describer: ColumnDescriber,
    fetch_by_rows: bool,
    rows_fetched: usize,
    rows_affected: i64,
}

impl<H: StatementHandle> StatementDriver<H> {
    /// Wrap an already-allocated protocol handle.
    #[must_use]
    pub fn new(handle: H) -> Self {
        Self::with_options(handle, StatementOptions::default())
    }

    #[must_use]
    pub fn with_options(handle: H, options: StatementOptions) -> Self {
        Self {
            handle,
            options,
            state: StatementState::Unprepared,
            plan: None,
            bind_mode: BindMode::Unbound,
            params: Vec::new(),
            results: Vec::new(),
            describer: ColumnDescriber::default(),
            fetch_by_rows: false,
            rows_fetched: 0,
            rows_affected: -1,
        }
    }

    /// Allocate a statement handle on `session` and wrap it.
    ///
    /// # Errors
    /// Surfaces the protocol diagnostic when allocation fails.
    pub fn allocate<S>(session: &mut S) -> Result<Self, WirebindError>
    where
        S: SessionHandle<Statement = H>,
    {
        let handle = session
            .allocate_statement()
            .map_err(|diag| WirebindError::protocol("error allocating statement", diag))?;
        Ok(Self::new(handle))
    }

    /// Access the underlying protocol handle.
    #[must_use]
    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn handle_mut(&mut self) -> &mut H {
        &mut self.handle
    }

    /// Rewrite and prepare `query`, resetting every binder registration
    /// from any previous prepare: the old registrations reference the old
    /// handle state and are void from here on.
    ///
    /// # Errors
    /// `ProtocolError` when the protocol rejects the statement text.
    pub fn prepare(&mut self, query: &str) -> Result<&QueryPlan, WirebindError> {
        let plan = match self.options.rewrite {
            RewriteMode::Named => rewrite_named_placeholders(query),
            RewriteMode::Passthrough => QueryPlan::verbatim(query),
        };
        tracing::debug!(sql = plan.sql(), names = plan.names().len(), "preparing statement");
        self.handle.prepare(plan.sql()).map_err(|diag| {
            WirebindError::protocol(format!("preparing query \"{}\"", plan.sql()), diag)
        })?;

        self.clear_binders();
        self.bind_mode = BindMode::Unbound;
        self.describer.invalidate();
        self.fetch_by_rows = false;
        self.rows_fetched = 0;
        self.rows_affected = -1;
        self.state = StatementState::Prepared;
        Ok(self.plan.insert(plan))
    }

    /// The active query plan.
    #[must_use]
    pub fn plan(&self) -> Option<&QueryPlan> {
        self.plan.as_ref()
    }

    /// Lifecycle state, mainly for diagnostics.
    #[must_use]
    pub fn state(&self) -> StatementState {
        self.state
    }

    /// Bind one scalar input value by position or name. Passing
    /// `Some(Indicator::Null)` substitutes the protocol's null sentinel at
    /// execute time. Re-binding a position replaces the value but the
    /// exchange type stays fixed until re-prepare.
    ///
    /// # Errors
    /// Configuration errors for mode mixing, unresolved names, or a type
    /// change on an already-bound position.
    pub fn bind_parameter(
        &mut self,
        target: BindTarget<'_>,
        value: ExchangeValue,
        indicator: Option<Indicator>,
    ) -> Result<(), WirebindError> {
        let plan = self.plan.as_ref().ok_or_else(|| {
            WirebindError::InternalError("bind_parameter called before prepare".into())
        })?;
        let position = resolve_target(plan, target, &mut self.bind_mode)?;
        let binder = ParamBinder::Scalar(ScalarParamBinder::new(position, value, indicator));
        self.install_param(binder)
    }

    /// Bind one homogeneous input array for bulk execution. The optional
    /// indicator array marks null elements and must match the vector
    /// length.
    ///
    /// # Errors
    /// Configuration errors for empty vectors, length mismatches, mode
    /// mixing, or unresolved names.
    pub fn bind_parameter_vector(
        &mut self,
        target: BindTarget<'_>,
        values: VectorValue,
        indicators: Option<&[Indicator]>,
    ) -> Result<(), WirebindError> {
        let plan = self.plan.as_ref().ok_or_else(|| {
            WirebindError::InternalError("bind_parameter_vector called before prepare".into())
        })?;
        let position = resolve_target(plan, target, &mut self.bind_mode)?;
        let binder = ParamBinder::Vector(VectorParamBinder::new(position, values, indicators)?);
        self.install_param(binder)
    }

    /// Register a scalar output binding for a 1-based result column. Text
    /// columns size their buffer from the describe cache, so `describe`
    /// must have run first for those.
    ///
    /// # Errors
    /// `InternalError` when text sizing is requested before describe;
    /// configuration errors for opaque types or flavor/type changes.
    pub fn bind_result(
        &mut self,
        position: usize,
        ty: ExchangeType,
        with_indicator: bool,
    ) -> Result<(), WirebindError> {
        if self.plan.is_none() {
            return Err(WirebindError::InternalError(
                "bind_result called before prepare".into(),
            ));
        }
        let text_capacity = if ty.is_text() {
            let declared = self.describer.column_size(position)?;
            let declared = if declared == 0 {
                self.options.unbounded_text_capacity
            } else {
                declared
            };
            declared + 1
        } else {
            0
        };
        let binder = ScalarResultBinder::define(position, ty, with_indicator, text_capacity)?;
        self.install_result(ResultBinder::Scalar(binder))
    }

    /// Register a bulk output binding with `len` rows of destination
    /// storage. A text column declared wider than the columnar limit (or
    /// with unknown width) downgrades the whole statement to row-at-a-time
    /// fetches.
    ///
    /// # Errors
    /// Same contract as [`Self::bind_result`], plus empty-vector rejection.
    pub fn bind_result_vector(
        &mut self,
        position: usize,
        ty: ExchangeType,
        len: usize,
        with_indicator: bool,
    ) -> Result<(), WirebindError> {
        if self.plan.is_none() {
            return Err(WirebindError::InternalError(
                "bind_result_vector called before prepare".into(),
            ));
        }
        let declared_size = if ty.is_text() {
            Some(self.describer.column_size(position)?)
        } else {
            None
        };
        let (binder, wide) = VectorResultBinder::define(
            position,
            ty,
            len,
            with_indicator,
            declared_size,
            &self.options,
            self.fetch_by_rows,
        )?;
        if wide && !self.fetch_by_rows {
            self.fetch_by_rows = true;
            for existing in &mut self.results {
                existing.enter_row_mode();
            }
        }
        self.install_result(ResultBinder::Vector(binder))
    }

    /// Describe the pending result set, caching the shape until re-prepare.
    ///
    /// # Errors
    /// `InternalError` before prepare; `ProtocolError` when metadata cannot
    /// be read.
    pub fn describe(&mut self) -> Result<&ResultShape, WirebindError> {
        if self.plan.is_none() {
            return Err(WirebindError::InternalError(
                "describe called before prepare".into(),
            ));
        }
        self.describer
            .prepare_for_describe(&mut self.handle)
            .map_err(|diag| WirebindError::protocol("describing result metadata", diag))?;
        self.describer.shape().ok_or_else(|| {
            WirebindError::InternalError("describe cache empty after prepare_for_describe".into())
        })
    }

    /// Cached description of one 1-based column.
    ///
    /// # Errors
    /// `InternalError` when no describe has run for this prepare.
    pub fn column_info(&self, position: usize) -> Result<&ColumnInfo, WirebindError> {
        self.describer.describe_column(position)
    }

    /// Bind all registered parameters and execute. When `requested_rows >
    /// 0` and the statement produces a result set with registered result
    /// bindings, the first fetch happens immediately; its row count is
    /// available from [`Self::get_number_of_rows`].
    ///
    /// # Errors
    /// Configuration errors from descriptor assembly, or `ProtocolError`
    /// from the bind+execute call.
    pub fn execute(&mut self, requested_rows: usize) -> Result<ExecuteResult, WirebindError> {
        if matches!(self.state, StatementState::Unprepared) {
            return Err(WirebindError::InternalError(
                "execute called before prepare".into(),
            ));
        }

        let batch = self.input_batch()?;
        if let Some(batch) = batch {
            self.handle
                .set_input_batch(batch)
                .map_err(|diag| WirebindError::protocol("setting input batch size", diag))?;
        }

        self.check_positions()?;
        for binder in &mut self.params {
            binder.prepare_buffers();
        }
        let mut ordered: Vec<&ParamBinder> = self.params.iter().collect();
        ordered.sort_by_key(|b| b.position());
        let bindings: Vec<ParamBinding<'_>> = ordered.iter().map(|b| b.to_wire()).collect();

        tracing::debug!(parameters = bindings.len(), batch = ?batch, "executing statement");
        self.handle
            .execute(&bindings)
            .map_err(|diag| WirebindError::protocol("statement execute failed", diag))?;
        drop(bindings);
        drop(ordered);

        let rows_affected = self.handle.affected_rows().map_err(|diag| {
            WirebindError::protocol("error getting number of affected rows", diag)
        })?;
        self.rows_affected = i64::try_from(rows_affected).unwrap_or(i64::MAX);

        for binder in &mut self.params {
            binder.post_use();
        }

        let has_result_set = self.handle.field_count() > 0;
        self.state = StatementState::Executed;
        self.rows_fetched = 0;

        if requested_rows > 0 && has_result_set && !self.results.is_empty() {
            self.fetch(requested_rows)?;
        }

        Ok(ExecuteResult {
            rows_affected,
            has_result_set,
        })
    }

    /// Fetch up to `requested_rows` into the registered result bindings.
    ///
    /// # Errors
    /// A hard protocol failure aborts immediately and surfaces the
    /// diagnostic rather than a partial row count.
    pub fn fetch(&mut self, requested_rows: usize) -> Result<FetchResult, WirebindError> {
        match self.state {
            StatementState::Executed | StatementState::Fetching => {}
            StatementState::Exhausted => {
                self.rows_fetched = 0;
                return Ok(FetchResult {
                    rows_fetched: 0,
                    exhausted: true,
                });
            }
            StatementState::Unprepared | StatementState::Prepared => {
                return Err(WirebindError::InternalError(
                    "fetch called before execute".into(),
                ));
            }
        }
        if self.results.is_empty() {
            return Err(WirebindError::InternalError(
                "fetch called with no result bindings".into(),
            ));
        }

        // Scalar bindings hold exactly one row per fetch call.
        let requested = if self.results.iter().any(ResultBinder::is_vector) {
            requested_rows
        } else {
            requested_rows.min(1)
        };

        self.rows_fetched = 0;
        for binder in &mut self.results {
            binder.resize(requested);
        }

        if self.fetch_by_rows {
            self.fetch_row_at_a_time(requested)
        } else {
            self.fetch_columnar(requested)
        }
    }

    /// Affected-row count of the last execute; -1 before any execution.
    #[must_use]
    pub fn get_affected_rows(&self) -> i64 {
        self.rows_affected
    }

    /// Rows actually retrieved by the last fetch call, not rows requested.
    #[must_use]
    pub fn get_number_of_rows(&self) -> usize {
        self.rows_fetched
    }

    /// Materialized scalar value at `position`; `None` when the row was
    /// null.
    ///
    /// # Errors
    /// Configuration error when the position has no scalar result binding.
    pub fn result_value(&self, position: usize) -> Result<Option<&ExchangeValue>, WirebindError> {
        match self.result_binder(position)? {
            ResultBinder::Scalar(b) => Ok(b.value()),
            ResultBinder::Vector(_) => Err(WirebindError::ConfigError(format!(
                "result binding at position {position} is a vector"
            ))),
        }
    }

    /// Indicator observed for the scalar result at `position`.
    ///
    /// # Errors
    /// Configuration error when the position has no scalar result binding.
    pub fn result_indicator(&self, position: usize) -> Result<Option<Indicator>, WirebindError> {
        match self.result_binder(position)? {
            ResultBinder::Scalar(b) => Ok(b.indicator()),
            ResultBinder::Vector(_) => Err(WirebindError::ConfigError(format!(
                "result binding at position {position} is a vector"
            ))),
        }
    }

    /// Destination vector of the bulk result at `position`.
    ///
    /// # Errors
    /// Configuration error when the position has no vector result binding.
    pub fn vector_result(&self, position: usize) -> Result<&VectorValue, WirebindError> {
        match self.result_binder(position)? {
            ResultBinder::Vector(b) => Ok(b.values()),
            ResultBinder::Scalar(_) => Err(WirebindError::ConfigError(format!(
                "result binding at position {position} is scalar"
            ))),
        }
    }

    /// Per-row indicators of the bulk result at `position`, when a sink
    /// was requested.
    ///
    /// # Errors
    /// Configuration error when the position has no vector result binding.
    pub fn vector_indicators(
        &self,
        position: usize,
    ) -> Result<Option<&[Indicator]>, WirebindError> {
        match self.result_binder(position)? {
            ResultBinder::Vector(b) => Ok(b.indicators()),
            ResultBinder::Scalar(_) => Err(WirebindError::ConfigError(format!(
                "result binding at position {position} is scalar"
            ))),
        }
    }

    /// Post-execution outcome of the scalar parameter at `position`.
    ///
    /// # Errors
    /// Configuration error when the position has no scalar parameter.
    pub fn parameter_outcome(&self, position: usize) -> Result<Option<Indicator>, WirebindError> {
        let binder = self
            .params
            .iter()
            .find(|b| b.position() == position)
            .ok_or_else(|| {
                WirebindError::ConfigError(format!("no parameter binding at position {position}"))
            })?;
        match binder {
            ParamBinder::Scalar(b) => Ok(b.outcome()),
            ParamBinder::Vector(_) => Err(WirebindError::ConfigError(format!(
                "parameter binding at position {position} is a vector"
            ))),
        }
    }

    /// Release one result binding: frees its buffers and removes it from
    /// the active list so the storage can never be re-registered stale.
    pub fn release_result(&mut self, position: usize) {
        if let Some(index) = self.results.iter().position(|b| b.position() == position) {
            let mut binder = self.results.remove(index);
            binder.clean_up();
        }
    }

    /// Release every binder buffer and close the protocol handle. Safe to
    /// call any number of times; also runs on drop.
    pub fn clean_up(&mut self) {
        tracing::debug!("cleaning up statement");
        self.rows_affected = -1;
        self.clear_binders();
        self.describer.invalidate();
        self.plan = None;
        self.state = StatementState::Unprepared;
        self.handle.close();
    }

    fn clear_binders(&mut self) {
        for binder in &mut self.params {
            binder.clean_up();
        }
        for binder in &mut self.results {
            binder.clean_up();
        }
        self.params.clear();
        self.results.clear();
    }

    fn install_param(&mut self, binder: ParamBinder) -> Result<(), WirebindError> {
        let position = binder.position();
        if let Some(existing) = self.params.iter_mut().find(|b| b.position() == position) {
            if existing.exchange_type() != binder.exchange_type()
                || existing.is_vector() != binder.is_vector()
            {
                return Err(WirebindError::ConfigError(format!(
                    "exchange type for parameter {position} is fixed for the statement's lifetime"
                )));
            }
            *existing = binder;
        } else {
            self.params.push(binder);
        }
        Ok(())
    }

    fn install_result(&mut self, binder: ResultBinder) -> Result<(), WirebindError> {
        let position = binder.position();
        if let Some(existing) = self.results.iter_mut().find(|b| b.position() == position) {
            if existing.exchange_type() != binder.exchange_type()
                || existing.is_vector() != binder.is_vector()
            {
                return Err(WirebindError::ConfigError(format!(
                    "exchange type for result {position} is fixed for the statement's lifetime"
                )));
            }
            let mut old = std::mem::replace(existing, binder);
            old.clean_up();
            return Ok(());
        }
        if let Some(first) = self.results.first()
            && first.is_vector() != binder.is_vector()
        {
            return Err(WirebindError::ConfigError(
                "scalar and vector result bindings cannot be mixed on one statement".into(),
            ));
        }
        self.results.push(binder);
        Ok(())
    }

    fn result_binder(&self, position: usize) -> Result<&ResultBinder, WirebindError> {
        self.results
            .iter()
            .find(|b| b.position() == position)
            .ok_or_else(|| {
                WirebindError::ConfigError(format!("no result binding at position {position}"))
            })
    }

    /// Input cardinality announced to the protocol: the common vector
    /// length for bulk runs, 1 when scalar parameters exist, nothing when
    /// the statement has no parameters at all.
    fn input_batch(&self) -> Result<Option<usize>, WirebindError> {
        let mut vector_len: Option<usize> = None;
        let mut has_scalar = false;
        for binder in &self.params {
            match binder {
                ParamBinder::Vector(v) => {
                    let len = v.len();
                    if let Some(existing) = vector_len
                        && existing != len
                    {
                        return Err(WirebindError::ConfigError(format!(
                            "bulk parameter vectors disagree on length: {existing} vs {len}"
                        )));
                    }
                    vector_len = Some(len);
                }
                ParamBinder::Scalar(_) => has_scalar = true,
            }
        }
        if let Some(len) = vector_len {
            if has_scalar {
                return Err(WirebindError::ConfigError(
                    "scalar and vector parameters cannot be mixed on one statement".into(),
                ));
            }
            Ok(Some(len))
        } else if has_scalar {
            Ok(Some(1))
        } else {
            Ok(None)
        }
    }

    /// Bound positions must form the contiguous run 1..=N at execute time.
    fn check_positions(&self) -> Result<(), WirebindError> {
        let mut positions: Vec<usize> = self.params.iter().map(ParamBinder::position).collect();
        positions.sort_unstable();
        for (index, position) in positions.iter().enumerate() {
            if *position != index + 1 {
                return Err(WirebindError::ConfigError(format!(
                    "parameter at position {} is not bound",
                    index + 1
                )));
            }
        }
        Ok(())
    }

    fn fetch_columnar(&mut self, requested: usize) -> Result<FetchResult, WirebindError> {
        let mut slots: Vec<ResultBinding<'_>> =
            self.results.iter_mut().map(ResultBinder::wire_slot).collect();
        let reply = self
            .handle
            .fetch(&mut slots)
            .map_err(|diag| WirebindError::protocol("error fetching data", diag))?;
        drop(slots);

        let got = match reply {
            FetchReply::NoData => {
                self.state = StatementState::Exhausted;
                return Ok(FetchResult {
                    rows_fetched: 0,
                    exhausted: true,
                });
            }
            FetchReply::Rows(got) => got.min(requested),
        };
        for binder in &mut self.results {
            binder.post_fetch_rows(0, got)?;
        }
        self.rows_fetched = got;
        let exhausted = got < requested;
        self.state = if exhausted {
            StatementState::Exhausted
        } else {
            StatementState::Fetching
        };
        tracing::debug!(rows = got, exhausted, "columnar fetch complete");
        Ok(FetchResult {
            rows_fetched: got,
            exhausted,
        })
    }

    fn fetch_row_at_a_time(&mut self, requested: usize) -> Result<FetchResult, WirebindError> {
        let mut fetched = 0;
        for row in 0..requested {
            // Every binding is re-registered for this single row; the
            // current registration may still reference the previous row.
            let mut slots: Vec<ResultBinding<'_>> = self
                .results
                .iter_mut()
                .map(|b| b.rebind_row(row))
                .collect();
            let reply = self
                .handle
                .fetch(&mut slots)
                .map_err(|diag| WirebindError::protocol("error fetching data", diag))?;
            drop(slots);
            match reply {
                FetchReply::NoData => break,
                FetchReply::Rows(_) => {}
            }
            for binder in &mut self.results {
                binder.post_fetch_rows(row, row + 1)?;
            }
            fetched += 1;
        }
        self.rows_fetched = fetched;
        let exhausted = fetched < requested;
        self.state = if exhausted {
            StatementState::Exhausted
        } else {
            StatementState::Fetching
        };
        tracing::debug!(rows = fetched, exhausted, "row-at-a-time fetch complete");
        Ok(FetchResult {
            rows_fetched: fetched,
            exhausted,
        })
    }
}

impl<H: StatementHandle> Drop for StatementDriver<H> {
    fn drop(&mut self) {
        self.clean_up();
    }
}
