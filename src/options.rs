/// Whether `prepare` rewrites `:name` placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RewriteMode {
    /// Rewrite named placeholders into positional markers.
    #[default]
    Named,
    /// Pass the query through untouched (already positional).
    Passthrough,
}

/// Widest declared text column (bytes) still fetched with one columnar
/// batch buffer.
pub const DEFAULT_COLUMNAR_TEXT_LIMIT: usize = 8 * 1024;

/// Per-row buffer capacity for a text column whose declared width the
/// protocol reports as unknown.
pub const DEFAULT_UNBOUNDED_TEXT_CAPACITY: usize = 1024 * 1024;

/// Per-statement tuning knobs.
///
/// # Examples
/// ```rust
/// use wirebind::options::{RewriteMode, StatementOptions};
///
/// let options = StatementOptions::default().with_rewrite(RewriteMode::Passthrough);
/// # let _ = options;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementOptions {
    pub rewrite: RewriteMode,
    /// Text columns declared wider than this downgrade the whole statement
    /// to row-at-a-time fetches.
    pub columnar_text_limit: usize,
    /// Buffer capacity used when a text column's declared width is unknown.
    pub unbounded_text_capacity: usize,
}

impl Default for StatementOptions {
    fn default() -> Self {
        Self {
            rewrite: RewriteMode::default(),
            columnar_text_limit: DEFAULT_COLUMNAR_TEXT_LIMIT,
            unbounded_text_capacity: DEFAULT_UNBOUNDED_TEXT_CAPACITY,
        }
    }
}

impl StatementOptions {
    #[must_use]
    pub fn with_rewrite(mut self, rewrite: RewriteMode) -> Self {
        self.rewrite = rewrite;
        self
    }

    #[must_use]
    pub fn with_columnar_text_limit(mut self, limit: usize) -> Self {
        self.columnar_text_limit = limit;
        self
    }

    #[must_use]
    pub fn with_unbounded_text_capacity(mut self, capacity: usize) -> Self {
        self.unbounded_text_capacity = capacity;
        self
    }
}
