mod scanner;

use scanner::{State, is_name_byte};

/// A prepared query after placeholder rewriting.
///
/// Built once by `prepare` and immutable afterwards. The name list is
/// ordered by placeholder position (1-based), not by bind order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    sql: String,
    names: Vec<String>,
    source_len: usize,
}

impl QueryPlan {
    /// Wrap an already-positional query without rewriting it.
    #[must_use]
    pub fn verbatim(query: &str) -> Self {
        Self {
            sql: query.to_string(),
            names: Vec::new(),
            source_len: query.len(),
        }
    }

    /// The rewritten, positional query text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Placeholder names in positional order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Name of the placeholder at 1-based `position`.
    #[must_use]
    pub fn parameter_name(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .and_then(|index| self.names.get(index))
            .map(String::as_str)
    }

    /// 1-based position of the first placeholder with this name.
    #[must_use]
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name).map(|i| i + 1)
    }

    /// Length of the pre-rewrite query text, kept as a capacity hint.
    #[must_use]
    pub fn source_len(&self) -> usize {
        self.source_len
    }
}

/// Rewrite every `:name` placeholder into a positional `?` marker,
/// recording the names in the order encountered.
///
/// Quote- and `#...#`-aware: no substitution happens inside single-quoted
/// or hash-delimited runs. A name still open at end of input is finalized.
/// Any input produces a valid rewrite; a query without named placeholders
/// comes back byte-identical.
#[must_use]
pub fn rewrite_named_placeholders(query: &str) -> QueryPlan {
    let bytes = query.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(query.len());
    let mut names = Vec::new();
    let mut name = String::new();
    let mut state = State::Normal;

    let mut idx = 0;
    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => {
                    out.push(b);
                    state = State::Quoted;
                }
                b'#' => {
                    out.push(b);
                    state = State::HashDelimited;
                }
                b':' => state = State::Name,
                _ => out.push(b),
            },
            State::Quoted => {
                out.push(b);
                if b == b'\'' {
                    state = State::Normal;
                }
            }
            State::HashDelimited => {
                out.push(b);
                if b == b'#' {
                    state = State::Normal;
                }
            }
            State::Name => {
                if is_name_byte(b) {
                    name.push(b as char);
                } else {
                    names.push(std::mem::take(&mut name));
                    out.push(b'?');
                    state = State::Normal;
                    // The terminator is re-processed in Normal state, so a
                    // directly adjacent placeholder still starts a name.
                    continue;
                }
            }
        }
        idx += 1;
    }

    if matches!(state, State::Name) {
        names.push(name);
        out.push(b'?');
    }

    QueryPlan {
        // Only ASCII bytes were spliced in or out, so the rewrite preserves
        // whatever encoding the input had.
        sql: String::from_utf8_lossy(&out).into_owned(),
        names,
        source_len: query.len(),
    }
}
