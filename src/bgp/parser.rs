//! BGP table parser for raw "show ip bgp" captures
//!
//! A capture is whatever the terminal session recorded: banners, prompts,
//! legend lines and the table itself. Only lines starting with the status
//! marker are table rows. When the router omits the network column on a
//! continuation row, the second token is the next hop instead; the
//! exchange's reference prefix set recognises those and the last
//! authoritative network is carried forward.

use super::prefixes::ReferencePrefixSet;
use super::records::{NetworkRecord, OriginAttribute};
use serde::Serialize;

/// Default status marker of a table row
pub const DEFAULT_MARKER: char = '*';

/// Default column where the Path column starts in a Cisco-style table
pub const DEFAULT_PATH_COLUMN: usize = 61;

/// BGP origin codes that terminate an AS path
const ORIGIN_CODES: [&str; 3] = ["i", "e", "?"];

/// Which origin attribute a capture is reduced to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportVariant {
    /// Origin AS of each route (last AS before the origin code)
    #[default]
    Origin,
    /// Neighbour AS, the first token of the Path column
    Connected,
}

/// Counters collected during one parse pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    /// Lines seen
    pub lines: usize,
    /// Lines recognised as table rows
    pub rows: usize,
    /// Rows whose network was carried forward
    pub continuations: usize,
    /// Rows joined with a wrapped follow-up line
    pub wrapped: usize,
    /// Rows dropped for lacking a usable network field
    pub malformed: usize,
}

/// Records and counters of one parse pass
#[derive(Debug, Clone, Default)]
pub struct ParseOutput {
    /// Reconstructed rows, in capture order
    pub records: Vec<NetworkRecord>,
    /// Parse counters
    pub stats: ParseStats,
}

/// Parser for one exchange's capture layout
#[derive(Debug, Clone)]
pub struct TableParser {
    prefixes: ReferencePrefixSet,
    variant: ReportVariant,
    marker: char,
    path_column: usize,
}

/// Fold accumulator of a parse pass
#[derive(Default)]
struct ParseState {
    last_network: String,
    /// Row whose path has not started yet, waiting for its wrapped tail
    pending: Option<String>,
    output: ParseOutput,
}

impl TableParser {
    /// Create a parser for the given reference prefixes and variant
    pub fn new(prefixes: ReferencePrefixSet, variant: ReportVariant) -> Self {
        if prefixes.is_empty() {
            tracing::debug!("Continuation heuristic unavailable, parsing network column literally");
        }
        Self {
            prefixes,
            variant,
            marker: DEFAULT_MARKER,
            path_column: DEFAULT_PATH_COLUMN,
        }
    }

    /// Use a different status marker character
    pub fn with_marker(mut self, marker: char) -> Self {
        self.marker = marker;
        self
    }

    /// Use a different column for the start of the Path field
    pub fn with_path_column(mut self, path_column: usize) -> Self {
        self.path_column = path_column;
        self
    }

    /// Parse a whole capture held in memory
    pub fn parse_str(&self, capture: &str) -> ParseOutput {
        self.parse(capture.lines())
    }

    /// Parse a sequence of capture lines
    ///
    /// Parsing is a pure function of its input; a truncated capture parses
    /// as far as it goes.
    pub fn parse<'a, I>(&self, lines: I) -> ParseOutput
    where
        I: IntoIterator<Item = &'a str>,
    {
        let state = lines
            .into_iter()
            .fold(ParseState::default(), |state, line| self.step(state, line));
        self.finish(state)
    }

    fn step(&self, mut state: ParseState, line: &str) -> ParseState {
        state.output.stats.lines += 1;
        let line = line.trim_end_matches('\r');

        if let Some(head) = state.pending.take() {
            if !line.starts_with(self.marker)
                && line.starts_with(char::is_whitespace)
                && !line.trim().is_empty()
            {
                state.output.stats.wrapped += 1;
                let joined = format!("{head} {line}");
                self.emit_row(&mut state, &joined, line);
                return state;
            }
            self.flush_pending(&mut state, &head);
        }

        if !line.starts_with(self.marker) {
            return state;
        }
        state.output.stats.rows += 1;

        if line.split_whitespace().nth(1).is_none() {
            state.output.stats.malformed += 1;
        } else if self.has_path(line) {
            self.emit_row(&mut state, line, line);
        } else {
            state.pending = Some(line.to_string());
        }
        state
    }

    fn finish(&self, mut state: ParseState) -> ParseOutput {
        if let Some(head) = state.pending.take() {
            self.flush_pending(&mut state, &head);
        }
        state.output
    }

    /// Whether the path (or at least the origin code) is on this line
    ///
    /// The router wraps long prefixes and IPv6 next hops, pushing the
    /// path onto the following line.
    fn has_path(&self, line: &str) -> bool {
        ends_with_origin_code(line) || token_at(line, self.path_column).is_some()
    }

    /// Emit a complete row; `path_line` is the physical line holding its path
    fn emit_row(&self, state: &mut ParseState, row: &str, path_line: &str) {
        let tokens: Vec<&str> = row.split_whitespace().collect();
        let field = tokens.get(1).copied().unwrap_or_default();
        let continuation = self.is_continuation(field);
        // marker and network, plus the next hop when the network is present
        let leading = if continuation { 2 } else { 3 };
        let origin = self.origin_of(&tokens, path_line, leading);
        self.emit(state, field, continuation, origin);
    }

    /// A row whose path never came still names its network
    fn flush_pending(&self, state: &mut ParseState, head: &str) {
        let field = head.split_whitespace().nth(1).unwrap_or_default();
        let continuation = self.is_continuation(field);
        self.emit(state, field, continuation, None);
    }

    fn is_continuation(&self, field: &str) -> bool {
        !self.prefixes.is_empty() && !self.prefixes.is_authoritative(field)
    }

    fn emit(
        &self,
        state: &mut ParseState,
        field: &str,
        continuation: bool,
        origin: Option<OriginAttribute>,
    ) {
        let network = if continuation {
            state.output.stats.continuations += 1;
            state.last_network.clone()
        } else {
            state.last_network = field.to_string();
            state.last_network.clone()
        };

        if network.is_empty() {
            state.output.stats.malformed += 1;
            return;
        }

        state.output.records.push(NetworkRecord { network, origin });
    }

    /// Extract the origin attribute of a row
    ///
    /// `leading` is the number of tokens before the AS path; they are never
    /// taken as the origin. Without a trailing origin code the row was cut
    /// short, and only a token inside the Path column counts.
    fn origin_of(&self, tokens: &[&str], path_line: &str, leading: usize) -> Option<OriginAttribute> {
        match self.variant {
            ReportVariant::Origin => {
                let last = tokens.len().checked_sub(1)?;
                if ORIGIN_CODES.contains(&tokens[last]) {
                    let index = last.checked_sub(1)?;
                    return (index >= leading)
                        .then(|| OriginAttribute::from_token(tokens[index]))
                        .flatten();
                }
                if last < leading {
                    return None;
                }
                OriginAttribute::from_token(last_token_from(path_line, self.path_column)?)
            }
            ReportVariant::Connected => {
                let token = token_at(path_line, self.path_column)?;
                if ORIGIN_CODES.contains(&token) {
                    return None;
                }
                OriginAttribute::from_token(token)
            }
        }
    }
}

fn ends_with_origin_code(line: &str) -> bool {
    line.split_whitespace()
        .last()
        .is_some_and(|t| ORIGIN_CODES.contains(&t))
}

/// First token at or after `column`
fn token_at(line: &str, column: usize) -> Option<&str> {
    line.get(column..)?.split_whitespace().next()
}

/// Last token of the line, if it starts at or after `column`
fn last_token_from(line: &str, column: usize) -> Option<&str> {
    let line = line.trim_end();
    let start = line
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map_or(0, |(i, c)| i + c.len_utf8());
    (start >= column && start < line.len()).then(|| &line[start..])
}
