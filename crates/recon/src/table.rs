//! Raw source tables as handed over by the I/O layer.

use crate::error::ReportError;

/// A named grid of text cells with a header row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceTable {
    pub source: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SourceTable {
    pub fn new(source: &str, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            source: source.to_string(),
            headers: headers.into_iter().map(|h| h.trim().to_string()).collect(),
            rows,
        }
    }

    /// Build from a raw grid whose first row is the header row.
    pub fn from_grid(source: &str, mut grid: Vec<Vec<String>>) -> Self {
        if grid.is_empty() {
            return Self::new(source, Vec::new(), Vec::new());
        }
        let headers = grid.remove(0);
        Self::new(source, headers, grid)
    }

    /// Index of the first column named `name`.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Index of a required column, or a schema error naming column and source.
    pub fn require(&self, name: &str) -> Result<usize, ReportError> {
        self.column(name)
            .ok_or_else(|| ReportError::missing_column(&self.source, name))
    }

    /// Fail when the table has no header at all.
    pub fn require_header(&self) -> Result<(), ReportError> {
        if self.headers.iter().all(|h| h.is_empty()) {
            return Err(ReportError::EmptySource {
                source: self.source.clone(),
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rename_column(&mut self, from: &str, to: &str) {
        if let Some(idx) = self.column(from) {
            self.headers[idx] = to.to_string();
        }
    }

    /// Drop repeated column names; the first occurrence wins.
    pub fn dedup_columns(mut self) -> Self {
        let mut keep = Vec::with_capacity(self.headers.len());
        for (idx, name) in self.headers.iter().enumerate() {
            keep.push(!self.headers[..idx].contains(name));
        }
        if keep.iter().all(|k| *k) {
            return self;
        }

        let filter = |cells: Vec<String>| -> Vec<String> {
            cells
                .into_iter()
                .enumerate()
                .filter(|(i, _)| keep.get(*i).copied().unwrap_or(true))
                .map(|(_, c)| c)
                .collect()
        };
        self.headers = filter(std::mem::take(&mut self.headers));
        self.rows = std::mem::take(&mut self.rows).into_iter().map(filter).collect();
        self
    }

    /// Find the real header row. If the current header satisfies `is_header`
    /// it is kept; otherwise the first of the next `max_scan` rows that does
    /// is promoted and everything above it is discarded.
    pub fn promote_header<F>(self, max_scan: usize, is_header: F) -> Option<Self>
    where
        F: Fn(&[String]) -> bool,
    {
        if is_header(&self.headers) {
            return Some(self);
        }

        let found = self
            .rows
            .iter()
            .take(max_scan)
            .position(|row| {
                let trimmed: Vec<String> = row.iter().map(|c| c.trim().to_string()).collect();
                is_header(&trimmed)
            })?;

        let mut rows = self.rows;
        let header = rows.remove(found);
        rows.drain(..found);
        Some(Self::new(&self.source, header, rows))
    }
}

/// Cell text at `idx`, empty when the row is short.
pub fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|s| s.as_str()).unwrap_or("")
}

/// Normalized contract key: trimmed and uppercased.
pub fn contract_key(raw: &str) -> String {
    raw.trim().to_uppercase()
}
