/// Tracks the printed-column references seen while a section is open and
/// collapses them to their boundary values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnRange {
    start: Option<String>,
    end: Option<String>,
}

impl ColumnRange {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first non-empty observation becomes the start column; every later
    /// one supersedes the end column.
    pub fn observe(&mut self, column: &str) {
        let column = column.trim();
        if column.is_empty() {
            return;
        }
        match self.start {
            None => self.start = Some(column.to_string()),
            Some(_) => self.end = Some(column.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none()
    }

    /// Boundary columns only: intermediate observations are discarded.
    pub fn finalize(&self) -> Vec<String> {
        match (&self.start, &self.end) {
            (None, _) => Vec::new(),
            (Some(start), None) => vec![start.clone()],
            (Some(start), Some(end)) if start == end => vec![start.clone()],
            (Some(start), Some(end)) => vec![start.clone(), end.clone()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_range() {
        let range = ColumnRange::new();
        assert!(range.is_empty());
        assert!(range.finalize().is_empty());
    }

    #[test]
    fn test_single_column() {
        let mut range = ColumnRange::new();
        range.observe("831");
        assert_eq!(range.finalize(), vec!["831"]);
    }

    #[test]
    fn test_repeated_column_stored_once() {
        let mut range = ColumnRange::new();
        range.observe("831");
        range.observe("831");
        range.observe("831");
        assert_eq!(range.finalize(), vec!["831"]);
    }

    #[test]
    fn test_intermediate_columns_dropped() {
        let mut range = ColumnRange::new();
        for column in ["184WH", "185WH", "186WH", "187WH"] {
            range.observe(column);
        }
        assert_eq!(range.finalize(), vec!["184WH", "187WH"]);
    }

    #[test]
    fn test_blank_observations_ignored() {
        let mut range = ColumnRange::new();
        range.observe("  ");
        range.observe("12");
        range.observe("");
        assert_eq!(range.finalize(), vec!["12"]);
    }
}
