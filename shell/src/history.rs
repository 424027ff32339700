/// Append-only log of the command lines submitted to the shell.
///
/// Index `i` always refers to the `i`-th line ever appended: entries are never
/// reordered, edited or removed.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<String>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `line` at the end of the log.
    pub fn append(&mut self, line: impl Into<String>) {
        self.entries.push(line.into());
    }

    /// Entry stored at `index`, if the log is that long.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    /// Lazily enumerate `(index, line)` pairs in insertion order.
    ///
    /// The iterator is `Clone`, so a listing can be restarted from any point.
    pub fn list(&self) -> impl Iterator<Item = (usize, &str)> + Clone + '_ {
        self.entries.iter().map(String::as_str).enumerate()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
