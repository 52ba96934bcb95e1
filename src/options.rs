//! Load-time options

/// How markup is turned into a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Drop whitespace-only runs between a `>` and the next `<` before parsing
    pub collapse_whitespace: bool,
    /// Try the strict well-formed reader before the lenient HTML5 parse
    pub strict_first: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            collapse_whitespace: true,
            strict_first: true,
        }
    }
}

impl LoadOptions {
    pub fn collapse_whitespace(mut self, collapse: bool) -> Self {
        self.collapse_whitespace = collapse;
        self
    }

    pub fn strict_first(mut self, strict: bool) -> Self {
        self.strict_first = strict;
        self
    }
}
