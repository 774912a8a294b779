#[derive(Debug, Clone)]
pub struct FormatterConfig {
    pub indent_spaces: usize,
    /// Spaces around infix operators.
    pub operator_spacing: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            indent_spaces: 4,
            operator_spacing: true,
        }
    }
}
