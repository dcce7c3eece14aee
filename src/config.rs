use crate::document::Template;

/// Settings for one documentation run.
#[derive(Debug, Clone)]
pub struct DocsConfig {
    /// Index of the first generated component name (`type<N>`).
    pub first_type_index: u32,
    pub template: Template,
    /// Pretty-print the serialized document.
    pub pretty: bool,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            first_type_index: 1,
            template: Template::default(),
            pretty: false,
        }
    }
}
