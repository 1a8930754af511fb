/// Service configuration.
///
/// Passed explicitly into the filter compiler and document projection rather
/// than read from process globals, so each service instance carries its own
/// settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// strftime-style format used when rendering timestamps in documents and
    /// when parsing absolute-time filter values. All times are UTC.
    pub time_format: String,
}

impl Config {
    pub fn new() -> Self {
        Self {
            time_format: "%Y-%m-%dT%H:%M:%SZ".to_string(),
        }
    }

    pub fn time_format(mut self, format: &str) -> Self {
        self.time_format = format.to_string();
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
