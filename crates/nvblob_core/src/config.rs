//! Manager configuration.

/// Configuration for a [`crate::BlobStoreManager`].
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Whether `setup` erases and retries once when initialization reports
    /// no free pages or a new format version.
    pub recover_on_init_error: bool,

    /// Largest segment capacity `put` accepts (`None` = no limit).
    pub max_segment_capacity: Option<usize>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            recover_on_init_error: true,
            max_segment_capacity: None,
        }
    }
}

impl ManagerConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether `setup` falls back to erase-and-retry.
    #[must_use]
    pub const fn recover_on_init_error(mut self, value: bool) -> Self {
        self.recover_on_init_error = value;
        self
    }

    /// Sets the largest segment capacity `put` accepts.
    #[must_use]
    pub const fn max_segment_capacity(mut self, limit: usize) -> Self {
        self.max_segment_capacity = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ManagerConfig::default();
        assert!(config.recover_on_init_error);
        assert!(config.max_segment_capacity.is_none());
    }

    #[test]
    fn builder_pattern() {
        let config = ManagerConfig::new()
            .recover_on_init_error(false)
            .max_segment_capacity(4000);

        assert!(!config.recover_on_init_error);
        assert_eq!(config.max_segment_capacity, Some(4000));
    }
}
