use std::time::Duration;

/// Tunables of an [`AddManager`][crate::manager::AddManager].
///
/// ```
/// use std::time::Duration;
/// use add_rs::config::AddConfig;
/// use add_rs::manager::AddManager;
///
/// let mgr = AddManager::with_config(AddConfig {
///     time_limit: Some(Duration::from_secs(5)),
///     ..AddConfig::default()
/// });
/// assert_eq!(mgr.num_vars(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct AddConfig {
    /// Hard limit on the number of nodes (terminals included) held at once.
    pub max_nodes: usize,
    /// Live-node count that triggers an automatic garbage collection.
    pub gc_threshold: usize,
    /// Whether the constructor may collect garbage on its own.
    pub auto_gc: bool,
    /// Initial capacity of the operation cache, as a power of two.
    pub cache_bits: usize,
    /// How many times a public operation restarts after reordering before giving up.
    ///
    /// `0` means the first reorder fails the operation.
    pub max_restarts: usize,
    /// Wall-clock budget for a single public operation.
    pub time_limit: Option<Duration>,
}

impl Default for AddConfig {
    fn default() -> Self {
        Self {
            max_nodes: 1 << 24,
            gc_threshold: 1 << 16,
            auto_gc: true,
            cache_bits: 14,
            max_restarts: 64,
            time_limit: None,
        }
    }
}
