use serde::{Deserialize, Serialize};

/// Tuning knobs for ring perception.
///
/// The defaults give incremental detection with fused-ring simplification,
/// which is what layout code expects. Missing fields deserialize to their
/// defaults; unknown fields are rejected.
///
/// # Examples
///
/// ```
/// use ringcrab::{GraphManager, PerceptionConfig};
///
/// let config = PerceptionConfig {
///     simplify: false,
///     ..PerceptionConfig::default()
/// };
/// let graph = GraphManager::<(), ()>::with_config(config);
/// assert!(!graph.config().simplify);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PerceptionConfig {
    /// Search only for the ring a new edge closes. When `false`, any
    /// insertion that closes a ring rebuilds the whole component instead.
    pub incremental: bool,
    /// Decompose over-large fused detections into smaller rings after
    /// every publication.
    pub simplify: bool,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            incremental: true,
            simplify: true,
        }
    }
}
