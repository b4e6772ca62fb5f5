/*!
 * Shard Configuration Manager
 *
 * CPU-topology-aware shard count calculation for the segmented caches.
 * Power-of-2 shards enable shard selection via `hash & mask`.
 */

use std::sync::OnceLock;

/// Global singleton for hardware-aware shard configuration
static SHARD_MANAGER: OnceLock<ShardManager> = OnceLock::new();

/// Hardware-aware shard configuration calculator
#[derive(Debug, Clone)]
pub struct ShardManager {
    cpu_count: usize,
}

impl ShardManager {
    /// Get or initialize the global shard manager instance
    fn instance() -> &'static Self {
        SHARD_MANAGER.get_or_init(|| {
            let cpu_count = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or_else(|_| {
                    tracing::warn!("Failed to detect CPU count, defaulting to 8");
                    8
                });

            tracing::debug!(cpu_count, "ShardManager initialized");
            Self { cpu_count }
        })
    }

    /// Calculate shard count for a given workload profile
    pub fn shards(profile: WorkloadProfile) -> usize {
        let base = Self::instance().cpu_count;

        let multiplier = match profile {
            // Lock descriptors are consulted on every mutation
            WorkloadProfile::HighContention => 4,
            // Metadata maps are read often, written rarely
            WorkloadProfile::MediumContention => 2,
            WorkloadProfile::LowContention => 1,
        };

        Self::normalize(base * multiplier).clamp(4, 256)
    }

    /// Round a requested shard count up to the next power of two
    pub fn normalize(requested: usize) -> usize {
        requested.max(1).next_power_of_two()
    }

    /// Get the CPU count detected at initialization
    pub fn cpu_count() -> usize {
        Self::instance().cpu_count
    }
}

/// Workload characterization for shard count calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadProfile {
    /// Shard count: 4x CPU cores
    HighContention,

    /// Shard count: 2x CPU cores
    MediumContention,

    /// Shard count: 1x CPU cores
    LowContention,
}
