use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Linear rescaling applied by a sink to every reported percentage.
///
/// Used to map a single item's 0-100 progress into its slice of an overall
/// run: `mapped = offset + scale * percent`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressMapping {
    pub scale: f64,
    pub offset: f64,
}

impl ProgressMapping {
    /// The identity mapping: percentages pass through unchanged
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        offset: 0.0,
    };

    /// Mapping for one item's window `[offset, offset + width]` of the
    /// overall 0-100 range, where the item itself reports 0-100
    pub fn window(offset: f64, width: f64) -> Self {
        Self {
            scale: width / 100.0,
            offset,
        }
    }

    pub fn apply(&self, percent: f64) -> f64 {
        self.offset + self.scale * percent
    }
}

impl Default for ProgressMapping {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Contract between the download core and whatever surface renders progress
/// and requests cancellation.
///
/// The core polls `is_cancelled` at its suspension points and pushes
/// percentages through `report_progress`; it installs a window mapping
/// around each item's transfer and clears it afterwards. `reset` belongs to
/// the controlling side and is called between runs, never by the core.
pub trait ProgressSink: Send + Sync {
    /// True once the controlling side has requested cancellation
    fn is_cancelled(&self) -> bool;

    /// Report a progress percentage (0-100, pre-mapping)
    fn report_progress(&self, percent: f64);

    /// Install a rescaling applied to subsequent reports
    fn install_mapping(&self, mapping: ProgressMapping);

    /// Restore the identity mapping
    fn clear_mapping(&self);

    /// Clear cancellation and progress for a new run (caller-side)
    fn reset(&self);
}

/// A shared reference to a progress sink
pub type SharedProgressSink = Arc<dyn ProgressSink>;

/// Thread-safe default sink: an atomic cancellation flag and an atomic
/// progress cell, readable from the controlling side while the core writes.
///
/// The published value only moves forward within a run; a retried transfer
/// restarts its own reporting at 0 but the cell keeps the high-water mark
/// until `reset`.
#[derive(Debug, Default)]
pub struct ProgressHandle {
    cancelled: AtomicBool,
    // f64 stored as bits so the cell stays lock-free
    progress: AtomicU64,
    mapping: Mutex<ProgressMapping>,
}

impl ProgressHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new handle wrapped in an Arc
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Request cooperative cancellation; honored at the core's next poll
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Current mapped progress value
    pub fn progress(&self) -> f64 {
        f64::from_bits(self.progress.load(Ordering::SeqCst))
    }
}

impl ProgressSink for ProgressHandle {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn report_progress(&self, percent: f64) {
        let mapped = self.mapping.lock().unwrap().apply(percent);
        let _ = self
            .progress
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |bits| {
                (mapped > f64::from_bits(bits)).then(|| mapped.to_bits())
            });
    }

    fn install_mapping(&self, mapping: ProgressMapping) {
        *self.mapping.lock().unwrap() = mapping;
    }

    fn clear_mapping(&self) {
        *self.mapping.lock().unwrap() = ProgressMapping::IDENTITY;
    }

    fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
        self.progress.store(0f64.to_bits(), Ordering::SeqCst);
    }
}
