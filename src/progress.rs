//! Stage progress reporting for pipeline runs.
//!
//! A run moves through a handful of coarse [`Stage`]s. Observers are told
//! when each one starts and finishes and may request cancellation, which the
//! pipeline honours between stages (cleanup still runs).
//!
//! # Example
//!
//! ```rust
//! use splashpatch::progress::{StageEvent, observer_fn};
//!
//! let observer = observer_fn(|event: &StageEvent| {
//!     if let StageEvent::Started { stage, path } = event {
//!         println!("{stage}: {}", path.display());
//!     }
//! });
//! # let _ = observer;
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::Stage;

/// IEC byte unit: 1 KiB = 1024 bytes.
pub const BYTES_KIB: u64 = 1024;
/// IEC byte unit: 1 MiB = 1024 KiB.
pub const BYTES_MIB: u64 = 1024 * BYTES_KIB;
/// IEC byte unit: 1 GiB = 1024 MiB.
pub const BYTES_GIB: u64 = 1024 * BYTES_MIB;

/// Receives stage transitions from a pipeline run.
pub trait StageObserver {
    /// Called when a stage begins working on `path`.
    fn on_stage_start(&mut self, stage: Stage, path: &Path) {
        let _ = (stage, path);
    }

    /// Called when a stage finishes, successfully or not.
    fn on_stage_complete(&mut self, stage: Stage, success: bool) {
        let _ = (stage, success);
    }

    /// Called for conditions worth showing that do not stop the run.
    fn on_warning(&mut self, message: &str) {
        let _ = message;
    }

    /// Checked before each stage.
    ///
    /// Default implementation returns `false` (no cancellation).
    fn should_cancel(&self) -> bool {
        false
    }
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObserver;

impl StageObserver for NoObserver {}

/// One recorded stage transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageEvent {
    /// A stage started.
    Started {
        /// The stage.
        stage: Stage,
        /// The file it works on.
        path: PathBuf,
    },
    /// A stage finished.
    Completed {
        /// The stage.
        stage: Stage,
        /// Whether it succeeded.
        success: bool,
    },
    /// A non-fatal warning.
    Warning(String),
}

/// Observer that records every event, in order.
#[derive(Debug, Clone, Default)]
pub struct StageLog {
    events: Vec<StageEvent>,
}

impl StageLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded events.
    pub fn events(&self) -> &[StageEvent] {
        &self.events
    }

    /// Returns the stages that started, in order.
    pub fn started(&self) -> Vec<Stage> {
        self.events
            .iter()
            .filter_map(|e| match e {
                StageEvent::Started { stage, .. } => Some(*stage),
                _ => None,
            })
            .collect()
    }
}

impl StageObserver for StageLog {
    fn on_stage_start(&mut self, stage: Stage, path: &Path) {
        self.events.push(StageEvent::Started {
            stage,
            path: path.to_path_buf(),
        });
    }

    fn on_stage_complete(&mut self, stage: Stage, success: bool) {
        self.events.push(StageEvent::Completed { stage, success });
    }

    fn on_warning(&mut self, message: &str) {
        self.events.push(StageEvent::Warning(message.to_string()));
    }
}

/// Shared cancellation flag, settable from another thread (e.g. a Ctrl-C
/// handler) and observed between stages.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Clears a previous request.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Returns true once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Observer that forwards every event to a closure.
pub struct ClosureObserver<F> {
    callback: F,
}

impl<F> std::fmt::Debug for ClosureObserver<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureObserver").finish_non_exhaustive()
    }
}

impl<F> ClosureObserver<F>
where
    F: FnMut(&StageEvent),
{
    /// Creates a new closure observer.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> StageObserver for ClosureObserver<F>
where
    F: FnMut(&StageEvent),
{
    fn on_stage_start(&mut self, stage: Stage, path: &Path) {
        (self.callback)(&StageEvent::Started {
            stage,
            path: path.to_path_buf(),
        });
    }

    fn on_stage_complete(&mut self, stage: Stage, success: bool) {
        (self.callback)(&StageEvent::Completed { stage, success });
    }

    fn on_warning(&mut self, message: &str) {
        (self.callback)(&StageEvent::Warning(message.to_string()));
    }
}

/// Creates an observer from a closure.
pub fn observer_fn<F>(f: F) -> ClosureObserver<F>
where
    F: FnMut(&StageEvent),
{
    ClosureObserver::new(f)
}

/// Formats a byte count using IEC units.
///
/// ```rust
/// use splashpatch::progress::format_bytes_iec;
///
/// assert_eq!(format_bytes_iec(512), "512 B");
/// assert_eq!(format_bytes_iec(1536), "1.5 KiB");
/// ```
pub fn format_bytes_iec(bytes: u64) -> String {
    if bytes < BYTES_KIB {
        format!("{} B", bytes)
    } else if bytes < BYTES_MIB {
        format!("{:.1} KiB", bytes as f64 / BYTES_KIB as f64)
    } else if bytes < BYTES_GIB {
        format!("{:.1} MiB", bytes as f64 / BYTES_MIB as f64)
    } else {
        format!("{:.1} GiB", bytes as f64 / BYTES_GIB as f64)
    }
}

/// Formats a duration as a human-readable string.
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    let secs = duration.as_secs();
    if secs == 0 {
        format!("{}ms", millis)
    } else if secs < 60 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
