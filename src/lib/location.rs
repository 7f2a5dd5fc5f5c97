use super::*;
use std::sync::Arc;
use std::time::Duration;

/// Name under which the background tracking task is registered.
pub const LOCATION_TASK: &str = "background-location-task";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accuracy {
    Lowest,
    Low,
    Balanced,
    High,
    Highest,
}

/// Parameters for background location updates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingOptions {
    pub accuracy: Accuracy,
    /// Minimum movement between two reports in meters.
    pub distance_interval: f64,
    /// Maximum time the platform may hold back reports to batch them.
    pub deferred_updates_interval: Duration,
    pub shows_background_indicator: bool,
}

impl Default for TrackingOptions {
    fn default() -> Self {
        Self {
            accuracy: Accuracy::High,
            distance_interval: 100.0,
            deferred_updates_interval: Duration::from_millis(1000),
            shows_background_indicator: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("location access is not permitted")]
    PermissionDenied,
    #[error("location is unavailable: {0}")]
    Unavailable(String),
    #[error("task {0} is already tracking")]
    AlreadyTracking(String),
}

/// Receives a batch of positions, or the error the platform ran into.
pub type UpdateCallback = Arc<dyn Fn(Result<Vec<Coordinates>, LocationError>) + Send + Sync>;

/// Position reads of the host platform.
pub trait LocationProvider: Send + Sync {
    /// Read the current position once.
    fn current_position(&self) -> Result<Coordinates, LocationError>;

    /// Register a background task which calls `callback` whenever the platform
    /// decides to report new positions.
    ///
    /// The callback is invoked from a platform thread, concurrently with the foreground.
    fn start_updates(
        &self,
        task: &str,
        options: TrackingOptions,
        callback: UpdateCallback,
    ) -> Result<(), LocationError>;
}

#[test]
fn test_tracking_defaults() {
    let options = TrackingOptions::default();
    assert_eq!(options.accuracy, Accuracy::High);
    assert_eq!(options.distance_interval, 100.0);
    assert_eq!(options.deferred_updates_interval, Duration::from_millis(1000));
    assert!(options.shows_background_indicator);
}
