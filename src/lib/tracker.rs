use super::*;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    AwaitingPermission,
    Tracking,
    /// A location permission was denied. Only a restart leaves this state.
    Halted(Permission),
}

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error(transparent)]
    Permission(#[from] GateError),
    #[error(transparent)]
    Location(#[from] LocationError),
}

/// The platform services the tracker is built on.
#[derive(Clone)]
pub struct Platform {
    pub permissions: Arc<dyn PermissionProvider>,
    pub location: Arc<dyn LocationProvider>,
    pub notifier: Arc<dyn Notifier>,
    pub alerter: Arc<dyn Alerter>,
}

/// Wires permissions, position reads and delivery to the screen.
///
/// Clones share everything, so the background task holds its own handle.
#[derive(Clone)]
pub struct Tracker {
    gate: Arc<PermissionGate>,
    location: Arc<dyn LocationProvider>,
    delivery: DeliveryClient,
    screen: Screen,
    state: Arc<Mutex<TrackerState>>,
}

impl Tracker {
    pub fn new(platform: Platform, screen: Screen) -> Self {
        Self {
            gate: Arc::new(PermissionGate::new(
                platform.permissions.clone(),
                platform.alerter.clone(),
            )),
            location: platform.location,
            delivery: DeliveryClient::new(platform.notifier),
            screen,
            state: Arc::new(Mutex::new(TrackerState::Idle)),
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn state(&self) -> TrackerState {
        *self.lock_state()
    }

    fn lock_state(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, new: TrackerState) {
        *self.lock_state() = new;
    }

    /// Run the startup sequence once: permissions, a first read and background updates.
    ///
    /// A tracker that already left `Idle` is not started again.
    pub fn mount(&self) -> Result<TrackerState, TrackerError> {
        {
            let mut state = self.lock_state();
            if *state != TrackerState::Idle {
                log::debug!("Tracker is already mounted ({:?}).", *state);
                return Ok(*state);
            }
            *state = TrackerState::AwaitingPermission;
        }

        if let Err(GateError::Denied(permission)) = self.gate.run() {
            self.set_state(TrackerState::Halted(permission));
            return Ok(TrackerState::Halted(permission));
        }

        if let Err(e) = self.start_tracking() {
            self.set_state(TrackerState::Idle);
            return Err(e);
        }
        self.set_state(TrackerState::Tracking);
        Ok(TrackerState::Tracking)
    }

    fn start_tracking(&self) -> Result<(), TrackerError> {
        let coordinates = self.location.current_position()?;
        self.screen
            .set_coordinates(coordinates, UpdateSource::Startup);

        let tracker = self.clone();
        self.location.start_updates(
            LOCATION_TASK,
            TrackingOptions::default(),
            Arc::new(move |update| {
                tracker.on_background_update(update);
            }),
        )?;

        log::info!("Tracking started at {}.", coordinates);
        Ok(())
    }

    /// The confirm button: check permission, read the position and send it.
    ///
    /// Returns `None` if the foreground permission was denied.
    pub fn confirm_and_send(&self) -> Result<Option<DeliveryOutcome>, TrackerError> {
        if self.gate.ensure(Permission::ForegroundLocation).is_err() {
            return Ok(None);
        }

        let coordinates = self.location.current_position()?;
        self.screen
            .set_coordinates(coordinates, UpdateSource::Manual);
        Ok(Some(self.delivery.send(&coordinates, &self.screen.url())))
    }

    /// Called by the platform with every batch of background positions.
    ///
    /// Returns `None` when the update was dropped.
    pub fn on_background_update(
        &self,
        update: Result<Vec<Coordinates>, LocationError>,
    ) -> Option<DeliveryOutcome> {
        let coordinates = match update {
            Ok(batch) => match batch.first() {
                Some(coordinates) => *coordinates,
                None => {
                    log::trace!("Background task delivered an empty batch.");
                    return None;
                }
            },
            Err(e) => {
                log::error!("Background location task failed. Reason:\r\n{}", e);
                return None;
            }
        };

        self.screen
            .set_coordinates(coordinates, UpdateSource::Background);
        Some(self.delivery.send(&coordinates, &self.screen.url()))
    }
}
