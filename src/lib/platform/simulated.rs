//! An in-process platform: scripted permission answers, a walking position
//! source and a notification log.

use crate::*;
use crossbeam_channel::{bounded, select, tick, Sender};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread::spawn;

/// Meters per degree of latitude.
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Answers permission requests from a fixed script.
pub struct SimulatedPermissions {
    answers: Mutex<HashMap<Permission, bool>>,
    decided: Mutex<HashMap<Permission, PermissionStatus>>,
    prompts: Mutex<HashMap<Permission, usize>>,
}

impl SimulatedPermissions {
    pub fn new(notification: bool, foreground: bool, background: bool) -> Self {
        let mut answers = HashMap::new();
        answers.insert(Permission::Notification, notification);
        answers.insert(Permission::ForegroundLocation, foreground);
        answers.insert(Permission::BackgroundLocation, background);
        Self {
            answers: Mutex::new(answers),
            decided: Mutex::new(HashMap::new()),
            prompts: Mutex::new(HashMap::new()),
        }
    }

    /// Change the answer given to future prompts.
    pub fn set_answer(&self, permission: Permission, grant: bool) {
        if let Ok(mut answers) = self.answers.lock() {
            answers.insert(permission, grant);
        }
    }

    /// How often the dialog for `permission` was shown.
    pub fn prompts(&self, permission: Permission) -> usize {
        self.prompts
            .lock()
            .map(|p| p.get(&permission).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

impl PermissionProvider for SimulatedPermissions {
    fn status(&self, permission: Permission) -> PermissionStatus {
        self.decided
            .lock()
            .ok()
            .and_then(|d| d.get(&permission).copied())
            .unwrap_or(PermissionStatus::Undetermined)
    }

    fn request(&self, permission: Permission) -> PermissionStatus {
        if self.status(permission).is_granted() {
            return PermissionStatus::Granted;
        }

        if let Ok(mut prompts) = self.prompts.lock() {
            *prompts.entry(permission).or_insert(0) += 1;
        }
        let grant = self
            .answers
            .lock()
            .map(|a| a.get(&permission).copied().unwrap_or(false))
            .unwrap_or(false);

        let status = if grant {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        };
        if let Ok(mut decided) = self.decided.lock() {
            decided.insert(permission, status);
        }
        status
    }
}

/// A position source which walks north east by a fixed step.
///
/// Background tasks run on their own thread each, driven by a ticker with the
/// deferred update interval as period.
pub struct SimulatedLocation {
    position: Arc<Mutex<Coordinates>>,
    step: f64,
    failure: Arc<Mutex<Option<LocationError>>>,
    tasks: Mutex<HashMap<String, Sender<()>>>,
}

impl SimulatedLocation {
    pub fn new(start: Coordinates, step: f64) -> Self {
        Self {
            position: Arc::new(Mutex::new(start)),
            step,
            failure: Arc::new(Mutex::new(None)),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Make every read fail with `error` until called again with `None`.
    pub fn fail_reads(&self, error: Option<LocationError>) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = error;
        }
    }

    pub fn is_tracking(&self, task: &str) -> bool {
        self.tasks
            .lock()
            .map(|t| t.contains_key(task))
            .unwrap_or(false)
    }

    /// Stop all background tasks.
    pub fn stop(&self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            // Dropping the senders disconnects the task threads.
            for (task, _) in tasks.drain() {
                log::debug!("Stopped background task {}.", task);
            }
        }
    }

    fn read(
        position: &Mutex<Coordinates>,
        failure: &Mutex<Option<LocationError>>,
    ) -> Result<Coordinates, LocationError> {
        if let Ok(failure) = failure.lock() {
            if let Some(e) = failure.as_ref() {
                return Err(e.clone());
            }
        }
        position
            .lock()
            .map(|p| *p)
            .map_err(|e| LocationError::Unavailable(e.to_string()))
    }
}

impl LocationProvider for SimulatedLocation {
    fn current_position(&self) -> Result<Coordinates, LocationError> {
        Self::read(&self.position, &self.failure)
    }

    fn start_updates(
        &self,
        task: &str,
        options: TrackingOptions,
        callback: UpdateCallback,
    ) -> Result<(), LocationError> {
        let mut tasks = self
            .tasks
            .lock()
            .map_err(|e| LocationError::Unavailable(e.to_string()))?;
        if tasks.contains_key(task) {
            return Err(LocationError::AlreadyTracking(task.to_string()));
        }

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let ticker = tick(options.deferred_updates_interval);
        let position = self.position.clone();
        let failure = self.failure.clone();
        let step = self.step;
        let task_name = task.to_string();

        spawn(move || {
            let mut last_report = None;
            let mut batch = vec![];
            loop {
                select! {
                    recv(ticker) -> _ => match Self::read(&position, &failure) {
                        Ok(coordinates) => {
                            let next = coordinates.offset(step, step);
                            if let Ok(mut position) = position.lock() {
                                *position = next;
                            }

                            batch.push(next);
                            let moved = last_report
                                .map(|last| distance_meters(&last, &next))
                                .unwrap_or(f64::INFINITY);
                            if moved >= options.distance_interval {
                                last_report = Some(next);
                                callback(Ok(std::mem::take(&mut batch)));
                            }
                        }
                        Err(e) => callback(Err(e)),
                    },
                    recv(stop_rx) -> _ => break,
                }
            }
            log::trace!("Background task {} finished.", task_name);
        });

        tasks.insert(task.to_string(), stop_tx);
        log::debug!(
            "Started background task {} with {:?}.",
            task,
            options
        );
        Ok(())
    }
}

/// Equirectangular approximation, good enough for short walks.
fn distance_meters(a: &Coordinates, b: &Coordinates) -> f64 {
    let mean_latitude = ((a.latitude + b.latitude) / 2.0).to_radians();
    let dx = (b.longitude - a.longitude) * mean_latitude.cos();
    let dy = b.latitude - a.latitude;
    (dx * dx + dy * dy).sqrt() * METERS_PER_DEGREE
}

/// Records every notification.
pub struct SimulatedNotifications {
    echo: bool,
    sent: Mutex<Vec<Notification>>,
}

impl SimulatedNotifications {
    pub fn new(echo: bool) -> Self {
        Self {
            echo,
            sent: Mutex::new(vec![]),
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Notifier for SimulatedNotifications {
    fn notify(&self, notification: &Notification) {
        if self.echo {
            log::info!("Notification {}", notification);
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn denied_permissions_are_prompted_each_time() {
        let permissions = SimulatedPermissions::new(true, false, true);
        permissions.request(Permission::ForegroundLocation);
        permissions.request(Permission::ForegroundLocation);
        assert_eq!(permissions.prompts(Permission::ForegroundLocation), 2);
        assert_eq!(
            permissions.status(Permission::ForegroundLocation),
            PermissionStatus::Denied
        );
        assert_eq!(
            permissions.status(Permission::BackgroundLocation),
            PermissionStatus::Undetermined
        );

        permissions.set_answer(Permission::ForegroundLocation, true);
        permissions.request(Permission::ForegroundLocation);
        permissions.request(Permission::ForegroundLocation);
        assert_eq!(
            permissions.status(Permission::ForegroundLocation),
            PermissionStatus::Granted
        );
        assert_eq!(permissions.prompts(Permission::ForegroundLocation), 3);
    }

    #[test]
    fn second_task_with_same_name_is_rejected() {
        let location = SimulatedLocation::new(Coordinates::new(0.0, 0.0), 0.01);
        let callback: UpdateCallback = Arc::new(|_| {});
        location
            .start_updates(LOCATION_TASK, TrackingOptions::default(), callback.clone())
            .unwrap();
        assert_eq!(
            location.start_updates(LOCATION_TASK, TrackingOptions::default(), callback),
            Err(LocationError::AlreadyTracking(LOCATION_TASK.to_string()))
        );
        location.stop();
        assert!(!location.is_tracking(LOCATION_TASK));
    }

    #[test]
    fn small_steps_are_batched() {
        // 0.0003 degrees is ~47 meters, so every report carries at least two steps
        // after the first one.
        let location = SimulatedLocation::new(Coordinates::new(0.0, 0.0), 0.0003);
        let (tx, rx) = crossbeam_channel::unbounded();
        let options = TrackingOptions {
            deferred_updates_interval: Duration::from_millis(10),
            ..TrackingOptions::default()
        };
        location
            .start_updates(
                LOCATION_TASK,
                options,
                Arc::new(move |update| {
                    let _ = tx.send(update);
                }),
            )
            .unwrap();

        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
        let second = rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
        location.stop();

        assert_eq!(first.len(), 1);
        assert!(second.len() >= 2);
    }

    #[test]
    fn read_failures_reach_the_callback() {
        let location = SimulatedLocation::new(Coordinates::new(0.0, 0.0), 0.01);
        location.fail_reads(Some(LocationError::PermissionDenied));
        assert_eq!(
            location.current_position(),
            Err(LocationError::PermissionDenied)
        );

        let (tx, rx) = crossbeam_channel::unbounded();
        let options = TrackingOptions {
            deferred_updates_interval: Duration::from_millis(10),
            ..TrackingOptions::default()
        };
        location
            .start_updates(
                LOCATION_TASK,
                options,
                Arc::new(move |update| {
                    let _ = tx.send(update);
                }),
            )
            .unwrap();
        let update = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        location.stop();
        assert_eq!(update, Err(LocationError::PermissionDenied));
    }

    #[test]
    fn distance_of_one_milli_degree() {
        let d = distance_meters(&Coordinates::new(0.0, 0.0), &Coordinates::new(0.001, 0.0));
        assert!((d - 111.32).abs() < 0.01);
    }
}
