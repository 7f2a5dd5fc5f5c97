use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Notification,
    ForegroundLocation,
    BackgroundLocation,
}

impl Permission {
    /// The message shown to the user when this permission was denied.
    pub fn denied_message(&self) -> &'static str {
        match self {
            Permission::Notification => "Notification permission denied",
            Permission::ForegroundLocation => "Location permission denied",
            Permission::BackgroundLocation => "Background location permission denied",
        }
    }

    /// Whether a denial of this permission stops the tracker from starting.
    pub fn is_required(&self) -> bool {
        !matches!(self, Permission::Notification)
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Permission::Notification => "notification",
            Permission::ForegroundLocation => "foreground location",
            Permission::BackgroundLocation => "background location",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// Access to the permission dialogs of the host platform.
pub trait PermissionProvider: Send + Sync {
    /// Look up the current status without prompting.
    fn status(&self, permission: Permission) -> PermissionStatus;
    /// Ask the user for the permission. May show a system dialog.
    fn request(&self, permission: Permission) -> PermissionStatus;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// Informs the user; the flow continues.
    NonBlocking,
    /// The flow stops after the alert.
    Blocking,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub message: String,
    pub kind: AlertKind,
}

impl Alert {
    pub fn for_denied(permission: Permission) -> Self {
        Self {
            message: permission.denied_message().to_string(),
            kind: if permission.is_required() {
                AlertKind::Blocking
            } else {
                AlertKind::NonBlocking
            },
        }
    }
}

/// Shows modal alerts to the user.
pub trait Alerter: Send + Sync {
    fn alert(&self, alert: &Alert);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("{0} permission was denied")]
    Denied(Permission),
}

/// Requests everything the tracker needs before it may start.
pub struct PermissionGate {
    provider: Arc<dyn PermissionProvider>,
    alerter: Arc<dyn Alerter>,
}

impl PermissionGate {
    /// The order in which permissions are requested on startup.
    pub const STARTUP_ORDER: [Permission; 3] = [
        Permission::Notification,
        Permission::ForegroundLocation,
        Permission::BackgroundLocation,
    ];

    pub fn new(provider: Arc<dyn PermissionProvider>, alerter: Arc<dyn Alerter>) -> Self {
        Self { provider, alerter }
    }

    /// Request all startup permissions in order.
    ///
    /// A denied notification permission only raises an alert. A denied location
    /// permission raises a blocking alert and stops at that permission.
    pub fn run(&self) -> Result<(), GateError> {
        for permission in Self::STARTUP_ORDER.iter().copied() {
            if let Err(e) = self.ensure(permission) {
                if permission.is_required() {
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Make sure a single permission is granted, prompting only if it isn't yet.
    pub fn ensure(&self, permission: Permission) -> Result<(), GateError> {
        if self.provider.status(permission).is_granted() {
            log::trace!("The {} permission is already granted.", permission);
            return Ok(());
        }

        if self.provider.request(permission).is_granted() {
            log::debug!("The {} permission was granted.", permission);
            Ok(())
        } else {
            log::warn!("The {} permission was denied.", permission);
            self.alerter.alert(&Alert::for_denied(permission));
            Err(GateError::Denied(permission))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct Scripted {
        answers: HashMap<Permission, PermissionStatus>,
        granted: Mutex<Vec<Permission>>,
        prompts: Mutex<Vec<Permission>>,
    }

    impl Scripted {
        fn new(notification: bool, foreground: bool, background: bool) -> Self {
            let answer = |granted| {
                if granted {
                    PermissionStatus::Granted
                } else {
                    PermissionStatus::Denied
                }
            };
            let mut answers = HashMap::new();
            answers.insert(Permission::Notification, answer(notification));
            answers.insert(Permission::ForegroundLocation, answer(foreground));
            answers.insert(Permission::BackgroundLocation, answer(background));
            Self {
                answers,
                granted: Mutex::new(vec![]),
                prompts: Mutex::new(vec![]),
            }
        }
    }

    impl PermissionProvider for Scripted {
        fn status(&self, permission: Permission) -> PermissionStatus {
            if self.granted.lock().unwrap().contains(&permission) {
                PermissionStatus::Granted
            } else {
                PermissionStatus::Undetermined
            }
        }

        fn request(&self, permission: Permission) -> PermissionStatus {
            self.prompts.lock().unwrap().push(permission);
            let status = self.answers[&permission];
            if status.is_granted() {
                self.granted.lock().unwrap().push(permission);
            }
            status
        }
    }

    #[derive(Default)]
    struct Alerts(Mutex<Vec<Alert>>);

    impl Alerter for Alerts {
        fn alert(&self, alert: &Alert) {
            self.0.lock().unwrap().push(alert.clone());
        }
    }

    fn gate(provider: &Arc<Scripted>, alerts: &Arc<Alerts>) -> PermissionGate {
        PermissionGate::new(provider.clone(), alerts.clone())
    }

    #[test]
    fn requests_in_fixed_order() {
        let provider = Arc::new(Scripted::new(true, true, true));
        let alerts = Arc::new(Alerts::default());
        assert_eq!(gate(&provider, &alerts).run(), Ok(()));
        assert_eq!(
            *provider.prompts.lock().unwrap(),
            PermissionGate::STARTUP_ORDER.to_vec()
        );
        assert!(alerts.0.lock().unwrap().is_empty());
    }

    #[test]
    fn notification_denial_continues() {
        let provider = Arc::new(Scripted::new(false, true, true));
        let alerts = Arc::new(Alerts::default());
        assert_eq!(gate(&provider, &alerts).run(), Ok(()));
        let alerts = alerts.0.lock().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::NonBlocking);
        assert_eq!(alerts[0].message, "Notification permission denied");
    }

    #[test]
    fn foreground_denial_halts_before_background() {
        let provider = Arc::new(Scripted::new(true, false, true));
        let alerts = Arc::new(Alerts::default());
        assert_eq!(
            gate(&provider, &alerts).run(),
            Err(GateError::Denied(Permission::ForegroundLocation))
        );
        assert!(!provider
            .prompts
            .lock()
            .unwrap()
            .contains(&Permission::BackgroundLocation));
        assert_eq!(alerts.0.lock().unwrap()[0].kind, AlertKind::Blocking);
    }

    #[test]
    fn background_denial_halts() {
        let provider = Arc::new(Scripted::new(true, true, false));
        let alerts = Arc::new(Alerts::default());
        assert_eq!(
            gate(&provider, &alerts).run(),
            Err(GateError::Denied(Permission::BackgroundLocation))
        );
        let alerts = alerts.0.lock().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].message, "Background location permission denied");
    }

    #[test]
    fn granted_permission_is_not_prompted_again() {
        let provider = Arc::new(Scripted::new(true, true, true));
        let alerts = Arc::new(Alerts::default());
        let gate = gate(&provider, &alerts);
        gate.ensure(Permission::ForegroundLocation).unwrap();
        gate.ensure(Permission::ForegroundLocation).unwrap();
        assert_eq!(provider.prompts.lock().unwrap().len(), 1);
    }
}
