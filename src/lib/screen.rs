use super::*;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::{Arc, Mutex, RwLock};

/// Which flow wrote the coordinates last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSource {
    Startup,
    Manual,
    Background,
}

/// Everything the screen shows. Nothing of it is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenState {
    pub coordinates: Option<Coordinates>,
    pub url: String,
    pub last_source: Option<UpdateSource>,
    /// Number of coordinate writes so far.
    pub revision: u64,
}

impl ScreenState {
    pub fn new() -> Self {
        Self {
            coordinates: None,
            url: String::new(),
            last_source: None,
            revision: 0,
        }
    }
}

impl Default for ScreenState {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to the single slot of screen state.
///
/// The manual flow and the background task both write through it. There is no
/// ordering between them, the last write wins.
#[derive(Clone, Default)]
pub struct Screen {
    state: Arc<RwLock<ScreenState>>,
    watchers: Arc<Mutex<Vec<Sender<u64>>>>,
}

impl Screen {
    pub const HEADER: &'static str = "Location tracking";
    pub const URL_PLACEHOLDER: &'static str = "Server URL";
    pub const UNKNOWN: &'static str = "Unknown";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_coordinates(&self, coordinates: Coordinates, source: UpdateSource) {
        let revision = match self.state.write() {
            Ok(mut state) => {
                state.coordinates = Some(coordinates);
                state.last_source = Some(source);
                state.revision += 1;
                log::trace!(
                    "Screen shows {} from {:?} (revision {}).",
                    coordinates,
                    source,
                    state.revision
                );
                state.revision
            }
            Err(e) => {
                log::error!("Screen state is poisoned. Reason:\r\n{}", e);
                return;
            }
        };

        if let Ok(mut watchers) = self.watchers.lock() {
            // Receivers that went away are forgotten.
            watchers.retain(|tx| tx.send(revision).is_ok());
        }
    }

    /// Get the revision of every coordinate write from now on.
    pub fn watch(&self) -> Receiver<u64> {
        let (tx, rx) = unbounded();
        if let Ok(mut watchers) = self.watchers.lock() {
            watchers.push(tx);
        }
        rx
    }

    pub fn set_url(&self, url: impl Into<String>) {
        match self.state.write() {
            Ok(mut state) => state.url = url.into(),
            Err(e) => log::error!("Screen state is poisoned. Reason:\r\n{}", e),
        }
    }

    pub fn url(&self) -> String {
        self.snapshot().url
    }

    pub fn snapshot(&self) -> ScreenState {
        match self.state.read() {
            Ok(state) => state.clone(),
            Err(e) => e.into_inner().clone(),
        }
    }

    /// Lay out the form as lines of text.
    pub fn render(&self) -> Vec<String> {
        let state = self.snapshot();
        let url = if state.url.is_empty() {
            format!("[{}]", Self::URL_PLACEHOLDER)
        } else {
            format!("[{}]", state.url)
        };
        let (latitude, longitude) = match state.coordinates {
            Some(c) => (c.latitude.to_string(), c.longitude.to_string()),
            None => (Self::UNKNOWN.to_string(), Self::UNKNOWN.to_string()),
        };

        vec![
            Self::HEADER.to_string(),
            url,
            "[Confirm and send]".to_string(),
            "Current location".to_string(),
            format!("Latitude: {}", latitude),
            format!("Longitude: {}", longitude),
        ]
    }
}

#[test]
fn test_render_placeholders() {
    let screen = Screen::new();
    let lines = screen.render();
    assert_eq!(lines[0], "Location tracking");
    assert_eq!(lines[1], "[Server URL]");
    assert_eq!(lines[4], "Latitude: Unknown");
    assert_eq!(lines[5], "Longitude: Unknown");
}

#[test]
fn test_render_values() {
    let screen = Screen::new();
    screen.set_url("http://example.com/loc");
    screen.set_coordinates(Coordinates::new(55.75, 37.62), UpdateSource::Manual);
    let lines = screen.render();
    assert_eq!(lines[1], "[http://example.com/loc]");
    assert_eq!(lines[4], "Latitude: 55.75");
    assert_eq!(lines[5], "Longitude: 37.62");
}

#[test]
fn test_last_write_wins() {
    let screen = Screen::new();
    let other = screen.clone();
    screen.set_coordinates(Coordinates::new(1.0, 1.0), UpdateSource::Manual);
    other.set_coordinates(Coordinates::new(2.0, 2.0), UpdateSource::Background);

    let state = screen.snapshot();
    assert_eq!(state.coordinates, Some(Coordinates::new(2.0, 2.0)));
    assert_eq!(state.last_source, Some(UpdateSource::Background));
    assert_eq!(state.revision, 2);
}

#[test]
fn test_watchers_see_every_write() {
    let screen = Screen::new();
    let changes = screen.watch();
    let dropped = screen.watch();
    drop(dropped);

    screen.set_url("ignored");
    screen.set_coordinates(Coordinates::new(1.0, 1.0), UpdateSource::Background);
    screen
        .clone()
        .set_coordinates(Coordinates::new(2.0, 2.0), UpdateSource::Manual);

    assert_eq!(changes.try_iter().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(screen.watchers.lock().unwrap().len(), 1);
}
