mod config;
mod terminal;

use crate::config::CONFIG;
use geopost::platform::simulated::*;
use geopost::*;
use std::sync::Arc;

fn main() {
    init_logging(
        CONFIG.general.log_level,
        std::env::var("RUST_LOG").ok().as_deref(),
    );

    let simulation = &CONFIG.simulation;
    let location = Arc::new(SimulatedLocation::new(
        Coordinates::new(simulation.start_latitude, simulation.start_longitude),
        simulation.step_degrees,
    ));

    let platform = Platform {
        permissions: Arc::new(SimulatedPermissions::new(
            simulation.grant_notifications,
            simulation.grant_foreground,
            simulation.grant_background,
        )),
        location: location.clone(),
        notifier: Arc::new(terminal::TerminalNotifier::new(CONFIG.notifications)),
        alerter: Arc::new(terminal::TerminalAlerter),
    };

    let tracker = Tracker::new(platform, Screen::new());
    match tracker.mount() {
        Ok(TrackerState::Tracking) => {}
        Ok(state) => log::warn!("Tracking is not running ({:?}).", state),
        Err(e) => log::error!("Could not start tracking. Reason:\r\n{}", e),
    }

    terminal::run(&tracker);
    location.stop();
}

/// Log at the configured level. `RUST_LOG` style filters refine it.
fn init_logging(level: log::Level, filters: Option<&str>) {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(level.to_level_filter());
    if let Some(filters) = filters {
        builder.parse_filters(filters);
    }
    if let Err(e) = builder.try_init() {
        eprintln!("Could not set up logging. Reason:\r\n{}", e);
    }
}

#[test]
fn test_configured_level_is_effective() {
    init_logging(log::Level::Info, None);
    assert_eq!(log::max_level(), log::LevelFilter::Info);
    assert!(log::log_enabled!(log::Level::Info));
    assert!(!log::log_enabled!(log::Level::Debug));
}
