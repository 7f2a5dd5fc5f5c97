mod coords;
mod delivery;
mod location;
mod notifier;
mod permission;
mod screen;
mod tracker;
pub mod platform;

pub use coords::*;
pub use delivery::*;
pub use location::*;
pub use notifier::*;
pub use permission::*;
pub use screen::*;
pub use tracker::*;
