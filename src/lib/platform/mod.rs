//! Backends for the platform services the tracker consumes.

pub mod simulated;
