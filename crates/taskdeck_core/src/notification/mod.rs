//! Notification delivery seam.
//!
//! # Responsibility
//! - Abstract platform notification backends behind one capability.
//! - Keep the core free of platform branching.

pub mod capability;
