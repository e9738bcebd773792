//! The `vista` application: platform directories and the headless
//! fly-through driver.

pub mod fly_through;
pub mod platform;
