//! Service layer: the hub handle and the conductor task behind it.

pub mod conductor;
pub mod hub;

pub use conductor::Conductor;
pub use hub::{Admission, Hub};
