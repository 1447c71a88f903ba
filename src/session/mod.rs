//! Session Module
//!
//! Session validation gate for protected operations, plus the device
//! classifier consulted at handshake and stream issue.

mod device;
mod store;

pub use device::{DeviceClassifier, DeviceInfo, DeviceVerdict, UserAgentClassifier};
pub use store::{NewSession, Session, SessionError, SessionStore};
