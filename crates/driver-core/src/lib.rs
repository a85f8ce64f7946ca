#![deny(missing_docs)]
#![doc = "Core types shared by every coupled model driver crate: errors, platforms, time and path helpers."]

pub mod email;
pub mod errors;
pub mod files;
pub mod paths;
pub mod platform;
pub mod time;

pub use email::EmailType;
pub use errors::{DriverError, ErrorInfo};
pub use files::{write_guarded, WriteOutcome};
pub use paths::{posix_string, relative_path};
pub use platform::{Platform, PlatformInfo};
pub use time::{
    duration_from_seconds, duration_seconds, format_clock_duration, format_duration,
    format_timestamp, offset_timestamp, parse_duration, parse_timestamp,
};
