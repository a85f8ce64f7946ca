//! Capability mixins: schema fragments plus the contracts a composing record must meet.

use driver_core::errors::DriverError;

use crate::native::{CouplingEntry, ForcingKind, NativeForcing};
use crate::schema::Fragment;
use crate::value::FieldType;

/// Fields shared by every model: the modeled time window and step.
pub fn model() -> Fragment {
    Fragment::new("model")
        .field("modeled_start_time", FieldType::Timestamp)
        .field("modeled_end_time", FieldType::Timestamp)
        .field("modeled_timestep", FieldType::Duration)
}

/// Binding to the batch scheduler: processor request and environment file.
pub fn scheduler_binding() -> Fragment {
    Fragment::new("scheduler_binding")
        .field("processors", FieldType::Integer)
        .field("source_filename", FieldType::Path)
}

/// Participation in the coupling layer.
pub fn coupling_cap() -> Fragment {
    Fragment::new("coupling_cap")
        .field("processors", FieldType::Integer)
        .field("nems_parameters", FieldType::Mapping)
}

/// Free-form attributes forwarded to the native representation.
pub fn attributes() -> Fragment {
    Fragment::new("attributes").field("attributes", FieldType::Mapping)
}

/// Forcing updated at a fixed interval.
pub fn timestep_forcing() -> Fragment {
    Fragment::new("timestep_forcing").field("interval", FieldType::Duration)
}

/// Forcing read from a resource file.
pub fn file_forcing() -> Fragment {
    Fragment::new("file_forcing").field("resource", FieldType::Path)
}

/// Forcing that drives wind.
pub fn wind_forcing() -> Fragment {
    Fragment::new("wind_forcing").field("nws", FieldType::Integer)
}

/// Forcing that drives waves.
pub fn wave_forcing() -> Fragment {
    Fragment::new("wave_forcing").field("nrs", FieldType::Integer)
}

/// Contract of records composed with a forcing fragment.
pub trait ForcingRecord {
    /// Underlying forcing kind.
    fn kind(&self) -> ForcingKind;

    /// Converts the record into the native forcing object.
    fn native_forcing(&self) -> Result<NativeForcing, DriverError>;
}

/// Contract of records composed with [`coupling_cap`].
pub trait CouplingParticipant {
    /// Entry describing the record in the coupling layer.
    fn coupling_entry(&self) -> Result<CouplingEntry, DriverError>;
}
