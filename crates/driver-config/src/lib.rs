#![deny(missing_docs)]
#![doc = "Typed configuration records composed from capability mixins, and the run configuration aggregating them."]

pub mod configs;
pub mod input;
pub mod mixins;
pub mod native;
pub mod record;
pub mod run;
pub mod schema;
pub mod serde;
pub mod value;

pub use configs::{
    AdcircConfig, AtmeshForcingConfig, BestTrackForcingConfig, Configuration, ConfigurationEntry,
    ConfigurationKind, ForcingConfig, ModelDriverConfig, NemsConfig, OwiForcingConfig,
    RunDescriptor, SlurmConfig, TidalForcingConfig, Ww3DataForcingConfig, GWCE_SOLUTION_SCHEMES,
    TIDAL_SOURCES, UNPERTURBED,
};
pub use input::UserInput;
pub use mixins::{CouplingParticipant, ForcingRecord};
pub use native::{CouplingEntry, ForcingKind, ModelType, NativeForcing};
pub use record::Record;
pub use run::{PerturbedRun, RunConfiguration, RunKind, ASWIP_NWS};
pub use schema::{Fragment, Schema};
pub use value::{EnumSpec, FieldType, Value};
