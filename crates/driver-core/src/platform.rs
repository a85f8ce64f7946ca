//! Fixed table of supported HPC platforms.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{DriverError, ErrorInfo};

/// Target platform for generated job scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Platform {
    /// NOAA Hera.
    Hera,
    /// MSU Orion.
    Orion,
    /// TACC Stampede2.
    Stampede2,
    /// Local shell without a batch scheduler.
    Local,
    /// Generic Slurm cluster.
    Slurm,
}

/// Static description of a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformInfo {
    /// Number of processors available on one node.
    pub processors_per_node: u32,
    /// Process launcher prefixed to parallel commands.
    pub launcher: Option<&'static str>,
    /// Whether jobs are submitted to a batch scheduler.
    pub uses_scheduler: bool,
    /// Account charged when none is configured.
    pub default_account: Option<&'static str>,
    /// Partition requested when none is configured.
    pub default_partition: Option<&'static str>,
}

impl Platform {
    /// Every platform, in declaration order.
    pub const ALL: [Platform; 5] = [
        Platform::Hera,
        Platform::Orion,
        Platform::Stampede2,
        Platform::Local,
        Platform::Slurm,
    ];

    /// Declared names, usable as enumerant variants.
    pub const NAMES: &'static [&'static str] = &["HERA", "ORION", "STAMPEDE2", "LOCAL", "SLURM"];

    /// Returns the upper case name of the platform.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Hera => "HERA",
            Platform::Orion => "ORION",
            Platform::Stampede2 => "STAMPEDE2",
            Platform::Local => "LOCAL",
            Platform::Slurm => "SLURM",
        }
    }

    /// Lower case name used in generated file names.
    pub fn file_stem(&self) -> String {
        self.name().to_lowercase()
    }

    /// Returns the fixed platform description.
    pub fn info(&self) -> PlatformInfo {
        match self {
            Platform::Hera => PlatformInfo {
                processors_per_node: 40,
                launcher: Some("srun"),
                uses_scheduler: true,
                default_account: Some("coastal"),
                default_partition: None,
            },
            Platform::Orion => PlatformInfo {
                processors_per_node: 40,
                launcher: Some("srun"),
                uses_scheduler: true,
                default_account: Some("nosofs"),
                default_partition: Some("orion"),
            },
            Platform::Stampede2 => PlatformInfo {
                processors_per_node: 68,
                launcher: Some("ibrun"),
                uses_scheduler: true,
                default_account: Some("coastal"),
                default_partition: Some("development"),
            },
            Platform::Local => PlatformInfo {
                processors_per_node: 1,
                launcher: None,
                uses_scheduler: false,
                default_account: None,
                default_partition: None,
            },
            Platform::Slurm => PlatformInfo {
                processors_per_node: 36,
                launcher: Some("srun"),
                uses_scheduler: true,
                default_account: None,
                default_partition: None,
            },
        }
    }

    /// Number of nodes needed to host `tasks` processes.
    pub fn nodes_for(&self, tasks: u32) -> u32 {
        let per_node = self.info().processors_per_node.max(1);
        tasks.div_ceil(per_node)
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = DriverError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|platform| platform.name().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| {
                DriverError::TypeCoercion(
                    ErrorInfo::new("unknown_platform", format!("unrecognized platform \"{value}\""))
                        .with_context("value", value)
                        .with_hint(format!("must be one of {}", Platform::NAMES.join(", "))),
                )
            })
    }
}
