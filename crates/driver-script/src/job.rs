//! Batch-scheduler job scripts.

use std::path::{Path, PathBuf};

use chrono::Duration;
use driver_core::email::EmailType;
use driver_core::errors::{DriverError, ErrorInfo};
use driver_core::paths::posix_string;
use driver_core::platform::Platform;
use driver_core::time::format_clock_duration;
use sha2::{Digest, Sha256};

use crate::script::{Script, SHEBANG};

/// Log file used for both scheduler streams when none is given.
pub const DEFAULT_LOG_FILENAME: &str = "slurm.log";

/// Resource request and command list of one job.
///
/// Built with the `with_*` methods and rendered once; the header follows the scheduler
/// directive order job name, directory, account, notifications, error and output files,
/// tasks, nodes, wall clock, partition.
#[derive(Debug, Clone, PartialEq)]
pub struct JobScript {
    platform: Platform,
    commands: Vec<String>,
    tasks: u32,
    name: Option<String>,
    run_directory: Option<PathBuf>,
    account: Option<String>,
    email_type: Option<EmailType>,
    email_address: Option<String>,
    error_filename: Option<PathBuf>,
    log_filename: Option<PathBuf>,
    nodes: Option<u32>,
    duration: Option<Duration>,
    partition: Option<String>,
    modules: Vec<String>,
    path_prefix: Option<String>,
    source_filename: Option<PathBuf>,
    launcher: Option<String>,
}

impl JobScript {
    /// Empty job requesting `tasks` processes on `platform`.
    pub fn new(platform: Platform, tasks: u32) -> Self {
        Self {
            platform,
            commands: Vec::new(),
            tasks,
            name: None,
            run_directory: None,
            account: None,
            email_type: None,
            email_address: None,
            error_filename: None,
            log_filename: None,
            nodes: None,
            duration: None,
            partition: None,
            modules: Vec::new(),
            path_prefix: None,
            source_filename: None,
            launcher: None,
        }
    }

    /// Appends commands.
    pub fn with_commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.commands.extend(commands.into_iter().map(Into::into));
        self
    }

    /// Sets the process count.
    pub fn with_tasks(mut self, tasks: u32) -> Self {
        self.tasks = tasks;
        self
    }

    /// Sets the job name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds a working directory directive.
    pub fn with_run_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.run_directory = Some(directory.into());
        self
    }

    /// Sets the charged account; `None` falls back to the platform default.
    pub fn with_account(mut self, account: Option<String>) -> Self {
        self.account = account;
        self
    }

    /// Sets notification settings.
    pub fn with_email(mut self, email_type: Option<EmailType>, address: Option<String>) -> Self {
        self.email_type = email_type;
        self.email_address = address;
        self
    }

    /// Sets the error and output log files.
    pub fn with_logs(mut self, error: Option<PathBuf>, output: Option<PathBuf>) -> Self {
        self.error_filename = error;
        self.log_filename = output;
        self
    }

    /// Sets the node count; `None` derives it from the platform.
    pub fn with_nodes(mut self, nodes: Option<u32>) -> Self {
        self.nodes = nodes;
        self
    }

    /// Sets the wall-clock limit.
    pub fn with_duration(mut self, duration: Option<Duration>) -> Self {
        self.duration = duration;
        self
    }

    /// Sets the partition; `None` falls back to the platform default.
    pub fn with_partition(mut self, partition: Option<String>) -> Self {
        self.partition = partition;
        self
    }

    /// Sets the environment modules to load.
    pub fn with_modules(mut self, modules: Vec<String>) -> Self {
        self.modules = modules;
        self
    }

    /// Sets the directory prepended to `PATH`.
    pub fn with_path_prefix(mut self, prefix: Option<String>) -> Self {
        self.path_prefix = prefix;
        self
    }

    /// Sets an environment file sourced before any command.
    pub fn with_source_filename(mut self, source: Option<PathBuf>) -> Self {
        self.source_filename = source.filter(|path| !path.as_os_str().is_empty());
        self
    }

    /// Overrides the platform launcher.
    pub fn with_launcher(mut self, launcher: Option<String>) -> Self {
        self.launcher = launcher;
        self
    }

    /// Target platform.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Commands in execution order.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Requested process count.
    pub fn tasks(&self) -> u32 {
        self.tasks
    }

    /// Requested node count, derived from the platform when not set.
    pub fn nodes(&self) -> u32 {
        self.nodes
            .unwrap_or_else(|| self.platform.nodes_for(self.tasks))
    }

    /// Process launcher in effect.
    pub fn launcher(&self) -> Option<String> {
        self.launcher
            .clone()
            .or_else(|| self.platform.info().launcher.map(str::to_string))
    }

    /// Prefixes `command` with the launcher in effect.
    pub fn launch(&self, command: &str) -> String {
        match self.launcher() {
            Some(launcher) => format!("{launcher} {command}"),
            None => command.to_string(),
        }
    }

    /// Job name; unnamed jobs get a stable name derived from their commands.
    pub fn name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| default_job_name(&self.commands))
    }

    fn header(&self) -> Result<Vec<String>, DriverError> {
        let info = self.platform.info();
        let mut lines = vec![format!("#SBATCH -J {}", self.name())];
        if let Some(directory) = &self.run_directory {
            lines.push(format!("#SBATCH -D {}", posix_string(directory)));
        }
        if let Some(account) = self
            .account
            .clone()
            .or_else(|| info.default_account.map(str::to_string))
        {
            lines.push(format!("#SBATCH -A {account}"));
        }
        let email_type = match (self.email_type, &self.email_address) {
            (None, Some(_)) => Some(EmailType::All),
            (email_type, _) => email_type,
        };
        if let Some(email_type) = email_type.filter(|email_type| *email_type != EmailType::None) {
            lines.push(format!("#SBATCH --mail-type={email_type}"));
            match self.email_address.as_deref().filter(|address| !address.is_empty()) {
                Some(address) => lines.push(format!("#SBATCH --mail-user={address}")),
                None => {
                    return Err(DriverError::MissingEmailAddress(
                        ErrorInfo::new(
                            "missing_email_address",
                            format!("notification type {email_type} requires an address"),
                        )
                        .with_context("job", self.name())
                        .with_hint("set email_address or set email_type to NONE"),
                    ))
                }
            }
        }
        let log = |filename: &Option<PathBuf>| {
            filename
                .as_deref()
                .map(posix_string)
                .unwrap_or_else(|| DEFAULT_LOG_FILENAME.to_string())
        };
        lines.push(format!("#SBATCH --error={}", log(&self.error_filename)));
        lines.push(format!("#SBATCH --output={}", log(&self.log_filename)));
        lines.push(format!("#SBATCH -n {}", self.tasks));
        lines.push(format!("#SBATCH -N {}", self.nodes()));
        if let Some(duration) = &self.duration {
            lines.push(format!("#SBATCH --time={}", format_clock_duration(duration)));
        }
        if let Some(partition) = self
            .partition
            .clone()
            .or_else(|| info.default_partition.map(str::to_string))
        {
            lines.push(format!("#SBATCH --partition={partition}"));
        }
        Ok(lines)
    }
}

impl Script for JobScript {
    fn lines(&self) -> Result<Vec<String>, DriverError> {
        let mut lines = vec![SHEBANG.to_string()];
        if self.platform.info().uses_scheduler {
            lines.extend(self.header()?);
            lines.extend([String::new(), "set -e".to_string(), String::new()]);
        }
        if !self.modules.is_empty() {
            lines.push(format!("module load {}", self.modules.join(" ")));
            lines.push(String::new());
        }
        if let Some(prefix) = &self.path_prefix {
            lines.push(format!("PATH={prefix}:$PATH"));
            lines.push(String::new());
        }
        if let Some(source) = &self.source_filename {
            lines.push(format!("source {}", posix_string(source)));
        }
        lines.extend(self.commands.iter().cloned());
        Ok(lines)
    }

    fn default_filename(&self) -> String {
        format!("{}.job", self.platform.file_stem())
    }
}

/// Stable job name for an unnamed job: a digest of its commands.
pub fn default_job_name(commands: &[String]) -> String {
    let mut hasher = Sha256::new();
    for command in commands {
        hasher.update((command.len() as u64).to_le_bytes());
        hasher.update(command.as_bytes());
    }
    let digest = hasher.finalize();
    let hex = digest
        .iter()
        .take(8)
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>();
    format!("job_{hex}")
}

/// Renders `executable` for use in a command line.
pub fn command_path(executable: &Path) -> String {
    posix_string(executable)
}
