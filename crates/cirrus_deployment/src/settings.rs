//! Deployment settings provided by the engine.
//!
//! The engine starts the program with its configuration in environment
//! variables. [`DeploymentSettings::from_env`] reads them; tests build
//! settings directly with [`DeploymentSettings::new`] and the `with_*`
//! methods.

/// Address of the resource monitor. Required.
pub const MONITOR_ENV: &str = "PULUMI_MONITOR";
/// Address of the engine's logging endpoint.
pub const ENGINE_ENV: &str = "PULUMI_ENGINE";
/// Project name.
pub const PROJECT_ENV: &str = "PULUMI_PROJECT";
/// Stack name.
pub const STACK_ENV: &str = "PULUMI_STACK";
/// Organization name.
pub const ORGANIZATION_ENV: &str = "PULUMI_ORGANIZATION";
/// `true` when the engine is running a preview.
pub const DRY_RUN_ENV: &str = "PULUMI_DRY_RUN";
/// Degree of parallelism requested by the engine.
pub const PARALLEL_ENV: &str = "PULUMI_PARALLEL";

/// Invalid or missing deployment settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// A required variable is not set.
    #[error("required setting {0} is not set")]
    Missing(&'static str),

    /// A variable has a value that cannot be parsed.
    #[error("setting {key} has invalid value '{value}': {reason}")]
    Invalid {
        /// The variable name.
        key: &'static str,
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

/// Configuration of one program run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentSettings {
    /// Resource monitor address (`host:port`).
    pub monitor_address: String,
    /// Engine address, if the engine exposes one.
    pub engine_address: Option<String>,
    /// Project name.
    pub project: String,
    /// Stack name.
    pub stack: String,
    /// Organization name.
    pub organization: Option<String>,
    /// Whether this run is a preview.
    pub dry_run: bool,
    /// Degree of parallelism requested by the engine.
    pub parallel: Option<u32>,
}

impl DeploymentSettings {
    /// Creates settings for the monitor at `monitor_address`.
    #[must_use]
    pub fn new(monitor_address: impl Into<String>) -> Self {
        Self {
            monitor_address: monitor_address.into(),
            engine_address: None,
            project: String::new(),
            stack: String::new(),
            organization: None,
            dry_run: false,
            parallel: None,
        }
    }

    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `PULUMI_MONITOR` is missing or a value does not
    /// parse.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let monitor_address = read(MONITOR_ENV).ok_or(SettingsError::Missing(MONITOR_ENV))?;

        let dry_run = match read(DRY_RUN_ENV) {
            Some(value) => parse_bool(DRY_RUN_ENV, &value)?,
            None => false,
        };

        let parallel = read(PARALLEL_ENV)
            .map(|value| {
                value
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| SettingsError::Invalid {
                        key: PARALLEL_ENV,
                        value,
                        reason: "expected a non-negative integer",
                    })
            })
            .transpose()?;

        Ok(Self {
            monitor_address,
            engine_address: read(ENGINE_ENV),
            project: read(PROJECT_ENV).unwrap_or_default(),
            stack: read(STACK_ENV).unwrap_or_default(),
            organization: read(ORGANIZATION_ENV),
            dry_run,
            parallel,
        })
    }

    /// Sets the project name.
    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    /// Sets the stack name.
    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = stack.into();
        self
    }

    /// Sets the organization name.
    #[must_use]
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Sets the engine address.
    #[must_use]
    pub fn with_engine_address(mut self, address: impl Into<String>) -> Self {
        self.engine_address = Some(address.into());
        self
    }

    /// Sets whether this run is a preview.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets the requested parallelism.
    #[must_use]
    pub fn with_parallel(mut self, parallel: u32) -> Self {
        self.parallel = Some(parallel);
        self
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, SettingsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(SettingsError::Invalid {
            key,
            value: value.to_string(),
            reason: "expected true or false",
        }),
    }
}
