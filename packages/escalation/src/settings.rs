//! Escalation thresholds.
//!
//! Defaults are embedded from `config/escalation.toml` at compile time and
//! can be overridden through environment variables.

use serde::Deserialize;

/// Environment variable overriding [`EscalationSettings::radius_km`].
pub const RADIUS_KM_VAR: &str = "CYBERGUARD_RADIUS_KM";

/// Environment variable overriding [`EscalationSettings::min_reports`].
pub const MIN_REPORTS_VAR: &str = "CYBERGUARD_MIN_REPORTS";

const EMBEDDED_SETTINGS: &str = include_str!("../config/escalation.toml");

/// Errors from loading escalation settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The settings TOML could not be parsed.
    #[error("Failed to parse escalation settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value was present but unusable.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Setting or variable name.
        key: &'static str,
        /// The rejected raw value.
        value: String,
    },
}

/// Thresholds for the per-submission critical-area check.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct EscalationSettings {
    /// Radius around a new report, in kilometers.
    pub radius_km: f64,
    /// Co-located reports needed to escalate.
    pub min_reports: usize,
}

impl Default for EscalationSettings {
    fn default() -> Self {
        Self {
            radius_km: 1.0,
            min_reports: 3,
        }
    }
}

impl EscalationSettings {
    /// Parses settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if the TOML is malformed or a value is out
    /// of range.
    pub fn from_toml(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()
    }

    /// The compiled-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if the embedded file is malformed.
    pub fn embedded() -> Result<Self, SettingsError> {
        Self::from_toml(EMBEDDED_SETTINGS)
    }

    /// The compiled-in defaults with process environment overrides applied.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if the embedded file is malformed or an
    /// override doesn't parse.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::embedded()?.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up by variable name. Blank values are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidValue`] if an override doesn't parse
    /// or is out of range.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SettingsError> {
        if let Some(raw) = lookup(RADIUS_KM_VAR).filter(|v| !v.trim().is_empty()) {
            self.radius_km = raw
                .trim()
                .parse()
                .map_err(|_| SettingsError::InvalidValue {
                    key: RADIUS_KM_VAR,
                    value: raw.clone(),
                })?;
        }

        if let Some(raw) = lookup(MIN_REPORTS_VAR).filter(|v| !v.trim().is_empty()) {
            self.min_reports = raw
                .trim()
                .parse()
                .map_err(|_| SettingsError::InvalidValue {
                    key: MIN_REPORTS_VAR,
                    value: raw.clone(),
                })?;
        }

        self.validate()
    }

    fn validate(self) -> Result<Self, SettingsError> {
        if !self.radius_km.is_finite() || self.radius_km <= 0.0 {
            return Err(SettingsError::InvalidValue {
                key: "radius_km",
                value: self.radius_km.to_string(),
            });
        }
        if self.min_reports == 0 {
            return Err(SettingsError::InvalidValue {
                key: "min_reports",
                value: self.min_reports.to_string(),
            });
        }
        Ok(self)
    }
}
