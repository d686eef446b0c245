use campus_core::config::CoreConfig;
use campus_core::errors::ConfigError;
use campus_filters::{FilterState, FilterVisibility, LocalZone, PageFamily};

/// Starting filter for each page family on a fresh navigation context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDefaults {
    pub directory: FilterState,
    pub issues: FilterState,
}

impl FilterDefaults {
    pub fn for_family(&self, family: PageFamily) -> &FilterState {
        match family {
            PageFamily::Directory => &self.directory,
            PageFamily::Issues => &self.issues,
        }
    }
}

impl Default for FilterDefaults {
    fn default() -> Self {
        let issues_display = FilterVisibility {
            subject_search: true,
            description_search: true,
            ..FilterVisibility::default()
        };

        Self {
            directory: FilterState::with_visibility(FilterVisibility::default()),
            issues: FilterState::with_visibility(issues_display),
        }
    }
}

/// Settings for the admin pages service.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub core: CoreConfig,
    pub local_zone: LocalZone,
    pub defaults: FilterDefaults,
}

impl AdminConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::from_core(CoreConfig::from_env()?))
    }

    pub fn from_core(core: CoreConfig) -> Self {
        let local_zone = LocalZone::from_offset_minutes(core.local_utc_offset_minutes);
        Self {
            core,
            local_zone,
            defaults: FilterDefaults::default(),
        }
    }

    pub fn bind_address(&self) -> &str {
        &self.core.http_bind
    }

    pub fn session_cookie(&self) -> &str {
        &self.core.session_cookie
    }
}
