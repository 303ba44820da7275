//! Config store port — durable persistence for the config document and the
//! auto-resume flag.

use std::future::Future;
use std::sync::Arc;

use autotask_domain::config::Config;
use autotask_domain::error::AutoTaskError;

/// Durable storage behind two logical keys: the persisted [`Config`] and
/// the auto-resume flag.
pub trait ConfigStore {
    /// Load the persisted config.
    ///
    /// Missing or malformed data is not an error — implementations decode
    /// field-by-field and fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AutoTaskError::Storage`] when the backend itself fails.
    fn load_config(&self) -> impl Future<Output = Result<Config, AutoTaskError>> + Send;

    /// Persist the config document.
    fn save_config(&self, config: Config)
    -> impl Future<Output = Result<(), AutoTaskError>> + Send;

    /// Read the auto-resume flag; absent means disarmed.
    fn load_autorun(&self) -> impl Future<Output = Result<bool, AutoTaskError>> + Send;

    /// Arm or disarm the auto-resume flag.
    fn save_autorun(&self, armed: bool) -> impl Future<Output = Result<(), AutoTaskError>> + Send;
}

impl<T: ConfigStore + Send + Sync> ConfigStore for Arc<T> {
    fn load_config(&self) -> impl Future<Output = Result<Config, AutoTaskError>> + Send {
        (**self).load_config()
    }

    fn save_config(
        &self,
        config: Config,
    ) -> impl Future<Output = Result<(), AutoTaskError>> + Send {
        (**self).save_config(config)
    }

    fn load_autorun(&self) -> impl Future<Output = Result<bool, AutoTaskError>> + Send {
        (**self).load_autorun()
    }

    fn save_autorun(&self, armed: bool) -> impl Future<Output = Result<(), AutoTaskError>> + Send {
        (**self).save_autorun(armed)
    }
}
