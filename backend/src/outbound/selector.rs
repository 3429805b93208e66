//! Runtime choice of the backing store.
//!
//! `build_persistence` turns settings into exactly one driver and
//! `install_persistence` publishes it for the rest of the process. This is
//! the only module that names both drivers; everything else depends on the
//! `Persistence` port.

use std::sync::{Arc, OnceLock};

use tracing::info;

use crate::config::DatabaseSettings;
use crate::domain::DbVendor;
use crate::domain::ports::{Persistence, PersistenceError};

use super::persistence::{DieselPersistence, MongoPersistence, PoolConfig};

static INSTALLED: OnceLock<Arc<dyn Persistence>> = OnceLock::new();

/// Errors raised while installing or retrieving the process-wide driver.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// A driver has already been installed for this process.
    #[error("a persistence driver is already installed ({vendor})")]
    AlreadyInstalled { vendor: DbVendor },
    /// No driver has been installed yet.
    #[error("no persistence driver has been installed")]
    NotInstalled,
    /// The installed driver failed to connect or disconnect.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Construct the driver for the configured vendor without connecting it.
pub fn build_persistence(settings: &DatabaseSettings) -> Arc<dyn Persistence> {
    match settings.vendor() {
        DbVendor::Mongo => Arc::new(MongoPersistence::from_settings(settings)),
        DbVendor::Sql => Arc::new(DieselPersistence::new(PoolConfig::from_settings(settings))),
    }
}

/// Publish `driver` as the process-wide persistence handle.
///
/// # Errors
///
/// Returns [`SelectorError::AlreadyInstalled`] when a driver is already in
/// place; the existing driver is kept.
pub fn install_persistence(driver: Arc<dyn Persistence>) -> Result<(), SelectorError> {
    INSTALLED.set(driver).map_err(|_| SelectorError::AlreadyInstalled {
        vendor: INSTALLED
            .get()
            .map(|existing| existing.vendor())
            .unwrap_or_default(),
    })
}

/// The installed driver.
///
/// # Errors
///
/// Returns [`SelectorError::NotInstalled`] before `install_persistence`.
pub fn persistence() -> Result<Arc<dyn Persistence>, SelectorError> {
    INSTALLED.get().cloned().ok_or(SelectorError::NotInstalled)
}

/// Build, install and connect the configured driver.
///
/// # Errors
///
/// Fails when a driver is already installed or the backing store cannot be
/// reached. A failed connect leaves the driver installed but disconnected.
pub async fn connect_from_settings(
    settings: &DatabaseSettings,
) -> Result<Arc<dyn Persistence>, SelectorError> {
    let driver = build_persistence(settings);
    install_persistence(Arc::clone(&driver))?;
    driver.connect().await?;
    info!(vendor = %driver.vendor(), "persistence driver connected");
    Ok(driver)
}

/// Disconnect the installed driver, if any.
pub async fn shutdown() -> Result<(), SelectorError> {
    match INSTALLED.get() {
        Some(driver) => Ok(driver.disconnect().await?),
        None => Ok(()),
    }
}
