//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements both [`ConfigPort`] and [`LimitStorePort`].
//!
//! - The two calibration bytes live in a RAM shadow that is written back
//!   as one blob on `commit()`.  An erased or never-written slot reads as
//!   `0xFF`, which the actuator rejects and replaces with its defaults.
//! - Device configuration is a postcard blob, validated before every save.
//! - ESP-IDF NVS commits are atomic per `nvs_commit()`.

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort, LimitStorePort, StoreError};
use crate::config::DeviceConfig;

#[cfg(not(target_os = "espidf"))]
use std::cell::{Cell, RefCell};
#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
const NAMESPACE: &[u8] = b"airvent\0";
const CONFIG_KEY: &[u8] = b"devcfg\0";
const LIMITS_KEY: &[u8] = b"limits\0";

#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 512;

/// Value of an erased slot.
pub const ERASED: u8 = 0xFF;
const LIMIT_SLOTS: usize = 2;

pub struct NvsAdapter {
    limits: [u8; LIMIT_SLOTS],
    #[cfg(not(target_os = "espidf"))]
    store: RefCell<HashMap<&'static [u8], Vec<u8>>>,
    #[cfg(not(target_os = "espidf"))]
    fail_commits: Cell<bool>,
}

impl NvsAdapter {
    /// Initialise NVS flash and load the limit shadow.
    ///
    /// On first boot or after a version mismatch the partition is erased
    /// and re-initialised.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        let mut nvs = Self {
            limits: [ERASED; LIMIT_SLOTS],
            #[cfg(not(target_os = "espidf"))]
            store: RefCell::new(HashMap::new()),
            #[cfg(not(target_os = "espidf"))]
            fail_commits: Cell::new(false),
        };
        nvs.reload_limits();
        Ok(nvs)
    }

    fn reload_limits(&mut self) {
        match self.read_blob(LIMITS_KEY) {
            Ok(Some(bytes)) if bytes.len() == LIMIT_SLOTS => {
                self.limits.copy_from_slice(&bytes);
            }
            Ok(Some(bytes)) => {
                warn!("NvsAdapter: limit blob has {} bytes, ignoring", bytes.len());
                self.limits = [ERASED; LIMIT_SLOTS];
            }
            Ok(None) => self.limits = [ERASED; LIMIT_SLOTS],
            Err(rc) => {
                warn!("NvsAdapter: limit read error {}", rc);
                self.limits = [ERASED; LIMIT_SLOTS];
            }
        }
    }

    /// Make the next commits fail (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.set(fail);
    }

    /// Simulate a power cycle: drop the shadow and reload from the store.
    #[cfg(not(target_os = "espidf"))]
    pub fn reboot(&mut self) {
        self.reload_limits();
    }

    // ── Raw blob access ───────────────────────────────────────

    /// Open the namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(NAMESPACE.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    /// `Ok(None)` when the key (or the whole namespace) does not exist yet.
    #[cfg(target_os = "espidf")]
    fn read_blob(&self, key: &'static [u8]) -> Result<Option<Vec<u8>>, i32> {
        let result = Self::with_nvs_handle(false, |handle| {
            let mut size: usize = 0;
            let ret = unsafe {
                nvs_get_blob(handle, key.as_ptr() as *const _, core::ptr::null_mut(), &mut size)
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            if size == 0 || size > MAX_BLOB_SIZE {
                return Err(ESP_ERR_NVS_INVALID_LENGTH);
            }

            let mut buf = vec![0u8; size];
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    key.as_ptr() as *const _,
                    buf.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(buf)
        });
        match result {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&self, key: &'static [u8], data: &[u8]) -> Result<(), i32> {
        Self::with_nvs_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    key.as_ptr() as *const _,
                    data.as_ptr() as *const _,
                    data.len(),
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self, key: &'static [u8]) -> Result<Option<Vec<u8>>, i32> {
        Ok(self.store.borrow().get(key).cloned())
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&self, key: &'static [u8], data: &[u8]) -> Result<(), i32> {
        if self.fail_commits.get() {
            return Err(-1);
        }
        self.store.borrow_mut().insert(key, data.to_vec());
        Ok(())
    }
}

// ── Limit store ───────────────────────────────────────────────

impl LimitStorePort for NvsAdapter {
    fn read_byte(&self, slot: usize) -> u8 {
        self.limits.get(slot).copied().unwrap_or(ERASED)
    }

    fn write_byte(&mut self, slot: usize, value: u8) {
        match self.limits.get_mut(slot) {
            Some(b) => *b = value,
            None => warn!("NvsAdapter: slot {} out of range", slot),
        }
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        let limits = self.limits;
        match self.write_blob(LIMITS_KEY, &limits) {
            Ok(()) => {
                info!("NvsAdapter: limits committed {:?}", limits);
                Ok(())
            }
            Err(rc) => {
                warn!("NvsAdapter: limit commit failed ({})", rc);
                Err(StoreError::CommitFailed)
            }
        }
    }
}

// ── Device configuration ──────────────────────────────────────

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<DeviceConfig, ConfigError> {
        match self.read_blob(CONFIG_KEY) {
            Ok(Some(bytes)) => {
                let cfg: DeviceConfig =
                    postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
                cfg.validate()?;
                info!("NvsAdapter: loaded config ({} bytes)", bytes.len());
                Ok(cfg)
            }
            Ok(None) => {
                info!("NvsAdapter: no stored config, using defaults");
                Ok(DeviceConfig::default())
            }
            Err(rc) => {
                warn!("NvsAdapter: config read error {}", rc);
                Err(ConfigError::IoError)
            }
        }
    }

    fn save(&self, config: &DeviceConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        match self.write_blob(CONFIG_KEY, &bytes) {
            Ok(()) => {
                info!("NvsAdapter: config saved ({} bytes)", bytes.len());
                Ok(())
            }
            Err(rc) => {
                warn!("NvsAdapter: config write error {}", rc);
                Err(ConfigError::IoError)
            }
        }
    }
}
