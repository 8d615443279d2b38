/// Arbor3D Engine - Singleton manager for engine subsystems
///
/// Holds the engine configuration, the shared graphics device, the resource
/// manager and the global logger in thread-safe static storage.
///
/// Logging works before `initialize()`: messages go to the default logger,
/// filtered with the default configuration.

use std::sync::{OnceLock, RwLock, Arc, Mutex};
use std::time::SystemTime;
use crate::config::EngineConfig;
use crate::graphics_device::{GraphicsDevice, SharedGraphicsDevice};
use crate::resource::ResourceManager;
use crate::error::{Result, Error};
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

// ===== INTERNAL STATE =====

/// Global engine state storage
static ENGINE_STATE: OnceLock<EngineState> = OnceLock::new();

/// Global logger and its severity threshold
static LOGGER: OnceLock<RwLock<LoggerState>> = OnceLock::new();

/// Internal state structure holding all engine singletons
struct EngineState {
    config: RwLock<EngineConfig>,
    graphics_device: RwLock<Option<SharedGraphicsDevice>>,
    resource_manager: RwLock<Option<Arc<Mutex<ResourceManager>>>>,
}

impl EngineState {
    fn new(config: EngineConfig) -> Self {
        Self {
            config: RwLock::new(config),
            graphics_device: RwLock::new(None),
            resource_manager: RwLock::new(None),
        }
    }
}

struct LoggerState {
    logger: Box<dyn Logger>,
    min_severity: LogSeverity,
}

fn logger_state() -> &'static RwLock<LoggerState> {
    LOGGER.get_or_init(|| RwLock::new(LoggerState {
        logger: Box::new(DefaultLogger),
        min_severity: EngineConfig::default().min_log_severity,
    }))
}

fn set_min_severity(severity: LogSeverity) {
    if let Ok(mut lock) = logger_state().write() {
        lock.min_severity = severity;
    }
}

// ===== PUBLIC API =====

/// Main engine singleton manager
///
/// # Example
///
/// ```no_run
/// use arbor_3d_engine::arbor3d::{Engine, EngineConfig};
/// use arbor_3d_engine::arbor3d::device::MockGraphicsDevice;
///
/// Engine::initialize_with(EngineConfig {
///     app_name: "Palette".to_string(),
///     ..EngineConfig::default()
/// })?;
/// let device = Engine::create_graphics_device(MockGraphicsDevice::new())?;
/// Engine::create_resource_manager()?;
///
/// // ... build and render scenes with `device` ...
///
/// Engine::shutdown();
/// # Ok::<(), arbor_3d_engine::arbor3d::Error>(())
/// ```
pub struct Engine;

impl Engine {
    fn state() -> Result<&'static EngineState> {
        match ENGINE_STATE.get() {
            Some(state) => Ok(state),
            None => crate::engine_fail!("arbor3d::Engine", Error::InitializationFailed(
                "Engine not initialized. Call Engine::initialize() first.".to_string()
            )),
        }
    }

    /// Initialize the engine with the default configuration
    pub fn initialize() -> Result<()> {
        Self::initialize_with(EngineConfig::default())
    }

    /// Initialize the engine with `config`
    ///
    /// Calling it again replaces the configuration and keeps existing
    /// subsystems.
    pub fn initialize_with(config: EngineConfig) -> Result<()> {
        set_min_severity(config.min_log_severity);
        let app_name = config.app_name.clone();

        let state = ENGINE_STATE.get_or_init(|| EngineState::new(config.clone()));
        let mut lock = state.config.write()
            .map_err(|_| crate::engine_err!("arbor3d::Engine", "Config lock poisoned"))?;
        *lock = config;
        drop(lock);

        crate::engine_info!("arbor3d::Engine", "Engine initialized for '{}'", app_name);
        Ok(())
    }

    /// Current configuration (the default one before `initialize()`)
    pub fn config() -> EngineConfig {
        ENGINE_STATE
            .get()
            .and_then(|state| state.config.read().ok().map(|config| config.clone()))
            .unwrap_or_default()
    }

    /// Shutdown the engine and destroy all singletons
    ///
    /// Resources go before the device. The configuration goes back to default.
    pub fn shutdown() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut rm) = state.resource_manager.write() {
                *rm = None;
            }
            if let Ok(mut device) = state.graphics_device.write() {
                *device = None;
            }
            if let Ok(mut config) = state.config.write() {
                *config = EngineConfig::default();
            }
        }
        set_min_severity(EngineConfig::default().min_log_severity);
    }

    // ===== GRAPHICS DEVICE API =====

    /// Wrap `device` and register it as the engine's graphics device
    pub fn create_graphics_device<D: GraphicsDevice + 'static>(device: D) -> Result<SharedGraphicsDevice> {
        let shared: SharedGraphicsDevice = Arc::new(Mutex::new(device));
        Self::register_graphics_device(shared.clone())?;
        crate::engine_info!("arbor3d::Engine", "Graphics device created");
        Ok(shared)
    }

    /// Register an already shared graphics device
    pub fn register_graphics_device(device: SharedGraphicsDevice) -> Result<()> {
        let state = Self::state()?;
        let mut lock = state.graphics_device.write()
            .map_err(|_| crate::engine_err!("arbor3d::Engine", "Graphics device lock poisoned"))?;

        if lock.is_some() {
            crate::engine_fail!("arbor3d::Engine", Error::InitializationFailed(
                "Graphics device already exists. Call Engine::destroy_graphics_device() first.".to_string()
            ));
        }

        *lock = Some(device);
        Ok(())
    }

    /// The engine's graphics device
    pub fn graphics_device() -> Result<SharedGraphicsDevice> {
        let state = Self::state()?;
        let lock = state.graphics_device.read()
            .map_err(|_| crate::engine_err!("arbor3d::Engine", "Graphics device lock poisoned"))?;

        match lock.clone() {
            Some(device) => Ok(device),
            None => crate::engine_fail!("arbor3d::Engine", Error::InitializationFailed(
                "Graphics device not created. Call Engine::create_graphics_device() first.".to_string()
            )),
        }
    }

    /// Unregister the graphics device
    ///
    /// Resources created on it stay valid until dropped.
    pub fn destroy_graphics_device() -> Result<()> {
        let state = Self::state()?;
        let mut lock = state.graphics_device.write()
            .map_err(|_| crate::engine_err!("arbor3d::Engine", "Graphics device lock poisoned"))?;
        *lock = None;

        crate::engine_info!("arbor3d::Engine", "Graphics device destroyed");
        Ok(())
    }

    // ===== RESOURCE MANAGER API =====

    /// Create and register the resource manager singleton
    pub fn create_resource_manager() -> Result<()> {
        let state = Self::state()?;
        let mut lock = state.resource_manager.write()
            .map_err(|_| crate::engine_err!("arbor3d::Engine", "ResourceManager lock poisoned"))?;

        if lock.is_some() {
            crate::engine_fail!("arbor3d::Engine", Error::InitializationFailed(
                "ResourceManager already exists. Call Engine::destroy_resource_manager() first.".to_string()
            ));
        }

        *lock = Some(Arc::new(Mutex::new(ResourceManager::new())));
        crate::engine_info!("arbor3d::Engine", "ResourceManager singleton created successfully");
        Ok(())
    }

    /// Get the resource manager singleton
    pub fn resource_manager() -> Result<Arc<Mutex<ResourceManager>>> {
        let state = Self::state()?;
        let lock = state.resource_manager.read()
            .map_err(|_| crate::engine_err!("arbor3d::Engine", "ResourceManager lock poisoned"))?;

        match lock.clone() {
            Some(rm) => Ok(rm),
            None => crate::engine_fail!("arbor3d::Engine", Error::InitializationFailed(
                "ResourceManager not created. Call Engine::create_resource_manager() first.".to_string()
            )),
        }
    }

    /// Destroy the resource manager singleton
    pub fn destroy_resource_manager() -> Result<()> {
        let state = Self::state()?;
        let mut lock = state.resource_manager.write()
            .map_err(|_| crate::engine_err!("arbor3d::Engine", "ResourceManager lock poisoned"))?;
        *lock = None;

        crate::engine_info!("arbor3d::Engine", "ResourceManager singleton destroyed");
        Ok(())
    }

    /// Reset all singletons for testing (only available in test builds)
    #[cfg(test)]
    pub fn reset_for_testing() {
        Self::shutdown();
    }

    // ===== LOGGING API =====

    /// Replace the logger (file logger, capture logger in tests...)
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        if let Ok(mut lock) = logger_state().write() {
            lock.logger = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        if let Ok(mut lock) = logger_state().write() {
            lock.logger = Box::new(DefaultLogger);
        }
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        Self::dispatch(severity, source, message, None, None);
    }

    /// Internal logging method with file:line information (for ERROR logs)
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        Self::dispatch(severity, source, message, Some(file), Some(line));
    }

    fn dispatch(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: Option<&'static str>,
        line: Option<u32>,
    ) {
        if let Ok(lock) = logger_state().read() {
            if severity < lock.min_severity {
                return;
            }
            lock.logger.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file,
                line,
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
