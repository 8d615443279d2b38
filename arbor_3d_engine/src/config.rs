/// Engine configuration
///
/// Installed once through `Engine::initialize_with()`. Everything has a
/// sensible default so `Engine::initialize()` needs no arguments.

use crate::log::LogSeverity;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Application name (reported in the startup log line)
    pub app_name: String,
    /// Messages below this severity are dropped before reaching the logger
    pub min_log_severity: LogSeverity,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app_name: "Arbor3D Application".to_string(),
            min_log_severity: if cfg!(debug_assertions) {
                LogSeverity::Debug
            } else {
                LogSeverity::Info
            },
        }
    }
}
