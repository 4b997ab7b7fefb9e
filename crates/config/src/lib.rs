// Configuration loading

pub mod settings;

pub use settings::Settings;

/// Directory name used under the platform config and data dirs.
pub const APP_DIR: &str = "gymdesk";
