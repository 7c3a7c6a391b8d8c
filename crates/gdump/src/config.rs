use std::path::PathBuf;

use crate::memory::ENGINE_WINDOW_CLASS;

/// Configuration for a dump session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumperConfig {
    /// Window class used to locate target processes
    pub window_class: String,
    /// Which target to attach to when several are running
    pub process_index: usize,
    /// Where the class map is written
    pub output_path: PathBuf,
}

impl Default for DumperConfig {
    fn default() -> Self {
        Self {
            window_class: ENGINE_WINDOW_CLASS.to_string(),
            process_index: 0,
            output_path: PathBuf::from("godot_classes.json"),
        }
    }
}

impl DumperConfig {
    /// Create a new configuration builder
    pub fn builder() -> DumperConfigBuilder {
        DumperConfigBuilder::default()
    }
}

/// Builder for DumperConfig
#[derive(Debug, Clone, Default)]
pub struct DumperConfigBuilder {
    window_class: Option<String>,
    process_index: Option<usize>,
    output_path: Option<PathBuf>,
}

impl DumperConfigBuilder {
    /// Set the target window class
    pub fn window_class<S: Into<String>>(mut self, class: S) -> Self {
        self.window_class = Some(class.into());
        self
    }

    /// Pick the n-th matching process
    pub fn process_index(mut self, index: usize) -> Self {
        self.process_index = Some(index);
        self
    }

    /// Set the JSON output path
    pub fn output_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> DumperConfig {
        let default = DumperConfig::default();
        DumperConfig {
            window_class: self.window_class.unwrap_or(default.window_class),
            process_index: self.process_index.unwrap_or(default.process_index),
            output_path: self.output_path.unwrap_or(default.output_path),
        }
    }
}
