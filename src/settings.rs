use log::{info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSettings {
    /// Instances reserved up front in the opaque queue.
    #[serde(default = "QueueSettings::default_opaque_capacity")]
    pub opaque_capacity: usize,
    /// Instances reserved up front in the transparent queue.
    #[serde(default = "QueueSettings::default_transparent_capacity")]
    pub transparent_capacity: usize,
    /// Instances an instance-batch record accepts before clamping.
    #[serde(default = "QueueSettings::default_instance_capacity")]
    pub instance_capacity: u32,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            opaque_capacity: Self::default_opaque_capacity(),
            transparent_capacity: Self::default_transparent_capacity(),
            instance_capacity: Self::default_instance_capacity(),
        }
    }
}

impl QueueSettings {
    pub fn load() -> Self {
        Self::load_from_path("draw_queue.json")
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<QueueSettings>(&contents) {
                Ok(settings) => {
                    info!("Loaded queue settings from {:?}", path);
                    settings.validate()
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {:?} ({}). Falling back to default queue settings.",
                        path, err
                    );
                    QueueSettings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Queue settings file {:?} not found. Using default settings.",
                    path
                );
                QueueSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default queue settings.",
                    path, err
                );
                QueueSettings::default()
            }
        }
    }

    fn validate(mut self) -> Self {
        if self.instance_capacity == 0 {
            warn!("Instance capacity must be greater than zero. Using default value.");
            self.instance_capacity = Self::default_instance_capacity();
        }

        self
    }

    const fn default_opaque_capacity() -> usize {
        1024
    }

    const fn default_transparent_capacity() -> usize {
        256
    }

    const fn default_instance_capacity() -> u32 {
        crate::queue::instancing::DEFAULT_INSTANCE_CAPACITY
    }
}
