use serde::{Deserialize, Serialize};

use crate::errors::PitlaneError;
use crate::track::TrackOutlineConfig;

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub outline: TrackOutlineConfig,
}

impl AppConfig {
    pub fn from_local_file() -> Option<Self> {
        let config_path = dirs::config_dir()?.join("pitlane").join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let file = std::fs::File::open(config_path).expect("Could not open config file");
            Some(serde_json::from_reader(file).expect("Could not parse config file"))
        } else {
            None
        }
    }

    pub fn save(&self) -> Result<(), PitlaneError> {
        let config_path = dirs::config_dir()
            .ok_or(PitlaneError::NoConfigDir)?
            .join("pitlane")
            .join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            std::fs::create_dir_all(config_path.parent().unwrap())
                .map_err(|e| PitlaneError::ConfigIOError { source: e })?;
        }

        let file = std::fs::File::create(config_path)
            .map_err(|e| PitlaneError::ConfigIOError { source: e })?;
        serde_json::to_writer(file, self)
            .map_err(|e| PitlaneError::ConfigSerializeError { source: e })
    }
}
