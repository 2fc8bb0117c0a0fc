use log::info;
use serde::{Deserialize, Serialize};

use std::fs::{create_dir_all, File};

use directories::ProjectDirs;

use crate::sampler::SamplerOptions;

#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct WavepeekConfig {
    pub port: String,
    pub default_length: usize,
    pub default_sample_rate: u32,
    pub max_length: usize,
}

impl Default for WavepeekConfig {
    fn default() -> Self {
        let options = SamplerOptions::default();
        WavepeekConfig {
            port: "7878".into(),
            default_length: options.default_length,
            default_sample_rate: options.default_sample_rate,
            max_length: options.max_length,
        }
    }
}

impl WavepeekConfig {
    pub fn sampler_options(&self) -> SamplerOptions {
        SamplerOptions {
            default_length: self.default_length,
            default_sample_rate: self.default_sample_rate,
            max_length: self.max_length,
        }
    }
}

pub fn load_config() -> WavepeekConfig {
    let proj_dirs = ProjectDirs::from("com", "wavepeek", "wavepeek").unwrap();
    let config_dir = proj_dirs.config_dir();
    let config_path = config_dir.join("config.json");

    match File::open(config_path.clone()) {
        Ok(config_file) => match serde_json::from_reader(config_file) {
            Ok(config) => {
                info!("loaded config from {}", config_path.display());
                config
            }
            Err(err) => {
                info!("could not parse config, using defaults: {}", err);
                WavepeekConfig::default()
            }
        },
        Err(_) => {
            info!("creating and saving default config");
            let config = WavepeekConfig::default();
            if let Err(err) = save_config(&config) {
                info!("could not save default config: {}", err);
            }
            config
        }
    }
}

pub fn save_config(config: &WavepeekConfig) -> Result<(), Box<dyn std::error::Error>> {
    let proj_dirs = ProjectDirs::from("com", "wavepeek", "wavepeek").unwrap();
    let config_dir = proj_dirs.config_dir();
    create_dir_all(config_dir)?;

    let config_path = config_dir.join("config.json");

    let config_file = File::create(config_path)?;
    serde_json::to_writer(config_file, &config)?;
    Ok(())
}
