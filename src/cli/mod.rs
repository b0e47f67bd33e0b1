// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Command-line flags for the detection node

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::config::ServiceConfig;

/// Fabstir Detection Node
#[derive(Parser, Debug, Default)]
#[command(name = "fabstir-detect-node")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "HTTP object detection service", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, short, env = "DETECT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listen host (overrides HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port (overrides API_PORT)
    #[arg(long, short)]
    pub port: Option<u16>,

    /// ONNX model path (overrides MODEL_PATH)
    #[arg(long)]
    pub model_path: Option<PathBuf>,

    /// Load the model before accepting requests
    #[arg(long)]
    pub preload: bool,
}

impl Cli {
    /// Resolve the effective configuration: defaults, then the TOML file,
    /// then environment variables, then these flags
    pub fn load_config(&self) -> Result<ServiceConfig> {
        let mut config = match &self.config {
            Some(path) => ServiceConfig::from_file(path)?,
            None => ServiceConfig::default(),
        };
        config.apply_env();
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut ServiceConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(path) = &self.model_path {
            config.model_path = path.clone();
        }
        if self.preload {
            config.preload_model = true;
        }
    }
}
