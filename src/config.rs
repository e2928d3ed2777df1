use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use geo::Point;
use serde::Deserialize;

use crate::cluster::DEFAULT_CLUSTER_DISTANCE;
use crate::types::Viewport;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub map: MapConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Base URL of the paginated collection, e.g. `https://host/containers`.
    pub endpoint: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MapConfig {
    pub center_lon: f64,
    pub center_lat: f64,
    pub zoom: u8,
    #[serde(default = "default_width_px")]
    pub width_px: f64,
    #[serde(default = "default_height_px")]
    pub height_px: f64,
    #[serde(default = "default_cluster_distance")]
    pub cluster_distance: f64,
}

fn default_page_size() -> u32 {
    100
}

fn default_width_px() -> f64 {
    1280.0
}

fn default_height_px() -> f64 {
    800.0
}

fn default_cluster_distance() -> f64 {
    DEFAULT_CLUSTER_DISTANCE
}

impl MapConfig {
    pub fn viewport(&self) -> Viewport {
        Viewport {
            center: Point::new(self.center_lon, self.center_lat),
            zoom: self.zoom,
            width_px: self.width_px,
            height_px: self.height_px,
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [provider]
            endpoint = "https://ecomap.example/containers"

            [map]
            center_lon = -8.41
            center_lat = 40.20
            zoom = 12
            "#,
        )
        .unwrap();

        assert_eq!(config.provider.page_size, 100);
        assert_eq!(config.map.cluster_distance, DEFAULT_CLUSTER_DISTANCE);
        let viewport = config.map.viewport();
        assert_eq!(viewport.zoom, 12);
        assert_eq!(viewport.center.x(), -8.41);
    }
}
