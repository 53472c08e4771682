//! Tuning knobs for the selector and scheduler (spec §6, `TilesetOptions`).

use std::path::Path;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::TfError;

/// Monotone eye-height -> fog-density table, piecewise-linearly
/// interpolated (spec §4.1, "a fog density derived from the eye's height
/// above the ellipsoid via piecewise interpolation of a configured table").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FogDensityTable {
    /// (height_above_ellipsoid_m, density) pairs, sorted ascending by height.
    entries: Vec<(f64, f64)>,
}

impl Default for FogDensityTable {
    fn default() -> Self {
        // Cesium's stock table, the usual default for this kind of engine.
        Self {
            entries: vec![
                (359.0, 2.0e-5),
                (800.0, 2.0e-4),
                (1200.0, 1.0e-4),
                (2500.0, 8.0e-5),
                (5000.0, 6.0e-5),
                (10000.0, 5.0e-5),
                (20000.0, 4.0e-5),
                (40000.0, 3.0e-5),
                (100000.0, 1.5e-5),
                (200000.0, 8.5e-6),
                (400000.0, 6.25e-6),
                (800000.0, 4.0e-6),
            ],
        }
    }
}

impl FogDensityTable {
    pub fn new(entries: Vec<(f64, f64)>) -> Self {
        let mut entries = entries;
        entries.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        Self { entries }
    }

    /// Piecewise-linear interpolation, clamped at the table's ends.
    pub fn density_at_height(&self, height_m: f64) -> f64 {
        let Some(first) = self.entries.first() else {
            return 0.0;
        };
        if height_m <= first.0 {
            return first.1;
        }
        let last = self.entries.last().unwrap();
        if height_m >= last.0 {
            return last.1;
        }
        for w in self.entries.windows(2) {
            let (h0, d0) = w[0];
            let (h1, d1) = w[1];
            if height_m >= h0 && height_m <= h1 {
                if (h1 - h0).abs() < f64::EPSILON {
                    return d0;
                }
                let t = (height_m - h0) / (h1 - h0);
                return d0 + (d1 - d0) * t;
            }
        }
        last.1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TilesetOptions {
    pub maximum_screen_space_error: f64,
    pub maximum_simultaneous_tile_loads: usize,
    pub preload_ancestors: bool,
    pub preload_siblings: bool,
    pub loading_descendant_limit: usize,
    pub forbid_holes: bool,
    pub enable_frustum_culling: bool,
    pub enable_fog_culling: bool,
    pub enforce_culled_screen_space_error: bool,
    pub culled_screen_space_error: f64,
    pub maximum_cached_bytes: u64,
    pub fog_density_table: FogDensityTable,
    pub render_tiles_under_camera: bool,
}

impl Default for TilesetOptions {
    fn default() -> Self {
        Self {
            maximum_screen_space_error: 16.0,
            maximum_simultaneous_tile_loads: 20,
            preload_ancestors: true,
            preload_siblings: true,
            loading_descendant_limit: 20,
            forbid_holes: false,
            enable_frustum_culling: true,
            enable_fog_culling: true,
            enforce_culled_screen_space_error: true,
            culled_screen_space_error: 64.0,
            maximum_cached_bytes: 512 * 1024 * 1024,
            fog_density_table: FogDensityTable::default(),
            render_tiles_under_camera: true,
        }
    }
}

impl TilesetOptions {
    /// Load from a TOML file, falling back to defaults (and the platform
    /// config dir) the same way `abetterworld::world::config_loader` does.
    pub fn load(path: &Path) -> Result<Self, TfError> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| TfError::Invariant(format!("bad tileset options: {e}")))
    }

    pub fn save(&self, path: &Path) -> Result<(), TfError> {
        let text = toml::to_string_pretty(self)
            .map_err(|e| TfError::Invariant(format!("cannot serialize tileset options: {e}")))?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Default on-disk location under the platform config dir, mirroring
    /// `abetterworld`'s use of `directories` for its cache dir.
    pub fn default_path() -> Option<std::path::PathBuf> {
        ProjectDirs::from("dev", "tileforge", "tileforge")
            .map(|dirs| dirs.config_dir().join("tileset_options.toml"))
    }
}
