//! Site descriptor: location, boundary polygon, and resource inputs.

use serde::{Deserialize, Serialize};

use super::{ConfigError, check_range};

/// Geographic and meteorological description of the plant site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Site {
    /// Location, year, and boundary polygon.
    pub data: SiteData,
    /// Solar resource file path (empty or absent means "download").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solar_resource_file: Option<String>,
    /// Wind resource file path (empty or absent means "download").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_resource_file: Option<String>,
    /// Wave resource file path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wave_resource_file: Option<String>,
    /// Grid price/demand signal file path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_resource_file: Option<String>,
    /// Turbine hub height used to pick the wind resource (m).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub_height: Option<f64>,
    /// Hours for which the plant must meet capacity (optional list).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capacity_hours: Vec<f64>,
    /// Whether the solar resource is loaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solar: Option<bool>,
    /// Whether the wind resource is loaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind: Option<bool>,
    /// Whether the wave resource is loaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wave: Option<bool>,
    /// Wind resource database, e.g. `"WTK"` or `"TAP"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_resource_origin: Option<String>,
}

/// Location and time reference for the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteData {
    /// Latitude (degrees).
    pub lat: f64,
    /// Longitude (degrees).
    pub lon: f64,
    /// Elevation (m).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elev: Option<f64>,
    /// Resource year.
    pub year: i32,
    /// UTC offset (hours).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tz: Option<i32>,
    /// Plant boundary polygons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_boundaries: Option<SiteBoundaries>,
}

/// Ordered `[x, y]` vertices of the plant boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteBoundaries {
    /// Detailed boundary.
    pub verts: Vec<[f64; 2]>,
    /// Simplified boundary.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verts_simple: Vec<[f64; 2]>,
}

impl SiteBoundaries {
    /// Shoelace area of the detailed polygon (m², when vertices are in metres).
    pub fn area(&self) -> f64 {
        polygon_area(&self.verts)
    }
}

fn polygon_area(verts: &[[f64; 2]]) -> f64 {
    if verts.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for (i, a) in verts.iter().enumerate() {
        let b = verts[(i + 1) % verts.len()];
        twice += a[0] * b[1] - b[0] * a[1];
    }
    twice.abs() / 2.0
}

impl Site {
    /// Appends validation errors for the site block.
    pub(crate) fn validate(&self, errors: &mut Vec<ConfigError>) {
        let d = &self.data;
        check_range(errors, "site.data.lat", d.lat, -90.0, 90.0);
        check_range(errors, "site.data.lon", d.lon, -180.0, 180.0);
        if let Some(tz) = d.tz {
            check_range(errors, "site.data.tz", f64::from(tz), -12.0, 14.0);
        }

        if let Some(b) = &d.site_boundaries {
            if b.verts.len() < 3 {
                errors.push(ConfigError::new(
                    "site.data.site_boundaries.verts",
                    format!("polygon needs at least 3 vertices, got {}", b.verts.len()),
                ));
            }
            if !b.verts_simple.is_empty() && b.verts_simple.len() < 3 {
                errors.push(ConfigError::new(
                    "site.data.site_boundaries.verts_simple",
                    format!(
                        "polygon needs at least 3 vertices, got {}",
                        b.verts_simple.len()
                    ),
                ));
            }
            for (i, v) in b.verts.iter().chain(&b.verts_simple).enumerate() {
                if !v[0].is_finite() || !v[1].is_finite() {
                    errors.push(ConfigError::new(
                        "site.data.site_boundaries",
                        format!("vertex {i} is not finite"),
                    ));
                }
            }
        }

        if self.hub_height.is_some_and(|h| h < 0.0) {
            errors.push(ConfigError::new("site.hub_height", "must be >= 0"));
        }

        // Solar and wind files may be left empty and downloaded by location and
        // year. Wave data has no download source.
        let wave_file = self.wave_resource_file.as_deref().unwrap_or_default();
        if self.wave.unwrap_or(false) && wave_file.is_empty() {
            errors.push(ConfigError::new(
                "site.wave_resource_file",
                "required when site.wave is enabled",
            ));
        }
    }
}
