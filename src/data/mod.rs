use anyhow::{Context, Result};
use geojson::{GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::config::GlobeConfig;
use crate::map::{LandMask, Polygon, Ring};
use crate::state::City;

/// Land raster and preset cities used by the app
pub struct WorldData {
    pub land: LandMask,
    pub cities: Vec<City>,
}

/// Load land and cities from the data directory, falling back to built-in
/// outlines when files are missing or unreadable.
pub fn load_world(config: &GlobeConfig) -> WorldData {
    let data_dir = config.data_dir.as_path();

    let land_path = data_dir.join("land.json");
    let mut polygons = Vec::new();
    if land_path.exists() {
        match load_land(&land_path) {
            Ok(loaded) => {
                info!(path = %land_path.display(), polygons = loaded.len(), "loaded land");
                polygons = loaded;
            }
            Err(e) => warn!(path = %land_path.display(), "failed to load land: {e:#}"),
        }
    }
    if polygons.is_empty() {
        info!("using built-in land outlines");
        polygons = simple_world();
    }

    let cities = if !config.cities.is_empty() {
        config
            .cities
            .iter()
            .map(|c| City::new(c.name.clone(), c.lon, c.lat))
            .collect()
    } else {
        let cities_path = data_dir.join("cities.json");
        let loaded = if cities_path.exists() {
            load_cities(&cities_path).unwrap_or_else(|e| {
                warn!(path = %cities_path.display(), "failed to load cities: {e:#}");
                Vec::new()
            })
        } else {
            Vec::new()
        };
        if loaded.is_empty() { default_cities() } else { loaded }
    };

    let mut land = LandMask::from_polygons(&polygons);
    if !land.has_land() {
        warn!("land data covers no cells, using built-in land outlines");
        land = LandMask::from_polygons(&simple_world());
    }
    info!(land_fraction = land.land_fraction(), cities = cities.len(), "world ready");
    WorldData { land, cities }
}

/// Parse a GeoJSON file
fn read_geojson(path: &Path) -> Result<GeoJson> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let geojson: GeoJson = content
        .parse()
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(geojson)
}

/// Load land polygons (e.g. Natural Earth `ne_110m_land`)
pub fn load_land(path: &Path) -> Result<Vec<Polygon>> {
    let geojson = read_geojson(path)?;
    let mut polygons = Vec::new();
    process_geojson_polygons(&geojson, &mut |polygon| polygons.push(polygon));
    Ok(polygons)
}

/// Load named Point features as preset cities
pub fn load_cities(path: &Path) -> Result<Vec<City>> {
    let geojson = read_geojson(path)?;
    Ok(cities_from_geojson(&geojson))
}

fn cities_from_geojson(geojson: &GeoJson) -> Vec<City> {
    let mut cities = Vec::new();
    if let GeoJson::FeatureCollection(fc) = geojson {
        for feature in &fc.features {
            let name = feature
                .properties
                .as_ref()
                .and_then(|p| p.get("name"))
                .and_then(|v| v.as_str())
                .unwrap_or("Unknown");

            if let Some(ref geometry) = feature.geometry {
                if let Value::Point(coords) = &geometry.value {
                    if coords.len() >= 2 {
                        cities.push(City::new(name, coords[0], coords[1]));
                    }
                }
            }
        }
    }
    cities
}

/// Walk GeoJSON and hand each polygon (exterior plus holes) to `add_polygon`
fn process_geojson_polygons<F>(geojson: &GeoJson, add_polygon: &mut F)
where
    F: FnMut(Polygon),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    process_geometry_polygons(geometry, add_polygon);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                process_geometry_polygons(geometry, add_polygon);
            }
        }
        GeoJson::Geometry(geometry) => {
            process_geometry_polygons(geometry, add_polygon);
        }
    }
}

fn process_geometry_polygons<F>(geometry: &Geometry, add_polygon: &mut F)
where
    F: FnMut(Polygon),
{
    let to_ring = |coords: &Vec<Vec<f64>>| -> Ring {
        coords.iter().filter(|c| c.len() >= 2).map(|c| (c[0], c[1])).collect()
    };

    match &geometry.value {
        Value::Polygon(rings) => {
            add_polygon(rings.iter().map(to_ring).collect());
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                add_polygon(rings.iter().map(to_ring).collect());
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_polygons(g, add_polygon);
            }
        }
        _ => {}
    }
}

/// Preset cities when no city data is available
pub fn default_cities() -> Vec<City> {
    vec![
        City::new("Quito", -78.5, -0.2),
        City::new("Oslo", 10.7, 59.9),
        City::new("New York", -74.0, 40.7),
        City::new("London", -0.1, 51.5),
        City::new("Tokyo", 139.7, 35.7),
        City::new("Sydney", 151.2, -33.9),
        City::new("Rio", -43.2, -22.9),
        City::new("Reykjavik", -21.9, 64.1),
        City::new("Singapore", 103.8, 1.3),
        City::new("Buenos Aires", -58.4, -34.6),
        City::new("Nairobi", 36.8, -1.3),
        City::new("Anchorage", -149.9, 61.2),
    ]
}

/// Rough continent outlines for when no land file is available
pub fn simple_world() -> Vec<Polygon> {
    let ring = |points: &[(f64, f64)]| -> Polygon { vec![points.to_vec()] };
    vec![
        // North America
        ring(&[
            (-168.0, 65.0), (-166.0, 60.0), (-141.0, 60.0), (-130.0, 55.0),
            (-125.0, 48.0), (-124.0, 40.0), (-117.0, 32.0), (-110.0, 25.0),
            (-105.0, 20.0), (-95.0, 16.0), (-85.0, 12.0), (-80.0, 8.0),
            (-83.0, 15.0), (-88.0, 21.0), (-97.0, 25.0), (-97.0, 28.0),
            (-82.0, 24.0), (-80.0, 25.0), (-81.0, 31.0), (-75.0, 35.0),
            (-70.0, 41.0), (-67.0, 45.0), (-65.0, 47.0), (-55.0, 47.0),
            (-52.0, 47.0), (-55.0, 52.0), (-58.0, 55.0), (-64.0, 60.0),
            (-73.0, 62.0), (-80.0, 63.0), (-95.0, 62.0), (-110.0, 68.0),
            (-130.0, 70.0), (-145.0, 70.0),
        ]),
        // South America
        ring(&[
            (-80.0, 10.0), (-75.0, 11.0), (-70.0, 12.0), (-60.0, 8.0),
            (-50.0, 0.0), (-35.0, -5.0), (-35.0, -10.0), (-38.0, -15.0),
            (-40.0, -22.0), (-48.0, -25.0), (-55.0, -34.0), (-58.0, -38.0),
            (-65.0, -42.0), (-68.0, -50.0), (-75.0, -52.0), (-75.0, -45.0),
            (-72.0, -40.0), (-72.0, -30.0), (-70.0, -20.0), (-76.0, -14.0),
            (-81.0, -5.0), (-80.0, 0.0),
        ]),
        // Europe
        ring(&[
            (-10.0, 36.0), (-5.0, 36.0), (0.0, 38.0), (5.0, 43.0),
            (10.0, 44.0), (15.0, 45.0), (20.0, 40.0), (25.0, 37.0),
            (30.0, 40.0), (35.0, 42.0), (40.0, 43.0), (40.0, 55.0),
            (30.0, 60.0), (25.0, 65.0), (20.0, 70.0), (10.0, 71.0),
            (5.0, 62.0), (5.0, 58.0), (-5.0, 58.0), (-10.0, 52.0),
            (-5.0, 48.0), (-5.0, 43.0),
        ]),
        // Africa
        ring(&[
            (-17.0, 15.0), (-17.0, 21.0), (-13.0, 28.0), (-6.0, 35.0),
            (10.0, 37.0), (20.0, 32.0), (32.0, 31.0), (35.0, 28.0),
            (43.0, 12.0), (51.0, 12.0), (48.0, 4.0), (40.0, -5.0),
            (40.0, -15.0), (35.0, -24.0), (31.0, -30.0), (20.0, -35.0),
            (18.0, -32.0), (12.0, -18.0), (13.0, -8.0), (9.0, 0.0),
            (9.0, 4.0), (0.0, 5.0), (-8.0, 4.0), (-13.0, 8.0),
        ]),
        // Asia
        ring(&[
            (40.0, 43.0), (50.0, 40.0), (55.0, 37.0), (57.0, 25.0),
            (65.0, 25.0), (70.0, 20.0), (75.0, 15.0), (80.0, 8.0),
            (80.0, 15.0), (88.0, 22.0), (92.0, 22.0), (95.0, 16.0),
            (100.0, 14.0), (105.0, 10.0), (110.0, 20.0), (115.0, 22.0),
            (120.0, 22.0), (122.0, 25.0), (125.0, 30.0), (130.0, 35.0),
            (135.0, 35.0), (140.0, 40.0), (145.0, 45.0), (145.0, 50.0),
            (160.0, 60.0), (180.0, 66.0), (180.0, 70.0), (140.0, 73.0),
            (110.0, 77.0), (80.0, 73.0), (60.0, 70.0), (40.0, 66.0),
            (40.0, 55.0),
        ]),
        // Australia
        ring(&[
            (115.0, -20.0), (120.0, -18.0), (130.0, -12.0), (140.0, -12.0),
            (145.0, -15.0), (150.0, -25.0), (153.0, -30.0), (150.0, -35.0),
            (145.0, -38.0), (140.0, -38.0), (135.0, -35.0), (130.0, -32.0),
            (125.0, -32.0), (115.0, -35.0), (115.0, -25.0),
        ]),
        // Greenland
        ring(&[
            (-55.0, 60.0), (-43.0, 60.0), (-35.0, 66.0), (-20.0, 70.0),
            (-18.0, 78.0), (-30.0, 83.0), (-60.0, 82.0), (-72.0, 78.0),
            (-58.0, 70.0),
        ]),
        // Antarctica
        ring(&[
            (-180.0, -90.0), (180.0, -90.0), (180.0, -78.0), (120.0, -66.0),
            (60.0, -67.0), (0.0, -70.0), (-60.0, -64.0), (-100.0, -73.0),
            (-160.0, -78.0), (-180.0, -78.0),
        ]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GeoJson {
        json.parse().unwrap()
    }

    #[test]
    fn test_polygons_from_feature_collection() {
        let geojson = parse(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {}, "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]]
                }},
                {"type": "Feature", "properties": {}, "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[20, 0], [30, 0], [30, 10], [20, 0]]],
                        [[[40, 0], [50, 0], [50, 10], [40, 0]]]
                    ]
                }},
                {"type": "Feature", "properties": {}, "geometry": {
                    "type": "LineString",
                    "coordinates": [[0, 0], [1, 1]]
                }}
            ]}"#,
        );
        let mut polygons = Vec::new();
        process_geojson_polygons(&geojson, &mut |p| polygons.push(p));
        assert_eq!(polygons.len(), 3);
        assert_eq!(polygons[0][0].len(), 5);
        assert_eq!(polygons[1][0][1], (30.0, 0.0));
    }

    #[test]
    fn test_cities_from_points() {
        let geojson = parse(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"name": "Quito"},
                 "geometry": {"type": "Point", "coordinates": [-78.5, -0.2]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}}
            ]}"#,
        );
        let cities = cities_from_geojson(&geojson);
        assert_eq!(cities.len(), 2);
        assert_eq!(cities[0], City::new("Quito", -78.5, -0.2));
        assert_eq!(cities[1].name, "Unknown");
    }

    #[test]
    fn test_simple_world_has_land() {
        let mask = LandMask::from_polygons(&simple_world());
        // Central Africa, central Asia, Antarctica
        assert!(mask.is_on_land(20.0, 0.0));
        assert!(mask.is_on_land(90.0, 50.0));
        assert!(mask.is_on_land(0.0, -85.0));
        // Mid-Pacific, mid-Atlantic
        assert!(!mask.is_on_land(-150.0, 0.0));
        assert!(!mask.is_on_land(-30.0, 20.0));
    }

    #[test]
    fn test_empty_land_file_falls_back() {
        let dir = std::env::temp_dir().join(format!("globe-speed-land-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        // A degenerate ring rasterizes to nothing
        fs::write(
            dir.join("land.json"),
            r#"{"type": "Feature", "properties": {}, "geometry": {
                "type": "Polygon", "coordinates": [[[0, 0], [10, 0], [0, 0]]]
            }}"#,
        )
        .unwrap();

        let config = GlobeConfig {
            data_dir: dir.clone(),
            cities: vec![crate::config::CityEntry { name: "Quito".to_string(), lon: -78.5, lat: -0.2 }],
            ..GlobeConfig::default()
        };
        let world = load_world(&config);
        fs::remove_dir_all(&dir).unwrap();

        assert!(world.land.has_land());
        assert!(world.land.is_on_land(20.0, 0.0));
        assert_eq!(world.cities, vec![City::new("Quito", -78.5, -0.2)]);
    }

    #[test]
    fn test_default_cities_in_range() {
        for city in default_cities() {
            assert!((-90.0..=90.0).contains(&city.lat));
            assert!((-180.0..=180.0).contains(&city.lon));
        }
    }

    #[test]
    fn test_missing_land_file_errors() {
        assert!(load_land(Path::new("no/such/land.json")).is_err());
    }
}
