use crate::error::LocationError;
use crate::models::Coordinate;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

struct GazetteerEntry {
    key: &'static str,
    name: &'static str,
    latitude: f64,
    longitude: f64,
}

const GAZETTEER: &[GazetteerEntry] = &[
    GazetteerEntry {
        key: "bangalore",
        name: "Bangalore",
        latitude: 12.9716,
        longitude: 77.5946,
    },
    GazetteerEntry {
        key: "delhi",
        name: "Delhi",
        latitude: 28.7041,
        longitude: 77.1025,
    },
    GazetteerEntry {
        key: "mumbai",
        name: "Mumbai",
        latitude: 19.0761,
        longitude: 72.8775,
    },
];

pub trait DeviceLocator: Send + Sync {
    async fn current_position(&self) -> Result<Coordinate, LocationError>;
}

#[derive(Debug, Clone)]
pub struct FixedLocator {
    position: Coordinate,
}

impl FixedLocator {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            position: Coordinate::new(latitude, longitude),
        }
    }
}

impl DeviceLocator for FixedLocator {
    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        Ok(Coordinate::new(self.position.latitude, self.position.longitude))
    }
}

#[derive(Debug, Clone)]
pub struct LocationResolver<D> {
    device: Option<D>,
}

impl<D> Default for LocationResolver<D> {
    fn default() -> Self {
        Self { device: None }
    }
}

impl<D: DeviceLocator> LocationResolver<D> {
    pub fn new(device: Option<D>) -> Self {
        Self { device }
    }

    pub fn with_device(device: D) -> Self {
        Self::new(Some(device))
    }

    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    pub async fn resolve_from_device(&self) -> Result<Coordinate, LocationError> {
        let Some(device) = &self.device else {
            return Err(LocationError::Unsupported);
        };

        let position = device.current_position().await?;
        Ok(Coordinate::new(position.latitude, position.longitude))
    }

    pub fn resolve_manual(&self, city: &str) -> Result<Coordinate, LocationError> {
        lookup_city(city)
    }
}

pub fn lookup_city(city: &str) -> Result<Coordinate, LocationError> {
    let key = city.trim().to_lowercase();
    GAZETTEER
        .iter()
        .find(|entry| entry.key == key)
        .map(|entry| Coordinate::new(entry.latitude, entry.longitude).with_city(entry.name))
        .ok_or_else(|| LocationError::CityNotFound {
            query: city.trim().to_string(),
            known: known_cities_phrase(),
        })
}

pub fn known_cities() -> Vec<&'static str> {
    GAZETTEER.iter().map(|entry| entry.name).collect()
}

fn known_cities_phrase() -> String {
    let names = known_cities();
    match names.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{}, or {}", rest.join(", "), last),
        Some((last, _)) => (*last).to_string(),
        None => String::new(),
    }
}

// haversine over degrees, in kilometres
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

pub fn distance_between(from: &Coordinate, to: &Coordinate) -> f64 {
    distance_km(from.latitude, from.longitude, to.latitude, to.longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DenyingLocator;

    impl DeviceLocator for DenyingLocator {
        async fn current_position(&self) -> Result<Coordinate, LocationError> {
            Err(LocationError::Denied("permission denied".to_string()))
        }
    }

    #[test]
    fn manual_lookup_ignores_case_and_whitespace() {
        let coordinate = lookup_city("  BanGalore ").unwrap();
        assert_eq!(coordinate.latitude, 12.9716);
        assert_eq!(coordinate.longitude, 77.5946);
        assert_eq!(coordinate.city.as_deref(), Some("Bangalore"));
    }

    #[test]
    fn unknown_city_is_not_found() {
        let error = lookup_city("Atlantis").unwrap_err();
        assert_eq!(
            error.to_string(),
            "City not found. Please try Bangalore, Delhi, or Mumbai."
        );
        assert!(matches!(error, LocationError::CityNotFound { ref query, .. } if query == "Atlantis"));
    }

    #[test]
    fn no_fuzzy_matching() {
        assert!(lookup_city("bangalor").is_err());
        assert!(lookup_city("new delhi").is_err());
    }

    #[test]
    fn distance_is_zero_for_same_point_and_symmetric() {
        assert_eq!(distance_km(0.0, 0.0, 0.0, 0.0), 0.0);

        let pairs = [
            (12.9716, 77.5946, 28.7041, 77.1025),
            (19.0761, 72.8775, -33.8688, 151.2093),
            (-89.9, 0.0, 89.9, 180.0),
        ];
        for (a, b, c, d) in pairs {
            let forward = distance_km(a, b, c, d);
            let backward = distance_km(c, d, a, b);
            assert!((forward - backward).abs() < 1e-9);
        }
    }

    #[test]
    fn bangalore_to_delhi_is_about_1740_km() {
        let bangalore = lookup_city("bangalore").unwrap();
        let delhi = lookup_city("delhi").unwrap();
        let km = distance_between(&bangalore, &delhi);
        assert!((1_700.0..1_780.0).contains(&km), "got {km}");
    }

    #[tokio::test]
    async fn device_resolution_outcomes() {
        let absent = LocationResolver::<FixedLocator>::default();
        assert_eq!(
            absent.resolve_from_device().await,
            Err(LocationError::Unsupported)
        );

        let denied = LocationResolver::with_device(DenyingLocator);
        assert!(matches!(
            denied.resolve_from_device().await,
            Err(LocationError::Denied(_))
        ));

        let fixed = LocationResolver::with_device(FixedLocator::new(19.0, 72.8));
        let position = fixed.resolve_from_device().await.unwrap();
        assert_eq!(position, Coordinate::new(19.0, 72.8));
        assert!(position.city.is_none());
    }
}
