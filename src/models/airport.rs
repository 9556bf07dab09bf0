use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Airport {
    pub id: i64,
    pub name: String,
    pub icao_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub parking_description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewAirport {
    pub name: String,
    pub icao_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub parking_description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AirportUpdate {
    pub name: Option<String>,
    pub icao_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub parking_description: Option<String>,
    pub is_active: Option<bool>,
}

impl AirportUpdate {
    pub fn apply(self, airport: &mut Airport) {
        if let Some(v) = self.name {
            airport.name = v;
        }
        if self.icao_code.is_some() {
            airport.icao_code = self.icao_code;
        }
        if self.latitude.is_some() {
            airport.latitude = self.latitude;
        }
        if self.longitude.is_some() {
            airport.longitude = self.longitude;
        }
        if self.parking_description.is_some() {
            airport.parking_description = self.parking_description;
        }
        if let Some(v) = self.is_active {
            airport.is_active = v;
        }
    }
}
