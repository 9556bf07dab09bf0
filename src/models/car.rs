use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Car {
    pub id: i64,
    pub registration: String,
    pub make_model: Option<String>,
    pub airport_id: i64,
    pub status: CarStatus,
    pub price_hourly: Option<f64>,
    pub lockbox_ble_name: Option<String>,
    pub lockbox_serial: Option<String>,
    pub keyfob_code: Option<String>,
    pub image_url: Option<String>,
    pub carleft_url: Option<String>,
    pub carright_url: Option<String>,
    pub carback_url: Option<String>,
    pub carfront_url: Option<String>,
    pub cardash_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Car {
    pub fn display_name(&self) -> &str {
        self.make_model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.registration)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CarStatus {
    Active,
    Available,
    Maintenance,
    Retired,
}

impl CarStatus {
    /// Statuses a car can be hired in.
    pub const BOOKABLE: [CarStatus; 2] = [CarStatus::Active, CarStatus::Available];

    pub fn as_str(&self) -> &'static str {
        match self {
            CarStatus::Active => "active",
            CarStatus::Available => "available",
            CarStatus::Maintenance => "maintenance",
            CarStatus::Retired => "retired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(CarStatus::Active),
            "available" => Some(CarStatus::Available),
            "maintenance" => Some(CarStatus::Maintenance),
            "retired" => Some(CarStatus::Retired),
            _ => None,
        }
    }

    pub fn parse_param(s: &str) -> Result<Self, AppError> {
        Self::parse(s).ok_or_else(|| AppError::Validation(format!("unknown car status: {s}")))
    }

    pub fn is_bookable(&self) -> bool {
        Self::BOOKABLE.contains(self)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewCar {
    pub registration: String,
    pub airport_id: i64,
    pub make_model: Option<String>,
    #[serde(default = "default_car_status")]
    pub status: CarStatus,
    pub price_hourly: Option<f64>,
    pub lockbox_ble_name: Option<String>,
    pub lockbox_serial: Option<String>,
    pub keyfob_code: Option<String>,
    pub image_url: Option<String>,
    pub carleft_url: Option<String>,
    pub carright_url: Option<String>,
    pub carback_url: Option<String>,
    pub carfront_url: Option<String>,
    pub cardash_url: Option<String>,
}

fn default_car_status() -> CarStatus {
    CarStatus::Available
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CarUpdate {
    pub registration: Option<String>,
    pub airport_id: Option<i64>,
    pub make_model: Option<String>,
    pub status: Option<CarStatus>,
    pub price_hourly: Option<f64>,
    pub lockbox_ble_name: Option<String>,
    pub lockbox_serial: Option<String>,
    pub keyfob_code: Option<String>,
    pub image_url: Option<String>,
    pub carleft_url: Option<String>,
    pub carright_url: Option<String>,
    pub carback_url: Option<String>,
    pub carfront_url: Option<String>,
    pub cardash_url: Option<String>,
}

impl CarUpdate {
    pub fn apply(self, car: &mut Car) {
        if let Some(v) = self.registration {
            car.registration = v;
        }
        if let Some(v) = self.airport_id {
            car.airport_id = v;
        }
        if let Some(v) = self.status {
            car.status = v;
        }
        if self.make_model.is_some() {
            car.make_model = self.make_model;
        }
        if self.price_hourly.is_some() {
            car.price_hourly = self.price_hourly;
        }
        if self.lockbox_ble_name.is_some() {
            car.lockbox_ble_name = self.lockbox_ble_name;
        }
        if self.lockbox_serial.is_some() {
            car.lockbox_serial = self.lockbox_serial;
        }
        if self.keyfob_code.is_some() {
            car.keyfob_code = self.keyfob_code;
        }
        if self.image_url.is_some() {
            car.image_url = self.image_url;
        }
        if self.carleft_url.is_some() {
            car.carleft_url = self.carleft_url;
        }
        if self.carright_url.is_some() {
            car.carright_url = self.carright_url;
        }
        if self.carback_url.is_some() {
            car.carback_url = self.carback_url;
        }
        if self.carfront_url.is_some() {
            car.carfront_url = self.carfront_url;
        }
        if self.cardash_url.is_some() {
            car.cardash_url = self.cardash_url;
        }
    }
}
