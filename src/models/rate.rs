use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rate {
    pub id: i64,
    pub airport_id: Option<i64>,
    pub rate_name: String,
    pub hourly_rate: f64,
    pub discount_threshold_hours: Option<i64>,
    pub discount_percent: Option<f64>,
    pub gst_percent: Option<f64>,
    pub is_gst_inclusive: Option<bool>,
    pub active_from: Option<NaiveDate>,
    pub active_to: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewRate {
    pub rate_name: String,
    pub hourly_rate: f64,
    pub airport_id: Option<i64>,
    pub discount_threshold_hours: Option<i64>,
    pub discount_percent: Option<f64>,
    pub gst_percent: Option<f64>,
    pub is_gst_inclusive: Option<bool>,
    pub active_from: Option<NaiveDate>,
    pub active_to: Option<NaiveDate>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateUpdate {
    pub rate_name: Option<String>,
    pub hourly_rate: Option<f64>,
    pub airport_id: Option<i64>,
    pub discount_threshold_hours: Option<i64>,
    pub discount_percent: Option<f64>,
    pub gst_percent: Option<f64>,
    pub is_gst_inclusive: Option<bool>,
    pub active_from: Option<NaiveDate>,
    pub active_to: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

impl RateUpdate {
    pub fn apply(self, rate: &mut Rate) {
        if let Some(v) = self.rate_name {
            rate.rate_name = v;
        }
        if let Some(v) = self.hourly_rate {
            rate.hourly_rate = v;
        }
        if let Some(v) = self.is_active {
            rate.is_active = v;
        }
        if self.airport_id.is_some() {
            rate.airport_id = self.airport_id;
        }
        if self.discount_threshold_hours.is_some() {
            rate.discount_threshold_hours = self.discount_threshold_hours;
        }
        if self.discount_percent.is_some() {
            rate.discount_percent = self.discount_percent;
        }
        if self.gst_percent.is_some() {
            rate.gst_percent = self.gst_percent;
        }
        if self.is_gst_inclusive.is_some() {
            rate.is_gst_inclusive = self.is_gst_inclusive;
        }
        if self.active_from.is_some() {
            rate.active_from = self.active_from;
        }
        if self.active_to.is_some() {
            rate.active_to = self.active_to;
        }
    }
}
