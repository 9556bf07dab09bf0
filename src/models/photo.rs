use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Inspection photo positions. Dashboard shots are only taken on return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhotoSlot {
    BeforeFront,
    BeforeLeft,
    BeforeRight,
    BeforeRear,
    AfterFront,
    AfterLeft,
    AfterRight,
    AfterRear,
    AfterDash,
}

impl PhotoSlot {
    pub const ALL: [PhotoSlot; 9] = [
        PhotoSlot::BeforeFront,
        PhotoSlot::BeforeLeft,
        PhotoSlot::BeforeRight,
        PhotoSlot::BeforeRear,
        PhotoSlot::AfterFront,
        PhotoSlot::AfterLeft,
        PhotoSlot::AfterRight,
        PhotoSlot::AfterRear,
        PhotoSlot::AfterDash,
    ];

    pub fn parse(phase: &str, angle: &str) -> Result<Self, AppError> {
        let phase = phase.trim().to_lowercase();
        let angle = angle.trim().to_lowercase();
        let slot = match (phase.as_str(), angle.as_str()) {
            ("before", "front") => PhotoSlot::BeforeFront,
            ("before", "left") => PhotoSlot::BeforeLeft,
            ("before", "right") => PhotoSlot::BeforeRight,
            ("before", "rear" | "back") => PhotoSlot::BeforeRear,
            ("after", "front") => PhotoSlot::AfterFront,
            ("after", "left") => PhotoSlot::AfterLeft,
            ("after", "right") => PhotoSlot::AfterRight,
            ("after", "rear" | "back") => PhotoSlot::AfterRear,
            ("after", "dash") => PhotoSlot::AfterDash,
            _ => {
                return Err(AppError::Validation(format!(
                    "unknown photo slot {phase}/{angle}; expected one of: {}",
                    Self::ALL
                        .iter()
                        .map(|s| s.key())
                        .collect::<Vec<_>>()
                        .join(", ")
                )))
            }
        };
        Ok(slot)
    }

    pub fn key(&self) -> &'static str {
        match self {
            PhotoSlot::BeforeFront => "before/front",
            PhotoSlot::BeforeLeft => "before/left",
            PhotoSlot::BeforeRight => "before/right",
            PhotoSlot::BeforeRear => "before/rear",
            PhotoSlot::AfterFront => "after/front",
            PhotoSlot::AfterLeft => "after/left",
            PhotoSlot::AfterRight => "after/right",
            PhotoSlot::AfterRear => "after/rear",
            PhotoSlot::AfterDash => "after/dash",
        }
    }

    /// Column in `bookings` that stores this slot's URL.
    pub fn column(&self) -> &'static str {
        match self {
            PhotoSlot::BeforeFront => "photo_before_front_url",
            PhotoSlot::BeforeLeft => "photo_before_left_url",
            PhotoSlot::BeforeRight => "photo_before_right_url",
            PhotoSlot::BeforeRear => "photo_before_rear_url",
            PhotoSlot::AfterFront => "photo_after_front_url",
            PhotoSlot::AfterLeft => "photo_after_left_url",
            PhotoSlot::AfterRight => "photo_after_right_url",
            PhotoSlot::AfterRear => "photo_after_rear_url",
            PhotoSlot::AfterDash => "photo_after_dash_url",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoSlots {
    pub photo_before_front_url: Option<String>,
    pub photo_before_left_url: Option<String>,
    pub photo_before_right_url: Option<String>,
    pub photo_before_rear_url: Option<String>,
    pub photo_after_front_url: Option<String>,
    pub photo_after_left_url: Option<String>,
    pub photo_after_right_url: Option<String>,
    pub photo_after_rear_url: Option<String>,
    pub photo_after_dash_url: Option<String>,
}

impl PhotoSlots {
    fn slot_mut(&mut self, slot: PhotoSlot) -> &mut Option<String> {
        match slot {
            PhotoSlot::BeforeFront => &mut self.photo_before_front_url,
            PhotoSlot::BeforeLeft => &mut self.photo_before_left_url,
            PhotoSlot::BeforeRight => &mut self.photo_before_right_url,
            PhotoSlot::BeforeRear => &mut self.photo_before_rear_url,
            PhotoSlot::AfterFront => &mut self.photo_after_front_url,
            PhotoSlot::AfterLeft => &mut self.photo_after_left_url,
            PhotoSlot::AfterRight => &mut self.photo_after_right_url,
            PhotoSlot::AfterRear => &mut self.photo_after_rear_url,
            PhotoSlot::AfterDash => &mut self.photo_after_dash_url,
        }
    }

    pub fn get(&self, slot: PhotoSlot) -> Option<&str> {
        let value = match slot {
            PhotoSlot::BeforeFront => &self.photo_before_front_url,
            PhotoSlot::BeforeLeft => &self.photo_before_left_url,
            PhotoSlot::BeforeRight => &self.photo_before_right_url,
            PhotoSlot::BeforeRear => &self.photo_before_rear_url,
            PhotoSlot::AfterFront => &self.photo_after_front_url,
            PhotoSlot::AfterLeft => &self.photo_after_left_url,
            PhotoSlot::AfterRight => &self.photo_after_right_url,
            PhotoSlot::AfterRear => &self.photo_after_rear_url,
            PhotoSlot::AfterDash => &self.photo_after_dash_url,
        };
        value.as_deref()
    }

    pub fn set(&mut self, slot: PhotoSlot, url: String) {
        *self.slot_mut(slot) = Some(url);
    }
}

/// Accepts only absolute http(s) URLs, as handed out by the upload service.
pub fn validate_photo_url(raw: &str) -> Result<String, AppError> {
    let url = reqwest::Url::parse(raw.trim())
        .map_err(|_| AppError::Validation(format!("photo url is not a valid URL: {raw:?}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        other => Err(AppError::Validation(format!(
            "photo url must use http or https, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_slots() {
        assert_eq!(PhotoSlot::parse("before", "front").unwrap(), PhotoSlot::BeforeFront);
        assert_eq!(PhotoSlot::parse("After", "DASH").unwrap(), PhotoSlot::AfterDash);
        assert_eq!(PhotoSlot::parse("after", "back").unwrap(), PhotoSlot::AfterRear);
    }

    #[test]
    fn test_dash_only_after() {
        assert!(matches!(
            PhotoSlot::parse("before", "dash"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_unknown_slot_lists_choices() {
        let err = PhotoSlot::parse("during", "roof").unwrap_err();
        assert!(err.to_string().contains("after/dash"));
    }

    #[test]
    fn test_slot_columns_are_distinct() {
        let mut cols: Vec<_> = PhotoSlot::ALL.iter().map(|s| s.column()).collect();
        cols.sort();
        cols.dedup();
        assert_eq!(cols.len(), PhotoSlot::ALL.len());
    }

    #[test]
    fn test_set_leaves_other_slots_alone() {
        let mut slots = PhotoSlots::default();
        slots.set(PhotoSlot::BeforeLeft, "https://cdn.example/l.jpg".to_string());
        slots.set(PhotoSlot::AfterDash, "https://cdn.example/d.jpg".to_string());
        assert_eq!(slots.get(PhotoSlot::BeforeLeft), Some("https://cdn.example/l.jpg"));
        assert_eq!(slots.get(PhotoSlot::AfterDash), Some("https://cdn.example/d.jpg"));
        assert_eq!(slots.get(PhotoSlot::BeforeFront), None);
        assert_eq!(slots.get(PhotoSlot::AfterLeft), None);
    }

    #[test]
    fn test_validate_photo_url() {
        assert!(validate_photo_url("https://bucket.s3.amazonaws.com/cars/1/a.jpg").is_ok());
        assert!(validate_photo_url("ftp://example.com/a.jpg").is_err());
        assert!(validate_photo_url("not a url").is_err());
    }
}
