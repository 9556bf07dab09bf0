use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub name: Option<String>,
    pub email: String,
    pub dob: Option<NaiveDate>,
    pub address: Option<String>,
    pub renewal_date: Option<DateTime<Utc>>,
    pub platform: Option<String>,
    pub status: MemberStatus,
    pub licence_front_url: Option<String>,
    pub licence_back_url: Option<String>,
    pub selfie_url: Option<String>,
    pub licence_number: Option<String>,
    pub licence_expiry: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Member {
    pub fn is_admin(&self) -> bool {
        self.platform.as_deref() == Some("admin")
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("admin access required".to_string()))
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    NewUser,
    PendingVerification,
    Verified,
    Rejected,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::NewUser => "new_user",
            MemberStatus::PendingVerification => "pending_verification",
            MemberStatus::Verified => "verified",
            MemberStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new_user" => Some(MemberStatus::NewUser),
            "pending_verification" => Some(MemberStatus::PendingVerification),
            "verified" => Some(MemberStatus::Verified),
            "rejected" => Some(MemberStatus::Rejected),
            _ => None,
        }
    }

    /// Moves a member may make on their own profile: submitting it for review.
    pub fn can_self_transition_to(&self, target: MemberStatus) -> bool {
        *self == target
            || matches!(
                (self, target),
                (MemberStatus::NewUser, MemberStatus::PendingVerification)
            )
    }
}

/// Self-service profile update. Email, platform and verification outcome
/// are not member-editable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberUpdate {
    pub name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub address: Option<String>,
    pub status: Option<MemberStatus>,
    pub licence_front_url: Option<String>,
    pub licence_back_url: Option<String>,
    pub selfie_url: Option<String>,
    pub licence_number: Option<String>,
    pub licence_expiry: Option<NaiveDate>,
}

impl MemberUpdate {
    pub fn apply(self, member: &mut Member) -> Result<(), AppError> {
        if let Some(status) = self.status {
            if !member.status.can_self_transition_to(status) {
                return Err(AppError::InvalidState(format!(
                    "member status cannot change from {} to {}",
                    member.status.as_str(),
                    status.as_str()
                )));
            }
            member.status = status;
        }
        if self.name.is_some() {
            member.name = self.name;
        }
        if self.dob.is_some() {
            member.dob = self.dob;
        }
        if self.address.is_some() {
            member.address = self.address;
        }
        if self.licence_front_url.is_some() {
            member.licence_front_url = self.licence_front_url;
        }
        if self.licence_back_url.is_some() {
            member.licence_back_url = self.licence_back_url;
        }
        if self.selfie_url.is_some() {
            member.selfie_url = self.selfie_url;
        }
        if self.licence_number.is_some() {
            member.licence_number = self.licence_number;
        }
        if self.licence_expiry.is_some() {
            member.licence_expiry = self.licence_expiry;
        }
        Ok(())
    }
}
