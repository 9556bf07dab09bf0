use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::interval::deserialize_opt_instant;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub member_id: i64,
    pub platform: Option<String>,
    pub purchase_token: Option<String>,
    pub status: Option<String>,
    pub renewal_date: Option<DateTime<Utc>>,
    pub last_checked: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewSubscription {
    pub member_id: i64,
    pub platform: Option<String>,
    pub purchase_token: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_instant")]
    pub renewal_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_opt_instant")]
    pub last_checked: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubscriptionUpdate {
    pub platform: Option<String>,
    pub purchase_token: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_instant")]
    pub renewal_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_opt_instant")]
    pub last_checked: Option<DateTime<Utc>>,
}

impl SubscriptionUpdate {
    pub fn apply(self, sub: &mut Subscription) {
        if self.platform.is_some() {
            sub.platform = self.platform;
        }
        if self.purchase_token.is_some() {
            sub.purchase_token = self.purchase_token;
        }
        if self.status.is_some() {
            sub.status = self.status;
        }
        if self.renewal_date.is_some() {
            sub.renewal_date = self.renewal_date;
        }
        if self.last_checked.is_some() {
            sub.last_checked = self.last_checked;
        }
    }
}
