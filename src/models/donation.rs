use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequest {
    pub amount: f64,
    pub donor_email: Option<String>,
    pub payment_method: String,
    pub donor_name: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorRef {
    #[serde(default)]
    pub full_name: Option<String>,
}

/// A donation as returned by the recent-donations listing.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    #[serde(default)]
    pub donor_name: Option<String>,
    #[serde(default)]
    pub donor: Option<DonorRef>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub donation_time: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationMessage {
    pub donor_name: String,
    pub amount: f64,
    pub donation_time: String,
}

impl Donation {
    pub fn to_message(&self, now: DateTime<Utc>) -> DonationMessage {
        let donor_name = self
            .donor_name
            .as_deref()
            .or_else(|| self.donor.as_ref().and_then(|d| d.full_name.as_deref()))
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("Anonymous")
            .to_string();
        let donation_time = match self.created_at.as_deref().or(self.donation_time.as_deref()) {
            Some(raw) => format_time_ago(raw, now),
            None => "Just now".to_string(),
        };
        DonationMessage {
            donor_name,
            amount: self.amount.unwrap_or(0.0),
            donation_time,
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // LocalDateTime#toString from the backend, no offset.
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Relative "X ago" text. Inputs that are not timestamps are passed through.
pub fn format_time_ago(raw: &str, now: DateTime<Utc>) -> String {
    let Some(date) = parse_timestamp(raw) else {
        return raw.trim().to_string();
    };
    let diff = now.signed_duration_since(date);
    let mins = diff.num_minutes();
    let hours = diff.num_hours();
    let days = diff.num_days();

    let plural = |n: i64| if n > 1 { "s" } else { "" };
    if mins < 1 {
        "Just now".to_string()
    } else if mins < 60 {
        format!("{mins} minute{} ago", plural(mins))
    } else if hours < 24 {
        format!("{hours} hour{} ago", plural(hours))
    } else if days < 30 {
        format!("{days} day{} ago", plural(days))
    } else {
        date.format("%Y-%m-%d").to_string()
    }
}
