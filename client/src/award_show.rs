//! The closing screen shown once voting has ended.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use songjam_utils::format_duration;

/// When and where the results are announced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardShow {
    /// Start of the live stream (RFC 3339, UTC).
    #[serde(default = "default_date_time")]
    pub date_time: DateTime<Utc>,

    #[serde(default = "default_twitch_channel")]
    pub twitch_channel: String,

    #[serde(default = "default_contest_name")]
    pub contest_name: String,
}

/// Where the show stands relative to now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShowStatus {
    Upcoming { starts_in_secs: u64 },
    Live,
}

fn default_date_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 7, 11, 0, 0)
        .single()
        .unwrap_or_default()
}

fn default_twitch_channel() -> String {
    "kalden_berg".to_string()
}

fn default_contest_name() -> String {
    "Kalden's SONGJAM".to_string()
}

impl AwardShow {
    pub fn twitch_url(&self) -> String {
        format!("https://twitch.tv/{}", self.twitch_channel)
    }

    pub fn status(&self, now: DateTime<Utc>) -> ShowStatus {
        let secs = (self.date_time - now).num_seconds();
        if secs > 0 {
            ShowStatus::Upcoming {
                starts_in_secs: secs as u64,
            }
        } else {
            ShowStatus::Live
        }
    }

    /// The start date and time as the viewer in `tz` would read them,
    /// e.g. ("Saturday, March 7, 2026", "11:00 AM UTC").
    pub fn local_date_time<Tz>(&self, tz: &Tz) -> (String, String)
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let local = self.date_time.with_timezone(tz);
        (
            local.format("%A, %B %-d, %Y").to_string(),
            local.format("%-I:%M %p %Z").to_string(),
        )
    }

    /// Full text of the closing screen.
    pub fn render<Tz>(&self, now: DateTime<Utc>, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let (date, time) = self.local_date_time(tz);
        let countdown = match self.status(now) {
            ShowStatus::Upcoming { starts_in_secs } => {
                format!("Starts in {}", format_duration(starts_in_secs))
            }
            ShowStatus::Live => "Live now!".to_string(),
        };
        format!(
            "Thank You for Voting!\n\
             Voting for {name} has ended.\n\
             Thank you to everyone who participated and supported our amazing artists!\n\
             \n\
             Join Us for the Award Show!\n\
             Tune in to see the results live and celebrate our talented artists!\n\
             \n\
             Date and Time: {date} at {time}\n\
             {countdown}\n\
             Watch on Twitch: {url}\n\
             \n\
             See you at the Award Show!\n",
            name = self.contest_name,
            url = self.twitch_url(),
        )
    }
}

impl Default for AwardShow {
    fn default() -> Self {
        Self {
            date_time: default_date_time(),
            twitch_channel: default_twitch_channel(),
            contest_name: default_contest_name(),
        }
    }
}
