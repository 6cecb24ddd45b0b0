//! Campaign Manager settings.

use std::fmt;
use std::str::FromStr;

use adconnect_fetch::FetchError;
use serde::{Deserialize, Deserializer, Serialize};

use crate::google::GoogleOAuthConfig;

/// A saved report of a user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRef {
    /// User profile id.
    #[serde(deserialize_with = "id_string")]
    pub profile_id: String,
    /// Report id.
    #[serde(deserialize_with = "id_string")]
    pub report_id: String,
}

impl ReportRef {
    /// Creates a reference.
    pub fn new(profile_id: impl Into<String>, report_id: impl Into<String>) -> Self {
        Self {
            profile_id: profile_id.into(),
            report_id: report_id.into(),
        }
    }
}

impl fmt::Display for ReportRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.profile_id, self.report_id)
    }
}

impl FromStr for ReportRef {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (profile, report) = s
            .split_once(':')
            .map(|(p, r)| (p.trim(), r.trim()))
            .filter(|(p, r)| !p.is_empty() && !r.is_empty())
            .ok_or_else(|| FetchError::Config(format!("expected profile_id:report_id, got `{s}`")))?;
        Ok(Self::new(profile, report))
    }
}

/// Ids may be written as numbers or strings.
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Number(u64),
        Text(String),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Number(n) => n.to_string(),
        Id::Text(s) => s,
    })
}

/// Campaign Manager connector settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignManagerConfig {
    /// OAuth client and token cache.
    #[serde(flatten)]
    pub oauth: GoogleOAuthConfig,
    /// Reports to run.
    pub reports: Vec<ReportRef>,
}

impl CampaignManagerConfig {
    /// Distinct profile ids, in configuration order.
    pub fn profile_ids(&self) -> Vec<&str> {
        distinct_profile_ids(&self.reports)
    }
}

/// Distinct profile ids of `reports`, first occurrence first.
pub(crate) fn distinct_profile_ids(reports: &[ReportRef]) -> Vec<&str> {
    let mut ids: Vec<&str> = Vec::new();
    for report in reports {
        if !ids.contains(&report.profile_id.as_str()) {
            ids.push(&report.profile_id);
        }
    }
    ids
}
