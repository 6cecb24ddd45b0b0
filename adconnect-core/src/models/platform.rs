//! Platform and account identity types.
//!
//! - [`Platform`] - Enum of supported advertising platforms
//! - [`AccountId`] - Opaque account identifier
//! - [`SubAccount`] - Account listed under a login
//! - [`ConnectionInfo`] - Description of the authenticated connection

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// Platform
// ============================================================================

/// Supported advertising/reporting platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Facebook Marketing API
    Facebook,
    /// The Trade Desk
    TradeDesk,
    /// Twitter Ads
    Twitter,
    /// LinkedIn Marketing
    LinkedIn,
    /// Display & Video 360 (Bid Manager)
    Dv360,
    /// Campaign Manager 360
    CampaignManager,
    /// Google Ads
    GoogleAds,
    /// Google Analytics (Universal Analytics reporting)
    GoogleAnalytics,
    /// Google Trends
    GoogleTrends,
}

impl Platform {
    /// Returns the display name for this platform.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Facebook => "Facebook",
            Self::TradeDesk => "The Trade Desk",
            Self::Twitter => "Twitter Ads",
            Self::LinkedIn => "LinkedIn",
            Self::Dv360 => "DV360",
            Self::CampaignManager => "Campaign Manager 360",
            Self::GoogleAds => "Google Ads",
            Self::GoogleAnalytics => "Google Analytics",
            Self::GoogleTrends => "Google Trends",
        }
    }

    /// Returns all supported platforms.
    pub fn all() -> &'static [Platform] {
        &[
            Self::Facebook,
            Self::TradeDesk,
            Self::Twitter,
            Self::LinkedIn,
            Self::Dv360,
            Self::CampaignManager,
            Self::GoogleAds,
            Self::GoogleAnalytics,
            Self::GoogleTrends,
        ]
    }

    /// Returns the CLI name for this platform (lowercase, no spaces).
    pub fn cli_name(&self) -> &'static str {
        match self {
            Self::Facebook => "fb",
            Self::TradeDesk => "ttd",
            Self::Twitter => "twitter",
            Self::LinkedIn => "linkedin",
            Self::Dv360 => "dv360",
            Self::CampaignManager => "gcm",
            Self::GoogleAds => "google-ads",
            Self::GoogleAnalytics => "google-analytics",
            Self::GoogleTrends => "gt",
        }
    }

    /// Whether this platform authenticates through Google OAuth.
    pub fn uses_google_oauth(&self) -> bool {
        matches!(
            self,
            Self::Dv360 | Self::CampaignManager | Self::GoogleAds | Self::GoogleAnalytics
        )
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase().replace('_', "-");
        Self::all()
            .iter()
            .copied()
            .find(|p| p.cli_name() == needle)
            .ok_or_else(|| CoreError::UnknownPlatform(s.to_string()))
    }
}

// ============================================================================
// Account Identity
// ============================================================================

/// Opaque, platform-specific account identifier.
///
/// Examples: `act_123` (Facebook ad account), a LinkedIn sponsored account
/// number, a Campaign Manager profile id, or a Google Trends keyword.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Creates a new account id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An account reachable from the authenticated login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubAccount {
    /// Account identifier.
    pub id: AccountId,
    /// Human-readable name.
    pub name: String,
    /// Account currency, when the platform reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl SubAccount {
    /// Creates a sub-account without currency.
    pub fn new(id: impl Into<AccountId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            currency: None,
        }
    }

    /// Sets the currency.
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }
}

/// Description of an authenticated connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Platform of the connection.
    pub platform: Platform,
    /// Login account (email or user name).
    pub login_account: String,
    /// Login account id, if the platform exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_account_id: Option<String>,
    /// Number of sub-accounts reachable from this login.
    pub num_sub_account: usize,
}

impl ConnectionInfo {
    /// Creates connection info for the given platform and login.
    pub fn new(platform: Platform, login_account: impl Into<String>) -> Self {
        Self {
            platform,
            login_account: login_account.into(),
            login_account_id: None,
            num_sub_account: 0,
        }
    }

    /// Sets the login account id.
    pub fn with_login_account_id(mut self, id: impl Into<String>) -> Self {
        self.login_account_id = Some(id.into());
        self
    }

    /// Sets the sub-account count.
    pub fn with_sub_accounts(mut self, count: usize) -> Self {
        self.num_sub_account = count;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_from_cli_name() {
        for platform in Platform::all() {
            assert_eq!(platform.cli_name().parse::<Platform>().unwrap(), *platform);
        }
        assert_eq!("Google_Ads".parse::<Platform>().unwrap(), Platform::GoogleAds);
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn test_google_oauth_platforms() {
        assert!(Platform::Dv360.uses_google_oauth());
        assert!(!Platform::GoogleTrends.uses_google_oauth());
        assert!(!Platform::Facebook.uses_google_oauth());
    }
}
