//! Typed per-platform connector configuration.
//!
//! Stored under the `connectors` key of the settings file. Every field has
//! a default so partial files load.

use adconnect_core::Platform;
use serde::{Deserialize, Serialize};

use crate::campaign_manager::CampaignManagerConfig;
use crate::dv360::Dv360Config;
use crate::facebook::FacebookConfig;
use crate::google_ads::GoogleAdsConfig;
use crate::google::GoogleOAuthConfig;
use crate::google_analytics::GoogleAnalyticsConfig;
use crate::google_trends::GoogleTrendsConfig;
use crate::linkedin::LinkedInConfig;
use crate::tradedesk::TradeDeskConfig;
use crate::twitter::TwitterConfig;

/// Configuration for every connector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorsConfig {
    /// Facebook Marketing API.
    pub facebook: FacebookConfig,
    /// The Trade Desk.
    pub tradedesk: TradeDeskConfig,
    /// Twitter Ads.
    pub twitter: TwitterConfig,
    /// LinkedIn Marketing.
    pub linkedin: LinkedInConfig,
    /// DV360.
    pub dv360: Dv360Config,
    /// Campaign Manager 360.
    pub campaign_manager: CampaignManagerConfig,
    /// Google Ads.
    pub google_ads: GoogleAdsConfig,
    /// Google Analytics.
    pub google_analytics: GoogleAnalyticsConfig,
    /// Google Trends.
    pub google_trends: GoogleTrendsConfig,
}

impl ConnectorsConfig {
    /// OAuth settings of a Google platform.
    pub fn google_oauth(&self, platform: Platform) -> Option<&GoogleOAuthConfig> {
        match platform {
            Platform::Dv360 => Some(&self.dv360.oauth),
            Platform::CampaignManager => Some(&self.campaign_manager.oauth),
            Platform::GoogleAds => Some(&self.google_ads.oauth),
            Platform::GoogleAnalytics => Some(&self.google_analytics.oauth),
            _ => None,
        }
    }

    /// Credential stored in the settings file, the lowest-priority source.
    pub fn stored_credential(&self, platform: Platform, key: &str) -> Option<String> {
        let value = match (platform, key) {
            (Platform::Facebook, "access_token") => &self.facebook.access_token,
            (Platform::TradeDesk, "username") => &self.tradedesk.username,
            (Platform::TradeDesk, "password") => &self.tradedesk.password,
            (Platform::Twitter, "consumer_key") => &self.twitter.consumer_key,
            (Platform::Twitter, "consumer_secret") => &self.twitter.consumer_secret,
            (Platform::Twitter, "access_token") => &self.twitter.access_token,
            (Platform::Twitter, "access_token_secret") => &self.twitter.access_token_secret,
            (Platform::LinkedIn, "access_token") => &self.linkedin.access_token,
            (Platform::GoogleAds, "developer_token") => &self.google_ads.developer_token,
            _ => return None,
        };
        value.clone().filter(|v| !v.is_empty())
    }
}
