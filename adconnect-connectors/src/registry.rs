//! Connector registry for looking up platform descriptors.
//!
//! The registry provides static access to every connector descriptor and
//! is the central point for resolving CLI names and aliases.

use std::collections::HashMap;
use std::sync::OnceLock;

use adconnect_core::Platform;

use crate::campaign_manager::campaign_manager_descriptor;
use crate::descriptor::ConnectorDescriptor;
use crate::dv360::dv360_descriptor;
use crate::facebook::facebook_descriptor;
use crate::google_ads::google_ads_descriptor;
use crate::google_analytics::google_analytics_descriptor;
use crate::google_trends::google_trends_descriptor;
use crate::linkedin::linkedin_descriptor;
use crate::tradedesk::tradedesk_descriptor;
use crate::twitter::twitter_descriptor;

// ============================================================================
// Static Registry
// ============================================================================

static DESCRIPTORS: OnceLock<Vec<ConnectorDescriptor>> = OnceLock::new();

static CLI_NAME_MAP: OnceLock<HashMap<String, Platform>> = OnceLock::new();

/// Initializes all descriptors in [`Platform::all`] order.
fn init_descriptors() -> Vec<ConnectorDescriptor> {
    vec![
        facebook_descriptor(),
        tradedesk_descriptor(),
        twitter_descriptor(),
        linkedin_descriptor(),
        dv360_descriptor(),
        campaign_manager_descriptor(),
        google_ads_descriptor(),
        google_analytics_descriptor(),
        google_trends_descriptor(),
    ]
}

fn build_cli_name_map(descriptors: &[ConnectorDescriptor]) -> HashMap<String, Platform> {
    let mut map = HashMap::new();

    for desc in descriptors {
        map.insert(desc.cli.name.to_string(), desc.id);
        for alias in desc.cli.aliases {
            map.insert((*alias).to_string(), desc.id);
        }
    }

    map
}

// ============================================================================
// Connector Registry
// ============================================================================

/// Global registry of connector descriptors.
pub struct ConnectorRegistry;

impl ConnectorRegistry {
    /// Returns all descriptors.
    pub fn all() -> &'static [ConnectorDescriptor] {
        DESCRIPTORS.get_or_init(init_descriptors)
    }

    /// Gets a descriptor by platform.
    pub fn get(id: Platform) -> Option<&'static ConnectorDescriptor> {
        Self::all().iter().find(|d| d.id == id)
    }

    /// Returns the CLI name to platform mapping.
    pub fn cli_name_map() -> &'static HashMap<String, Platform> {
        CLI_NAME_MAP.get_or_init(|| build_cli_name_map(Self::all()))
    }

    /// Looks up a descriptor by CLI name or alias.
    pub fn get_by_cli_name(name: &str) -> Option<&'static ConnectorDescriptor> {
        let platform = Self::cli_name_map().get(name)?;
        Self::get(*platform)
    }

    /// Platforms that authenticate with Google OAuth.
    pub fn google_platforms() -> Vec<&'static ConnectorDescriptor> {
        Self::all()
            .iter()
            .filter(|d| d.id.uses_google_oauth())
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
