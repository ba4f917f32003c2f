//! Provider and platform vocabulary plus the normalized identity value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Third-party identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Facebook,
    Apple,
}

impl Provider {
    /// Wire form, as it appears in URLs and request bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Facebook => "facebook",
            Provider::Apple => "apple",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(Provider::Google),
            "facebook" => Ok(Provider::Facebook),
            "apple" => Ok(Provider::Apple),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// Client application surface a login originates from.
///
/// Affects session expiry policy only; see [`PlatformClass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Platform {
    Web,
    H5,
    Ios,
    Android,
    WechatMiniapp,
    DouyinMiniapp,
}

/// Expiry tier a platform belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformClass {
    Web,
    Mobile,
    MiniApp,
}

impl Platform {
    pub fn class(&self) -> PlatformClass {
        match self {
            Platform::Web | Platform::H5 => PlatformClass::Web,
            Platform::Ios | Platform::Android => PlatformClass::Mobile,
            Platform::WechatMiniapp | Platform::DouyinMiniapp => PlatformClass::MiniApp,
        }
    }

    /// Wire form, as embedded in session claims and redirect parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Web => "WEB",
            Platform::H5 => "H5",
            Platform::Ios => "IOS",
            Platform::Android => "ANDROID",
            Platform::WechatMiniapp => "WECHAT_MINIAPP",
            Platform::DouyinMiniapp => "DOUYIN_MINIAPP",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "WEB" => Ok(Platform::Web),
            "H5" => Ok(Platform::H5),
            "IOS" => Ok(Platform::Ios),
            "ANDROID" => Ok(Platform::Android),
            "WECHAT_MINIAPP" => Ok(Platform::WechatMiniapp),
            "DOUYIN_MINIAPP" => Ok(Platform::DouyinMiniapp),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

/// Provider-agnostic identity produced by a provider client.
///
/// `subject` is the provider-scoped user id and is never empty for a
/// successful resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedIdentity {
    pub provider: Provider,
    pub subject: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_class_tiers() {
        assert_eq!(Platform::Web.class(), PlatformClass::Web);
        assert_eq!(Platform::H5.class(), PlatformClass::Web);
        assert_eq!(Platform::Ios.class(), PlatformClass::Mobile);
        assert_eq!(Platform::Android.class(), PlatformClass::Mobile);
        assert_eq!(Platform::WechatMiniapp.class(), PlatformClass::MiniApp);
        assert_eq!(Platform::DouyinMiniapp.class(), PlatformClass::MiniApp);
    }

    #[test]
    fn provider_round_trips_wire_form() {
        for provider in [Provider::Google, Provider::Facebook, Provider::Apple] {
            let parsed: Provider = provider.as_str().parse().unwrap();
            assert_eq!(parsed, provider);
        }
        assert!("github".parse::<Provider>().is_err());
    }

    #[test]
    fn platform_serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&Platform::WechatMiniapp).unwrap();
        assert_eq!(json, "\"WECHAT_MINIAPP\"");
        let parsed: Platform = serde_json::from_str("\"IOS\"").unwrap();
        assert_eq!(parsed, Platform::Ios);
    }
}
