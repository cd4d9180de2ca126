//! Runtime context probe
//!
//! The pipeline asks the host for the current location, session and
//! user-agent through `RuntimeContext`. Outside a browser-like host every
//! answer is `None` and metadata falls back to `"server"` placeholders.

use serde::{Deserialize, Serialize};

/// Placeholder used for device fields outside a browser-like runtime
pub const SERVER_PLACEHOLDER: &str = "server";

pub trait RuntimeContext: Send + Sync {
    /// Current page URL
    fn current_url(&self) -> Option<String> {
        None
    }

    /// Current in-app route
    fn current_route(&self) -> Option<String> {
        None
    }

    /// Membership id of the authenticated user, `None` when signed out
    fn membership_id(&self) -> Option<String> {
        None
    }

    /// User-agent string; `None` means not a browser-like runtime
    fn user_agent(&self) -> Option<String> {
        None
    }
}

/// Headless host: no location, no session, server metadata
#[derive(Debug, Default, Clone, Copy)]
pub struct ServerContext;

impl RuntimeContext for ServerContext {}

/// Fixed answers, typically loaded from the `[runtime]` config section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticContext {
    pub url: Option<String>,
    pub route: Option<String>,
    pub membership_id: Option<String>,
    pub user_agent: Option<String>,
}

impl RuntimeContext for StaticContext {
    fn current_url(&self) -> Option<String> {
        self.url.clone()
    }

    fn current_route(&self) -> Option<String> {
        self.route.clone()
    }

    fn membership_id(&self) -> Option<String> {
        self.membership_id.clone()
    }

    fn user_agent(&self) -> Option<String> {
        self.user_agent.clone()
    }
}

// =============================================================================
// User-agent heuristics
// =============================================================================

pub fn browser_family(ua: &str) -> &'static str {
    if ua.contains("Firefox") {
        "Firefox"
    } else if ua.contains("Chrome") {
        "Chrome"
    } else if ua.contains("Safari") {
        "Safari"
    } else if ua.contains("MSIE") || ua.contains("Trident") {
        "Internet Explorer"
    } else if ua.contains("Edge") {
        "Edge"
    } else {
        "unknown"
    }
}

pub fn os_family(ua: &str) -> &'static str {
    if ua.contains("Windows") {
        "Windows"
    } else if ua.contains("Mac") {
        "MacOS"
    } else if ua.contains("Linux") {
        "Linux"
    } else if ua.contains("Android") {
        "Android"
    } else if ua.contains("iOS") || ua.contains("iPhone") || ua.contains("iPad") {
        "iOS"
    } else {
        "unknown"
    }
}

/// "tablet", "mobile" or "desktop"
pub fn device_class(ua: &str) -> &'static str {
    let lower = ua.to_ascii_lowercase();
    let android_tablet = lower
        .find("android")
        .map(|at| !lower[at..].contains("mobi"))
        .unwrap_or(false);

    if ["tablet", "ipad", "playbook", "silk"]
        .iter()
        .any(|m| lower.contains(m))
        || android_tablet
    {
        return "tablet";
    }

    const MOBILE_MARKERS: [&str; 8] = [
        "Mobile",
        "Android",
        "iPhone",
        "iPod",
        "IEMobile",
        "BlackBerry",
        "Kindle",
        "Silk-Accelerated",
    ];
    if MOBILE_MARKERS.iter().any(|m| ua.contains(m)) {
        "mobile"
    } else {
        "desktop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
    const FIREFOX_LINUX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
    const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148 Safari/604.1";
    const ANDROID_TABLET: &str = "Mozilla/5.0 (Linux; Android 13; SM-X200) AppleWebKit/537.36 Chrome/120.0 Safari/537.36";
    const ANDROID_PHONE: &str = "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 Chrome/120.0 Mobile Safari/537.36";

    #[test]
    fn test_browser_family() {
        assert_eq!(browser_family(CHROME_WIN), "Chrome");
        assert_eq!(browser_family(FIREFOX_LINUX), "Firefox");
        assert_eq!(browser_family(IPHONE), "Safari");
        assert_eq!(browser_family("curl/8.0"), "unknown");
    }

    #[test]
    fn test_os_family() {
        assert_eq!(os_family(CHROME_WIN), "Windows");
        assert_eq!(os_family(FIREFOX_LINUX), "Linux");
        // "Mac OS X" appears in iPhone agents and wins, as in the browser heuristic
        assert_eq!(os_family(IPHONE), "MacOS");
    }

    #[test]
    fn test_device_class() {
        assert_eq!(device_class(CHROME_WIN), "desktop");
        assert_eq!(device_class(IPHONE), "mobile");
        assert_eq!(device_class(ANDROID_TABLET), "tablet");
        assert_eq!(device_class(ANDROID_PHONE), "mobile");
    }

    #[test]
    fn test_server_context_is_empty() {
        let ctx = ServerContext;
        assert!(ctx.current_url().is_none());
        assert!(ctx.membership_id().is_none());
        assert!(ctx.user_agent().is_none());
    }
}
