//! Bundled User-Agent strings
//!
//! Pass any of these to
//! [`RequestClient::set_user_agent`](crate::http::RequestClient::set_user_agent).

use std::fmt;
use std::str::FromStr;

pub const FIREFOX_31: &str =
    "Mozilla/5.0 (Windows NT 6.1; WOW64; rv:31.0) Gecko/20100101 Firefox/31.0";
pub const FIREFOX_31_MAC: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.9; rv:31.0) Gecko/20100101 Firefox/31.0";
pub const CHROME_36: &str = "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/36.0.1985.125 Safari/537.36";
pub const CHROME_36_LINUX: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/36.0.1985.125 Safari/537.36";
pub const SAFARI_7: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_9_4) AppleWebKit/537.77.4 \
     (KHTML, like Gecko) Version/7.0.5 Safari/537.77.4";
pub const IE_11: &str = "Mozilla/5.0 (Windows NT 6.3; Trident/7.0; rv:11.0) like Gecko";
pub const IE_10: &str = "Mozilla/5.0 (compatible; MSIE 10.0; Windows NT 6.2; Trident/6.0)";
pub const OPERA_22: &str = "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/35.0.1916.153 Safari/537.36 OPR/22.0.1471.70";
pub const IPHONE_SAFARI_7: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 7_1_2 like Mac OS X) \
     AppleWebKit/537.51.2 (KHTML, like Gecko) Version/7.0 Mobile/11D257 Safari/9537.53";
pub const ANDROID_CHROME_36: &str = "Mozilla/5.0 (Linux; Android 4.4.2; Nexus 5 Build/KOT49H) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/36.0.1985.128 Mobile Safari/537.36";
pub const GOOGLEBOT: &str =
    "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";
pub const CURL: &str = "curl/7.37.1";

/// Browser identities from the bundled table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserAgent {
    Firefox31,
    Firefox31Mac,
    Chrome36,
    Chrome36Linux,
    Safari7,
    InternetExplorer11,
    InternetExplorer10,
    Opera22,
    IphoneSafari7,
    AndroidChrome36,
    Googlebot,
    Curl,
}

impl BrowserAgent {
    pub const ALL: [BrowserAgent; 12] = [
        BrowserAgent::Firefox31,
        BrowserAgent::Firefox31Mac,
        BrowserAgent::Chrome36,
        BrowserAgent::Chrome36Linux,
        BrowserAgent::Safari7,
        BrowserAgent::InternetExplorer11,
        BrowserAgent::InternetExplorer10,
        BrowserAgent::Opera22,
        BrowserAgent::IphoneSafari7,
        BrowserAgent::AndroidChrome36,
        BrowserAgent::Googlebot,
        BrowserAgent::Curl,
    ];

    /// The literal `User-Agent` header value.
    pub fn user_agent(self) -> &'static str {
        match self {
            BrowserAgent::Firefox31 => FIREFOX_31,
            BrowserAgent::Firefox31Mac => FIREFOX_31_MAC,
            BrowserAgent::Chrome36 => CHROME_36,
            BrowserAgent::Chrome36Linux => CHROME_36_LINUX,
            BrowserAgent::Safari7 => SAFARI_7,
            BrowserAgent::InternetExplorer11 => IE_11,
            BrowserAgent::InternetExplorer10 => IE_10,
            BrowserAgent::Opera22 => OPERA_22,
            BrowserAgent::IphoneSafari7 => IPHONE_SAFARI_7,
            BrowserAgent::AndroidChrome36 => ANDROID_CHROME_36,
            BrowserAgent::Googlebot => GOOGLEBOT,
            BrowserAgent::Curl => CURL,
        }
    }

    /// Canonical name accepted by `FromStr`.
    pub fn name(self) -> &'static str {
        match self {
            BrowserAgent::Firefox31 => "firefox-31",
            BrowserAgent::Firefox31Mac => "firefox-31-mac",
            BrowserAgent::Chrome36 => "chrome-36",
            BrowserAgent::Chrome36Linux => "chrome-36-linux",
            BrowserAgent::Safari7 => "safari-7",
            BrowserAgent::InternetExplorer11 => "ie-11",
            BrowserAgent::InternetExplorer10 => "ie-10",
            BrowserAgent::Opera22 => "opera-22",
            BrowserAgent::IphoneSafari7 => "iphone-safari-7",
            BrowserAgent::AndroidChrome36 => "android-chrome-36",
            BrowserAgent::Googlebot => "googlebot",
            BrowserAgent::Curl => "curl",
        }
    }
}

impl fmt::Display for BrowserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for BrowserAgent {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "firefox" | "firefox-31" => Ok(BrowserAgent::Firefox31),
            "firefox-mac" | "firefox-31-mac" => Ok(BrowserAgent::Firefox31Mac),
            "chrome" | "chromium" | "chrome-36" => Ok(BrowserAgent::Chrome36),
            "chrome-linux" | "chrome-36-linux" => Ok(BrowserAgent::Chrome36Linux),
            "safari" | "safari-7" => Ok(BrowserAgent::Safari7),
            "ie" | "ie-11" | "internet-explorer" => Ok(BrowserAgent::InternetExplorer11),
            "ie-10" => Ok(BrowserAgent::InternetExplorer10),
            "opera" | "opera-22" => Ok(BrowserAgent::Opera22),
            "iphone" | "iphone-safari-7" => Ok(BrowserAgent::IphoneSafari7),
            "android" | "android-chrome-36" => Ok(BrowserAgent::AndroidChrome36),
            "googlebot" => Ok(BrowserAgent::Googlebot),
            "curl" => Ok(BrowserAgent::Curl),
            _ => Err(()),
        }
    }
}
