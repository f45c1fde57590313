// Blocking diagnostics - classifies yt-dlp failure output
//
// Used for both steps (catalog extraction and download) to turn stderr into
// a reason plus a suggestion the user can act on.

use serde::{Deserialize, Serialize};

/// Reasons why YouTube might refuse a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockingReason {
    /// HTTP 403 Forbidden - general access denied
    Http403Forbidden,
    /// SABR streaming protection hides the https formats
    SabrStreaming,
    /// PO Token (Proof of Origin) required
    PoTokenRequired,
    AgeRestricted,
    GeoBlocked,
    /// Network timeout (soft IP block)
    NetworkTimeout,
    RateLimited,
    BotDetection,
    PrivateVideo,
    /// Video deleted or unavailable
    VideoUnavailable,
    /// DRM-protected content, permanent
    DrmProtected,
    MembersOnly,
    Unknown,
}

impl BlockingReason {
    /// Check if cookies might help
    pub fn cookies_might_help(&self) -> bool {
        matches!(
            self,
            Self::Http403Forbidden
                | Self::SabrStreaming
                | Self::PoTokenRequired
                | Self::AgeRestricted
                | Self::BotDetection
                | Self::PrivateVideo
                | Self::MembersOnly
        )
    }

    /// Check if proxy might help
    pub fn proxy_might_help(&self) -> bool {
        matches!(
            self,
            Self::Http403Forbidden
                | Self::GeoBlocked
                | Self::NetworkTimeout
                | Self::RateLimited
                | Self::BotDetection
        )
    }

    /// No workaround exists
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::DrmProtected | Self::VideoUnavailable)
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Http403Forbidden => "Access denied (HTTP 403)",
            Self::SabrStreaming => "SABR streaming protection active",
            Self::PoTokenRequired => "Proof of Origin token required",
            Self::AgeRestricted => "Age-restricted content",
            Self::GeoBlocked => "Geographic restriction",
            Self::NetworkTimeout => "Network timeout (possible IP throttling)",
            Self::RateLimited => "Rate limited by YouTube",
            Self::BotDetection => "Bot detection triggered",
            Self::PrivateVideo => "Private video",
            Self::VideoUnavailable => "Video unavailable",
            Self::DrmProtected => "DRM-protected content",
            Self::MembersOnly => "Members-only content",
            Self::Unknown => "Unknown blocking reason",
        }
    }

    fn severity(&self) -> u8 {
        match self {
            Self::DrmProtected | Self::VideoUnavailable => 5,
            Self::PrivateVideo | Self::GeoBlocked | Self::MembersOnly => 4,
            Self::AgeRestricted | Self::PoTokenRequired | Self::SabrStreaming => 3,
            Self::Http403Forbidden | Self::BotDetection | Self::RateLimited => 2,
            Self::NetworkTimeout | Self::Unknown => 1,
        }
    }
}

/// Detailed diagnostics information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockingDiagnostics {
    pub reason: BlockingReason,
    /// First useful line of the error output
    pub context: Option<String>,
    pub recommend_cookies: bool,
    pub recommend_proxy: bool,
    /// 1-5, 5 being most severe
    pub severity: u8,
}

impl BlockingDiagnostics {
    pub fn new(reason: BlockingReason, context: Option<String>) -> Self {
        Self {
            reason,
            context,
            recommend_cookies: reason.cookies_might_help(),
            recommend_proxy: reason.proxy_might_help(),
            severity: reason.severity(),
        }
    }
}

/// Analyze error message and return blocking reason
pub fn diagnose_error(error: &str) -> Option<BlockingReason> {
    let lower = error.to_lowercase();
    let any = |patterns: &[&str]| patterns.iter().any(|p| lower.contains(p));

    // Checked in order of specificity
    if any(&[
        "drm",
        "widevine",
        "playready",
        "fairplay",
        "encrypted media",
        "youtube premium",
        "requires purchase",
        "rental",
        "this video requires payment",
    ]) {
        return Some(BlockingReason::DrmProtected);
    }

    if any(&[
        "members only",
        "members-only",
        "join this channel",
        "membership required",
        "available to members",
    ]) {
        return Some(BlockingReason::MembersOnly);
    }

    if any(&["sabr"]) {
        return Some(BlockingReason::SabrStreaming);
    }

    if any(&["po token", "proof of origin"]) {
        return Some(BlockingReason::PoTokenRequired);
    }

    if any(&["age-restricted", "sign in to confirm your age", "age_verification"]) {
        return Some(BlockingReason::AgeRestricted);
    }

    if any(&[
        "private video",
        "video is private",
        "sign in if you've been granted access",
    ]) {
        return Some(BlockingReason::PrivateVideo);
    }

    if any(&[
        "video unavailable",
        "video has been removed",
        "no longer available",
        "video is unavailable",
    ]) {
        return Some(BlockingReason::VideoUnavailable);
    }

    if any(&[
        "not available in your country",
        "blocked in your country",
        "geo restricted",
        "geographic restriction",
    ]) {
        return Some(BlockingReason::GeoBlocked);
    }

    if any(&["429", "rate limit", "too many requests"]) {
        return Some(BlockingReason::RateLimited);
    }

    if any(&["not a bot", "captcha", "unusual traffic", "automated"]) {
        return Some(BlockingReason::BotDetection);
    }

    if any(&["403", "forbidden"]) {
        return Some(BlockingReason::Http403Forbidden);
    }

    if any(&["timeout", "timed out", "connection refused", "network unreachable"]) {
        return Some(BlockingReason::NetworkTimeout);
    }

    if !error.trim().is_empty() {
        return Some(BlockingReason::Unknown);
    }

    None
}

/// Full diagnostic analysis of an error
pub fn analyze_error(error: &str) -> BlockingDiagnostics {
    let reason = diagnose_error(error).unwrap_or(BlockingReason::Unknown);

    let context = error
        .lines()
        .map(str::trim)
        .find(|line| line.to_lowercase().starts_with("error:"))
        .map(|line| line.trim_start_matches("ERROR:").trim().to_string());

    BlockingDiagnostics::new(reason, context)
}

/// User-facing suggestion for a blocking reason
pub fn get_blocking_suggestion(reason: &BlockingReason, proxy: Option<&str>) -> String {
    let mut suggestion = match reason {
        BlockingReason::Http403Forbidden => {
            "What to try:\n\
             1) Use a proxy (--proxy)\n\
             2) Refresh cookies (--cookies)\n\
             3) Wait and try again later"
        }
        BlockingReason::SabrStreaming => {
            "YouTube SABR protection active.\n\
             What to try:\n\
             1) Use cookies from a logged-in browser\n\
             2) Update yt-dlp"
        }
        BlockingReason::PoTokenRequired => {
            "YouTube requires a PO Token.\n\
             See: github.com/yt-dlp/yt-dlp/wiki/PO-Token-Guide"
        }
        BlockingReason::AgeRestricted => {
            "Video is age-restricted.\n\
             Export cookies.txt from a logged-in browser and pass --cookies"
        }
        BlockingReason::GeoBlocked => "Video is blocked in your country. Use a proxy in an allowed region.",
        BlockingReason::NetworkTimeout => {
            "Network timeout (possible IP throttling).\n\
             What to try:\n\
             1) Check your internet connection\n\
             2) Use a proxy\n\
             3) Try again later"
        }
        BlockingReason::RateLimited => "YouTube is rate-limiting requests. Wait 10-15 minutes or change IP.",
        BlockingReason::BotDetection => "YouTube detected automated access. Use cookies or a fresh proxy.",
        BlockingReason::PrivateVideo => "Video is private. Cookies from an authorized account are required.",
        BlockingReason::VideoUnavailable => "Video is unavailable (deleted, removed or made private).",
        BlockingReason::DrmProtected => "Video is DRM-protected and cannot be downloaded as a file.",
        BlockingReason::MembersOnly => "Video requires a channel membership. Use cookies of a member account.",
        BlockingReason::Unknown => "Unknown error. Check the video id and try again later.",
    }
    .to_string();

    if !reason.is_permanent() {
        if let Some(p) = proxy {
            suggestion.push_str(&format!("\nProxy in use: {}", p));
        }
    }

    suggestion
}
