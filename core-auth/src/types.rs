use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuthError;

/// Seconds before `expires_at` at which a token already counts as expired.
pub const EXPIRY_BUFFER_SECS: i64 = 60;

/// OAuth 2.0 token set.
///
/// # Security
///
/// Tokens should never be logged. The `Debug` implementation redacts them.
///
/// # Examples
///
/// ```
/// use core_auth::OAuthTokens;
///
/// let tokens = OAuthTokens::new("BQD...".to_string(), Some("AQD...".to_string()), 3600);
/// assert!(!tokens.is_expired());
///
/// // A token seeded from a refresh token is expired until refreshed
/// let seeded = OAuthTokens::from_refresh_token("AQD...");
/// assert!(seeded.is_expired());
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct OAuthTokens {
    /// The access token used for API requests (empty until first refresh)
    pub access_token: String,
    /// The refresh token used to obtain new access tokens
    pub refresh_token: Option<String>,
    /// When the access token expires (UTC)
    pub expires_at: DateTime<Utc>,
}

impl OAuthTokens {
    /// Create a new token set expiring `expires_in` seconds from now
    pub fn new(access_token: String, refresh_token: Option<String>, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: Utc::now() + Duration::seconds(expires_in),
        }
    }

    /// Token set holding only a refresh token; the first use refreshes it.
    pub fn from_refresh_token(refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: String::new(),
            refresh_token: Some(refresh_token.into()),
            expires_at: Utc::now(),
        }
    }

    /// True when there is no access token or it expires within
    /// [`EXPIRY_BUFFER_SECS`].
    pub fn is_expired(&self) -> bool {
        self.is_expired_with_buffer(EXPIRY_BUFFER_SECS)
    }

    /// Check if the access token is expired with a custom buffer
    pub fn is_expired_with_buffer(&self, buffer_seconds: i64) -> bool {
        self.access_token.is_empty()
            || Utc::now() >= self.expires_at - Duration::seconds(buffer_seconds)
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Get the time remaining until token expiration, `None` once expired.
    pub fn time_until_expiry(&self) -> Option<Duration> {
        let now = Utc::now();
        (now < self.expires_at).then(|| self.expires_at - now)
    }
}

impl fmt::Debug for OAuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTokens")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// OAuth scopes understood by the accounts service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    // Images
    UgcImageUpload,
    // Connect
    UserModifyPlaybackState,
    UserReadPlaybackState,
    UserReadCurrentlyPlaying,
    // Follow
    UserFollowModify,
    UserFollowRead,
    // Listening history
    UserReadRecentlyPlayed,
    UserReadPlaybackPosition,
    UserTopRead,
    // Playlists
    PlaylistReadCollaborative,
    PlaylistModifyPublic,
    PlaylistReadPrivate,
    PlaylistModifyPrivate,
    // Playback
    AppRemoteControl,
    Streaming,
    // Users
    UserReadEmail,
    UserReadPrivate,
    // Library
    UserLibraryModify,
    UserLibraryRead,
}

impl Scope {
    pub const ALL: [Scope; 19] = [
        Scope::UgcImageUpload,
        Scope::UserModifyPlaybackState,
        Scope::UserReadPlaybackState,
        Scope::UserReadCurrentlyPlaying,
        Scope::UserFollowModify,
        Scope::UserFollowRead,
        Scope::UserReadRecentlyPlayed,
        Scope::UserReadPlaybackPosition,
        Scope::UserTopRead,
        Scope::PlaylistReadCollaborative,
        Scope::PlaylistModifyPublic,
        Scope::PlaylistReadPrivate,
        Scope::PlaylistModifyPrivate,
        Scope::AppRemoteControl,
        Scope::Streaming,
        Scope::UserReadEmail,
        Scope::UserReadPrivate,
        Scope::UserLibraryModify,
        Scope::UserLibraryRead,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::UgcImageUpload => "ugc-image-upload",
            Scope::UserModifyPlaybackState => "user-modify-playback-state",
            Scope::UserReadPlaybackState => "user-read-playback-state",
            Scope::UserReadCurrentlyPlaying => "user-read-currently-playing",
            Scope::UserFollowModify => "user-follow-modify",
            Scope::UserFollowRead => "user-follow-read",
            Scope::UserReadRecentlyPlayed => "user-read-recently-played",
            Scope::UserReadPlaybackPosition => "user-read-playback-position",
            Scope::UserTopRead => "user-top-read",
            Scope::PlaylistReadCollaborative => "playlist-read-collaborative",
            Scope::PlaylistModifyPublic => "playlist-modify-public",
            Scope::PlaylistReadPrivate => "playlist-read-private",
            Scope::PlaylistModifyPrivate => "playlist-modify-private",
            Scope::AppRemoteControl => "app-remote-control",
            Scope::Streaming => "streaming",
            Scope::UserReadEmail => "user-read-email",
            Scope::UserReadPrivate => "user-read-private",
            Scope::UserLibraryModify => "user-library-modify",
            Scope::UserLibraryRead => "user-library-read",
        }
    }

    /// Scope strings for a set of scopes, in the order given.
    pub fn to_strings<'a>(scopes: impl IntoIterator<Item = &'a Scope>) -> Vec<String> {
        scopes.into_iter().map(|s| s.as_str().to_string()).collect()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('_', "-").to_ascii_lowercase();
        Scope::ALL
            .iter()
            .copied()
            .find(|scope| scope.as_str() == wanted)
            .ok_or_else(|| AuthError::Other(format!("Unknown OAuth scope: {}", s)))
    }
}
