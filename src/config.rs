use std::time::Duration;

use image::imageops::FilterType;

/// Hosts whose responses are requested with an anonymous cross-origin hint.
pub const DEFAULT_CROSS_ORIGIN_HOSTS: &[&str] = &[
    "images.unsplash.com",
    "cdn.shopify.com",
    "res.cloudinary.com",
    "i.imgur.com",
    "images.pexels.com",
];

/// Hosts known to fail intermittently; a failed load from these is retried once through the relay.
pub const DEFAULT_RELAY_HOSTS: &[&str] = &["i.imgur.com", "i.ibb.co", "via.placeholder.com"];

/// Options for fetching and decoding candidate images.
#[derive(Debug, Clone)]
pub struct LoaderSettings {
    /// Upper bound on a single fetch attempt.
    pub attempt_timeout: Duration,
    /// Prefix of the CORS relay; the percent-encoded original URL is appended to it.
    pub relay_endpoint: Option<String>,
    /// Hosts that receive the cross-origin hint.
    pub cross_origin_hosts: Vec<String>,
    /// Hosts that get a one-shot retry through the relay.
    pub relay_hosts: Vec<String>,
    /// Size of the synthesized placeholder raster.
    pub placeholder_size: (u32, u32),
    /// Largest response body accepted from a remote host.
    pub max_body_bytes: u64,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(10),
            relay_endpoint: None,
            cross_origin_hosts: DEFAULT_CROSS_ORIGIN_HOSTS
                .iter()
                .map(|h| h.to_string())
                .collect(),
            relay_hosts: DEFAULT_RELAY_HOSTS.iter().map(|h| h.to_string()).collect(),
            placeholder_size: (400, 500),
            max_body_bytes: 32 * 1024 * 1024,
        }
    }
}

impl LoaderSettings {
    /// Set the per-attempt timeout.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Set the CORS relay endpoint; `None` disables the relay retry.
    pub fn with_relay_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.relay_endpoint = endpoint.filter(|e| !e.trim().is_empty());
        self
    }
}

/// Drop shadow drawn beneath the garment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowStyle {
    pub color: [u8; 3],
    /// Shadow opacity in 0.0-1.0.
    pub alpha: f32,
    /// Canvas-style blur radius; the gaussian sigma is half of it.
    pub blur: f32,
    pub offset: (i64, i64),
}

impl Default for ShadowStyle {
    fn default() -> Self {
        Self {
            color: [0, 0, 0],
            alpha: 0.25,
            blur: 4.0,
            offset: (1, 3),
        }
    }
}

/// Options describing how a garment is drawn onto the photo.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub garment_alpha: f32,
    pub shadow: ShadowStyle,
    /// Global alpha of the multiply contour pass.
    pub contour_alpha: f32,
    /// Filter used when scaling the garment into its placement rectangle.
    pub garment_filter: FilterType,
    /// Treat every quality rejection as fatal instead of falling back to the default body layout.
    pub strict_photo_validation: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            garment_alpha: 0.95,
            shadow: ShadowStyle::default(),
            contour_alpha: 0.1,
            garment_filter: FilterType::Triangle,
            strict_photo_validation: false,
        }
    }
}
