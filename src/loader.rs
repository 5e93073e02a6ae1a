//! Image loading with ordered candidate fallback.
//!
//! Each candidate is fetched and decoded in turn. Hosts listed in
//! [`LoaderSettings::relay_hosts`] get one retry through the CORS relay, and
//! when every candidate fails a placeholder garment is synthesized from the
//! product metadata.

use std::path::PathBuf;
use std::sync::Arc;
#[cfg(feature = "remote")]
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::RgbaImage;
use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::catalog::Product;
use crate::config::LoaderSettings;
use crate::placeholder::{PlaceholderStyle, render_placeholder};
use crate::{FittingError, FittingResult};

/// Where an image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Url(String),
    Path(PathBuf),
    /// A full `data:` URI.
    DataUri(String),
    /// Already-encoded image bytes.
    Bytes(Vec<u8>),
}

impl ImageSource {
    /// Classify a string as a data URI, an http(s) URL, or a file path.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("data:") {
            ImageSource::DataUri(trimmed.to_string())
        } else if lower.starts_with("http://") || lower.starts_with("https://") {
            ImageSource::Url(trimmed.to_string())
        } else {
            ImageSource::Path(PathBuf::from(trimmed))
        }
    }

    /// Short human-readable form for logs and diagnostics.
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Url(url) => url.clone(),
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::DataUri(uri) => {
                let header = uri.split(',').next().unwrap_or("data:");
                format!("{header},...")
            }
            ImageSource::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
        }
    }
}

impl From<&str> for ImageSource {
    fn from(raw: &str) -> Self {
        ImageSource::parse(raw)
    }
}

/// Decode the payload of a `data:` URI.
pub fn decode_data_uri(uri: &str) -> FittingResult<Vec<u8>> {
    let rest = uri
        .get(..5)
        .filter(|scheme| scheme.eq_ignore_ascii_case("data:"))
        .map(|_| &uri[5..])
        .ok_or_else(|| FittingError::DataUri("missing `data:` scheme".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| FittingError::DataUri("missing `,` separator".into()))?;

    if meta.to_ascii_lowercase().ends_with(";base64") {
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        STANDARD
            .decode(compact)
            .map_err(|e| FittingError::DataUri(format!("invalid base64 payload: {e}")))
    } else {
        Ok(percent_decode_str(payload).collect())
    }
}

/// Cross-origin hint attached to a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossOrigin {
    /// Request an anonymous CORS response so pixels can be read back.
    Anonymous,
    /// No hint; the host is not known to serve CORS headers.
    Omitted,
}

impl CrossOrigin {
    /// Value sent in the `Sec-Fetch-Mode` header.
    pub fn fetch_mode(self) -> &'static str {
        match self {
            CrossOrigin::Anonymous => "cors",
            CrossOrigin::Omitted => "no-cors",
        }
    }
}

/// One network fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub cross_origin: CrossOrigin,
    pub max_body_bytes: u64,
}

/// Retrieves raw bytes for a URL.
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, request: &FetchRequest) -> FittingResult<Vec<u8>>;
}

fn fetch_error(url: &str, reason: impl Into<String>) -> FittingError {
    FittingError::Fetch {
        url: url.to_string(),
        reason: reason.into(),
    }
}

/// Blocking HTTP fetcher backed by a shared `ureq` agent.
#[cfg(feature = "remote")]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

#[cfg(feature = "remote")]
impl HttpFetcher {
    /// Create a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

#[cfg(feature = "remote")]
impl ImageFetcher for HttpFetcher {
    fn fetch(&self, request: &FetchRequest) -> FittingResult<Vec<u8>> {
        let mut response = self
            .agent
            .get(&request.url)
            .header("Accept", "image/*")
            .header("Sec-Fetch-Mode", request.cross_origin.fetch_mode())
            .call()
            .map_err(|error| match error {
                ureq::Error::StatusCode(status) => {
                    fetch_error(&request.url, format!("HTTP error {status}"))
                }
                other => fetch_error(&request.url, other.to_string()),
            })?;
        response
            .body_mut()
            .with_config()
            .limit(request.max_body_bytes)
            .read_to_vec()
            .map_err(|e| fetch_error(&request.url, e.to_string()))
    }
}

/// Fetcher used when the crate is built without network support.
#[cfg(not(feature = "remote"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFetcher;

#[cfg(not(feature = "remote"))]
impl ImageFetcher for OfflineFetcher {
    fn fetch(&self, request: &FetchRequest) -> FittingResult<Vec<u8>> {
        Err(fetch_error(
            &request.url,
            "built without the `remote` feature",
        ))
    }
}

#[cfg(feature = "remote")]
fn default_fetcher(settings: &LoaderSettings) -> Arc<dyn ImageFetcher> {
    Arc::new(HttpFetcher::new(settings.attempt_timeout))
}

#[cfg(not(feature = "remote"))]
fn default_fetcher(_settings: &LoaderSettings) -> Arc<dyn ImageFetcher> {
    Arc::new(OfflineFetcher)
}

/// Lowercased host of an absolute URL, without userinfo or port.
pub fn url_host(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
    let host_port = authority.rsplit('@').next().unwrap_or(authority);
    let host = if host_port.starts_with('[') {
        host_port.split(']').next().map(|h| &h[1..]).unwrap_or("")
    } else {
        host_port.split(':').next().unwrap_or("")
    };
    (!host.is_empty()).then(|| host.to_ascii_lowercase())
}

/// How a [`LoadedImage`] was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOrigin {
    /// Loaded directly from this candidate.
    Source(String),
    /// Loaded through the relay on behalf of this candidate URL.
    Relay(String),
    /// Synthesized because every candidate failed.
    Placeholder,
}

#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub image: RgbaImage,
    pub origin: ImageOrigin,
}

impl LoadedImage {
    pub fn is_placeholder(&self) -> bool {
        self.origin == ImageOrigin::Placeholder
    }
}

/// Resolves candidate sources into decoded RGBA rasters.
#[derive(Clone)]
pub struct ImageLoader {
    settings: LoaderSettings,
    fetcher: Arc<dyn ImageFetcher>,
}

impl std::fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoader")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new(LoaderSettings::default())
    }
}

impl ImageLoader {
    pub fn new(settings: LoaderSettings) -> Self {
        let fetcher = default_fetcher(&settings);
        Self { settings, fetcher }
    }

    pub fn with_fetcher(settings: LoaderSettings, fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self { settings, fetcher }
    }

    /// Same fetcher, new settings.
    pub fn with_settings(&self, settings: LoaderSettings) -> Self {
        Self {
            settings,
            fetcher: Arc::clone(&self.fetcher),
        }
    }

    pub fn settings(&self) -> &LoaderSettings {
        &self.settings
    }

    /// Try `candidates` in order and return the first that decodes.
    ///
    /// When all fail and `product` is given, a placeholder garment is
    /// synthesized instead. Without a product the load fails with
    /// [`FittingError::ImageLoadFailed`].
    pub fn load(
        &self,
        candidates: &[ImageSource],
        product: Option<&Product>,
    ) -> FittingResult<LoadedImage> {
        for candidate in candidates {
            match self.load_candidate(candidate) {
                Ok(loaded) => {
                    tracing::debug!(source = %candidate.describe(), "image loaded");
                    return Ok(loaded);
                }
                Err(e) => {
                    tracing::warn!(source = %candidate.describe(), error = %e, "image candidate failed");
                }
            }
        }

        match product {
            Some(product) => {
                tracing::warn!(
                    product = %product.id,
                    attempted = candidates.len(),
                    "all candidates failed; synthesizing placeholder"
                );
                Ok(LoadedImage {
                    image: render_placeholder(
                        &PlaceholderStyle::from(product),
                        self.settings.placeholder_size,
                    ),
                    origin: ImageOrigin::Placeholder,
                })
            }
            None => Err(FittingError::ImageLoadFailed {
                attempted: candidates.len(),
            }),
        }
    }

    /// Load a single candidate, including the one-shot relay retry.
    pub fn load_candidate(&self, source: &ImageSource) -> FittingResult<LoadedImage> {
        let url = match source {
            ImageSource::Url(url) => url,
            ImageSource::Path(path) => {
                return decode(&std::fs::read(path)?, source);
            }
            ImageSource::DataUri(uri) => return decode(&decode_data_uri(uri)?, source),
            ImageSource::Bytes(bytes) => return decode(bytes, source),
        };

        let request = FetchRequest {
            url: url.clone(),
            cross_origin: self.cross_origin_for(url),
            max_body_bytes: self.settings.max_body_bytes,
        };
        let direct = self
            .fetcher
            .fetch(&request)
            .and_then(|bytes| decode(&bytes, source));
        let error = match direct {
            Ok(loaded) => return Ok(loaded),
            Err(e) => e,
        };

        let Some(relay_url) = self.relay_url(url) else {
            return Err(error);
        };
        tracing::debug!(url = %url, relay = %relay_url, error = %error, "retrying through relay");
        let relayed = FetchRequest {
            url: relay_url,
            cross_origin: CrossOrigin::Anonymous,
            max_body_bytes: self.settings.max_body_bytes,
        };
        let bytes = self.fetcher.fetch(&relayed)?;
        let image = image::load_from_memory(&bytes)?.to_rgba8();
        Ok(LoadedImage {
            image,
            origin: ImageOrigin::Relay(url.clone()),
        })
    }

    /// Cross-origin hint for `url` based on the known CDN hosts.
    pub fn cross_origin_for(&self, url: &str) -> CrossOrigin {
        match url_host(url) {
            Some(host) if host_listed(&self.settings.cross_origin_hosts, &host) => {
                CrossOrigin::Anonymous
            }
            _ => CrossOrigin::Omitted,
        }
    }

    /// Relay URL for `url`, when its host qualifies and a relay is configured.
    pub fn relay_url(&self, url: &str) -> Option<String> {
        let endpoint = self.settings.relay_endpoint.as_deref()?;
        let host = url_host(url)?;
        host_listed(&self.settings.relay_hosts, &host)
            .then(|| format!("{endpoint}{}", utf8_percent_encode(url, NON_ALPHANUMERIC)))
    }
}

fn host_listed(hosts: &[String], host: &str) -> bool {
    hosts.iter().any(|h| h.eq_ignore_ascii_case(host))
}

fn decode(bytes: &[u8], source: &ImageSource) -> FittingResult<LoadedImage> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    Ok(LoadedImage {
        image,
        origin: ImageOrigin::Source(source.describe()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Mutex;

    fn png_bytes(w: u32, h: u32, color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, Rgba(color));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[derive(Default)]
    struct FakeFetcher {
        responses: HashMap<String, Vec<u8>>,
        requests: Mutex<Vec<FetchRequest>>,
    }

    impl FakeFetcher {
        fn serving(pairs: &[(&str, Vec<u8>)]) -> Self {
            Self {
                responses: pairs
                    .iter()
                    .map(|(url, bytes)| (url.to_string(), bytes.clone()))
                    .collect(),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<FetchRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl ImageFetcher for FakeFetcher {
        fn fetch(&self, request: &FetchRequest) -> FittingResult<Vec<u8>> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .get(&request.url)
                .cloned()
                .ok_or_else(|| fetch_error(&request.url, "HTTP error 404"))
        }
    }

    fn loader(fetcher: Arc<FakeFetcher>, relay: Option<&str>) -> ImageLoader {
        let settings =
            LoaderSettings::default().with_relay_endpoint(relay.map(str::to_string));
        ImageLoader::with_fetcher(settings, fetcher)
    }

    mod image_source {
        use super::*;

        #[test]
        fn parse_classifies_inputs() {
            assert_eq!(
                ImageSource::parse("https://x.test/a.png"),
                ImageSource::Url("https://x.test/a.png".into())
            );
            assert_eq!(
                ImageSource::parse(" HTTP://x.test/a.png "),
                ImageSource::Url("HTTP://x.test/a.png".into())
            );
            assert!(matches!(
                ImageSource::parse("data:image/png;base64,AAAA"),
                ImageSource::DataUri(_)
            ));
            assert_eq!(
                ImageSource::parse("photos/me.jpg"),
                ImageSource::Path(PathBuf::from("photos/me.jpg"))
            );
        }

        #[test]
        fn describe_hides_data_payload() {
            let source = ImageSource::parse("data:image/png;base64,AAAA");
            assert_eq!(source.describe(), "data:image/png;base64,...");
            assert_eq!(ImageSource::Bytes(vec![1, 2, 3]).describe(), "<3 bytes>");
        }
    }

    mod decode_data_uri {
        use super::*;

        #[test]
        fn base64_payload() {
            let bytes = decode_data_uri("data:image/png;base64,aGVs bG8=").unwrap();
            assert_eq!(bytes, b"hello");
        }

        #[test]
        fn percent_encoded_payload() {
            let bytes = decode_data_uri("data:text/plain,a%20b%2Cc").unwrap();
            assert_eq!(bytes, b"a b,c");
        }

        #[test]
        fn malformed_uris_are_rejected() {
            assert!(matches!(
                decode_data_uri("data:image/png;base64"),
                Err(FittingError::DataUri(_))
            ));
            assert!(matches!(
                decode_data_uri("image/png;base64,AAAA"),
                Err(FittingError::DataUri(_))
            ));
            assert!(matches!(
                decode_data_uri("data:;base64,@@@"),
                Err(FittingError::DataUri(_))
            ));
        }
    }

    mod url_host {
        use super::*;

        #[test]
        fn strips_scheme_port_path_and_userinfo() {
            assert_eq!(
                url_host("https://CDN.Shopify.com:443/a/b.png?x=1"),
                Some("cdn.shopify.com".into())
            );
            assert_eq!(url_host("http://u:p@i.imgur.com/x"), Some("i.imgur.com".into()));
            assert_eq!(url_host("http://[::1]:8080/x"), Some("::1".into()));
            assert_eq!(url_host("no-scheme.png"), None);
            assert_eq!(url_host("https:///path"), None);
        }
    }

    mod load {
        use super::*;

        #[test]
        fn first_decodable_candidate_wins() {
            let fetcher = Arc::new(FakeFetcher::serving(&[
                ("https://a.test/bad.png", b"not an image".to_vec()),
                ("https://a.test/good.png", png_bytes(3, 2, [1, 2, 3, 255])),
            ]));
            let loaded = loader(fetcher.clone(), None)
                .load(
                    &[
                        ImageSource::parse("https://a.test/missing.png"),
                        ImageSource::parse("https://a.test/bad.png"),
                        ImageSource::parse("https://a.test/good.png"),
                    ],
                    None,
                )
                .unwrap();
            assert_eq!(loaded.image.dimensions(), (3, 2));
            assert_eq!(
                loaded.origin,
                ImageOrigin::Source("https://a.test/good.png".into())
            );
            assert_eq!(fetcher.requested().len(), 3);
        }

        #[test]
        fn cross_origin_hint_follows_host_list() {
            let fetcher = Arc::new(FakeFetcher::default());
            let l = loader(fetcher.clone(), None);
            let _ = l.load(
                &[
                    ImageSource::parse("https://images.unsplash.com/p.jpg"),
                    ImageSource::parse("https://example.test/p.jpg"),
                ],
                None,
            );
            let requests = fetcher.requested();
            assert_eq!(requests[0].cross_origin, CrossOrigin::Anonymous);
            assert_eq!(requests[1].cross_origin, CrossOrigin::Omitted);
            assert_eq!(CrossOrigin::Anonymous.fetch_mode(), "cors");
        }

        #[test]
        fn unreliable_host_retries_once_through_relay() {
            let original = "https://i.imgur.com/abc.png";
            let relay = "https://relay.test/?url=https%3A%2F%2Fi%2Eimgur%2Ecom%2Fabc%2Epng";
            let fetcher = Arc::new(FakeFetcher::serving(&[(
                relay,
                png_bytes(2, 2, [9, 9, 9, 255]),
            )]));
            let loaded = loader(fetcher.clone(), Some("https://relay.test/?url="))
                .load(&[ImageSource::parse(original)], None)
                .unwrap();
            assert_eq!(loaded.origin, ImageOrigin::Relay(original.into()));
            let urls: Vec<String> = fetcher.requested().into_iter().map(|r| r.url).collect();
            assert_eq!(urls, vec![original.to_string(), relay.to_string()]);
        }

        #[test]
        fn no_relay_without_endpoint_or_for_other_hosts() {
            let fetcher = Arc::new(FakeFetcher::default());
            let l = loader(fetcher.clone(), None);
            assert!(l.relay_url("https://i.imgur.com/a.png").is_none());
            let _ = l.load(&[ImageSource::parse("https://i.imgur.com/a.png")], None);
            assert_eq!(fetcher.requested().len(), 1);

            let l = loader(fetcher.clone(), Some("https://relay.test/"));
            assert!(l.relay_url("https://cdn.shopify.com/a.png").is_none());
        }

        #[test]
        fn all_failing_without_product_is_load_failure() {
            let fetcher = Arc::new(FakeFetcher::default());
            let err = loader(fetcher, None)
                .load(
                    &[
                        ImageSource::parse("https://a.test/1.png"),
                        ImageSource::parse("https://a.test/2.png"),
                    ],
                    None,
                )
                .unwrap_err();
            assert!(matches!(err, FittingError::ImageLoadFailed { attempted: 2 }));
        }

        #[test]
        fn all_failing_with_product_synthesizes_placeholder() {
            let fetcher = Arc::new(FakeFetcher::default());
            let product = Product {
                id: "p".into(),
                name: "Tee".into(),
                category: "shirts".into(),
                color_code: Some("#ff0000".into()),
                ..Product::default()
            };
            let loaded = loader(fetcher, None)
                .load(&[ImageSource::parse("https://a.test/1.png")], Some(&product))
                .unwrap();
            assert!(loaded.is_placeholder());
            assert_eq!(loaded.image.dimensions(), (400, 500));
            assert_eq!(loaded.image.get_pixel(200, 400).0, [255, 0, 0, 255]);
        }

        #[test]
        fn empty_candidates_with_product_is_placeholder() {
            let loaded = loader(Arc::new(FakeFetcher::default()), None)
                .load(&[], Some(&Product::default()))
                .unwrap();
            assert!(loaded.is_placeholder());
        }

        #[test]
        fn local_sources_skip_the_fetcher() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("photo.png");
            std::fs::write(&path, png_bytes(4, 5, [0, 0, 0, 255])).unwrap();
            let fetcher = Arc::new(FakeFetcher::default());
            let l = loader(fetcher.clone(), None);

            let from_path = l.load(&[ImageSource::Path(path)], None).unwrap();
            assert_eq!(from_path.image.dimensions(), (4, 5));

            let bytes = png_bytes(1, 1, [5, 6, 7, 255]);
            let uri = format!("data:image/png;base64,{}", STANDARD.encode(&bytes));
            let from_uri = l.load(&[ImageSource::DataUri(uri)], None).unwrap();
            assert_eq!(from_uri.image.get_pixel(0, 0).0, [5, 6, 7, 255]);

            let from_bytes = l.load(&[ImageSource::Bytes(bytes)], None).unwrap();
            assert_eq!(from_bytes.image.dimensions(), (1, 1));
            assert!(fetcher.requested().is_empty());
        }
    }
}
