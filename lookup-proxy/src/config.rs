use crate::locale::Locale;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 900;
pub const DEFAULT_TARGET_LANGUAGE: &str = "pt";
pub const DEFAULT_FALLBACK_IMAGE: &str =
    "https://upload.wikimedia.org/wikipedia/commons/c/cd/Image-not-available.png";

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Batch size must be greater than 0")]
    InvalidBatchSize,

    #[error("Thumbnail size must be greater than 0")]
    InvalidThumbnailSize,

    #[error("Upstream timeout must be greater than 0 when set")]
    InvalidTimeout,

    #[error("Empty target language")]
    EmptyTargetLanguage,
}

/// Lookup proxy configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Public listener receiving batch requests
    #[serde(default = "Listener::public")]
    pub listener: Listener,
    /// Admin listener for health and readiness probes
    #[serde(default = "Listener::admin")]
    pub admin_listener: Listener,
    #[serde(default)]
    pub upstreams: Upstreams,
    #[serde(default)]
    pub lookup: LookupSettings,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listener: Listener::public(),
            admin_listener: Listener::admin(),
            upstreams: Upstreams::default(),
            lookup: LookupSettings::default(),
        }
    }
}

impl Config {
    /// Validates the lookup proxy configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;
        self.upstreams.validate()?;
        self.lookup.validate()
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    fn public() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }

    fn admin() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 3001,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Wikimedia endpoints the strategies talk to.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Upstreams {
    #[serde(default)]
    pub wikipedia: WikipediaUpstreams,
    #[serde(default = "default_wikidata")]
    pub wikidata: Url,
    /// Per-call timeout for upstream requests. Unset means calls may wait
    /// indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for Upstreams {
    fn default() -> Self {
        Upstreams {
            wikipedia: WikipediaUpstreams::default(),
            wikidata: default_wikidata(),
            timeout_secs: None,
        }
    }
}

impl Upstreams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == Some(0) {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

/// `api.php` endpoint of each supported Wikipedia edition
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct WikipediaUpstreams {
    #[serde(default = "default_wikipedia_en")]
    pub en: Url,
    #[serde(default = "default_wikipedia_es")]
    pub es: Url,
    #[serde(default = "default_wikipedia_de")]
    pub de: Url,
}

impl Default for WikipediaUpstreams {
    fn default() -> Self {
        WikipediaUpstreams {
            en: default_wikipedia_en(),
            es: default_wikipedia_es(),
            de: default_wikipedia_de(),
        }
    }
}

impl WikipediaUpstreams {
    pub fn for_locale(&self, locale: Locale) -> &Url {
        match locale {
            Locale::English => &self.en,
            Locale::Spanish => &self.es,
            Locale::German => &self.de,
        }
    }
}

/// Tunables shared by the lookup strategies
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct LookupSettings {
    /// Titles checked concurrently per existence-check batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Target width in pixels requested for thumbnails
    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_size: u32,
    /// Image returned when a page has no thumbnail or the lookup fails
    #[serde(default = "default_fallback_image")]
    pub fallback_image: String,
    /// Language whose interlanguage links and descriptions are looked up
    #[serde(default = "default_target_language")]
    pub target_language: String,
}

impl Default for LookupSettings {
    fn default() -> Self {
        LookupSettings {
            batch_size: DEFAULT_BATCH_SIZE,
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            fallback_image: DEFAULT_FALLBACK_IMAGE.into(),
            target_language: DEFAULT_TARGET_LANGUAGE.into(),
        }
    }
}

impl LookupSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.batch_size == 0 {
            return Err(ValidationError::InvalidBatchSize);
        }
        if self.thumbnail_size == 0 {
            return Err(ValidationError::InvalidThumbnailSize);
        }
        if self.target_language.trim().is_empty() {
            return Err(ValidationError::EmptyTargetLanguage);
        }
        Ok(())
    }
}

fn static_url(url: &'static str) -> Url {
    Url::parse(url).expect("static upstream URL is valid")
}

fn default_wikipedia_en() -> Url {
    static_url("https://en.wikipedia.org/w/api.php")
}

fn default_wikipedia_es() -> Url {
    static_url("https://es.wikipedia.org/w/api.php")
}

fn default_wikipedia_de() -> Url {
    static_url("https://de.wikipedia.org/w/api.php")
}

fn default_wikidata() -> Url {
    static_url("https://www.wikidata.org/w/api.php")
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_thumbnail_size() -> u32 {
    DEFAULT_THUMBNAIL_SIZE
}

fn default_fallback_image() -> String {
    DEFAULT_FALLBACK_IMAGE.into()
}

fn default_target_language() -> String {
    DEFAULT_TARGET_LANGUAGE.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_config() {
        let yaml = r#"
listener:
    host: "0.0.0.0"
    port: 8080
admin_listener:
    host: "127.0.0.1"
    port: 8081
upstreams:
    wikipedia:
        es: "http://127.0.0.1:9000/es/w/api.php"
    wikidata: "http://127.0.0.1:9000/wikidata/w/api.php"
    timeout_secs: 10
lookup:
    batch_size: 20
    target_language: gl
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());

        assert_eq!(config.listener.host, "0.0.0.0");
        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.admin_listener.port, 8081);
        assert_eq!(
            config.upstreams.wikipedia.for_locale(Locale::Spanish).as_str(),
            "http://127.0.0.1:9000/es/w/api.php"
        );
        // Unset editions keep their public endpoint
        assert_eq!(
            config.upstreams.wikipedia.for_locale(Locale::German).as_str(),
            "https://de.wikipedia.org/w/api.php"
        );
        assert_eq!(config.upstreams.timeout_secs, Some(10));
        assert_eq!(config.lookup.batch_size, 20);
        assert_eq!(config.lookup.thumbnail_size, DEFAULT_THUMBNAIL_SIZE);
        assert_eq!(config.lookup.target_language, "gl");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());

        assert_eq!(config.listener.port, 3000);
        assert_eq!(config.admin_listener.port, 3001);
        assert_eq!(config.upstreams.timeout_secs, None);
        assert_eq!(
            config.upstreams.wikipedia.for_locale(Locale::English).as_str(),
            "https://en.wikipedia.org/w/api.php"
        );
        assert_eq!(
            config.upstreams.wikidata.as_str(),
            "https://www.wikidata.org/w/api.php"
        );
        assert_eq!(config.lookup.batch_size, 50);
        assert_eq!(config.lookup.thumbnail_size, 900);
        assert_eq!(config.lookup.fallback_image, DEFAULT_FALLBACK_IMAGE);
        assert_eq!(config.lookup.target_language, "pt");
    }

    #[test]
    fn test_invalid_upstream_url_is_rejected() {
        let yaml = r#"
upstreams:
    wikidata: "not a url"
"#;
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }

    #[test]
    fn test_validation_errors() {
        let mut config = Config::default();
        config.listener.port = 0;
        assert_eq!(config.validate(), Err(ValidationError::InvalidPort));

        let mut config = Config::default();
        config.lookup.batch_size = 0;
        assert_eq!(config.validate(), Err(ValidationError::InvalidBatchSize));

        let mut config = Config::default();
        config.lookup.thumbnail_size = 0;
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidThumbnailSize)
        );

        let mut config = Config::default();
        config.lookup.target_language = " ".into();
        assert_eq!(config.validate(), Err(ValidationError::EmptyTargetLanguage));

        let mut config = Config::default();
        config.upstreams.timeout_secs = Some(0);
        assert_eq!(config.validate(), Err(ValidationError::InvalidTimeout));
    }
}
