use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Friendly,
    Professional,
    Witty,
    Bold,
    Luxury,
    Educational,
    Casual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Tiktok,
    Twitter,
    Linkedin,
    Youtube,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Length {
    Short,
    Medium,
    Long,
}

impl Tone {
    pub const ALL: [Tone; 7] = [
        Tone::Friendly,
        Tone::Professional,
        Tone::Witty,
        Tone::Bold,
        Tone::Luxury,
        Tone::Educational,
        Tone::Casual,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Friendly => "friendly",
            Tone::Professional => "professional",
            Tone::Witty => "witty",
            Tone::Bold => "bold",
            Tone::Luxury => "luxury",
            Tone::Educational => "educational",
            Tone::Casual => "casual",
        }
    }
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Instagram,
        Platform::Tiktok,
        Platform::Twitter,
        Platform::Linkedin,
        Platform::Youtube,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Tiktok => "tiktok",
            Platform::Twitter => "twitter",
            Platform::Linkedin => "linkedin",
            Platform::Youtube => "youtube",
        }
    }
}

impl Length {
    pub const ALL: [Length; 3] = [Length::Short, Length::Medium, Length::Long];

    pub fn as_str(self) -> &'static str {
        match self {
            Length::Short => "short",
            Length::Medium => "medium",
            Length::Long => "long",
        }
    }
}

/// Step to the neighbouring option of a closed set, wrapping at both ends.
pub fn cycle<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let n = all.len();
    let idx = all.iter().position(|v| *v == current).unwrap_or(0);
    let next = if forward { (idx + 1) % n } else { (idx + n - 1) % n };
    all[next]
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

display_as_str!(Tone, Platform, Length);

/// Number of caption variants to request. Always within [`VariantCount::MIN`, `VariantCount::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VariantCount(u8);

impl VariantCount {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Normalize any integer into range: below the minimum becomes 1, above the maximum is clamped.
    pub fn clamped(n: i64) -> Self {
        if n < Self::MIN as i64 {
            Self(Self::MIN)
        } else {
            Self(n.min(Self::MAX as i64) as u8)
        }
    }

    /// Normalize free-form input. Anything that is not an integer becomes 1.
    pub fn parse_lenient(input: &str) -> Self {
        input
            .trim()
            .parse::<i64>()
            .map(Self::clamped)
            .unwrap_or(Self(Self::MIN))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn increment(self) -> Self {
        Self::clamped(self.0 as i64 + 1)
    }

    pub fn decrement(self) -> Self {
        Self::clamped(self.0 as i64 - 1)
    }
}

impl Default for VariantCount {
    fn default() -> Self {
        Self(3)
    }
}

impl FromStr for VariantCount {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lenient(s))
    }
}

impl fmt::Display for VariantCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Topic must not be empty")]
    EmptyTopic,
}

/// User-controlled inputs for one generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationParameters {
    topic: String,
    pub tone: Tone,
    pub platform: Platform,
    pub length: Length,
    pub include_emojis: bool,
    pub include_hashtags: bool,
    pub variant_count: VariantCount,
}

impl GenerationParameters {
    pub fn new(
        topic: impl Into<String>,
        tone: Tone,
        platform: Platform,
        length: Length,
        include_emojis: bool,
        include_hashtags: bool,
        variant_count: VariantCount,
    ) -> Result<Self, InputError> {
        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err(InputError::EmptyTopic);
        }
        Ok(Self {
            topic,
            tone,
            platform,
            length,
            include_emojis,
            include_hashtags,
            variant_count,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn to_request(&self) -> GenerateRequest {
        GenerateRequest {
            topic: self.topic.clone(),
            tone: self.tone,
            platform: self.platform,
            length: self.length,
            include_emojis: self.include_emojis,
            include_hashtags: self.include_hashtags,
            variants: self.variant_count,
        }
    }
}

/// Wire body of `POST /api/generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateRequest {
    pub topic: String,
    pub tone: Tone,
    pub platform: Platform,
    pub length: Length,
    pub include_emojis: bool,
    pub include_hashtags: bool,
    pub variants: VariantCount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub variants: Vec<String>,
}

/// A past generation persisted by the caption service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub created_at: String,
    pub topic: String,
    pub tone: Tone,
    pub platform: Platform,
    pub length: Length,
    #[serde(default)]
    pub variants: Vec<String>,
    #[serde(default)]
    pub favorite: bool,
}

impl HistoryRecord {
    /// Render `created_at` in local time when it parses, the raw value otherwise.
    pub fn created_at_display(&self) -> String {
        format_timestamp(&self.created_at)
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

/// Body of `GET /api/captions`. A missing `items` key is an empty list, and
/// records that do not decode are skipped individually.
#[derive(Debug, Clone, Default)]
pub struct HistoryPage {
    pub items: Vec<HistoryRecord>,
}

impl<'de> Deserialize<'de> for HistoryPage {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct RawPage {
            #[serde(default)]
            items: Vec<serde_json::Value>,
        }

        let raw = RawPage::deserialize(d)?;
        let items = raw
            .items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<HistoryRecord>(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping undecodable history record");
                    None
                }
            })
            .collect();
        Ok(Self { items })
    }
}

fn format_timestamp(raw: &str) -> String {
    use time::format_description::well_known::Rfc3339;
    use time::macros::format_description;
    use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

    let parsed = OffsetDateTime::parse(raw, &Rfc3339).ok().or_else(|| {
        // Naive ISO timestamps (no offset) are UTC.
        let trimmed = raw.split('.').next().unwrap_or(raw);
        PrimitiveDateTime::parse(
            trimmed,
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        )
        .ok()
        .map(|dt| dt.assume_utc())
    });

    let Some(dt) = parsed else {
        return raw.to_string();
    };
    // The local offset is unavailable once other threads run, so the zone is always printed.
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let local = dt.to_offset(offset);
    let stamp = local.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ));
    let zone = if offset.is_utc() {
        Ok("UTC".to_string())
    } else {
        local.format(format_description!(
            "[offset_hour sign:mandatory]:[offset_minute]"
        ))
    };
    match (stamp, zone) {
        (Ok(stamp), Ok(zone)) => format!("{stamp} {zone}"),
        _ => raw.to_string(),
    }
}

/// Commands emitted by UI layers to the controller.
#[derive(Debug, Clone)]
pub enum UiCommand {
    Generate(GenerationParameters),
    Favorite { id: String, index: usize },
    RefreshHistory,
    Quit,
}

/// View events emitted by the controller for presentation layers.
#[derive(Debug, Clone)]
pub enum AppEvent {
    GenerationStarted,
    GenerationSucceeded { variants: Vec<String> },
    GenerationFailed { message: String },
    HistoryUpdated { records: Vec<HistoryRecord> },
    /// A refresh settled without changing the cache (failed or superseded).
    HistoryUnchanged,
    Info(String),
}
