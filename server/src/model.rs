//! Domain records for projects, feedback and labels.
//!
//! These are the shapes the persistence handle stores and the HTTP layer
//! serializes. Wire names follow the dashboard's camelCase convention.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Serialize a timestamp as ISO-8601 UTC with millisecond precision.
pub fn to_iso8601<S>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&format_timestamp(dt))
}

/// Format a timestamp the way every outbound document does (`2024-01-01T00:00:00.000Z`).
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// =============================================================================
// Feedback
// =============================================================================

/// Category chosen by the submitter in the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedbackType {
    Bug,
    Feature,
    Other,
}

impl FeedbackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackType::Bug => "Bug",
            FeedbackType::Feature => "Feature",
            FeedbackType::Other => "Other",
        }
    }
}

impl fmt::Display for FeedbackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sentiment assigned after the fact by the classification client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A triage label attached to one feedback entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: String,
    pub label: String,
    #[serde(serialize_with = "to_iso8601")]
    pub created_at: DateTime<Utc>,
}

/// A single feedback submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: String,
    pub project_id: String,
    #[serde(rename = "type")]
    pub kind: FeedbackType,
    pub message: String,
    pub sentiment: Option<Sentiment>,
    #[serde(serialize_with = "to_iso8601")]
    pub created_at: DateTime<Utc>,
    /// Newest first.
    pub labels: Vec<Label>,
}

// =============================================================================
// Feedback queries
// =============================================================================

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Type filter for feedback listings. `All` disables filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum TypeFilter {
    #[default]
    All,
    Bug,
    Feature,
    Other,
}

impl TypeFilter {
    pub fn matches(&self, kind: FeedbackType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Bug => kind == FeedbackType::Bug,
            TypeFilter::Feature => kind == FeedbackType::Feature,
            TypeFilter::Other => kind == FeedbackType::Other,
        }
    }
}

/// Typed parameters for one page of a project's feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackFilter {
    /// 1-based.
    pub page: u32,
    pub limit: u32,
    pub kind: TypeFilter,
}

impl Default for FeedbackFilter {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            kind: TypeFilter::All,
        }
    }
}

impl FeedbackFilter {
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.limit as usize
    }
}

/// One page of results plus the totals the dashboard paginates with.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, filter: &FeedbackFilter, total: usize) -> Self {
        let limit = filter.limit.max(1) as usize;
        Self {
            data,
            page: filter.page,
            limit: filter.limit,
            total,
            total_pages: total.div_ceil(limit),
        }
    }
}

// =============================================================================
// Widget customization
// =============================================================================

/// Icon shown on the floating widget button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WidgetIcon {
    #[default]
    Chat,
    Mail,
    Question,
    Star,
    Settings,
    ThumbsUp,
    Envelope,
    Info,
}

impl WidgetIcon {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetIcon::Chat => "chat",
            WidgetIcon::Mail => "mail",
            WidgetIcon::Question => "question",
            WidgetIcon::Star => "star",
            WidgetIcon::Settings => "settings",
            WidgetIcon::ThumbsUp => "thumbsUp",
            WidgetIcon::Envelope => "envelope",
            WidgetIcon::Info => "info",
        }
    }
}

/// Screen corner the widget button is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

impl WidgetPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetPosition::TopLeft => "top-left",
            WidgetPosition::TopRight => "top-right",
            WidgetPosition::BottomLeft => "bottom-left",
            WidgetPosition::BottomRight => "bottom-right",
        }
    }
}

/// Look-and-feel options baked into the embed snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSettings {
    pub widget_icon: WidgetIcon,
    pub widget_text: String,
    pub widget_primary: String,
    pub widget_text_color: String,
    pub widget_background: String,
    pub widget_position: WidgetPosition,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            widget_icon: WidgetIcon::Chat,
            widget_text: "Feedback".to_string(),
            widget_primary: "#2563EB".to_string(),
            widget_text_color: "#FFFFFF".to_string(),
            widget_background: "#FFFFFF".to_string(),
            widget_position: WidgetPosition::BottomRight,
        }
    }
}

// =============================================================================
// Project
// =============================================================================

/// A feedback-collecting project owned by one dashboard user.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// Public identifier embedded in widget URLs (`fp_XXXXXXXXXX`).
    pub project_key: String,
    pub created_at: DateTime<Utc>,
    pub widget: WidgetSettings,
    /// Comma-separated origin patterns; `None` means unrestricted.
    pub allowed_domains: Option<String>,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
    pub webhook_enabled: bool,
}

// =============================================================================
// User
// =============================================================================

/// A dashboard account. Emails are stored lowercased.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    #[serde(serialize_with = "to_iso8601")]
    pub created_at: DateTime<Utc>,
}
