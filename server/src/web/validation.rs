//! Request bodies and their validation rules.

use serde::{Deserialize, Deserializer};

use crate::error::AppError;
use crate::model::{
    FeedbackFilter, FeedbackType, TypeFilter, WidgetIcon, WidgetPosition, WidgetSettings,
    DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
use crate::webhook::is_valid_webhook_url;

pub const MIN_MESSAGE_CHARS: usize = 3;
pub const MIN_PROJECT_NAME_CHARS: usize = 2;
pub const MAX_LABEL_CHARS: usize = 50;
pub const MAX_WIDGET_TEXT_CHARS: usize = 20;
pub const MAX_ALLOWED_DOMAINS_CHARS: usize = 1000;
pub const MIN_PASSWORD_CHARS: usize = 6;

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::Validation(message.into())
}

/// `local@domain.tld` with no whitespace.
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, _)| !host.is_empty())
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// `#RGB` or `#RRGGBB`.
pub fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(hex) => (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

pub fn validate_project_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.chars().count() < MIN_PROJECT_NAME_CHARS {
        return Err(invalid("Project name must be at least 2 characters"));
    }
    Ok(name.to_string())
}

pub fn validate_label(label: &str) -> Result<String, AppError> {
    let label = label.trim();
    let chars = label.chars().count();
    if chars == 0 {
        return Err(invalid("Label is required"));
    }
    if chars > MAX_LABEL_CHARS {
        return Err(invalid("Label must be less than 50 characters"));
    }
    Ok(label.to_string())
}

/// Length-check the raw domain list; blank lists mean "allow every origin".
pub fn normalize_allowed_domains(raw: Option<String>) -> Result<Option<String>, AppError> {
    match raw {
        Some(domains) if domains.chars().count() > MAX_ALLOWED_DOMAINS_CHARS => {
            Err(invalid("Allowed domains must be at most 1000 characters"))
        }
        Some(domains) if domains.trim().is_empty() => Ok(None),
        Some(domains) => Ok(Some(domains.trim().to_string())),
        None => Ok(None),
    }
}

// =============================================================================
// Accounts
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if !is_valid_email(self.email.trim()) {
            return Err(invalid("Invalid email format"));
        }
        if self.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(invalid("Password must be at least 6 characters"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if !is_valid_email(self.email.trim()) {
            return Err(invalid("Invalid email format"));
        }
        if self.password.is_empty() {
            return Err(invalid("Password is required"));
        }
        Ok(())
    }
}

// =============================================================================
// Public submission
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFeedbackRequest {
    pub project_key: String,
    #[serde(rename = "type")]
    pub kind: FeedbackType,
    pub message: String,
}

impl SubmitFeedbackRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.project_key.trim().is_empty() {
            return Err(invalid("Project key is required"));
        }
        if self.message.chars().count() < MIN_MESSAGE_CHARS {
            return Err(invalid("Message must be at least 3 characters"));
        }
        Ok(())
    }
}

// =============================================================================
// Projects
// =============================================================================

/// Widget fields accepted on create and update; unset fields keep their base value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetInput {
    pub widget_icon: Option<WidgetIcon>,
    pub widget_text: Option<String>,
    pub widget_primary: Option<String>,
    pub widget_text_color: Option<String>,
    pub widget_background: Option<String>,
    pub widget_position: Option<WidgetPosition>,
}

impl WidgetInput {
    fn is_empty(&self) -> bool {
        self.widget_icon.is_none()
            && self.widget_text.is_none()
            && self.widget_primary.is_none()
            && self.widget_text_color.is_none()
            && self.widget_background.is_none()
            && self.widget_position.is_none()
    }

    /// Overlay these fields on `base`, validating each one that is set.
    pub fn apply(self, mut base: WidgetSettings) -> Result<WidgetSettings, AppError> {
        if let Some(icon) = self.widget_icon {
            base.widget_icon = icon;
        }
        if let Some(text) = self.widget_text {
            let len = text.trim().chars().count();
            if len == 0 || len > MAX_WIDGET_TEXT_CHARS {
                return Err(invalid("Widget text must be between 1 and 20 characters"));
            }
            base.widget_text = text.trim().to_string();
        }
        for (value, slot) in [
            (self.widget_primary, &mut base.widget_primary),
            (self.widget_text_color, &mut base.widget_text_color),
            (self.widget_background, &mut base.widget_background),
        ] {
            if let Some(color) = value {
                if !is_hex_color(&color) {
                    return Err(invalid(format!("Invalid color value: {}", color)));
                }
                *slot = color;
            }
        }
        if let Some(position) = self.widget_position {
            base.widget_position = position;
        }
        Ok(base)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(flatten)]
    pub widget: WidgetInput,
    #[serde(default)]
    pub allowed_domains: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    #[serde(flatten)]
    pub widget: WidgetInput,
    #[serde(default, deserialize_with = "double_option")]
    pub allowed_domains: Option<Option<String>>,
}

impl UpdateProjectRequest {
    /// Validated name and domains plus the widget overlay, if any widget field was sent.
    pub fn into_parts(
        self,
        current: &WidgetSettings,
    ) -> Result<(Option<String>, Option<WidgetSettings>, Option<Option<String>>), AppError> {
        let name = self.name.as_deref().map(validate_project_name).transpose()?;
        let allowed_domains = self
            .allowed_domains
            .map(normalize_allowed_domains)
            .transpose()?;
        let widget = if self.widget.is_empty() {
            None
        } else {
            Some(self.widget.apply(current.clone())?)
        };
        Ok((name, widget, allowed_domains))
    }
}

// =============================================================================
// Feedback listing
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct FeedbackQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(rename = "type")]
    pub kind: Option<TypeFilter>,
}

impl FeedbackQuery {
    pub fn into_filter(self) -> Result<FeedbackFilter, AppError> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(invalid("Page must be a positive integer"));
        }
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(invalid("Limit must be between 1 and 100"));
        }
        Ok(FeedbackFilter {
            page,
            limit,
            kind: self.kind.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct AddLabelRequest {
    pub label: String,
}

// =============================================================================
// Webhook settings
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookSettingsRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub webhook_url: Option<Option<String>>,
    pub webhook_enabled: Option<bool>,
}

impl WebhookSettingsRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(Some(url)) = &self.webhook_url {
            if !is_valid_webhook_url(url) {
                return Err(AppError::BadRequest(
                    "Invalid webhook URL. Must be a valid HTTP or HTTPS URL.".to_string(),
                ));
            }
        }
        Ok(())
    }
}
