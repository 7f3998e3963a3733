use url::form_urlencoded;

use crate::model::WidgetSettings;

/// The `<script>` tag a customer pastes into their site.
pub fn embed_snippet(base_url: &str, project_key: &str, widget: &WidgetSettings) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("key", project_key)
        .append_pair("icon", widget.widget_icon.as_str())
        .append_pair("text", &widget.widget_text)
        .append_pair("primary", &widget.widget_primary)
        .append_pair("textColor", &widget.widget_text_color)
        .append_pair("bg", &widget.widget_background)
        .append_pair("pos", widget.widget_position.as_str())
        .finish();

    format!(
        r#"<script src="{}/widget.js?{}" async></script>"#,
        base_url.trim_end_matches('/'),
        query
    )
}
