//! Notification templates with `{{name}}` placeholders.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use tourhub_core::{AppError, AppResult};
use tourhub_entity::notification::NotificationType;

/// A rendered title and body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedMessage {
    /// Rendered title.
    pub title: String,
    /// Rendered body.
    pub content: String,
}

/// Renders a named template with variables.
pub trait TemplateRenderer: Send + Sync + std::fmt::Debug {
    /// Render `name`. Unknown names fail with `NotFound`.
    fn render(&self, name: &str, variables: &HashMap<String, String>) -> AppResult<RenderedMessage>;
}

/// Name of the template used for a notification type when the caller
/// does not pick one.
pub fn default_template(notification_type: NotificationType) -> &'static str {
    match notification_type {
        NotificationType::OrderConfirmed => "booking_confirmation",
        NotificationType::PaymentSuccess => "payment_success",
        NotificationType::OrderCancelled => "order_cancelled",
        NotificationType::Reminder => "booking_reminder",
        NotificationType::SystemAnnouncement => "system_announcement",
        NotificationType::Promotional => "promotional",
    }
}

#[derive(Debug, Clone)]
struct Template {
    title: String,
    content: String,
}

/// In-process template table.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Template>,
}

impl TemplateRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with a template for every notification type.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(
            "booking_confirmation",
            "Booking confirmed: {{service_name}}",
            "Your booking {{confirmation_number}} for {{service_name}} on {{date}} {{time}} \
             is confirmed. Guests: {{guests}}. Total: {{amount}}. \
             Contact: {{contact_name}} {{contact_phone}}",
        );
        registry.register(
            "payment_success",
            "Payment received",
            "We received {{amount}} for booking {{confirmation_number}} ({{payment_method}}).",
        );
        registry.register(
            "order_cancelled",
            "Booking {{confirmation_number}} cancelled",
            "Your booking {{confirmation_number}} was cancelled. {{reason}}",
        );
        registry.register(
            "booking_reminder",
            "Reminder: {{service_name}}",
            "Booking {{confirmation_number}} for {{service_name}} starts at {{starts_at}}.",
        );
        registry.register("system_announcement", "{{title}}", "{{message}} {{link}}");
        registry.register("promotional", "{{title}}", "{{message}} {{link}}");
        registry
    }

    /// Add or replace a template.
    pub fn register(&mut self, name: &str, title: &str, content: &str) {
        self.templates.insert(
            name.to_string(),
            Template {
                title: title.to_string(),
                content: content.to_string(),
            },
        );
    }
}

impl TemplateRenderer for TemplateRegistry {
    fn render(&self, name: &str, variables: &HashMap<String, String>) -> AppResult<RenderedMessage> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| AppError::not_found(format!("Template '{name}' not found")))?;
        Ok(RenderedMessage {
            title: fill(&template.title, variables),
            content: fill(&template.content, variables),
        })
    }
}

/// Substitute `{{ key }}` placeholders. Missing keys render as empty, an
/// unterminated `{{` is kept literally, and the result is trimmed.
fn fill(template: &str, variables: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                if let Some(value) = variables.get(key) {
                    out.push_str(value);
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_fill_placeholders() {
        let out = fill("Hi {{ name }}, order {{id}}", &vars(&[("name", "Ana"), ("id", "7")]));
        assert_eq!(out, "Hi Ana, order 7");
    }

    #[test]
    fn test_missing_and_unterminated() {
        assert_eq!(fill("a {{missing}} b", &HashMap::new()), "a  b");
        assert_eq!(fill("a {{oops", &HashMap::new()), "a {{oops");
    }

    #[test]
    fn test_builtin_covers_every_type() {
        let registry = TemplateRegistry::with_builtin();
        for t in [
            NotificationType::OrderConfirmed,
            NotificationType::PaymentSuccess,
            NotificationType::OrderCancelled,
            NotificationType::Reminder,
            NotificationType::SystemAnnouncement,
            NotificationType::Promotional,
        ] {
            assert!(registry.render(default_template(t), &HashMap::new()).is_ok());
        }
    }

    #[test]
    fn test_unknown_template() {
        let err = TemplateRegistry::new()
            .render("nope", &HashMap::new())
            .unwrap_err();
        assert_eq!(err.kind, tourhub_core::ErrorKind::NotFound);
    }
}
