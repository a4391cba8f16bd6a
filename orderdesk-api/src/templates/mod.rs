use handlebars::Handlebars;
use orderdesk_domain::{InternalError, OrderdeskError};
use serde::Serialize;

pub const GUESTBOOK: &str = "guestbook";
pub const ERROR: &str = "error";

/// Compiled page templates. Values are HTML-escaped on render.
pub fn registry() -> Result<Handlebars<'static>, OrderdeskError> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);

    for (name, source) in [
        (GUESTBOOK, include_str!("guestbook.hbs")),
        (ERROR, include_str!("error.hbs")),
    ] {
        handlebars
            .register_template_string(name, source)
            .map_err(|e| {
                InternalError::configuration_error(
                    &format!("Invalid {name} template: {e}"),
                    Some("template"),
                )
            })?;
    }

    Ok(handlebars)
}

pub fn render<T: Serialize>(
    handlebars: &Handlebars<'static>,
    name: &str,
    data: &T,
) -> Result<String, OrderdeskError> {
    handlebars.render(name, data).map_err(|e| {
        InternalError::serialize_error(&format!("Failed to render {name}: {e}"), Some("template"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_guestbook_escapes_values() {
        let handlebars = registry().expect("Failed to compile templates");

        let html = render(
            &handlebars,
            GUESTBOOK,
            &json!({ "entries": [{ "id": 1, "name": "<b>Eve</b>", "message": "<script>x</script>" }] }),
        )
        .expect("Failed to render");

        assert!(html.contains("&lt;b&gt;Eve&lt;/b&gt;"));
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_empty_guestbook() {
        let handlebars = registry().expect("Failed to compile templates");

        let html = render(&handlebars, GUESTBOOK, &json!({ "entries": [] }))
            .expect("Failed to render");

        assert!(html.contains("No entries yet."));
    }
}
