// ── Markup rendering ──

use std::cell::RefCell;

use crate::controller::{Controller, ControllerKind};
use crate::engine::EventHandler;
use crate::error::HeadError;
use crate::hairdresser::Hairdresser;
use crate::model::to_html;

/// Accumulates one markup fragment per controller.
#[derive(Default)]
struct MarkupWriter {
    out: RefCell<String>,
}

impl MarkupWriter {
    fn into_markup(self) -> String {
        self.out.into_inner()
    }
}

impl EventHandler for MarkupWriter {
    fn on_update(&self, controller: &Controller) -> Result<(), HeadError> {
        let fragment = match controller.kind() {
            ControllerKind::Title => format!("<title>{}</title>", controller.render_title()?),
            ControllerKind::Etc => {
                let rendered = to_html(controller.render_attrs()?);
                let tag = controller.tag_name();
                let open = [tag, controller.attrs().html(), rendered.as_str()]
                    .into_iter()
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                if controller.needs_to_close() {
                    format!("<{open}></{tag}>")
                } else {
                    format!("<{open}>")
                }
            }
        };
        self.out.borrow_mut().push_str(&fragment);
        Ok(())
    }
}

impl Hairdresser {
    /// Render every active controller as markup, in selector order.
    ///
    /// Values are inserted as-is; escaping is the caller's concern.
    pub fn render_to_string(&self) -> Result<String, HeadError> {
        let writer = MarkupWriter::default();
        self.render_once(&writer, &writer)?;
        Ok(writer.into_markup())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::controller::{ControllerOptions, Render};
    use serde_json::json;

    #[test]
    fn empty_hairdresser_renders_nothing() {
        assert_eq!(Hairdresser::new().render_to_string().unwrap(), "");
    }

    #[test]
    fn title_and_meta_in_selector_order() {
        let hairdresser = Hairdresser::new();
        hairdresser
            .new_override()
            .title("Hello")
            .unwrap()
            .meta([("name", "twitter:title")], [("content", "Hello")])
            .unwrap();

        insta::assert_snapshot!(
            hairdresser.render_to_string().unwrap(),
            @r#"<meta name="twitter:title" content="Hello"><title>Hello</title>"#
        );
    }

    #[test]
    fn closing_tags_are_opt_in() {
        let hairdresser = Hairdresser::new();
        hairdresser
            .new_override()
            .tag_with(
                "script",
                [("id", "ld")],
                [("type", "application/ld+json")],
                ControllerOptions::new().close(true),
            )
            .unwrap();

        assert_eq!(
            hairdresser.render_to_string().unwrap(),
            r#"<script id="ld" type="application/ld+json"></script>"#
        );
    }

    #[test]
    fn empty_attribute_groups_add_no_space() {
        let hairdresser = Hairdresser::new();
        let ov = hairdresser.new_override();
        ov.tag("base", Vec::<(String, String)>::new(), [("href", "/")])
            .unwrap()
            .meta([("charset", "utf-8")], json!({}))
            .unwrap();

        assert_eq!(
            hairdresser.render_to_string().unwrap(),
            r#"<base href="/"><meta charset="utf-8">"#
        );
    }

    #[test]
    fn invalid_function_output_fails_the_render() {
        let hairdresser = Hairdresser::new();
        hairdresser
            .new_override()
            .title(Render::func(|| json!(42)))
            .unwrap();

        let err = hairdresser.render_to_string().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: render value for <title> must be a string"
        );
    }

    #[test]
    fn only_the_top_override_is_rendered() {
        let hairdresser = Hairdresser::new();
        hairdresser.new_override().title("base").unwrap();
        let top = hairdresser.new_override();
        top.title("top").unwrap();

        assert_eq!(hairdresser.render_to_string().unwrap(), "<title>top</title>");
        top.restore().unwrap();
        assert_eq!(hairdresser.render_to_string().unwrap(), "<title>base</title>");
    }
}
