//! `inspect`: the active controller of every selector.

use std::rc::Rc;

use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use hairdresser_core::{Controller, ControllerId, ControllerKind, to_html};

use super::{Settings, Stack};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct ActiveEntry {
    selector: String,
    kind: ControllerKind,
    #[serde(rename = "override")]
    owner: Option<String>,
    controller: ControllerId,
    /// Number of controllers stacked on this selector.
    depth: usize,
    /// Title string, or the rendered attributes; matching ones are in `selector`.
    value: Value,
    #[serde(skip)]
    display: String,
}

#[derive(Tabled)]
struct ActiveRow {
    #[tabled(rename = "Selector")]
    selector: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Override")]
    owner: String,
    #[tabled(rename = "Depth")]
    depth: usize,
    #[tabled(rename = "Value")]
    value: String,
}

fn entry(stack: &Stack, controller: &Controller) -> Result<ActiveEntry, CliError> {
    let (value, display) = match controller.kind() {
        ControllerKind::Title => {
            let title = controller.render_title()?;
            (Value::String(title.clone()), title)
        }
        ControllerKind::Etc => {
            let attrs = controller.render_attrs()?;
            let display = to_html(&attrs);
            let object = attrs
                .into_iter()
                .map(|(name, value)| (name, Value::String(value)))
                .collect();
            (Value::Object(object), display)
        }
    };

    Ok(ActiveEntry {
        selector: controller.selector().to_owned(),
        kind: controller.kind(),
        owner: controller
            .override_id()
            .and_then(|id| stack.override_name(id))
            .map(str::to_owned),
        controller: controller.id(),
        depth: depth(controller),
        value,
        display,
    })
}

fn depth(controller: &Controller) -> usize {
    let mut depth = 1;
    let mut cursor: Option<Rc<Controller>> = controller.prev();
    while let Some(prev) = cursor {
        depth += 1;
        cursor = prev.prev();
    }
    depth
}

pub fn handle(stack: &Stack, settings: &Settings) -> Result<(), CliError> {
    let entries = stack
        .hairdresser
        .active_controllers()
        .iter()
        .map(|controller| entry(stack, controller))
        .collect::<Result<Vec<_>, _>>()?;

    let color = output::should_color(settings.color);
    let out = output::render_list(
        settings.output,
        &entries,
        |e| ActiveRow {
            selector: e.selector.clone(),
            kind: if color {
                match e.kind {
                    ControllerKind::Title => e.kind.cyan().to_string(),
                    ControllerKind::Etc => e.kind.green().to_string(),
                }
            } else {
                e.kind.to_string()
            },
            owner: e.owner.clone().unwrap_or_else(|| "-".into()),
            depth: e.depth,
            value: e.display.clone(),
        },
        |e| e.selector.clone(),
    )?;
    output::print_output(&out, settings.quiet);
    Ok(())
}
