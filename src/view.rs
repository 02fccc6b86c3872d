//! Page layout as a tree of plain view nodes, rendered to HTML on each request.

use serde::Serialize;

use crate::binding::{Dashboard, InputId, OutputId};
use crate::model::{ALL_SITES, SLIDER_MAX_KG, SLIDER_MIN_KG, SLIDER_STEP_KG};
use crate::render::{escape, figure_svg};

pub const PAGE_TITLE: &str = "SpaceX Launch Records Dashboard";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropdownOption {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum ViewNode {
    Container {
        children: Vec<ViewNode>,
    },
    Heading {
        text: String,
        style: String,
    },
    Paragraph {
        text: String,
    },
    Break,
    Dropdown {
        id: InputId,
        options: Vec<DropdownOption>,
        value: String,
        placeholder: String,
        searchable: bool,
    },
    RangeSlider {
        id: InputId,
        min: f64,
        max: f64,
        step: f64,
        marks: Vec<(f64, String)>,
        value: (f64, f64),
    },
    Graph {
        id: OutputId,
    },
}

/// Builds the page tree from the current dashboard inputs.
pub fn layout(dash: &Dashboard) -> ViewNode {
    let mut options = vec![DropdownOption {
        label: "All Sites".to_string(),
        value: ALL_SITES.to_string(),
    }];
    options.extend(dash.dataset().sites().iter().map(|s| DropdownOption {
        label: s.clone(),
        value: s.clone(),
    }));
    let inputs = dash.inputs();

    ViewNode::Container {
        children: vec![
            ViewNode::Heading {
                text: PAGE_TITLE.to_string(),
                style: "text-align:center; color:#503D36; font-size:40px".to_string(),
            },
            ViewNode::Dropdown {
                id: InputId::SiteDropdown,
                options,
                value: inputs.site.as_value().to_string(),
                placeholder: "Select a Launch Site here.".to_string(),
                searchable: true,
            },
            ViewNode::Break,
            ViewNode::Graph {
                id: OutputId::SuccessPieChart,
            },
            ViewNode::Break,
            ViewNode::Paragraph {
                text: "Payload range (Kg):".to_string(),
            },
            ViewNode::RangeSlider {
                id: InputId::PayloadSlider,
                min: SLIDER_MIN_KG,
                max: SLIDER_MAX_KG,
                step: SLIDER_STEP_KG,
                marks: vec![
                    (SLIDER_MIN_KG, format!("{}", SLIDER_MIN_KG)),
                    (SLIDER_MAX_KG, format!("{}", SLIDER_MAX_KG)),
                ],
                value: (inputs.payload.low(), inputs.payload.high()),
            },
            ViewNode::Graph {
                id: OutputId::PayloadScatterChart,
            },
        ],
    }
}

/// Full HTML document. The controls sit in one GET form that resubmits on change.
pub fn render_page(dash: &Dashboard) -> String {
    let mut body = String::new();
    render_node(&layout(dash), dash, &mut body);
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{}</title>
  <style>
    body {{ font-family: sans-serif; margin: 24px; }}
    .graph {{ margin: 12px 0; }}
    .range label {{ margin-right: 12px; }}
  </style>
</head>
<body>
<form method="get" action="/">
{}
</form>
</body>
</html>
"##,
        escape(PAGE_TITLE),
        body
    )
}

fn render_node(node: &ViewNode, dash: &Dashboard, out: &mut String) {
    match node {
        ViewNode::Container { children } => {
            out.push_str("<div>\n");
            for child in children {
                render_node(child, dash, out);
            }
            out.push_str("</div>\n");
        }
        ViewNode::Heading { text, style } => {
            out.push_str(&format!("<h1 style=\"{}\">{}</h1>\n", escape(style), escape(text)));
        }
        ViewNode::Paragraph { text } => {
            out.push_str(&format!("<p>{}</p>\n", escape(text)));
        }
        ViewNode::Break => out.push_str("<br>\n"),
        ViewNode::Dropdown {
            id,
            options,
            value,
            placeholder,
            ..
        } => {
            out.push_str(&format!(
                "<div><select id=\"{}\" name=\"site\" title=\"{}\" onchange=\"this.form.submit()\">\n",
                id.as_str(),
                escape(placeholder)
            ));
            for opt in options {
                let selected = if &opt.value == value { " selected" } else { "" };
                out.push_str(&format!(
                    "<option value=\"{}\"{}>{}</option>\n",
                    escape(&opt.value),
                    selected,
                    escape(&opt.label)
                ));
            }
            out.push_str("</select></div>\n");
        }
        ViewNode::RangeSlider {
            id,
            min,
            max,
            step,
            value,
            ..
        } => {
            out.push_str(&format!("<div id=\"{}\" class=\"range\">\n", id.as_str()));
            for (name, v) in [("low", value.0), ("high", value.1)] {
                out.push_str(&format!(
                    "<label>{} <input type=\"number\" name=\"{}\" min=\"{}\" max=\"{}\" step=\"{}\" value=\"{}\" onchange=\"this.form.submit()\"></label>\n",
                    name, name, min, max, step, v
                ));
            }
            out.push_str("</div>\n");
        }
        ViewNode::Graph { id } => {
            out.push_str(&format!("<div id=\"{}\" class=\"graph\">\n", id.as_str()));
            if let Some(figure) = dash.figure(*id) {
                out.push_str(&figure_svg(figure));
                out.push('\n');
            }
            out.push_str("</div>\n");
        }
    }
}
