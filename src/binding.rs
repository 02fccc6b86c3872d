//! Reactive binding between the two dashboard inputs and the two charts.
//!
//! The callback table is explicit: each entry names the inputs it reads, the
//! output it publishes and the function that computes it. An input change marks
//! every dependent output stale and recomputes it before `apply` returns, so a
//! caller never observes a stale slot.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::data::Dataset;
use crate::error::DashError;
use crate::logging::{self, obj, v_num, v_str, Domain};
use crate::model::{PayloadRange, PieSlice, ScatterPoint, SiteSelection};
use crate::{pie, scatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum InputId {
    #[serde(rename = "site-dropdown")]
    SiteDropdown,
    #[serde(rename = "payload-slider")]
    PayloadSlider,
}

impl InputId {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputId::SiteDropdown => "site-dropdown",
            InputId::PayloadSlider => "payload-slider",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, DashError> {
        match raw {
            "site-dropdown" => Ok(InputId::SiteDropdown),
            "payload-slider" => Ok(InputId::PayloadSlider),
            other => Err(DashError::UnknownInput(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum OutputId {
    #[serde(rename = "success-pie-chart")]
    SuccessPieChart,
    #[serde(rename = "success-payload-scatter-chart")]
    PayloadScatterChart,
}

impl OutputId {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputId::SuccessPieChart => "success-pie-chart",
            OutputId::PayloadScatterChart => "success-payload-scatter-chart",
        }
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current values of the named inputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inputs {
    pub site: SiteSelection,
    pub payload: PayloadRange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputChange {
    Site(SiteSelection),
    Payload(PayloadRange),
}

impl InputChange {
    pub fn input_id(&self) -> InputId {
        match self {
            InputChange::Site(_) => InputId::SiteDropdown,
            InputChange::Payload(_) => InputId::PayloadSlider,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Figure {
    Pie {
        title: String,
        slices: Vec<PieSlice>,
    },
    Scatter {
        title: String,
        x_label: String,
        y_label: String,
        color_label: String,
        points: Vec<ScatterPoint>,
    },
}

impl Figure {
    pub fn title(&self) -> &str {
        match self {
            Figure::Pie { title, .. } | Figure::Scatter { title, .. } => title,
        }
    }
}

pub type ComputeFn = fn(&Dataset, &Inputs) -> Result<Figure, DashError>;

#[derive(Clone)]
pub struct Callback {
    pub inputs: &'static [InputId],
    pub output: OutputId,
    pub compute: ComputeFn,
}

impl Callback {
    pub fn depends_on(&self, input: InputId) -> bool {
        self.inputs.contains(&input)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("inputs", &self.inputs)
            .field("output", &self.output)
            .finish()
    }
}

pub fn pie_figure(dataset: &Dataset, inputs: &Inputs) -> Result<Figure, DashError> {
    logging::debug(
        Domain::Callback,
        "pie.invoke",
        obj(&[("site", v_str(inputs.site.as_value()))]),
    );
    Ok(Figure::Pie {
        title: pie::title(&inputs.site),
        slices: pie::aggregate(dataset.records(), &inputs.site)?,
    })
}

pub fn scatter_figure(dataset: &Dataset, inputs: &Inputs) -> Result<Figure, DashError> {
    logging::debug(
        Domain::Callback,
        "scatter.invoke",
        obj(&[
            ("site", v_str(inputs.site.as_value())),
            ("low", v_num(inputs.payload.low())),
            ("high", v_num(inputs.payload.high())),
        ]),
    );
    Ok(Figure::Scatter {
        title: scatter::title(&inputs.site),
        x_label: scatter::X_LABEL.to_string(),
        y_label: scatter::Y_LABEL.to_string(),
        color_label: scatter::COLOR_LABEL.to_string(),
        points: scatter::filter(dataset.records(), &inputs.site, inputs.payload),
    })
}

/// The dashboard's wiring: pie reads the dropdown, scatter reads both inputs.
pub fn default_callbacks() -> Vec<Callback> {
    vec![
        Callback {
            inputs: &[InputId::SiteDropdown],
            output: OutputId::SuccessPieChart,
            compute: pie_figure,
        },
        Callback {
            inputs: &[InputId::SiteDropdown, InputId::PayloadSlider],
            output: OutputId::PayloadScatterChart,
            compute: scatter_figure,
        },
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    Stale,
    Fresh,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputSlot {
    pub freshness: Freshness,
    pub revision: u64,
    pub figure: Figure,
}

pub struct Dashboard {
    dataset: Dataset,
    inputs: Inputs,
    callbacks: Vec<Callback>,
    outputs: BTreeMap<OutputId, OutputSlot>,
    events: u64,
}

impl Dashboard {
    pub fn new(dataset: Dataset) -> Result<Self, DashError> {
        Self::with_callbacks(dataset, default_callbacks())
    }

    /// Computes every output once from the defaults: all sites, observed payload bounds.
    pub fn with_callbacks(dataset: Dataset, callbacks: Vec<Callback>) -> Result<Self, DashError> {
        let inputs = Inputs {
            site: SiteSelection::All,
            payload: PayloadRange::new(dataset.min_payload(), dataset.max_payload())?,
        };
        let mut outputs = BTreeMap::new();
        for cb in &callbacks {
            let figure = (cb.compute)(&dataset, &inputs)?;
            outputs.insert(
                cb.output,
                OutputSlot {
                    freshness: Freshness::Fresh,
                    revision: 1,
                    figure,
                },
            );
        }
        logging::info(
            Domain::Callback,
            "dashboard.init",
            obj(&[
                ("outputs", v_num(outputs.len() as f64)),
                ("records", v_num(dataset.len() as f64)),
            ]),
        );
        Ok(Self {
            dataset,
            inputs,
            callbacks,
            outputs,
            events: 0,
        })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    pub fn callbacks(&self) -> &[Callback] {
        &self.callbacks
    }

    pub fn slot(&self, id: OutputId) -> Option<&OutputSlot> {
        self.outputs.get(&id)
    }

    pub fn figure(&self, id: OutputId) -> Option<&Figure> {
        self.outputs.get(&id).map(|s| &s.figure)
    }

    pub fn slots(&self) -> &BTreeMap<OutputId, OutputSlot> {
        &self.outputs
    }

    /// Number of input-change events processed since startup.
    pub fn events(&self) -> u64 {
        self.events
    }

    /// Processes one input-change event.
    ///
    /// All changes are validated before anything is stored; an unknown site
    /// leaves inputs and outputs untouched. Each dependent output is recomputed
    /// exactly once, in table order. Returns the outputs that were republished.
    pub fn apply(&mut self, changes: &[InputChange]) -> Result<Vec<OutputId>, DashError> {
        if changes.is_empty() {
            return Ok(Vec::new());
        }
        for change in changes {
            if let InputChange::Site(SiteSelection::Site(name)) = change {
                if !self.dataset.has_site(name) {
                    logging::warn(
                        Domain::Callback,
                        "input.rejected",
                        obj(&[("input", v_str(change.input_id().as_str())), ("site", v_str(name))]),
                    );
                    return Err(DashError::UnknownSite(name.clone()));
                }
            }
        }

        let mut changed = Vec::new();
        for change in changes {
            match change {
                InputChange::Site(site) => self.inputs.site = site.clone(),
                InputChange::Payload(range) => self.inputs.payload = *range,
            }
            if !changed.contains(&change.input_id()) {
                changed.push(change.input_id());
            }
        }
        self.events += 1;

        let affected: Vec<OutputId> = self
            .callbacks
            .iter()
            .filter(|cb| changed.iter().any(|id| cb.depends_on(*id)))
            .map(|cb| cb.output)
            .collect();
        for id in &affected {
            if let Some(slot) = self.outputs.get_mut(id) {
                slot.freshness = Freshness::Stale;
            }
        }

        for cb in self.callbacks.iter().filter(|cb| affected.contains(&cb.output)) {
            let figure = (cb.compute)(&self.dataset, &self.inputs)?;
            if let Some(slot) = self.outputs.get_mut(&cb.output) {
                slot.figure = figure;
                slot.revision += 1;
                slot.freshness = Freshness::Fresh;
            }
        }

        logging::debug(
            Domain::Callback,
            "event.applied",
            obj(&[
                ("event", v_num(self.events as f64)),
                ("site", v_str(self.inputs.site.as_value())),
                ("low", v_num(self.inputs.payload.low())),
                ("high", v_num(self.inputs.payload.high())),
                (
                    "outputs",
                    serde_json::Value::Array(affected.iter().map(|o| v_str(o.as_str())).collect()),
                ),
            ]),
        );
        Ok(affected)
    }
}
