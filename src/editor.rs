use bevy::prelude::Resource;
use tracing::{info, warn};

use crate::collect::collect;
use crate::form::FormView;
use crate::model::{Configuration, FieldMapping, SensorId, SensorNode};

/// Outcome of [`ConfigEditor::add_sensor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedSensor {
    pub id: SensorId,
    /// The count-based identifier was already taken and the old sensor
    /// was overwritten.
    pub replaced_existing: bool,
}

/// Owns the canonical model and its rendered form.
///
/// Structural edits run collect, mutate, re-render so that text typed
/// anywhere else in the form survives the rebuild. Removing a field edits
/// the displayed rows and then collects.
#[derive(Debug, Clone, Default, Resource)]
pub struct ConfigEditor {
    config: Configuration,
    view: FormView,
}

impl ConfigEditor {
    pub fn new(config: Configuration) -> Self {
        let view = FormView::render(&config);
        Self { config, view }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn view(&self) -> &FormView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut FormView {
        &mut self.view
    }

    /// Installs a fresh snapshot and rebuilds every control.
    pub fn replace(&mut self, config: Configuration) {
        self.view = FormView::render(&config);
        self.config = config;
    }

    /// Pulls the current control values into the model. Cards stay as
    /// typed but are re-keyed to match the collected model.
    pub fn collect(&mut self) -> &Configuration {
        self.config = collect(&self.view, &self.config);
        self.view.rebind_sensor_keys();
        &self.config
    }

    pub fn add_sensor(&mut self) -> AddedSensor {
        self.collect();

        let id = SensorId::new((self.config.nivel1.len() + 1).to_string());
        let replaced_existing = self
            .config
            .nivel1
            .insert(id.clone(), SensorNode::placeholder())
            .is_some();
        if replaced_existing {
            warn!(%id, "count-based sensor identifier collided, existing sensor overwritten");
        } else {
            info!(%id, "sensor added");
        }

        self.rerender();
        AddedSensor {
            id,
            replaced_existing,
        }
    }

    pub fn remove_sensor(&mut self, id: &SensorId) -> bool {
        self.collect();
        let removed = self.config.nivel1.remove(id).is_some();
        if removed {
            info!(%id, "sensor removed");
        }
        self.rerender();
        removed
    }

    /// Appends an unnamed field. `id` is resolved after collecting, so it
    /// must be the identifier as currently typed on the card.
    pub fn add_field(&mut self, id: &SensorId) -> bool {
        self.collect();
        let added = match self.config.nivel1.get_mut(id) {
            Some(sensor) => {
                sensor.packet_mapping.push(FieldMapping::blank());
                true
            }
            None => false,
        };
        self.rerender();
        added
    }

    /// Drops the `index`-th row as displayed on the card for `id`, then
    /// collects. The view is not re-rendered, so rows with a blank name
    /// stay on screen until the next structural edit while the model
    /// already omits them.
    pub fn remove_field(&mut self, id: &SensorId, index: usize) -> bool {
        let removed = match self.view.sensors.iter_mut().rfind(|card| &card.target_id() == id) {
            Some(card) if index < card.fields.len() => {
                card.fields.remove(index);
                true
            }
            _ => false,
        };
        self.collect();
        if removed {
            info!(%id, index, "field removed");
        }
        removed
    }

    fn rerender(&mut self) {
        self.view.render_sensors(&self.config);
    }
}
