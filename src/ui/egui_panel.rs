use super::{ControlId, ControlPanel};

/// Draws the panel as one collapsing folder per group. Only widgets egui
/// reports as `changed()` become edits.
pub fn show_panel(ctx: &egui::Context, panel: &mut ControlPanel) {
    let mut edits: Vec<(ControlId, f32)> = Vec::new();
    egui::Window::new("Controls")
        .default_width(260.0)
        .resizable(false)
        .show(ctx, |ui| {
            for folder in panel.folders() {
                egui::CollapsingHeader::new(folder)
                    .default_open(true)
                    .show(ui, |ui| {
                        for control in panel
                            .controls()
                            .iter()
                            .filter(|control| control.spec.folder == folder)
                        {
                            let spec = &control.spec;
                            if spec.is_choice() {
                                let before = control.display().round().max(0.0) as usize;
                                let mut selected = before;
                                let selected_text = spec
                                    .options
                                    .get(selected)
                                    .map(String::as_str)
                                    .unwrap_or_default();
                                egui::ComboBox::from_id_salt((folder, spec.label.as_str()))
                                    .selected_text(selected_text)
                                    .show_ui(ui, |ui| {
                                        for (index, option) in spec.options.iter().enumerate() {
                                            ui.selectable_value(&mut selected, index, option.as_str());
                                        }
                                    });
                                if selected != before {
                                    edits.push((control.id, selected as f32));
                                }
                            } else {
                                let mut value = control.display();
                                let response = ui.add(
                                    egui::Slider::new(&mut value, spec.min..=spec.max)
                                        .step_by(f64::from(spec.step))
                                        .text(spec.label.as_str()),
                                );
                                if response.changed() {
                                    edits.push((control.id, value));
                                }
                            }
                        }
                    });
            }
        });
    for (id, value) in edits {
        panel.edit(id, value);
    }
}
