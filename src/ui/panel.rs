//! Control panel
//!
//! One window editing the light, the shading and the post-process settings
//! of a [`SimulationState`]. The panel only changes values the next frame
//! reads; it cannot add, remove or reorder passes.

use crate::{
    gfx::rendering::post_process::{EXPOSURE_RANGE, GAMMA_RANGE},
    state::{ShadingSettings, SimulationState},
};

const MAX_OUTLINE_WIDTH: f32 = 0.2;

/// Default control panel
pub fn control_panel(ui: &imgui::Ui, state: &mut SimulationState) {
    let display_size = ui.io().display_size;
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return;
    }

    ui.window("Controls")
        .size([360.0, 520.0], imgui::Condition::FirstUseEver)
        .position([20.0, 20.0], imgui::Condition::FirstUseEver)
        .resizable(true)
        .collapsible(true)
        .build(|| {
            render_frame_stats(ui, state);
            ui.separator();
            render_light_controls(ui, state);
            render_shading_controls(ui, state);
            render_post_controls(ui, state);
        });

    sanitize(state);
}

fn render_frame_stats(ui: &imgui::Ui, state: &SimulationState) {
    let fps = frames_per_second(state.time.delta);
    ui.text(format!("{fps:.0} FPS ({:.2} ms)", state.time.delta * 1000.0));
    ui.text(format!("Frame {}", state.time.frame_index));
}

fn render_light_controls(ui: &imgui::Ui, state: &mut SimulationState) {
    if ui.collapsing_header("Light", imgui::TreeNodeFlags::DEFAULT_OPEN) {
        let light = &mut state.light;
        imgui::Drag::new("Position")
            .speed(0.05)
            .build_array(ui, &mut light.position);
        ui.color_edit3("Ambient", &mut light.ambient);
        ui.color_edit3("Diffuse", &mut light.diffuse);
        ui.color_edit3("Specular", &mut light.specular);

        ui.text("Attenuation");
        ui.slider("Constant", 0.1, 2.0, &mut light.constant);
        ui.slider("Linear", 0.0, 1.0, &mut light.linear);
        ui.slider("Quadratic", 0.0, 1.0, &mut light.quadratic);
    }
}

fn render_shading_controls(ui: &imgui::Ui, state: &mut SimulationState) {
    if ui.collapsing_header("Shading", imgui::TreeNodeFlags::DEFAULT_OPEN) {
        let shading = &mut state.shading;
        ui.slider("Shininess", 1.0, 256.0, &mut shading.shininess);
        ui.slider(
            "Toon levels",
            0,
            ShadingSettings::MAX_TOON_LEVELS,
            &mut shading.toon_levels,
        );
        if shading.toon_levels == 0 {
            ui.same_line();
            ui.text_disabled("(smooth)");
        }

        ui.slider("Outline width", 0.0, MAX_OUTLINE_WIDTH, &mut shading.outline_width);
        ui.color_edit4("Outline color", &mut shading.outline_color);
    }
}

fn render_post_controls(ui: &imgui::Ui, state: &mut SimulationState) {
    if ui.collapsing_header("Post-processing", imgui::TreeNodeFlags::DEFAULT_OPEN) {
        let post = &mut state.post;
        ui.slider(
            "Exposure",
            *EXPOSURE_RANGE.start(),
            *EXPOSURE_RANGE.end(),
            &mut post.exposure,
        );
        ui.slider("Gamma", *GAMMA_RANGE.start(), *GAMMA_RANGE.end(), &mut post.gamma);
        ui.checkbox("Tone mapping", &mut post.tone_map);

        ui.spacing();
        if ui.button("Reset") {
            *post = Default::default();
        }
    }
}

fn frames_per_second(delta: f32) -> f32 {
    if delta > 0.0 {
        1.0 / delta
    } else {
        0.0
    }
}

/// Pulls typed-in values back into their valid ranges
fn sanitize(state: &mut SimulationState) {
    state.post = state.post.clamped();

    let shading = &mut state.shading;
    shading.toon_levels = shading.toon_levels.min(ShadingSettings::MAX_TOON_LEVELS);
    shading.outline_width = shading.outline_width.clamp(0.0, MAX_OUTLINE_WIDTH);
    shading.shininess = shading.shininess.max(1.0);

    // Attenuation must stay finite at distance 0
    let light = &mut state.light;
    light.constant = light.constant.max(0.1);
    light.linear = light.linear.max(0.0);
    light.quadratic = light.quadratic.max(0.0);
}
