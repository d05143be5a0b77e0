// src/ui/panel.rs
//! Viewer panels
//!
//! Controls, search and filter, conversation details, legend, status and
//! the hover tooltip. Scene changes are applied to the [`ViewerState`]
//! directly; anything that needs the network comes back as [`UiActions`].

use imgui::{Condition, TreeNodeFlags, WindowFlags};

use crate::gfx::point_cloud::ColorMode;
use crate::gfx::visibility::CategoryFilter;
use crate::viewer::{DataStatus, ViewerState};

const PANEL_MARGIN: f32 = 16.0;
const BODY_PREVIEW_CHARS: usize = 600;
const SHORT_EMAIL_CHARS: usize = 25;

const LIVE_COLOR: [f32; 4] = [0.4, 1.0, 0.6, 1.0];
const WARN_COLOR: [f32; 4] = [1.0, 0.75, 0.3, 1.0];
const ERROR_COLOR: [f32; 4] = [1.0, 0.4, 0.4, 1.0];
const MUTED_COLOR: [f32; 4] = [0.7, 0.7, 0.75, 1.0];

/// Requests the app has to carry out after the frame.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UiActions {
    pub refresh: bool,
    /// Email of the user to compare against.
    pub compare: Option<String>,
    pub exit_compare: bool,
}

/// Draws every viewer panel for this frame
pub fn viewer_panels(ui: &imgui::Ui, viewer: &mut ViewerState) -> UiActions {
    let mut actions = UiActions::default();
    let display_size = ui.io().display_size;
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return actions;
    }

    controls_panel(ui, viewer, &mut actions);
    filter_panel(ui, viewer);
    details_panel(ui, viewer, display_size, &mut actions);
    legend_panel(ui, viewer, display_size);
    status_panel(ui, viewer, display_size);
    hover_tooltip(ui, viewer);
    actions
}

fn controls_panel(ui: &imgui::Ui, viewer: &mut ViewerState, actions: &mut UiActions) {
    ui.window("Controls")
        .size([300.0, 230.0], Condition::FirstUseEver)
        .position([PANEL_MARGIN, PANEL_MARGIN], Condition::FirstUseEver)
        .collapsible(true)
        .build(|| {
            let mut mode = viewer.controls.color_mode;
            ui.text("Color by");
            ui.same_line();
            ui.radio_button("User", &mut mode, ColorMode::ByUser);
            ui.same_line();
            ui.radio_button("Cluster", &mut mode, ColorMode::ByCluster);
            viewer.set_color_mode(mode);

            ui.slider("Point size", 0.5, 3.0, &mut viewer.controls.point_size);
            ui.slider("Rotation", 0.0, 2.0, &mut viewer.controls.rotation_speed);
            ui.slider("Glow", 0.0, 2.0, &mut viewer.controls.glow_intensity);

            ui.separator();
            let loading = matches!(viewer.status(), DataStatus::Loading);
            let label = if loading { "Refreshing..." } else { "Refresh data" };
            if ui.button(label) && !loading {
                actions.refresh = true;
            }
        });
}

fn filter_panel(ui: &imgui::Ui, viewer: &mut ViewerState) {
    ui.window("Search & Filter")
        .size([300.0, 170.0], Condition::FirstUseEver)
        .position([PANEL_MARGIN, 260.0], Condition::FirstUseEver)
        .collapsible(true)
        .build(|| {
            let mut search = viewer.criteria().search.clone();
            if ui
                .input_text("Search", &mut search)
                .hint("title, email, cluster, text")
                .build()
            {
                viewer.set_search(&search);
            }

            let mut clusters = Vec::with_capacity(viewer.clusters().len() + 1);
            clusters.push("All clusters".to_string());
            clusters.extend(viewer.clusters().iter().cloned());
            let mut cluster_index = match &viewer.criteria().category {
                CategoryFilter::All => 0,
                CategoryFilter::Cluster(title) => viewer
                    .clusters()
                    .iter()
                    .position(|c| c == title)
                    .map_or(0, |i| i + 1),
            };
            if ui.combo_simple_string("Cluster", &mut cluster_index, &clusters) {
                let category = match cluster_index {
                    0 => CategoryFilter::All,
                    i => CategoryFilter::Cluster(clusters[i].clone()),
                };
                viewer.set_category(category);
            }

            if !viewer.users().is_empty() {
                let users = viewer.users().to_vec();
                let mut user_index = viewer
                    .current_user()
                    .and_then(|current| users.iter().position(|u| u == current))
                    .unwrap_or(0);
                if ui.combo_simple_string("You are", &mut user_index, &users) {
                    viewer.set_current_user(users.get(user_index).cloned());
                }
            }

            ui.text_colored(
                MUTED_COLOR,
                format!("{} of {} visible", viewer.visible().len(), viewer.points().len()),
            );
        });
}

fn details_panel(
    ui: &imgui::Ui,
    viewer: &ViewerState,
    display_size: [f32; 2],
    actions: &mut UiActions,
) {
    let width = 360.0;
    ui.window("Conversation")
        .size([width, 420.0], Condition::FirstUseEver)
        .position(
            [display_size[0] - width - PANEL_MARGIN, PANEL_MARGIN],
            Condition::FirstUseEver,
        )
        .collapsible(true)
        .build(|| {
            if let Some(pair) = viewer.comparison().active() {
                ui.text_colored(LIVE_COLOR, "Comparison mode");
                ui.text(format!("{} vs {}", short_email(&pair.current_user), short_email(&pair.target)));
                for connection in viewer.comparison().connections() {
                    ui.bullet_text(format!(
                        "{:.0}%  {} / {}",
                        connection.similarity * 100.0,
                        connection.conversation1.display_title(),
                        connection.conversation2.display_title()
                    ));
                }
                if viewer.comparison().connections().is_empty() {
                    ui.text_colored(MUTED_COLOR, "No shared connections found.");
                }
                if ui.button("Exit comparison") {
                    actions.exit_compare = true;
                }
                ui.separator();
            }

            let Some(point) = viewer.selected_point() else {
                ui.text_colored(MUTED_COLOR, "Click a point to see the conversation.");
                return;
            };

            ui.text_wrapped(point.display_title());
            ui.text_colored(MUTED_COLOR, &point.email);
            if let Some(cluster) = &point.cluster_title {
                ui.text(format!("Cluster: {cluster}"));
            }
            ui.text(format!("When: {}", point.timestamp));

            if let Some(body) = point.body.as_deref().filter(|b| !b.is_empty()) {
                if ui.collapsing_header("Conversation", TreeNodeFlags::DEFAULT_OPEN) {
                    ui.child_window("body")
                        .size([0.0, 180.0])
                        .border(true)
                        .build(|| ui.text_wrapped(preview(body, BODY_PREVIEW_CHARS)));
                }
            }

            let is_self = viewer.current_user() == Some(point.email.as_str());
            if !is_self && viewer.comparison().active().is_none() {
                ui.spacing();
                if viewer.comparison().is_loading() {
                    ui.text_colored(MUTED_COLOR, "Finding shared connections...");
                } else if ui.button(format!("Compare with {}", short_email(&point.email))) {
                    actions.compare = Some(point.email.clone());
                }
            }
            if let Some(error) = viewer.comparison().error() {
                ui.text_colored(ERROR_COLOR, error);
            }
        });
}

fn legend_panel(ui: &imgui::Ui, viewer: &ViewerState, display_size: [f32; 2]) {
    let height = 220.0;
    ui.window("Legend")
        .size([260.0, height], Condition::FirstUseEver)
        .position(
            [PANEL_MARGIN, display_size[1] - height - PANEL_MARGIN],
            Condition::FirstUseEver,
        )
        .collapsible(true)
        .build(|| {
            ui.text(format!("By {}", viewer.colors().mode().label()));
            ui.separator();
            for (key, color) in viewer.colors().legend() {
                let [r, g, b] = color.0;
                ui.color_button(format!("##legend-{key}"), [r, g, b, 1.0]);
                ui.same_line();
                ui.text(short_email(key));
            }
        });
}

fn status_panel(ui: &imgui::Ui, viewer: &ViewerState, display_size: [f32; 2]) {
    let width = 320.0;
    let height = 150.0;
    ui.window("Status")
        .size([width, height], Condition::FirstUseEver)
        .position(
            [
                display_size[0] - width - PANEL_MARGIN,
                display_size[1] - height - PANEL_MARGIN,
            ],
            Condition::FirstUseEver,
        )
        .collapsible(true)
        .build(|| {
            match viewer.status() {
                DataStatus::Loading => ui.text_colored(WARN_COLOR, "Loading data..."),
                DataStatus::Live => ui.text_colored(LIVE_COLOR, "Live data"),
                DataStatus::Fallback { reason } => {
                    ui.text_colored(WARN_COLOR, "Using fallback data");
                    ui.text_wrapped(reason);
                }
            }

            let stats = viewer.stats();
            ui.text(format!(
                "{} conversations, {} users, {} clusters",
                stats.total_conversations, stats.unique_users, stats.unique_clusters
            ));
            if let (Some(min), Some(max)) = (&stats.date_range.min, &stats.date_range.max) {
                ui.text_colored(MUTED_COLOR, format!("{min} to {max}"));
            }
            if !viewer.last_updated().is_empty() {
                ui.text_colored(MUTED_COLOR, format!("Updated {}", viewer.last_updated()));
            }
        });
}

fn hover_tooltip(ui: &imgui::Ui, viewer: &ViewerState) {
    let (Some(hover), Some(point)) = (viewer.hovered(), viewer.hovered_point()) else {
        return;
    };
    if ui.io().want_capture_mouse {
        return;
    }

    let (x, y) = hover.pointer;
    ui.window("##hover")
        .position([x + 14.0, y + 14.0], Condition::Always)
        .flags(
            WindowFlags::NO_DECORATION
                | WindowFlags::ALWAYS_AUTO_RESIZE
                | WindowFlags::NO_INPUTS
                | WindowFlags::NO_SAVED_SETTINGS
                | WindowFlags::NO_FOCUS_ON_APPEARING,
        )
        .build(|| {
            ui.text(point.display_title());
            ui.text_colored(MUTED_COLOR, short_email(&point.email));
            if let Some(cluster) = &point.cluster_title {
                ui.text_colored(MUTED_COLOR, cluster);
            }
        });
}

/// Shortens long emails to 22 characters plus an ellipsis.
pub fn short_email(email: &str) -> String {
    if email.chars().count() > SHORT_EMAIL_CHARS {
        let head: String = email.chars().take(SHORT_EMAIL_CHARS - 3).collect();
        format!("{head}...")
    } else {
        email.to_string()
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_emails_are_shortened() {
        assert_eq!(short_email("bob@startup.io"), "bob@startup.io");
        assert_eq!(
            short_email("someone.with.a.very.long.name@example.com"),
            "someone.with.a.very.lo..."
        );
    }

    #[test]
    fn previews_cut_on_char_boundaries() {
        assert_eq!(preview("héllo wörld", 5), "héllo...");
        assert_eq!(preview("short", 10), "short");
    }
}
