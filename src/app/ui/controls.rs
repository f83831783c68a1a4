use std::sync::Arc;

use eframe::egui::{self, Key, RichText, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::util::short_id;

use super::super::interaction::NeighborDepth;
use super::super::render_utils::pattern_color;
use super::super::{PhysicsConfig, RenderGraph, SearchMatchCache, ViewModel};

const SEARCH_RESULT_LIMIT: usize = 12;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Render node indices whose account id fuzzy-matches `query`, best match first.
fn ranked_matches(graph: &RenderGraph, query: &str) -> Vec<usize> {
    let matcher = SkimMatcherV2::default();
    let mut scored = graph
        .nodes
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            fuzzy_match_score(&matcher, &node.id, query).map(|score| (score, index))
        })
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| graph.nodes[a.1].id.cmp(&graph.nodes[b.1].id)));
    scored.into_iter().map(|(_, index)| index).collect()
}

fn tuning_slider(
    ui: &mut Ui,
    value: &mut f32,
    range: std::ops::RangeInclusive<f32>,
    text: &str,
    hint: &str,
) -> bool {
    ui.add(
        egui::Slider::new(value, range)
            .text(text)
            .clamping(egui::SliderClamping::Always),
    )
    .on_hover_text(hint)
    .changed()
}

impl ViewModel {
    fn cached_search_matches(&mut self) -> Option<Arc<Vec<usize>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.graph_revision == self.render_graph_revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matches = Arc::new(ranked_matches(self.graph_cache.as_ref()?, query));
        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            graph_revision: self.render_graph_revision,
            matches: Arc::clone(&matches),
        });
        Some(matches)
    }

    fn draw_filter_controls(&mut self, ui: &mut Ui) {
        let mut changed = false;

        changed |= ui
            .checkbox(&mut self.filters.show_only_suspicious, "Suspicious accounts only")
            .on_hover_text("Hide every account that the fraud detector did not flag.")
            .changed();
        changed |= ui
            .checkbox(&mut self.filters.show_low_weight, "Show low-value transfers")
            .on_hover_text("Include transfers below 10% of the largest visible amount.")
            .changed();

        let max_amount = self
            .bundle
            .dataset
            .as_ref()
            .map(|dataset| {
                dataset
                    .edges
                    .iter()
                    .map(|edge| edge.amount)
                    .filter(|amount| amount.is_finite())
                    .fold(0.0_f64, f64::max)
            })
            .unwrap_or(0.0)
            .max(1.0);
        changed |= ui
            .add(
                egui::Slider::new(&mut self.filters.min_amount, 0.0..=max_amount)
                    .text("Minimum amount")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("Hide transfers below this cumulative amount (0 disables).")
            .changed();

        if changed {
            self.graph_dirty = true;
        }
    }

    fn draw_interaction_controls(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.label("Neighbor depth");
            let mut depth = self.interaction.neighbor_depth();
            for option in [NeighborDepth::One, NeighborDepth::Two] {
                ui.selectable_value(&mut depth, option, option.label());
            }
            self.interaction
                .set_neighbor_depth(self.graph_cache.as_ref(), depth);
        });

        ui.add_space(4.0);
        ui.label("Fraud patterns");
        ui.horizontal_wrapped(|ui| {
            for (pattern, count) in self.annotations.pattern_counts() {
                let active = self.interaction.active_pattern() == Some(pattern);
                let text = format!("{} ({count})", pattern.label());
                let label = if active {
                    RichText::new(text).color(pattern_color(pattern)).strong()
                } else {
                    RichText::new(text)
                };
                if ui
                    .selectable_label(active, label)
                    .on_hover_text("Highlight accounts and transfers of this pattern.")
                    .clicked()
                {
                    self.interaction.toggle_pattern(pattern);
                }
            }
        });
    }

    fn draw_search(&mut self, ui: &mut Ui) {
        ui.label("Find account");
        let response = ui
            .text_edit_singleline(&mut self.search)
            .on_hover_text("Fuzzy search over visible account ids. Enter selects the best match.");
        let submitted =
            response.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter));

        let Some(matches) = self.cached_search_matches() else {
            return;
        };
        if matches.is_empty() {
            ui.small("No visible account matches.");
            return;
        }

        let mut picked = submitted.then(|| matches[0]);
        let selected = self.interaction.selected_index();
        if let Some(cache) = self.graph_cache.as_ref() {
            for &index in matches.iter().take(SEARCH_RESULT_LIMIT) {
                let Some(node) = cache.nodes.get(index) else {
                    continue;
                };
                if ui
                    .selectable_label(selected == Some(index), short_id(&node.id))
                    .on_hover_text(node.id.as_str())
                    .clicked()
                {
                    picked = Some(index);
                }
            }
            if matches.len() > SEARCH_RESULT_LIMIT {
                ui.small(format!("{} more", matches.len() - SEARCH_RESULT_LIMIT));
            }
        }

        let picked_id = picked
            .and_then(|index| self.graph_cache.as_ref()?.nodes.get(index))
            .map(|node| node.id.clone());
        if let Some(id) = picked_id {
            self.select_account(&id);
        }
    }

    fn draw_physics_controls(&mut self, ui: &mut Ui) {
        let mut changed = false;
        let physics = &mut self.physics;
        changed |= tuning_slider(
            ui,
            &mut physics.repulsion_scale,
            0.1..=4.0,
            "Repulsion",
            "How strongly accounts push away from each other.",
        );
        changed |= tuning_slider(
            ui,
            &mut physics.link_distance,
            10.0..=300.0,
            "Link distance",
            "Preferred gap between two accounts joined by a transfer.",
        );
        changed |= tuning_slider(
            ui,
            &mut physics.spring_scale,
            0.1..=3.0,
            "Edge spring",
            "How strongly connected accounts pull toward the link distance.",
        );
        changed |= tuning_slider(
            ui,
            &mut physics.center_strength,
            0.0..=0.2,
            "Centering",
            "Pull toward the origin that keeps disconnected groups on screen.",
        );
        changed |= tuning_slider(
            ui,
            &mut physics.collision_scale,
            0.0..=3.0,
            "Collision",
            "Separation force that prevents overlapping accounts.",
        );
        changed |= tuning_slider(
            ui,
            &mut physics.velocity_damping,
            0.3..=0.99,
            "Velocity damping",
            "Share of velocity kept from one step to the next.",
        );

        ui.horizontal(|ui| {
            if ui.button("Reset").clicked() {
                self.physics = PhysicsConfig::default();
                changed = true;
            }
            if ui.button("Reheat").clicked() {
                changed = true;
            }
        });

        if changed && let Some(cache) = self.graph_cache.as_mut() {
            super::super::physics::reheat(cache);
        }
    }

    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Investigation");
        ui.separator();

        self.draw_filter_controls(ui);
        ui.separator();
        self.draw_interaction_controls(ui);
        ui.separator();
        self.draw_search(ui);
        ui.separator();

        ui.checkbox(&mut self.live_physics, "Live physics simulation")
            .on_hover_text("Keep simulating layout forces until the layout settles.");
        ui.checkbox(&mut self.show_legend, "Risk legend")
            .on_hover_text("Show the risk tier colors in the canvas corner.");
        ui.checkbox(&mut self.show_fps_bar, "FPS display")
            .on_hover_text("Show a live FPS readout in the header.");
        ui.checkbox(&mut self.show_quadtree_overlay, "Show quadtree overlay")
            .on_hover_text("Draw the Barnes-Hut partitions over the graph canvas.");

        ui.collapsing("Physics tuning", |ui| self.draw_physics_controls(ui));
    }
}

#[cfg(test)]
mod tests {
    use super::super::super::graph::fixtures::render_graph;
    use super::*;

    #[test]
    fn search_ranks_closer_matches_first() {
        let graph = render_graph(&["ACC_1002", "MULE_77", "ACC_0001"], &[]);
        let matches = ranked_matches(&graph, "acc");
        let ids = matches
            .iter()
            .map(|index| graph.nodes[*index].id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids.len(), 2);
        assert!(!ids.contains(&"MULE_77"));

        let exact = ranked_matches(&graph, "MULE_77");
        assert_eq!(graph.nodes[exact[0]].id, "MULE_77");
    }

    #[test]
    fn search_without_hits_is_empty() {
        let graph = render_graph(&["ACC_1"], &[]);
        assert!(ranked_matches(&graph, "zzz").is_empty());
    }
}
