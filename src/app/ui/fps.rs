use eframe::egui::Context;

use super::super::ViewModel;

const FPS_SAMPLE_WINDOW: usize = 180;

impl ViewModel {
    pub(in crate::app) fn update_fps_counter(&mut self, ctx: &Context) {
        let dt = ctx.input(|input| input.stable_dt);
        if dt <= f32::EPSILON {
            return;
        }

        self.fps_current = (1.0 / dt).clamp(0.0, 1000.0);
        self.fps_samples.push_back(self.fps_current);
        while self.fps_samples.len() > FPS_SAMPLE_WINDOW {
            self.fps_samples.pop_front();
        }
    }

    pub(in crate::app) fn fps_display_text(&self) -> Option<String> {
        if !self.show_fps_bar {
            return None;
        }

        let mut text = format!("FPS {:.0}", self.fps_current);
        if !self.fps_samples.is_empty() {
            let avg = self.fps_samples.iter().sum::<f32>() / self.fps_samples.len() as f32;
            text.push_str(&format!(" | avg {avg:.1}"));
        }
        if self.fps_current > f32::EPSILON {
            text.push_str(&format!(" | {:.1} ms", 1000.0 / self.fps_current));
        }
        Some(text)
    }

    pub(in crate::app) fn visible_graph_text(&self) -> Option<String> {
        self.graph_cache.as_ref().map(|cache| {
            format!(
                "visible: {} accounts / {} transfers",
                self.visible_node_count.min(cache.nodes.len()),
                self.visible_edge_count.min(cache.edges.len())
            )
        })
    }
}
