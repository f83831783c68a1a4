use eframe::egui::{self, Color32, RichText, Ui};
use serde_json::Value;

use crate::util::{format_amount, short_id};

use super::super::ViewModel;
use super::super::render_utils::risk_color;

fn factor_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number
            .as_f64()
            .map(|value| format!("{value:.2}"))
            .unwrap_or_else(|| number.to_string()),
        Value::Bool(flag) => if *flag { "yes" } else { "no" }.to_owned(),
        other => other.to_string(),
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Account Details");
        ui.add_space(6.0);

        let Some(record) = self.last_clicked.as_deref() else {
            ui.label("Click an account in the graph or pick one from the search results.");
            return;
        };
        let record = record.clone();
        let account = &record.account;

        ui.label(RichText::new(account.id.as_str()).strong());
        if self.interaction.selected_id() != Some(account.id.as_str()) {
            ui.small("not currently selected");
        }
        ui.add_space(6.0);

        ui.horizontal(|ui| {
            ui.label("Risk:");
            ui.label(
                RichText::new(format!("{}  ({:.1})", record.risk_level, record.score))
                    .color(risk_color(record.risk_level))
                    .strong(),
            );
        });
        if record.is_suspicious {
            ui.colored_label(Color32::from_rgb(255, 170, 120), "Flagged as suspicious");
        }
        if record.is_in_ring {
            ui.colored_label(Color32::from_rgb(229, 72, 77), "Member of a fraud ring");
        }

        egui::Grid::new("account_metrics")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                ui.label("In-degree");
                ui.label(account.in_degree.to_string());
                ui.end_row();
                ui.label("Out-degree");
                ui.label(account.out_degree.to_string());
                ui.end_row();
                ui.label("Sent");
                ui.label(format_amount(account.total_amount_sent));
                ui.end_row();
                ui.label("Received");
                ui.label(format_amount(account.total_amount_received));
                ui.end_row();
                ui.label("Net flow");
                ui.label(format_amount(account.net_flow));
                ui.end_row();
                ui.label("Transactions");
                ui.label(account.total_transactions.to_string());
                ui.end_row();
                ui.label("Node size");
                ui.label(format!("{:.1}", record.size));
                ui.end_row();
            });

        if !record.patterns.is_empty() {
            ui.separator();
            ui.label(RichText::new("Patterns").strong());
            ui.horizontal_wrapped(|ui| {
                for pattern in &record.patterns {
                    ui.label(RichText::new(pattern.as_str()).monospace());
                }
            });
        }

        if let Some(entry) = self.annotations.risk(&account.id)
            && !entry.record.risk_factors.is_empty()
        {
            ui.separator();
            ui.label(RichText::new("Risk factors").strong());
            egui::Grid::new("risk_factors")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui| {
                    for (name, value) in &entry.record.risk_factors {
                        ui.label(name.replace('_', " "));
                        ui.label(factor_text(value));
                        ui.end_row();
                    }
                });
        }

        let Some(ring) = record
            .ring_id
            .as_deref()
            .and_then(|ring_id| self.annotations.ring(ring_id))
        else {
            return;
        };

        ui.separator();
        ui.label(RichText::new(format!("Ring {}", ring.ring_id)).strong());
        ui.label(format!(
            "{}  |  risk {:.1}  |  {} members",
            ring.pattern_type.label(),
            ring.risk_score,
            ring.member_count.max(ring.member_accounts.len())
        ));

        let members = ring.member_accounts.clone();
        let mut clicked = None;
        egui::ScrollArea::vertical()
            .id_salt("ring_members_scroll")
            .max_height(260.0)
            .auto_shrink([false, true])
            .show_rows(ui, 20.0, members.len(), |ui, row_range| {
                for member in &members[row_range] {
                    let is_current = member == &account.id;
                    if ui
                        .selectable_label(is_current, short_id(member))
                        .on_hover_text(member.as_str())
                        .clicked()
                        && !is_current
                    {
                        clicked = Some(member.clone());
                    }
                }
            });

        if let Some(member) = clicked {
            self.select_account(&member);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn factor_values_render_without_json_quoting() {
        assert_eq!(factor_text(&json!("velocity")), "velocity");
        assert_eq!(factor_text(&json!(0.5)), "0.50");
        assert_eq!(factor_text(&json!(true)), "yes");
        assert_eq!(factor_text(&json!([1, 2])), "[1,2]");
    }
}
