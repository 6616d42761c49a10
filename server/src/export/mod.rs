// Session export: leaderboards, placeholder-driven HTML, CSV/TSV tables
// and chart series. Runs on a snapshot only, so it can overlap the next
// session's live accumulation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::info;

use gridstat_core::participant::ParticipantRecord;
use gridstat_core::ranking::{sorted, RankingView};
use gridstat_core::registry::SessionSnapshot;
use gridstat_core::time::{format_gap, format_ticks};

use crate::config::ServerConfig;
use crate::records::RecordStore;
use crate::utils::{html_escape, now_epoch_secs, sanitize_filename};

mod tables;
mod template;

const DEFAULT_TEMPLATE: &str = include_str!("report.html");

pub struct Exporter {
    output_dir: PathBuf,
    template_path: Option<PathBuf>,
    records: Arc<RecordStore>,
}

impl Exporter {
    pub fn new(config: &ServerConfig, records: Arc<RecordStore>) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            template_path: config.template_path.clone(),
            records,
        }
    }

    /// Writes every artifact for one finished session. Any failure here
    /// is reported to the spawning site and never reaches the ingest loop.
    pub async fn export_session(&self, snapshot: SessionSnapshot) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("creating {}", self.output_dir.display()))?;

        let stem = format!(
            "{}_{}_{}",
            sanitize_filename(&snapshot.meta.track),
            snapshot.meta.phase.as_str(),
            now_epoch_secs()
        );

        let template = match &self.template_path {
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading template {}", path.display()))?,
            None => DEFAULT_TEMPLATE.to_string(),
        };
        let html = render_html(&template, &snapshot, &self.records);
        let html_path = self.output_dir.join(format!("{}.html", stem));
        tokio::fs::write(&html_path, html).await?;

        let csv = tables::classification_table(&snapshot, b',')?;
        tokio::fs::write(self.output_dir.join(format!("{}.csv", stem)), csv).await?;
        let tsv = tables::classification_table(&snapshot, b'\t')?;
        tokio::fs::write(self.output_dir.join(format!("{}.tsv", stem)), tsv).await?;

        let charts = serde_json::to_vec_pretty(&chart_series(&snapshot))?;
        tokio::fs::write(self.output_dir.join(format!("{}_charts.json", stem)), charts).await?;

        info!(
            report = %html_path.display(),
            participants = snapshot.participants.len(),
            phase = snapshot.meta.phase.as_str(),
            "session exported"
        );
        Ok(())
    }
}

fn render_html(template: &str, snapshot: &SessionSnapshot, records: &RecordStore) -> String {
    let values = placeholders(snapshot, records);
    template::apply(template, &values)
}

/// The named placeholder map consumed by string-key lookup in templates.
fn placeholders(snapshot: &SessionSnapshot, records: &RecordStore) -> HashMap<String, String> {
    let mut values = HashMap::new();
    let meta = &snapshot.meta;
    values.insert("track".to_string(), html_escape(&meta.track));
    values.insert("phase".to_string(), meta.phase.as_str().to_string());
    values.insert("weather".to_string(), meta.weather.to_string());
    values.insert("wind".to_string(), meta.wind.to_string());
    values.insert("laps".to_string(), meta.lap_counter.to_string());
    values.insert(
        "participants".to_string(),
        snapshot.participants.len().to_string(),
    );

    let session_best = sorted(RankingView::BestLap, &snapshot.participants)
        .into_iter()
        .find_map(|record| record.best_lap.map(|best| (record, best)));
    let (best_lap_text, best_driver, reference) = match session_best {
        Some((record, best)) => (
            format_ticks(best.ticks),
            html_escape(&record.display_name),
            records.lookup(&meta.track, &record.car),
        ),
        None => ("—".to_string(), "—".to_string(), None),
    };
    values.insert("best_lap".to_string(), best_lap_text);
    values.insert("best_lap_driver".to_string(), best_driver);

    let (record_lap, record_gap) = match (reference, session_best) {
        (Some(reference), Some((_, best))) => (
            format_ticks(reference.lap),
            format_gap(best.ticks.saturating_sub(reference.lap)),
        ),
        _ => ("—".to_string(), "—".to_string()),
    };
    values.insert("record_lap".to_string(), record_lap);
    values.insert("record_gap".to_string(), record_gap);
    let record_sectors = reference
        .filter(|reference| !reference.sectors.is_empty())
        .map(|reference| {
            reference
                .sectors
                .iter()
                .map(|&ticks| format_ticks(ticks))
                .collect::<Vec<_>>()
                .join(" / ")
        })
        .unwrap_or_else(|| "—".to_string());
    values.insert("record_sectors".to_string(), record_sectors);

    let sectors = observed_sectors(snapshot);
    let mut tables_html = String::new();
    for view in RankingView::all(sectors) {
        tables_html.push_str(&view_table(view, snapshot));
    }
    values.insert("tables".to_string(), tables_html);

    let chat = meta
        .chat
        .iter()
        .map(|line| format!("{}: {}", html_escape(&line.display_name), html_escape(&line.text)))
        .collect::<Vec<_>>()
        .join("\n");
    values.insert("chat".to_string(), chat);

    values
}

fn observed_sectors(snapshot: &SessionSnapshot) -> usize {
    let splits = snapshot
        .meta
        .splits_seen
        .max(
            snapshot
                .participants
                .iter()
                .flat_map(|record| record.laps.iter())
                .map(|lap| lap.splits.len())
                .max()
                .unwrap_or(0),
        );
    splits + 1
}

/// One `<h2>` + `<table>` block per ranking view. Drivers without data
/// for a value-based view are left out rather than padded with zeros.
fn view_table(view: RankingView, snapshot: &SessionSnapshot) -> String {
    let mut rows = String::new();
    let mut rank = 0usize;
    for record in sorted(view, &snapshot.participants) {
        let Some(value) = view_value(view, record) else {
            continue;
        };
        rank += 1;
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            rank,
            html_escape(&record.display_name),
            value
        ));
    }
    if rows.is_empty() {
        return String::new();
    }
    format!(
        "<h2>{}</h2>\n<table>\n<tr><th>#</th><th>Driver</th><th>{}</th></tr>\n{}</table>\n",
        view.title(),
        view.title(),
        rows
    )
}

/// The rendered cell for one driver in one view; None excludes the driver
/// from that table.
fn view_value(view: RankingView, record: &ParticipantRecord) -> Option<String> {
    match view {
        RankingView::Result => {
            let text = match record.classification.position() {
                Some(_) if record.penalty_note.is_empty() => {
                    format!("{} laps, {}", record.completed_laps(), format_ticks(record.result_time))
                }
                Some(_) => format!(
                    "{} laps, {} ({})",
                    record.completed_laps(),
                    format_ticks(record.result_time),
                    record.penalty_note
                ),
                None if record.classification.sort_key() == 998 => {
                    format!("penalized ({})", record.penalty_note)
                }
                None => format!("DNF after {} laps", record.completed_laps()),
            };
            Some(text)
        }
        RankingView::Grid => record.grid_position.map(|grid| format!("P{}", grid)),
        RankingView::Climber => {
            let position = record.classification.position()?;
            let grid = record.grid_position?;
            Some(format!("{:+}", grid as i64 - position as i64))
        }
        RankingView::BestLap => record
            .best_lap
            .map(|best| format!("{} (lap {})", format_ticks(best.ticks), best.lap)),
        RankingView::BestSector(index) => record
            .sector_bests
            .get(index)
            .copied()
            .flatten()
            .map(|best| format!("{} (lap {})", format_ticks(best.ticks), best.lap)),
        RankingView::TheoreticalBest => record.theoretical_best().map(format_ticks),
        RankingView::AverageLap => record
            .average_lap()
            .map(|avg| format_ticks(avg.round() as u32)),
        RankingView::FirstLap => record.first_lap.map(format_ticks),
        RankingView::Stability => record.stability().map(|dev| format!("{:.2}s", dev / 100.0)),
        RankingView::TopSpeed => record
            .top_speed
            .map(|best| format!("{:.1} km/h (lap {})", best.kph, best.lap)),
        RankingView::PitStops => {
            if record.pit_stop_count() == 0 {
                None
            } else {
                Some(format!(
                    "{} stops, {} stationary",
                    record.pit_stop_count(),
                    format_ticks(record.pit_time)
                ))
            }
        }
        RankingView::Penalties => {
            (record.penalty_count > 0).then(|| record.penalty_count.to_string())
        }
        RankingView::YellowFlags => {
            (record.yellow_count > 0).then(|| record.yellow_count.to_string())
        }
        RankingView::BlueFlags => (record.blue_count > 0).then(|| record.blue_count.to_string()),
        RankingView::LapsLed => (record.laps_led > 0).then(|| record.laps_led.to_string()),
        RankingView::Combativity => Some(format!(
            "{:+} ({} made / {} lost)",
            record.combativity(),
            record.overtakes_made,
            record.overtakes_lost
        )),
    }
}

/// Per-lap arrays for the external chart renderer: lap times and the
/// position held at each completed lap.
fn chart_series(snapshot: &SessionSnapshot) -> serde_json::Value {
    let positions = positions_by_lap(snapshot);
    let drivers: Vec<serde_json::Value> = snapshot
        .participants
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let lap_times: Vec<u32> = record.laps.iter().map(|lap| lap.lap_time).collect();
            json!({
                "driver": record.display_name,
                "car": record.car,
                "lap_times": lap_times,
                "positions": positions[index],
            })
        })
        .collect();
    json!({
        "track": snapshot.meta.track,
        "phase": snapshot.meta.phase.as_str(),
        "drivers": drivers,
    })
}

/// Position of each participant at each of their completed laps, derived
/// from cumulative times: at lap N, everyone with at least N laps is
/// ordered by their cumulative time at that lap.
fn positions_by_lap(snapshot: &SessionSnapshot) -> Vec<Vec<u32>> {
    let mut positions: Vec<Vec<u32>> = snapshot
        .participants
        .iter()
        .map(|record| Vec::with_capacity(record.laps.len()))
        .collect();
    let max_laps = snapshot
        .participants
        .iter()
        .map(|record| record.laps.len())
        .max()
        .unwrap_or(0);

    for lap in 0..max_laps {
        let mut at_lap: Vec<(usize, u32)> = snapshot
            .participants
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                record.laps.get(lap).map(|entry| (index, entry.total_time))
            })
            .collect();
        at_lap.sort_by_key(|&(_, total)| total);
        for (position, &(index, _)) in at_lap.iter().enumerate() {
            positions[index].push(position as u32 + 1);
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridstat_core::model::SpeedBest;
    use gridstat_core::participant::ParticipantRecord;
    use gridstat_core::registry::{SessionPhase, SessionRegistry};

    fn snapshot() -> SessionSnapshot {
        let mut registry = SessionRegistry::new(4);
        registry.reset(SessionPhase::Race);
        registry.meta.track = "AS5".to_string();
        registry.meta.lap_counter = 2;

        let mut leader = ParticipantRecord::new(1, 1, "Alpha <1>".to_string(), 4);
        leader.car = "XRT".to_string();
        leader.record_lap(9000, 0, 1).unwrap();
        leader.record_lap(9100, 0, 2).unwrap();
        leader.top_speed = Some(SpeedBest { kph: 271.5, lap: 2 });
        registry.insert(leader);

        let mut chaser = ParticipantRecord::new(2, 2, "Beta".to_string(), 4);
        chaser.car = "XRT".to_string();
        chaser.record_lap(9200, 0, 1).unwrap();
        chaser.record_lap(8900, 0, 2).unwrap();
        registry.insert(chaser);

        registry.snapshot()
    }

    #[test]
    fn placeholders_cover_session_and_best_lap() {
        let values = placeholders(&snapshot(), &RecordStore::empty());
        assert_eq!(values["track"], "AS5");
        assert_eq!(values["phase"], "race");
        assert_eq!(values["participants"], "2");
        assert_eq!(values["best_lap"], "1.29.00");
        assert_eq!(values["best_lap_driver"], "Beta");
        assert_eq!(values["record_lap"], "—");
    }

    #[test]
    fn rendered_html_escapes_names_and_fills_tables() {
        let html = render_html(DEFAULT_TEMPLATE, &snapshot(), &RecordStore::empty());
        assert!(html.contains("Alpha &lt;1&gt;"));
        assert!(html.contains("<h2>Best lap</h2>"));
        assert!(html.contains("<h2>Consistency</h2>"));
        assert!(!html.contains("{track}"));
    }

    #[test]
    fn positions_follow_cumulative_times() {
        let positions = positions_by_lap(&snapshot());
        // lap 1: Alpha 9000 vs Beta 9200; lap 2: Alpha 18100 vs Beta 18100
        assert_eq!(positions[0], vec![1, 1]);
        assert_eq!(positions[1], vec![2, 2]);
    }

    #[test]
    fn pit_and_flag_tables_skip_zero_rows() {
        assert!(view_table(RankingView::PitStops, &snapshot()).is_empty());
        assert!(view_table(RankingView::YellowFlags, &snapshot()).is_empty());
    }
}
