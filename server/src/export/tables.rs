// CSV/TSV leaderboard writers.

use anyhow::Result;

use gridstat_core::ranking::{sorted, RankingView};
use gridstat_core::registry::SessionSnapshot;
use gridstat_core::time::format_ticks;

/// The full classification as delimited text; `b'\t'` gives the TSV twin.
pub fn classification_table(snapshot: &SessionSnapshot, delimiter: u8) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    writer.write_record([
        "pos",
        "driver",
        "account",
        "car",
        "laps",
        "total_time",
        "best_lap",
        "best_lap_set_on",
        "average_lap",
        "consistency",
        "pit_stops",
        "pit_time",
        "penalties",
        "penalty_note",
        "top_speed_kph",
        "laps_led",
        "overtakes_made",
        "overtakes_lost",
        "grid",
        "classification",
        "controls",
    ])?;

    for (index, record) in sorted(RankingView::Result, &snapshot.participants)
        .into_iter()
        .enumerate()
    {
        let best_lap = record.best_lap;
        writer.write_record([
            (index + 1).to_string(),
            record.display_name.clone(),
            record.account_name.clone(),
            record.car.clone(),
            record.completed_laps().to_string(),
            format_ticks(record.total_time),
            best_lap.map_or_else(String::new, |best| format_ticks(best.ticks)),
            best_lap.map_or_else(String::new, |best| best.lap.to_string()),
            record
                .average_lap()
                .map_or_else(String::new, |avg| format_ticks(avg.round() as u32)),
            record
                .stability()
                .map_or_else(String::new, |dev| format!("{:.2}", dev / 100.0)),
            record.pit_stop_count().to_string(),
            format_ticks(record.pit_time),
            record.penalty_count.to_string(),
            record.penalty_note.clone(),
            record
                .top_speed
                .map_or_else(String::new, |best| format!("{:.1}", best.kph)),
            record.laps_led.to_string(),
            record.overtakes_made.to_string(),
            record.overtakes_lost.to_string(),
            record
                .grid_position
                .map_or_else(String::new, |grid| grid.to_string()),
            record.classification.sort_key().to_string(),
            record.control_flags.summary(),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(bytes)
}
