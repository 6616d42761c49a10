// Leaderboard comparators. Each view is a pure total order over
// participant records; sorting is stable, so exact ties keep arrival
// order. Missing data sorts last in every view.

use std::cmp::Ordering;

use crate::participant::ParticipantRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RankingView {
    /// Finishing classification, unclassified and penalized last.
    Result,
    Grid,
    /// Positions gained from grid to classification, biggest gain first.
    Climber,
    BestLap,
    /// Best time for one sector index (0-based).
    BestSector(usize),
    /// Sum of all sector bests.
    TheoreticalBest,
    AverageLap,
    FirstLap,
    /// Lap-time consistency (population std-dev), steadiest first.
    Stability,
    TopSpeed,
    PitStops,
    Penalties,
    YellowFlags,
    BlueFlags,
    LapsLed,
    Combativity,
}

impl RankingView {
    pub fn title(&self) -> String {
        match self {
            RankingView::Result => "Result".to_string(),
            RankingView::Grid => "Starting grid".to_string(),
            RankingView::Climber => "Climbers".to_string(),
            RankingView::BestLap => "Best lap".to_string(),
            RankingView::BestSector(index) => format!("Best sector {}", index + 1),
            RankingView::TheoreticalBest => "Theoretical best lap".to_string(),
            RankingView::AverageLap => "Average lap".to_string(),
            RankingView::FirstLap => "Best opening lap".to_string(),
            RankingView::Stability => "Consistency".to_string(),
            RankingView::TopSpeed => "Top speed".to_string(),
            RankingView::PitStops => "Pit stops".to_string(),
            RankingView::Penalties => "Penalties".to_string(),
            RankingView::YellowFlags => "Yellow flags".to_string(),
            RankingView::BlueFlags => "Blue flags".to_string(),
            RankingView::LapsLed => "Laps led".to_string(),
            RankingView::Combativity => "Combativity".to_string(),
        }
    }

    /// Every view rendered for a session with `sectors` observed sectors.
    pub fn all(sectors: usize) -> Vec<RankingView> {
        let mut views = vec![RankingView::Result, RankingView::Grid, RankingView::Climber];
        views.push(RankingView::BestLap);
        for index in 0..sectors {
            views.push(RankingView::BestSector(index));
        }
        views.extend([
            RankingView::TheoreticalBest,
            RankingView::AverageLap,
            RankingView::FirstLap,
            RankingView::Stability,
            RankingView::TopSpeed,
            RankingView::PitStops,
            RankingView::Penalties,
            RankingView::YellowFlags,
            RankingView::BlueFlags,
            RankingView::LapsLed,
            RankingView::Combativity,
        ]);
        views
    }
}

/// Ascending with None last.
fn cmp_option<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(left), Some(right)) => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Descending, still with None last.
fn cmp_option_desc<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(left), Some(right)) => right.partial_cmp(&left).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn compare(view: RankingView, a: &ParticipantRecord, b: &ParticipantRecord) -> Ordering {
    match view {
        RankingView::Result => a
            .classification
            .sort_key()
            .cmp(&b.classification.sort_key())
            .then(b.completed_laps().cmp(&a.completed_laps())),
        RankingView::Grid => cmp_option(a.grid_position, b.grid_position),
        RankingView::Climber => {
            let gain = |record: &ParticipantRecord| -> Option<i64> {
                let position = record.classification.position()?;
                let grid = record.grid_position?;
                Some(grid as i64 - position as i64)
            };
            // bigger gain first
            cmp_option_desc(gain(a), gain(b))
        }
        RankingView::BestLap => cmp_option(
            a.best_lap.map(|best| best.ticks),
            b.best_lap.map(|best| best.ticks),
        ),
        RankingView::BestSector(index) => cmp_option(
            a.sector_bests.get(index).copied().flatten().map(|best| best.ticks),
            b.sector_bests.get(index).copied().flatten().map(|best| best.ticks),
        ),
        RankingView::TheoreticalBest => cmp_option(a.theoretical_best(), b.theoretical_best()),
        RankingView::AverageLap => cmp_option(a.average_lap(), b.average_lap()),
        RankingView::FirstLap => cmp_option(a.first_lap, b.first_lap),
        RankingView::Stability => cmp_option(a.stability(), b.stability()),
        RankingView::TopSpeed => cmp_option_desc(
            a.top_speed.map(|best| best.kph),
            b.top_speed.map(|best| best.kph),
        ),
        RankingView::PitStops => a
            .pit_stop_count()
            .cmp(&b.pit_stop_count())
            .then(a.pit_time.cmp(&b.pit_time)),
        RankingView::Penalties => b.penalty_count.cmp(&a.penalty_count),
        RankingView::YellowFlags => b.yellow_count.cmp(&a.yellow_count),
        RankingView::BlueFlags => b.blue_count.cmp(&a.blue_count),
        RankingView::LapsLed => b.laps_led.cmp(&a.laps_led),
        RankingView::Combativity => b
            .combativity()
            .cmp(&a.combativity())
            .then(b.overtakes_made.cmp(&a.overtakes_made))
            .then(a.overtakes_lost.cmp(&b.overtakes_lost)),
    }
}

/// Stable sort of the snapshot's participants under one view.
pub fn sorted<'a>(view: RankingView, records: &'a [ParticipantRecord]) -> Vec<&'a ParticipantRecord> {
    let mut ranked: Vec<&ParticipantRecord> = records.iter().collect();
    ranked.sort_by(|a, b| compare(view, a, b));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Classification, SpeedBest};

    fn with_laps(slot: u8, name: &str, lap_times: &[u32]) -> ParticipantRecord {
        let mut record = ParticipantRecord::new(slot, slot, name.to_string(), 4);
        for (index, &lap_time) in lap_times.iter().enumerate() {
            record.record_lap(lap_time, 0, index as u32 + 1).unwrap();
        }
        record
    }

    #[test]
    fn best_lap_ranking_scenario() {
        // three cars, one-sector race: 1:30.00, 1:31.50, 1:29.80
        let records = vec![
            with_laps(1, "car1", &[9000]),
            with_laps(2, "car2", &[9150]),
            with_laps(3, "car3", &[8980]),
        ];
        let ranked = sorted(RankingView::BestLap, &records);
        let order: Vec<u8> = ranked.iter().map(|record| record.slot_id).collect();
        assert_eq!(order, vec![3, 1, 2]);

        // no results yet, equal lap counts: insertion order is preserved
        let result = sorted(RankingView::Result, &records);
        let order: Vec<u8> = result.iter().map(|record| record.slot_id).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn missing_best_lap_sorts_last() {
        let records = vec![
            with_laps(1, "nolap", &[]),
            with_laps(2, "fast", &[8980]),
        ];
        let ranked = sorted(RankingView::BestLap, &records);
        assert_eq!(ranked[0].slot_id, 2);
        assert_eq!(ranked[1].slot_id, 1);
    }

    #[test]
    fn result_ranking_puts_dnf_and_penalized_last() {
        let mut first = with_laps(1, "first", &[9000, 9000]);
        first.classification = Classification::Classified(1);
        let mut penalized = with_laps(2, "pen", &[9000, 9000]);
        penalized.classification = Classification::Penalized;
        let dnf = with_laps(3, "dnf", &[9000]);

        let records = vec![dnf, penalized, first];
        let ranked = sorted(RankingView::Result, &records);
        let order: Vec<u8> = ranked.iter().map(|record| record.slot_id).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn result_tie_breaks_on_lap_count() {
        let more_laps = with_laps(1, "a", &[9000, 9000, 9000]);
        let fewer_laps = with_laps(2, "b", &[9000]);
        let records = vec![fewer_laps, more_laps];
        let ranked = sorted(RankingView::Result, &records);
        assert_eq!(ranked[0].slot_id, 1);
    }

    #[test]
    fn climber_ranks_biggest_gain_first() {
        let mut gained = with_laps(1, "up", &[9000]);
        gained.grid_position = Some(8);
        gained.classification = Classification::Classified(2);
        let mut dropped = with_laps(2, "down", &[9000]);
        dropped.grid_position = Some(1);
        dropped.classification = Classification::Classified(5);
        let unranked = with_laps(3, "none", &[9000]);

        let records = vec![dropped, unranked, gained];
        let ranked = sorted(RankingView::Climber, &records);
        let order: Vec<u8> = ranked.iter().map(|record| record.slot_id).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn stability_sorts_steadiest_first_and_sentinel_last() {
        let steady = with_laps(1, "steady", &[9000, 9000]);
        let varied = with_laps(2, "varied", &[9000, 9400]);
        let single = with_laps(3, "single", &[9000]);
        let records = vec![varied, single, steady];
        let ranked = sorted(RankingView::Stability, &records);
        let order: Vec<u8> = ranked.iter().map(|record| record.slot_id).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn top_speed_is_descending_with_missing_last() {
        let mut fast = with_laps(1, "fast", &[9000]);
        fast.top_speed = Some(SpeedBest { kph: 287.3, lap: 1 });
        let mut slow = with_laps(2, "slow", &[9000]);
        slow.top_speed = Some(SpeedBest { kph: 250.0, lap: 1 });
        let none = with_laps(3, "none", &[9000]);
        let records = vec![slow, none, fast];
        let ranked = sorted(RankingView::TopSpeed, &records);
        let order: Vec<u8> = ranked.iter().map(|record| record.slot_id).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn combativity_breaks_ties_on_overtakes_made() {
        let mut busy = with_laps(1, "busy", &[9000]);
        busy.overtakes_made = 4;
        busy.overtakes_lost = 2;
        let mut quiet = with_laps(2, "quiet", &[9000]);
        quiet.overtakes_made = 2;
        quiet.overtakes_lost = 0;
        let records = vec![quiet, busy];
        // both net +2; more overtakes made ranks first
        let ranked = sorted(RankingView::Combativity, &records);
        assert_eq!(ranked[0].slot_id, 1);
    }

    #[test]
    fn sorting_is_idempotent_for_every_view() {
        let mut first = with_laps(1, "a", &[9000, 9100]);
        first.classification = Classification::Classified(1);
        first.grid_position = Some(2);
        let mut second = with_laps(2, "b", &[9150, 8980]);
        second.classification = Classification::Classified(2);
        second.grid_position = Some(1);
        let third = with_laps(3, "c", &[]);
        let records = vec![first, second, third];

        for view in RankingView::all(3) {
            let once: Vec<u8> = sorted(view, &records)
                .iter()
                .map(|record| record.slot_id)
                .collect();
            let reordered: Vec<ParticipantRecord> = sorted(view, &records)
                .into_iter()
                .cloned()
                .collect();
            let twice: Vec<u8> = sorted(view, &reordered)
                .iter()
                .map(|record| record.slot_id)
                .collect();
            assert_eq!(once, twice, "view {:?} must be stable under re-sort", view);
        }
    }
}
