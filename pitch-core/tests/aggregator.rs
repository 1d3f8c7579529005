use approx::assert_relative_eq;
use pitch_core::aggregator::finalize_run;
use pitch_core::{Aggregator, AggregatorState, OutlierBand, OutlierCenter, PitchConfig, PitchEvent};

fn finalized(events: &[Option<PitchEvent>]) -> Vec<f32> {
    events
        .iter()
        .filter_map(|event| match event {
            Some(PitchEvent::Finalized(pitch)) => Some(pitch.frequency),
            _ => None,
        })
        .collect()
}

#[test]
fn upward_outlier_is_dropped() {
    let mut aggregator = Aggregator::default();
    let mut events: Vec<Option<PitchEvent>> = [440.0, 442.0, 439.0, 441.0, 5000.0]
        .into_iter()
        .map(|f| aggregator.push(Some(f)))
        .collect();
    assert!(events.iter().all(|e| matches!(e, Some(PitchEvent::Running { .. }))));

    events.push(aggregator.push(None));
    match events.last() {
        Some(Some(PitchEvent::Finalized(pitch))) => {
            assert_relative_eq!(pitch.frequency, 440.5);
            assert_eq!(pitch.kept, 4);
            assert_eq!(pitch.rejected, 1);
        }
        other => panic!("expected a finalized pitch, got {:?}", other),
    }
    assert_eq!(aggregator.state(), AggregatorState::Idle);
}

#[test]
fn below_minimum_never_enters_the_run() {
    let config = PitchConfig {
        min_frequency: 300.0,
        ..Default::default()
    };
    let mut aggregator = Aggregator::from_config(&config);
    assert_eq!(aggregator.push(Some(100.0)), None);
    assert_eq!(aggregator.state(), AggregatorState::Idle);
    assert_eq!(aggregator.push(None), None);
}

#[test]
fn filtered_estimate_does_not_end_a_tone() {
    let mut aggregator = Aggregator::default();
    aggregator.push(Some(440.0));
    assert_eq!(aggregator.push(Some(120.0)), None);
    assert_eq!(aggregator.state(), AggregatorState::Accumulating);
    assert_eq!(aggregator.run(), &[440.0]);
}

#[test]
fn finalizing_idle_twice_is_a_no_op() {
    let mut aggregator = Aggregator::default();
    assert_eq!(aggregator.finalize(), None);
    assert_eq!(aggregator.finalize(), None);
    assert_eq!(aggregator.push(None), None);
}

#[test]
fn runs_do_not_leak_into_each_other() {
    let mut aggregator = Aggregator::default();
    let events = vec![
        aggregator.push(Some(440.0)),
        aggregator.push(Some(450.0)),
        aggregator.push(None),
        aggregator.push(Some(880.0)),
        aggregator.push(None),
    ];
    assert_eq!(finalized(&events), vec![445.0, 880.0]);
}

#[test]
fn downward_band_is_tighter_than_upward() {
    // median 700: 1600 sits 900 above (kept), 500 sits 200 below (dropped)
    let run = [500.0, 700.0, 900.0, 700.0, 700.0, 1600.0, 300.0];
    let pitch = finalize_run(&run, OutlierBand::default()).unwrap();
    assert_eq!(pitch.rejected, 2);
    assert_relative_eq!(pitch.frequency, (700.0 + 900.0 + 700.0 + 700.0 + 1600.0) / 5.0);
}

#[test]
fn custom_bands() {
    let run = [440.0, 441.0, 439.0, 480.0];

    // median 440.5
    let band = OutlierBand::new(10.0, 10.0);
    let pitch = finalize_run(&run, band).unwrap();
    assert_eq!(pitch.kept, 3);
    assert_relative_eq!(pitch.frequency, 440.0);

    // mean 450 puts 439 just outside the lower band
    let pitch = finalize_run(&run, band.with_center(OutlierCenter::Mean)).unwrap();
    assert_eq!(pitch.kept, 2);
    assert_relative_eq!(pitch.frequency, 440.5);
}

#[test]
fn literal_mean_band_from_config() {
    let config = PitchConfig {
        outlier_center: OutlierCenter::Mean,
        ..Default::default()
    };
    let mut aggregator = Aggregator::from_config(&config);
    for f in [440.0, 442.0, 439.0, 441.0, 5000.0] {
        aggregator.push(Some(f));
    }
    // Every estimate lies outside the band around a mean of 1352.4.
    assert_eq!(aggregator.push(None), None);
    assert_eq!(aggregator.state(), AggregatorState::Idle);
}

#[test]
fn short_runs_can_be_suppressed() {
    let config = PitchConfig {
        min_run_length: 2,
        ..Default::default()
    };
    let mut aggregator = Aggregator::from_config(&config);
    let events = vec![
        aggregator.push(Some(440.0)),
        aggregator.push(Some(441.0)),
        aggregator.push(None),
        aggregator.push(Some(880.0)),
        aggregator.push(None),
    ];
    assert_eq!(finalized(&events), vec![440.5]);
}
