use rstest::rstest;
use sorter_core::error::BuildError;
use sorter_core::mocks::{FailingServo, RecordingServo};
use sorter_core::{FlapCfg, Sorter, SorterError};

#[rstest]
fn missing_plastic_servo_yields_typed_build_error() {
    let err = Sorter::builder()
        .with_paper_servo(RecordingServo::default())
        .try_build()
        .expect_err("should fail with MissingPlasticFlap");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingPlasticFlap) => {}
        other => panic!("expected MissingPlasticFlap, got: {other:?}"),
    }
}

#[rstest]
fn missing_paper_servo_yields_typed_build_error() {
    let err = Sorter::builder()
        .with_plastic_servo(RecordingServo::default())
        .try_build()
        .expect_err("should fail with MissingPaperFlap");

    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingPaperFlap)
    ));
}

#[rstest]
#[case::home_equals_open(FlapCfg { home_deg: 45, open_deg: 45 })]
#[case::open_past_range(FlapCfg { home_deg: 0, open_deg: 181 })]
#[case::negative_home(FlapCfg { home_deg: -1, open_deg: 90 })]
fn invalid_flap_angles_are_rejected(#[case] flap: FlapCfg) {
    let err = Sorter::builder()
        .with_plastic_servo(RecordingServo::default())
        .with_paper_servo(RecordingServo::default())
        .with_paper_flap(flap)
        .build()
        .expect_err("invalid flap must fail");

    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(_))
    ));
}

#[rstest]
fn build_parks_both_flaps_at_home() {
    let plastic = RecordingServo::default();
    let paper = RecordingServo::default();
    let sorter = Sorter::builder()
        .with_plastic_servo(plastic.clone())
        .with_paper_servo(paper.clone())
        .with_paper_flap(FlapCfg {
            home_deg: 180,
            open_deg: 90,
        })
        .build()
        .unwrap();

    assert_eq!(plastic.angles(), vec![0]);
    assert_eq!(paper.angles(), vec![180]);
    assert_eq!(sorter.counters().biodegradable, 0);
    assert_eq!(sorter.counters().non_biodegradable, 0);
}

#[rstest]
fn servo_failure_while_parking_fails_the_build() {
    let err = Sorter::builder()
        .with_plastic_servo(FailingServo)
        .with_paper_servo(RecordingServo::default())
        .build()
        .expect_err("parking a dead servo must fail");

    assert!(matches!(
        err.downcast_ref::<SorterError>(),
        Some(SorterError::Hardware(_))
    ));
    assert!(format!("{err:#}").contains("plastic"));
}
