use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use rstest::rstest;
use sorter_core::mocks::{ManualClock, RecordingServo, SharedInput};
use sorter_core::{
    ArmingCfg, ControlSurface, Mode, MotionCfg, Outcome, RawInputs, RunParams, SensorInputs,
    Sorter, SorterError, command_queue, run,
};
use sorter_traits::{DigitalInput, Servo};

const ZERO_MOTION: MotionCfg = MotionCfg {
    step_delay_ms: 0,
    settle_ms: 0,
};

fn sorter() -> Sorter {
    Sorter::builder()
        .with_plastic_servo(RecordingServo::default())
        .with_paper_servo(RecordingServo::default())
        .with_motion(ZERO_MOTION)
        .with_arming(ArmingCfg {
            detect_stable_ms: 0,
            cooldown_ms: 0,
        })
        .build()
        .unwrap()
}

fn wait_for(mut pred: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if pred() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

#[rstest]
fn control_surface_drives_a_running_loop() {
    // capacitive idle low, IR idle high: nothing in view
    let cap = SharedInput::new(false);
    let ir = SharedInput::new(true);
    let mut inputs = SensorInputs::new(cap.clone(), ir.clone());
    let (handle, queue) = command_queue();
    let shutdown = Arc::new(AtomicBool::new(false));

    let stop = shutdown.clone();
    let worker = thread::spawn(move || {
        let mut s = sorter();
        run(
            &mut s,
            &mut inputs,
            &queue,
            &stop,
            RunParams {
                tick: Duration::from_millis(1),
                max_run: None,
            },
        )
    });

    let status = handle.status().unwrap();
    assert_eq!(status.mode, Mode::Manual);

    handle.set_mode(Mode::Automatic).unwrap();
    cap.set(true);
    assert!(wait_for(|| handle.status().unwrap().counters.non_biodegradable == 1));

    // ungated, even while latched on the same item
    assert_eq!(handle.manual_sort().unwrap(), Outcome::Plastic);
    assert_eq!(handle.status().unwrap().counters.non_biodegradable, 2);

    handle.reset_counters().unwrap();
    assert_eq!(handle.status().unwrap().counters, Default::default());

    shutdown.store(true, Ordering::Relaxed);
    let summary = worker.join().unwrap().unwrap();
    assert_eq!(summary.auto_sorts, 1);
    assert!(summary.commands >= 6);

    let err = handle.status().expect_err("loop is gone");
    assert!(matches!(
        err.downcast_ref::<SorterError>(),
        Some(SorterError::LoopStopped)
    ));
}

#[rstest]
fn run_limit_is_measured_on_the_sorter_clock() {
    let clock = ManualClock::new();
    let mut s = Sorter::builder()
        .with_plastic_servo(RecordingServo::default())
        .with_paper_servo(RecordingServo::default())
        .with_clock(Box::new(clock.clone()))
        .build()
        .unwrap();
    let mut inputs = SensorInputs::new(SharedInput::new(false), SharedInput::new(true));
    let (_handle, queue) = command_queue();
    let shutdown = AtomicBool::new(false);

    let summary = run(
        &mut s,
        &mut inputs,
        &queue,
        &shutdown,
        RunParams {
            tick: Duration::from_millis(20),
            max_run: Some(Duration::from_millis(100)),
        },
    )
    .unwrap();

    assert_eq!(summary.ticks, 5);
    assert_eq!(summary.auto_sorts, 0);
    assert_eq!(clock.elapsed(), Duration::from_millis(100));
}

#[rstest]
fn button_press_sorts_from_the_loop() {
    let clock = ManualClock::new();
    let mut s = Sorter::builder()
        .with_plastic_servo(RecordingServo::default())
        .with_paper_servo(RecordingServo::default())
        .with_motion(ZERO_MOTION)
        .with_clock(Box::new(clock.clone()))
        .build()
        .unwrap();
    // paper in view; button is active-low and held down
    let mut inputs = SensorInputs::new(SharedInput::new(false), SharedInput::new(false))
        .with_button(SharedInput::new(false), false);
    let (_handle, queue) = command_queue();
    let shutdown = AtomicBool::new(false);

    let summary = run(
        &mut s,
        &mut inputs,
        &queue,
        &shutdown,
        RunParams {
            tick: Duration::from_millis(20),
            max_run: Some(Duration::from_millis(200)),
        },
    )
    .unwrap();

    assert_eq!(summary.button_sorts, 1);
    assert_eq!(summary.status.counters.biodegradable, 1);
}

/// Servo whose first movement lets the item drop past the capacitive sensor.
struct DroppingServo {
    cap: SharedInput,
}

impl Servo for DroppingServo {
    fn set_angle(&mut self, _degrees: i32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.cap.set(false);
        Ok(())
    }
}

#[rstest]
fn queued_sort_does_not_leave_a_stale_reading_for_the_gate() {
    let clock = ManualClock::new();
    let cap = SharedInput::new(false);
    let mut s = Sorter::builder()
        .with_plastic_servo(DroppingServo { cap: cap.clone() })
        .with_paper_servo(RecordingServo::default())
        .with_motion(MotionCfg {
            step_delay_ms: 15,
            settle_ms: 1000,
        })
        .with_arming(ArmingCfg {
            detect_stable_ms: 300,
            cooldown_ms: 2000,
        })
        .with_clock(Box::new(clock.clone()))
        .build()
        .unwrap();

    // plastic in view, detection window already open in Automatic mode
    cap.set(true);
    let plastic = RawInputs::new(true, true);
    s.set_mode(Mode::Automatic);
    assert_eq!(s.tick(plastic).unwrap(), None);
    clock.advance_ms(40);

    let mut inputs = SensorInputs::new(cap.clone(), SharedInput::new(true));
    let (handle, queue) = command_queue();
    let requester = thread::spawn(move || handle.manual_sort());
    assert!(wait_for(|| queue.pending() == 1));

    let shutdown = AtomicBool::new(false);
    let summary = run(
        &mut s,
        &mut inputs,
        &queue,
        &shutdown,
        RunParams {
            tick: Duration::from_millis(20),
            max_run: Some(Duration::from_millis(5000)),
        },
    )
    .unwrap();

    assert_eq!(requester.join().unwrap().unwrap(), Outcome::Plastic);
    assert_eq!(summary.commands, 1);
    assert_eq!(summary.auto_sorts, 0);
    assert_eq!(summary.status.counters.non_biodegradable, 1);
}

struct DeadInput;

impl DigitalInput for DeadInput {
    fn is_high(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("gpio line released")))
    }
}

#[rstest]
fn input_fault_stops_the_loop() {
    let mut s = sorter();
    let mut inputs = SensorInputs::new(DeadInput, SharedInput::new(true));
    let (_handle, queue) = command_queue();
    let shutdown = AtomicBool::new(false);

    let err = run(&mut s, &mut inputs, &queue, &shutdown, RunParams::default())
        .expect_err("dead sensor must stop the loop");
    assert!(matches!(
        err.downcast_ref::<SorterError>(),
        Some(SorterError::Hardware(_))
    ));
    assert!(format!("{err:#}").contains("capacitive"));
}
