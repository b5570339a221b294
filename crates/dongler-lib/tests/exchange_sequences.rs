//! Integration tests: full exchanges through the public API against MockHost.
//!
//! These drive the controller and repositories end to end and check the
//! transfers a real dongle would see: payload bytes, ordering, link
//! lifetime and serialization between threads.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use dongler_lib::DonglerError;
use dongler_lib::commands::{DAWN, KA13};
use dongler_lib::controller::DongleController;
use dongler_lib::device::DeviceError;
use dongler_lib::device::mock::{Direction, MockHost, RecordedTransfer};
use dongler_lib::dongle::{Dongle, DawnFeatures, UsbDongle};
use dongler_lib::feature::RangedFeature;
use dongler_lib::feature::moondrop::{Filter, Gain, IndicatorState, VolumeLevel};
use dongler_lib::models::detect_model;
use dongler_lib::profile::{MemoryProfileStore, ProfileStore};
use dongler_lib::protocol::{REQUEST_ID_WRITE, REQUEST_INDEX, REQUEST_TYPE_WRITE};
use dongler_lib::repository::{DawnRepository, Ka13Repository};
use dongler_lib::setting::Setting;
use dongler_lib::transfer::Timing;

fn controller(host: &MockHost) -> DongleController {
    DongleController::new(Arc::new(host.clone()), Timing::immediate())
}

/// True when every link's transfers form one unbroken run in `log`.
fn links_are_contiguous(log: &[RecordedTransfer]) -> bool {
    let mut seen = Vec::new();
    let mut current = None;
    for t in log {
        if current != Some(t.link) {
            if seen.contains(&t.link) {
                return false;
            }
            seen.push(t.link);
            current = Some(t.link);
        }
    }
    true
}

// ── Single exchanges ──

#[test]
fn dawn_set_filter_is_one_vendor_write() {
    let host = MockHost::with_dongle(0x2FC6, 0xF06A);
    let c = controller(&host);
    let dongle = c.first_attached().unwrap();
    let setting = Setting::parse(&dongle, "filter", "min-phase-fast").unwrap();
    let updated = c.apply(&dongle, setting).unwrap();

    let UsbDongle::MoondropDawn(d) = updated else {
        panic!("expected a Dawn descriptor");
    };
    assert_eq!(d.features().filter, Filter::MinPhaseFast);

    let log = host.transfers();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].direction, Direction::Out);
    assert_eq!(log[0].request_type, REQUEST_TYPE_WRITE);
    assert_eq!(log[0].request, REQUEST_ID_WRITE);
    assert_eq!(log[0].index, REQUEST_INDEX);
    assert_eq!(log[0].value, 0);
    assert_eq!(log[0].data, vec![0xC0, 0xA5, 0x01, 0x40, 0x00, 0x00, 0x00]);
    assert_eq!(host.links_opened(), 1);
    assert_eq!(host.links_closed(), 1);
}

#[test]
fn read_then_write_round_trip_through_controller() {
    let host = MockHost::with_dongle(0x2FC6, 0xF06D);
    host.add_response(&[0xC0, 0xA5, 0xA3], vec![0xC0, 0xA5, 0xA3, 0x20, 0x01, 0x00, 0]);
    host.add_response(&[0xC0, 0xA5, 0xA2], vec![0xC0, 0xA5, 0xA2, 0, 0x00, 0, 0]);
    let c = controller(&host);

    let dongle = c.current_state(&c.first_attached().unwrap()).unwrap();
    assert_eq!(dongle.display_volume_level(), "100%");

    let quieter = c.volume_down(&dongle).unwrap();
    assert_eq!(quieter.display_volume_level(), "98%");
    assert_eq!(
        host.out_payloads().last().unwrap(),
        &vec![0xC0, 0xA5, 0x04, 0x02, 0, 0, 0]
    );
    assert_eq!(host.links_opened(), 2);
    assert_eq!(host.links_closed(), 2);
}

#[test]
fn short_response_is_protocol_error() {
    let host = MockHost::with_dongle(0x2972, 0x0081);
    host.add_response(&[], vec![0u8; 16]);
    host.short_in_transfers(8);
    let c = controller(&host);
    let dongle = c.first_attached().unwrap();
    let err = c.current_state(&dongle).unwrap_err();
    assert!(matches!(
        err,
        DonglerError::Device(DeviceError::Protocol {
            expected: 16,
            actual: 8
        })
    ));
    assert_eq!(host.links_closed(), 1);
}

// ── set_all ──

#[test]
fn set_all_failure_reports_error_and_closes_link() {
    let host = MockHost::with_dongle(0x2FC6, 0xF06A);
    host.fail_out_transfer(3);
    let c = controller(&host);
    let dongle = c.first_attached().unwrap();
    let mut target = dongle;
    for _ in 0..5 {
        target = target.volume_up();
    }

    let err = c.set_all(&dongle, &target).unwrap_err();
    assert!(matches!(
        err,
        DonglerError::Device(DeviceError::TransferFailed(_))
    ));
    // Filter and gain went out; the indicator write failed; volume never sent.
    assert_eq!(host.out_payloads().len(), 2);
    assert_eq!(host.links_closed(), 1);
}

#[test]
fn stored_profile_is_applied_in_one_exchange() {
    let host = MockHost::with_dongle(0x2FC6, 0xF06B);
    let c = controller(&host);
    let mut store = MemoryProfileStore::new();

    let model = detect_model(0x2FC6, 0xF06B).unwrap();
    let desk: Dongle<DawnFeatures> = Dongle::new(model).unwrap().with_features(DawnFeatures {
        filter: Filter::NonOversampling,
        gain: Gain::High,
        indicator_state: IndicatorState::Disabled,
        volume_level: VolumeLevel::from_display_value(45),
    });
    let id = store
        .insert(UsbDongle::MoondropDawn(desk).current_state_as_profile("desk"))
        .unwrap();

    let dongle = c.first_attached().unwrap();
    let profile = store.get(id).unwrap().unwrap();
    let applied = c.apply_profile(&dongle, &profile).unwrap();

    assert_eq!(applied, UsbDongle::MoondropDawn(desk));
    assert_eq!(host.out_payloads().len(), 4);
    assert_eq!(host.links_opened(), 1);
}

// ── Concurrency ──

#[test]
fn concurrent_exchanges_on_one_family_never_interleave() {
    let host = MockHost::with_dongle(0x2FC6, 0xF06A);
    host.set_transfer_delay(Duration::from_millis(2));
    let repo = Arc::new(DawnRepository::new(
        Arc::new(host.clone()),
        &DAWN,
        Timing::immediate(),
    ));
    let dongle = Dongle::new(detect_model(0x2FC6, 0xF06A).unwrap()).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let repo = Arc::clone(&repo);
            thread::spawn(move || {
                let target = DawnFeatures {
                    volume_level: VolumeLevel::from_display_value(10 * i),
                    ..DawnFeatures::default()
                };
                repo.set_all(&dongle, target).unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let log = host.transfers();
    assert_eq!(log.len(), 16);
    assert!(links_are_contiguous(&log), "interleaved: {log:?}");
    assert_eq!(host.max_in_flight(), 1);
    assert_eq!(host.links_closed(), 4);
}

#[test]
fn different_families_run_in_parallel() {
    let host = MockHost::new();
    host.attach(0x2FC6, 0xF06A, true);
    host.attach(0x2972, 0x0081, true);
    // Each family's first transfer waits for the other. Serialized families
    // would time out here with only one transfer in flight.
    host.rendezvous(2, Duration::from_secs(5));

    let dawn_repo = DawnRepository::new(Arc::new(host.clone()), &DAWN, Timing::immediate());
    let ka13_repo = Ka13Repository::new(Arc::new(host.clone()), &KA13, Timing::immediate());
    let dawn = Dongle::new(detect_model(0x2FC6, 0xF06A).unwrap()).unwrap();
    let ka13 = Dongle::new(detect_model(0x2972, 0x0081).unwrap()).unwrap();

    thread::scope(|s| {
        s.spawn(|| {
            for _ in 0..3 {
                dawn_repo.set_gain(&dawn, Gain::High).unwrap();
            }
        });
        s.spawn(|| {
            for _ in 0..3 {
                ka13_repo
                    .set_gain(&ka13, dongler_lib::feature::fiio::Gain::High)
                    .unwrap();
            }
        });
    });

    assert_eq!(host.max_in_flight(), 2);
    assert_eq!(host.transfers().len(), 6);
    assert_eq!(host.links_opened(), 6);
    assert_eq!(host.links_closed(), 6);
}
