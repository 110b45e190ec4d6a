use saf_devices::{
    Ccd, CheckError, DeviceProxy, Filter, FilterWheel, Focuser, LimitSource, SettlePolicy,
    SimulatedProxy, SimulatorConfig, Value, focuser::FOCUS_DEFAULT,
};

const SIMULATOR: &str = r#"
write_lag_refreshes = 3

[[devices]]
name = "F0"
properties = { FOC_DEF = 0, foc_min = -4000, foc_max = 4000 }

[[devices]]
name = "C0"
properties = { wheel = "W0" }

[[devices]]
name = "W0"
"#;

fn simulator() -> SimulatedProxy {
    let config: SimulatorConfig = toml::from_str(SIMULATOR).unwrap();
    SimulatedProxy::from_config(&config)
}

fn wheel() -> FilterWheel {
    let mut wheel = FilterWheel::new(
        "W0",
        vec![Filter::new("open"), Filter::new("R"), Filter::new("empty8")],
    );
    wheel.ccd_filter_offsets = vec![0, 12];
    wheel
}

#[test]
fn full_session_against_simulator() {
    let mut proxy = simulator();

    let mut ccd = Ccd::new("C0", vec![wheel()]);
    for wheel in &mut ccd.filter_wheels {
        wheel.mark_empty_slots(&["open", "empty8"]);
        assert!(wheel.check(&mut proxy));
    }
    assert!(ccd.check(&mut proxy));
    assert_eq!(ccd.verify_filter_wheels(&mut proxy), Ok(()));
    assert_eq!(ccd.filter_wheels[0].empty_slots, Some(vec![0, 2]));
    assert_eq!(ccd.ft_offsets, None);

    let mut focuser = Focuser {
        resolution: 5.0,
        settle: SettlePolicy {
            max_polls: 10,
            poll_interval_ms: 0,
            time_limit_ms: 1000,
        },
        ..Focuser::new("F0")
    };
    assert_eq!(focuser.verify(&mut proxy), Ok(LimitSource::Device));
    assert_eq!(focuser.travel(), (-4000, 4000));

    let refreshes_before = proxy.refresh_count();
    assert_eq!(
        focuser.write_focus_default(Some(&mut proxy), Some(1500)),
        Ok(1500)
    );
    assert_eq!(proxy.refresh_count() - refreshes_before, 3);
    assert_eq!(focuser.focus_default, Some(1500));
    assert_eq!(
        proxy.read_property("F0", FOCUS_DEFAULT),
        Ok(Value::Integer(1500))
    );
}

#[test]
fn absent_wheel_session_needs_only_the_camera() {
    let mut proxy = SimulatedProxy::new();
    proxy.add_device(saf_devices::Device::new("C1"));

    let ccd = Ccd::new("C1", vec![FilterWheel::absent(), wheel()]);

    assert!(ccd.check(&mut proxy));
    assert!(ccd.filter_wheels[0].check(&mut proxy));
    assert!(!ccd.filter_wheels[1].check(&mut proxy));
    assert_eq!(proxy.resolve_count("FAKE_FTW"), 0);
}

#[test]
fn device_going_offline_between_checks() {
    let mut proxy = simulator();
    let mut focuser = Focuser::new("F0");

    assert!(focuser.check(&mut proxy));
    proxy.set_offline("F0");
    assert!(!focuser.check(&mut proxy));
    assert_eq!(
        focuser.verify(&mut proxy),
        Err(CheckError::DeviceNotFound {
            kind: saf_devices::DeviceKind::Focuser,
            device: "F0".to_string(),
        })
    );
}

#[test]
fn trait_objects_are_accepted() {
    let mut proxy: Box<dyn DeviceProxy> = Box::new(simulator());
    let ccd = Ccd::new("C0", vec![wheel()]);

    assert!(ccd.check(&mut proxy));
    assert!(ccd.check(proxy.as_mut()));
}
