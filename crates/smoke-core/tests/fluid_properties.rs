use glam::{UVec2, Vec2, Vec3};
use smoke_core::{
    FluidEngine, FrameDriver, FrameOutcome, GridSizing, Impulse, Lifecycle, PingPong,
    ReferenceFluid, SimError, SimulationConfig,
};
use std::time::Duration;

fn small_config() -> SimulationConfig {
    SimulationConfig {
        sim_resolution: 64,
        dye_resolution: 64,
        velocity_dissipation: 1.0,
        density_dissipation: 1.0,
        pressure_iterations: 20,
        splat_radius: 0.001,
        ..SimulationConfig::default()
    }
}

fn e2e_config() -> SimulationConfig {
    SimulationConfig {
        sim_resolution: 128,
        dye_resolution: 512,
        velocity_dissipation: 0.99,
        density_dissipation: 0.98,
        pressure_iterations: 20,
        splat_radius: 0.0025,
        ..SimulationConfig::default()
    }
}

#[test]
fn double_buffers_are_disjoint_for_every_resolution() {
    for (sim, dye) in [(32u32, 64u32), (128, 512), (100, 300)] {
        let cfg = SimulationConfig {
            sim_resolution: sim,
            dye_resolution: dye,
            ..SimulationConfig::default()
        };
        let fluid = ReferenceFluid::new(cfg, UVec2::new(64, 64)).unwrap();
        for pair in [fluid.velocity(), fluid.pressure()] {
            assert!(!std::ptr::eq(pair.read(), pair.write()));
            assert_eq!(pair.read().size(), UVec2::splat(sim));
            assert_eq!(pair.write().size(), UVec2::splat(sim));
        }
        assert!(!std::ptr::eq(fluid.dye().read(), fluid.dye().write()));
        assert_eq!(fluid.dye_size(), UVec2::splat(dye));

        let mut pair = fluid.dye().clone();
        let before = pair.read_index();
        pair.swap();
        assert_ne!(pair.read_index(), before);
        pair.swap();
        assert_eq!(pair.read_index(), before);
    }
}

#[test]
fn swap_exchanges_roles_without_copying() {
    let mut pair = PingPong::new(vec![1u8; 16], vec![2u8; 16]);
    let read_ptr = pair.read().as_ptr();
    pair.swap();
    assert_eq!(pair.write().as_ptr(), read_ptr);
    assert_eq!(pair.read()[0], 2);
}

#[test]
fn energy_never_grows_without_splats() {
    let canvas = UVec2::new(64, 64);
    let mut fluid = ReferenceFluid::new(small_config(), canvas).unwrap();
    fluid
        .splat(&Impulse::at_center(canvas, Vec2::new(10.0, -4.0), Vec3::ONE))
        .unwrap();
    fluid.step(1.0 / 60.0).unwrap();

    let mut velocity = fluid.velocity().read().energy(2);
    let mut dye = fluid.dye().read().energy(3);
    assert!(velocity > 0.0 && dye > 0.0);
    for _ in 0..8 {
        fluid.step(1.0 / 60.0).unwrap();
        let v = fluid.velocity().read().energy(2);
        let d = fluid.dye().read().energy(3);
        assert!(v <= velocity * (1.0 + 1e-3) + 1e-6, "velocity {velocity} -> {v}");
        assert!(d <= dye * (1.0 + 1e-3) + 1e-6, "dye {dye} -> {d}");
        velocity = v;
        dye = d;
    }
}

#[test]
fn splat_raises_local_intensity_and_leaves_far_field() {
    let canvas = UVec2::new(512, 512);
    let mut fluid = ReferenceFluid::new(e2e_config(), canvas).unwrap();
    let near = Vec2::splat(0.5);
    let far = Vec2::new(0.8, 0.5);

    let before_near = fluid.dye().read().mean_intensity(near, 0.02);
    let before_far = fluid.dye().read().mean_intensity(far, 0.02);
    fluid
        .splat(&Impulse::at_center(canvas, Vec2::ZERO, Vec3::ONE))
        .unwrap();
    let after_near = fluid.dye().read().mean_intensity(near, 0.02);
    let after_far = fluid.dye().read().mean_intensity(far, 0.02);

    assert!(after_near > before_near);
    assert!((after_far - before_far).abs() < 1e-6);
}

#[test]
fn splat_maps_screen_top_to_field_top() {
    let canvas = UVec2::new(64, 64);
    let mut fluid = ReferenceFluid::new(small_config(), canvas).unwrap();
    fluid
        .splat(&Impulse::new(Vec2::new(32.0, 8.0), Vec2::ZERO, Vec3::ONE))
        .unwrap();
    let dye = fluid.dye().read();
    assert!(dye.intensity(32, 56) > 0.5);
    assert!(dye.intensity(32, 8) < 1e-6);
}

#[test]
fn oversized_delta_matches_clamped_delta() {
    let canvas = UVec2::new(64, 64);
    let mut long = ReferenceFluid::new(small_config(), canvas).unwrap();
    let mut clamped = long.clone();
    let impulse = Impulse::at_center(canvas, Vec2::new(40.0, 0.0), Vec3::ONE);
    long.splat(&impulse).unwrap();
    clamped.splat(&impulse).unwrap();

    long.step(5.0).unwrap();
    clamped.step(1.0 / 60.0).unwrap();

    assert_eq!(long.velocity().read(), clamped.velocity().read());
    assert_eq!(long.dye().read(), clamped.dye().read());
}

#[test]
fn resize_reallocates_cleared_fields() {
    let cfg = SimulationConfig {
        grid_sizing: GridSizing::Downsample { shift: 0 },
        ..SimulationConfig::default()
    };
    let mut fluid = ReferenceFluid::new(cfg, UVec2::splat(128)).unwrap();
    assert_eq!(fluid.grid_size(), UVec2::splat(128));
    fluid
        .splat(&Impulse::at_center(UVec2::splat(128), Vec2::X * 50.0, Vec3::ONE))
        .unwrap();
    fluid.step(1.0 / 60.0).unwrap();
    assert!(fluid.dye().read().energy(3) > 0.0);

    fluid.resize(UVec2::splat(256)).unwrap();
    assert_eq!(fluid.grid_size(), UVec2::splat(256));
    assert_eq!(fluid.dye_size(), UVec2::splat(256));
    assert_eq!(fluid.divergence().size(), UVec2::splat(256));
    for pair in [fluid.velocity(), fluid.dye(), fluid.pressure()] {
        assert_eq!(pair.read().energy(4), 0.0);
        assert_eq!(pair.write().energy(4), 0.0);
    }
}

#[test]
fn end_to_end_smoke_spreads_from_center() {
    let canvas = UVec2::new(512, 512);
    let cfg = e2e_config();
    let radius_uv = cfg.splat_radius.sqrt();
    let mut fluid = ReferenceFluid::new(cfg, canvas).unwrap();

    let center = fluid.dye_size() / 2;
    let before = fluid.dye().read().intensity(center.x, center.y);
    fluid
        .splat(&Impulse::at_center(canvas, Vec2::new(100.0, 0.0), Vec3::ONE))
        .unwrap();
    fluid.step(1.0 / 60.0).unwrap();
    assert!(fluid.dye().read().intensity(center.x, center.y) > before);

    for _ in 0..3 {
        fluid.step(1.0 / 60.0).unwrap();
    }
    let right = center.x + (radius_uv * fluid.dye_size().x as f32) as u32;
    assert!(fluid.dye().read().intensity(right, center.y) > 0.0);

    fluid.render().unwrap();
    let frame = fluid.frame();
    assert!(frame.texel(256, 256).w > 0.0);
    assert_eq!(frame.texel(0, 0).w, 0.0);
}

#[test]
fn disposed_driver_stops_and_engine_rejects_step() {
    let canvas = UVec2::new(64, 64);
    let cfg = small_config();
    let fluid = ReferenceFluid::new(cfg.clone(), canvas).unwrap();
    let mut driver = FrameDriver::new(fluid, &cfg, canvas);
    driver.start().unwrap();
    assert_eq!(
        driver.frame(instant::Instant::now(), canvas).unwrap(),
        FrameOutcome::Continue
    );

    driver.dispose();
    assert_eq!(
        driver.frame(instant::Instant::now(), canvas).unwrap(),
        FrameOutcome::Halted
    );
    assert_eq!(driver.engine().lifecycle(), Lifecycle::Disposed);
    assert!(matches!(
        driver.engine_mut().step(1.0 / 60.0),
        Err(SimError::Disposed)
    ));
    assert!(matches!(
        driver
            .engine_mut()
            .splat(&Impulse::at_center(canvas, Vec2::ZERO, Vec3::ONE)),
        Err(SimError::Disposed)
    ));
}

#[test]
fn incense_driver_fills_dye_over_frames() {
    let canvas = UVec2::new(64, 64);
    let mut cfg = SimulationConfig {
        sim_resolution: 32,
        dye_resolution: 64,
        ..SimulationConfig::incense()
    };
    if let Some(emitter) = cfg.emitter.as_mut() {
        emitter.seed = Some(11);
    }
    let fluid = ReferenceFluid::new(cfg.clone(), canvas).unwrap();
    let mut driver = FrameDriver::new(fluid, &cfg, canvas);
    driver.start().unwrap();

    let t0 = instant::Instant::now();
    for i in 0..5u64 {
        driver.emit_due(Duration::from_millis(60));
        driver
            .frame(t0 + Duration::from_millis(16 * i), canvas)
            .unwrap();
    }
    assert_eq!(driver.frames(), 5);
    assert!(driver.engine().dye().read().energy(3) > 0.0);
    assert!(driver.engine().frame().texel(32, 32).w > 0.0);
}

#[test]
fn invalid_config_is_rejected_at_initialization() {
    let cfg = SimulationConfig {
        splat_radius: 0.0,
        ..SimulationConfig::default()
    };
    assert!(matches!(
        ReferenceFluid::new(cfg, UVec2::splat(64)),
        Err(SimError::Config(_))
    ));
}

#[test]
fn config_parses_from_partial_json() {
    let cfg: SimulationConfig =
        serde_json::from_str(r#"{"pressure_iterations": 10, "grid_sizing": {"mode": "downsample", "shift": 1}}"#)
            .unwrap();
    assert_eq!(cfg.pressure_iterations, 10);
    assert_eq!(cfg.grid_sizing, GridSizing::Downsample { shift: 1 });
    assert_eq!(cfg.sim_resolution, 128);
    assert!(cfg.emitter.is_none());
}
