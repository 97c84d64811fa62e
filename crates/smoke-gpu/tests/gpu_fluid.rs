//! Headless checks of the wgpu solver. Each test skips when no adapter is
//! available (e.g. CI without a GPU or software rasterizer).

use glam::{UVec2, Vec2, Vec3};
use smoke_core::{GridSizing, Impulse, Lifecycle, SimError, SimulationConfig};
use smoke_gpu::readback::read_field;
use smoke_gpu::{FluidSim, GpuContext};

const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

fn context() -> Option<GpuContext> {
    let _ = env_logger::builder().is_test(true).try_init();
    let instance = wgpu::Instance::default();
    let adapter = match pollster::block_on(GpuContext::request_adapter(&instance, None)) {
        Ok(adapter) => adapter,
        Err(err) => {
            eprintln!("skipping GPU test: {err}");
            return None;
        }
    };
    match pollster::block_on(GpuContext::new(&adapter)) {
        Ok(ctx) => Some(ctx),
        Err(err) => {
            eprintln!("skipping GPU test: {err}");
            None
        }
    }
}

fn sim(ctx: &GpuContext, config: SimulationConfig, canvas: UVec2) -> FluidSim {
    pollster::block_on(FluidSim::new(ctx, config, canvas, OFFSCREEN_FORMAT)).unwrap()
}

fn dye(ctx: &GpuContext, sim: &FluidSim) -> smoke_core::Field {
    read_field(ctx, sim.fields().unwrap().dye.read()).unwrap()
}

fn velocity(ctx: &GpuContext, sim: &FluidSim) -> smoke_core::Field {
    read_field(ctx, sim.fields().unwrap().velocity.read()).unwrap()
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
fn field_pairs_are_disjoint_and_swap_is_an_involution() {
    let Some(ctx) = context() else { return };
    for (res, dye_res) in [(64u32, 128u32), (128, 512)] {
        let cfg = SimulationConfig {
            sim_resolution: res,
            dye_resolution: dye_res,
            ..SimulationConfig::default()
        };
        let mut fluid = sim(&ctx, cfg, UVec2::splat(256));
        let fields = fluid.fields().unwrap();
        for pair in [&fields.velocity, &fields.dye, &fields.pressure] {
            assert!(!std::ptr::eq(pair.read(), pair.write()));
            assert_ne!(pair.read().label(), pair.write().label());
            assert_eq!(pair.read().size(), pair.write().size());
        }
        assert_eq!(fluid.grid_size(), UVec2::splat(res));
        assert_eq!(fluid.dye_size(), UVec2::splat(dye_res));

        let mut pair = smoke_gpu::double_target(&ctx.device, "probe", UVec2::splat(4));
        let read = pair.read() as *const _;
        pair.swap();
        pair.swap();
        assert!(std::ptr::eq(pair.read(), read));
        fluid.dispose();
    }
}

#[test]
fn energy_does_not_grow_without_splats() {
    let Some(ctx) = context() else { return };
    let cfg = SimulationConfig {
        sim_resolution: 64,
        dye_resolution: 64,
        velocity_dissipation: 1.0,
        density_dissipation: 1.0,
        pressure_iterations: 20,
        splat_radius: 0.001,
        ..SimulationConfig::default()
    };
    let canvas = UVec2::splat(64);
    let mut fluid = sim(&ctx, cfg, canvas);
    fluid
        .splat(&ctx, &Impulse::at_center(canvas, Vec2::new(10.0, -4.0), Vec3::ONE))
        .unwrap();
    fluid.step(&ctx, 1.0 / 60.0).unwrap();

    let mut v_prev = velocity(&ctx, &fluid).energy(2);
    let mut d_prev = dye(&ctx, &fluid).energy(3);
    assert!(v_prev > 0.0 && d_prev > 0.0);
    for _ in 0..6 {
        fluid.step(&ctx, 1.0 / 60.0).unwrap();
        let v = velocity(&ctx, &fluid).energy(2);
        let d = dye(&ctx, &fluid).energy(3);
        assert!(v <= v_prev * 1.01 + 1e-4, "velocity {v_prev} -> {v}");
        assert!(d <= d_prev * 1.01 + 1e-4, "dye {d_prev} -> {d}");
        v_prev = v;
        d_prev = d;
    }
}

#[test]
fn splat_is_local() {
    let Some(ctx) = context() else { return };
    let canvas = UVec2::splat(512);
    let mut fluid = sim(&ctx, e2e_config(), canvas);
    let before = dye(&ctx, &fluid);
    fluid
        .splat(&ctx, &Impulse::at_center(canvas, Vec2::ZERO, Vec3::ONE))
        .unwrap();
    let after = dye(&ctx, &fluid);

    let near = Vec2::splat(0.5);
    let far = Vec2::new(0.8, 0.5);
    assert!(after.mean_intensity(near, 0.02) > before.mean_intensity(near, 0.02));
    assert!((after.mean_intensity(far, 0.02) - before.mean_intensity(far, 0.02)).abs() < 1e-6);
}

#[test]
fn oversized_delta_is_clamped() {
    let Some(ctx) = context() else { return };
    let canvas = UVec2::splat(64);
    let cfg = SimulationConfig {
        sim_resolution: 64,
        dye_resolution: 64,
        ..SimulationConfig::default()
    };
    let impulse = Impulse::at_center(canvas, Vec2::new(40.0, 0.0), Vec3::ONE);
    let mut long = sim(&ctx, cfg.clone(), canvas);
    let mut clamped = sim(&ctx, cfg, canvas);
    long.splat(&ctx, &impulse).unwrap();
    clamped.splat(&ctx, &impulse).unwrap();
    long.step(&ctx, 5.0).unwrap();
    clamped.step(&ctx, 1.0 / 60.0).unwrap();

    let (a, b) = (dye(&ctx, &long), dye(&ctx, &clamped));
    let max_diff = a
        .texels()
        .iter()
        .zip(b.texels())
        .map(|(x, y)| (*x - *y).abs().max_element())
        .fold(0.0f32, f32::max);
    assert!(max_diff < 1e-3, "max diff {max_diff}");
}

#[test]
fn resize_reallocates_cleared_fields() {
    let Some(ctx) = context() else { return };
    let cfg = SimulationConfig {
        grid_sizing: GridSizing::Downsample { shift: 0 },
        ..SimulationConfig::default()
    };
    let mut fluid = sim(&ctx, cfg, UVec2::splat(128));
    assert_eq!(fluid.grid_size(), UVec2::splat(128));
    fluid
        .splat(&ctx, &Impulse::at_center(UVec2::splat(128), Vec2::X * 50.0, Vec3::ONE))
        .unwrap();
    assert!(dye(&ctx, &fluid).energy(3) > 0.0);

    fluid.resize(&ctx, UVec2::splat(256)).unwrap();
    assert_eq!(fluid.grid_size(), UVec2::splat(256));
    assert_eq!(fluid.dye_size(), UVec2::splat(256));
    assert_eq!(dye(&ctx, &fluid).energy(4), 0.0);
    assert_eq!(velocity(&ctx, &fluid).energy(4), 0.0);
}

#[test]
fn end_to_end_center_splat_spreads() {
    let Some(ctx) = context() else { return };
    let canvas = UVec2::splat(512);
    let cfg = e2e_config();
    let radius_uv = cfg.splat_radius.sqrt();
    let mut fluid = sim(&ctx, cfg, canvas);
    let center = fluid.dye_size() / 2;

    let before = dye(&ctx, &fluid).intensity(center.x, center.y);
    fluid
        .splat(&ctx, &Impulse::at_center(canvas, Vec2::new(100.0, 0.0), Vec3::ONE))
        .unwrap();
    fluid.step(&ctx, 1.0 / 60.0).unwrap();
    assert!(dye(&ctx, &fluid).intensity(center.x, center.y) > before);

    for _ in 0..3 {
        fluid.step(&ctx, 1.0 / 60.0).unwrap();
    }
    let right = center.x + (radius_uv * fluid.dye_size().x as f32) as u32;
    assert!(dye(&ctx, &fluid).intensity(right, center.y) > 0.0);
}

#[test]
fn display_leaves_simulation_state_untouched() {
    let Some(ctx) = context() else { return };
    let canvas = UVec2::splat(64);
    let mut fluid = sim(&ctx, SimulationConfig::default(), canvas);
    fluid
        .splat(&ctx, &Impulse::at_center(canvas, Vec2::ZERO, Vec3::new(0.2, 0.6, 0.4)))
        .unwrap();

    let target = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("offscreen"),
        size: wgpu::Extent3d {
            width: 64,
            height: 64,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: OFFSCREEN_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = target.create_view(&wgpu::TextureViewDescriptor::default());
    let before = dye(&ctx, &fluid);
    fluid.render_to(&ctx, &view).unwrap();
    fluid.render_to(&ctx, &view).unwrap();
    assert_eq!(dye(&ctx, &fluid), before);
    assert_eq!(fluid.lifecycle(), Lifecycle::Ready);
}

#[test]
fn disposed_sim_rejects_every_operation() {
    let Some(ctx) = context() else { return };
    let canvas = UVec2::splat(64);
    let mut fluid = sim(&ctx, SimulationConfig::default(), canvas);
    fluid.dispose();
    fluid.dispose();
    assert_eq!(fluid.lifecycle(), Lifecycle::Disposed);
    assert!(fluid.fields().is_none());
    assert_eq!(fluid.grid_size(), UVec2::ZERO);
    assert!(matches!(fluid.step(&ctx, 0.01), Err(SimError::Disposed)));
    assert!(matches!(
        fluid.splat(&ctx, &Impulse::at_center(canvas, Vec2::ZERO, Vec3::ONE)),
        Err(SimError::Disposed)
    ));
    assert!(matches!(
        fluid.resize(&ctx, UVec2::splat(32)),
        Err(SimError::Disposed)
    ));
}

#[test]
fn invalid_config_fails_before_touching_the_gpu() {
    let Some(ctx) = context() else { return };
    let cfg = SimulationConfig {
        pressure_iterations: 0,
        ..SimulationConfig::default()
    };
    let result = pollster::block_on(FluidSim::new(&ctx, cfg, UVec2::splat(64), OFFSCREEN_FORMAT));
    assert!(matches!(result, Err(SimError::Config(_))));
}

#[test]
fn oversized_grid_is_an_incomplete_framebuffer() {
    let Some(ctx) = context() else { return };
    let max = ctx.device.limits().max_texture_dimension_2d;
    let cfg = SimulationConfig {
        dye_resolution: max + 1,
        ..SimulationConfig::default()
    };
    let result = pollster::block_on(FluidSim::new(&ctx, cfg, UVec2::splat(64), OFFSCREEN_FORMAT));
    assert!(matches!(
        result,
        Err(SimError::IncompleteFramebuffer { .. })
    ));
}
