use glowfield::{Engine, EngineConfig, SequenceSource, Viewport, render_still};

fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn digest_u64(bytes: &[u8]) -> u64 {
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    for chunk in bytes.chunks(8) {
        let mut v = 0u64;
        for (i, &b) in chunk.iter().enumerate() {
            v |= (b as u64) << (i * 8);
        }
        state = mix64(state ^ v);
    }
    state
}

fn run_ticks(seed: u64, vp: Viewport, ticks: u32) -> Vec<u8> {
    let cfg = EngineConfig {
        seed: Some(seed),
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(cfg, Box::new(|| {})).unwrap();
    engine.start(vp).unwrap();
    for i in 0..ticks {
        engine.tick(f64::from(i) * 16.0);
    }
    engine.surface().unwrap().data().to_vec()
}

#[test]
fn cpu_render_is_deterministic_and_nonempty() {
    let vp = Viewport::new(96, 64);
    let a = run_ticks(21, vp, 30);
    let b = run_ticks(21, vp, 30);
    assert_eq!(digest_u64(&a), digest_u64(&b));
    assert!(a.chunks_exact(4).any(|px| px[0] != 0 || px[1] != 0 || px[2] != 0));
}

#[test]
fn different_seeds_produce_different_frames() {
    let vp = Viewport::new(96, 64);
    assert_ne!(
        digest_u64(&run_ticks(1, vp, 5)),
        digest_u64(&run_ticks(2, vp, 5))
    );
}

fn single_centered_blob(trail_alpha: f64) -> Engine {
    let cfg = EngineConfig {
        population: 1,
        trail_alpha,
        ..EngineConfig::default()
    };
    // Every draw is 0.5: the one blob sits at the centre with a 100px base size.
    let rng = Box::new(SequenceSource::constant(0.5));
    let mut engine = Engine::with_random_source(cfg, rng, Box::new(|| {})).unwrap();
    engine.start(Viewport::new(400, 400)).unwrap();
    engine
}

#[test]
fn trail_fade_accumulates_outside_blobs() {
    let mut engine = single_centered_blob(0.15);

    engine.tick(0.0);
    let surface = engine.surface().unwrap();
    assert_eq!(surface.pixel(0, 0), Some([0, 0, 0, 38]));
    let center_once = surface.pixel(200, 200).unwrap();
    assert!(center_once[0] > 0 || center_once[1] > 0 || center_once[2] > 0);

    engine.tick(16.0);
    let corner = engine.surface().unwrap().pixel(0, 0).unwrap();
    assert_eq!(&corner[..3], &[0, 0, 0]);
    assert!(corner[3] > 38);
}

#[test]
fn opaque_trail_erases_history() {
    let mut engine = single_centered_blob(1.0);
    for i in 0..5 {
        engine.tick(f64::from(i) * 16.0);
    }
    let surface = engine.surface().unwrap();
    assert_eq!(surface.pixel(0, 0), Some([0, 0, 0, 255]));
    assert_eq!(surface.pixel(399, 399), Some([0, 0, 0, 255]));
    assert!(surface.data().chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn glow_brightens_the_faded_background() {
    let mut engine = single_centered_blob(0.15);
    engine.tick(0.0);
    let surface = engine.surface().unwrap();
    let corner = surface.pixel(0, 0).unwrap();
    let center = surface.pixel(200, 200).unwrap();
    assert!(center[3] > corner[3]);
}

#[test]
fn render_still_matches_manual_ticking() {
    let cfg = EngineConfig {
        seed: Some(8),
        fps: 50,
        ..EngineConfig::default()
    };
    let vp = Viewport::new(64, 48);
    let still = render_still(&cfg, vp, 100.0).unwrap();

    let mut engine = Engine::new(cfg, Box::new(|| {})).unwrap();
    engine.start(vp).unwrap();
    for t in [0.0, 20.0, 40.0, 60.0, 80.0, 100.0] {
        engine.tick(t);
    }
    assert_eq!(still.data, engine.surface().unwrap().data());
}
