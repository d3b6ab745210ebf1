use criterion::{black_box, criterion_group, criterion_main, Criterion};
use waypath_core::{
    parse_path_config_json, sample, AnimationDriver, MovementMode, PathBuilder, PathConfig,
};
use waypath_test_fixtures as fixtures;

fn load(name: &str) -> PathConfig {
    let json = fixtures::paths::json(name).expect("fixture json");
    parse_path_config_json(&json).expect("fixture parses")
}

fn bench_sample(c: &mut Criterion) {
    let path = PathBuilder::build(&load("multi-spline")).expect("build");
    c.bench_function("sample_multi_spline", |b| {
        let mut u = 0.0f32;
        b.iter(|| {
            u = (u + 0.001) % 1.0;
            black_box(sample(&path, black_box(u)))
        })
    });
}

fn bench_build(c: &mut Criterion) {
    let cfg = load("multi-spline");
    c.bench_function("build_multi_spline", |b| {
        b.iter(|| black_box(PathBuilder::build(black_box(&cfg))))
    });
}

fn bench_auto_update(c: &mut Criterion) {
    let cfg = load("multi-spline");
    c.bench_function("auto_update_60hz", |b| {
        let mut driver = AnimationDriver::with_config(cfg.clone());
        b.iter(|| {
            if !driver.is_playing() {
                driver.reset_to_start();
                driver.resume();
            }
            black_box(driver.update(1.0 / 60.0).pose)
        })
    });
}

fn bench_climb_update(c: &mut Criterion) {
    let cfg = load("climb-ladder").with_mode(MovementMode::PathAnimation);
    c.bench_function("climb_update_60hz", |b| {
        let mut driver = AnimationDriver::with_config(cfg.clone());
        b.iter(|| {
            if !driver.is_path_animating() {
                if driver.is_finished() {
                    let _ = driver.reset_climb();
                }
                let _ = driver.climb_distance(1.0, 0.25);
            }
            black_box(driver.update(1.0 / 60.0).pose)
        })
    });
}

criterion_group!(
    benches,
    bench_sample,
    bench_build,
    bench_auto_update,
    bench_climb_update
);
criterion_main!(benches);
