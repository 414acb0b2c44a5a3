// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Benchmarks for one fixed tick
//!
//! Measures `fixed_update` on a field of platforms with a growing number of
//! falling boxes, and the solver on its own.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use platform_physics::config::PhysicsConfig;
use platform_physics::entity::TextureHandle;
use platform_physics::geometry::{Rect, Vec2};
use platform_physics::registry::EntityManager;

fn setup_level(n_moveables: usize) -> EntityManager {
    let manager = EntityManager::new(PhysicsConfig::default().with_scene_size(4000.0, 2000.0));
    for row in 0..8 {
        for col in 0..16 {
            manager.add_entity(
                TextureHandle::DEFAULT,
                Rect::new(col as f64 * 250.0, 200.0 + row as f64 * 220.0, 180.0, 10.0),
            );
        }
    }
    for i in 0..n_moveables {
        let body = manager.add_moveable_entity(
            TextureHandle::DEFAULT,
            Rect::new((i % 160) as f64 * 25.0, (i / 160) as f64 * 25.0, 15.0, 15.0),
            1.0 + (i % 7) as f64,
        );
        if let Some(motion) = body.lock().motion_mut() {
            motion.set_velocity(Vec2::new(0.0, 50.0));
        }
    }
    manager
}

fn bench_fixed_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("fixed_update");
    for &n in &[10usize, 100, 500] {
        let manager = setup_level(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| manager.fixed_update(black_box(0.01)));
        });
    }
    group.finish();
}

fn bench_solver(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve_insiders");
    for &n in &[100usize, 500] {
        let manager = setup_level(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(manager.solve_insiders(black_box(0.01))));
        });
    }
    group.finish();
}

fn bench_reset(c: &mut Criterion) {
    let manager = setup_level(500);
    c.bench_function("reset_entities_500", |b| {
        b.iter(|| {
            manager.fixed_update(0.01);
            manager.reset_entities();
        });
    });
}

criterion_group!(benches, bench_fixed_update, bench_solver, bench_reset);
criterion_main!(benches);
