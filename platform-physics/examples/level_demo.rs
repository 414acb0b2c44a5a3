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
//! Headless run of the demo level
//!
//! Loads the demo level, starts the physics thread and drives the player
//! with a scripted input sequence from a 60 Hz frame loop.
//!
//! ```text
//! RUST_LOG=debug cargo run --example level_demo [config.toml]
//! ```

use platform_physics::config::PhysicsConfig;
use platform_physics::driver::FixedTickDriver;
use platform_physics::entity::TextureHandle;
use platform_physics::frame::{collectible_progress, FrameOutcome, PlayerControls};
use platform_physics::geometry::Rect;
use platform_physics::registry::EntityManager;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const PLATFORM: TextureHandle = TextureHandle(2);
const CRATE: TextureHandle = TextureHandle(3);
const PLAYER: TextureHandle = TextureHandle(4);
const COIN: TextureHandle = TextureHandle(5);

fn load_level(manager: &EntityManager) {
    manager.add_player(PLAYER, Rect::new(50.0, 30.0, 20.0, 40.0), 80.0);

    let platforms = [
        (10.0, 75.0, 100.0, 10.0),
        (10.0, 150.0, 100.0, 10.0),
        (10.0, 225.0, 100.0, 10.0),
        (10.0, 300.0, 100.0, 10.0),
        (150.0, 0.0, 20.0, 300.0),
        (30.0, 400.0, 200.0, 20.0),
        (300.0, 400.0, 200.0, 20.0),
        (350.0, 380.0, 25.0, 20.0),
        (400.0, 380.0, 25.0, 20.0),
        (550.0, 325.0, 100.0, 10.0),
        (500.0, 250.0, 100.0, 10.0),
        (400.0, 150.0, 100.0, 10.0),
        (450.0, 75.0, 100.0, 10.0),
    ];
    for (x, y, w, h) in platforms {
        manager.add_entity(PLATFORM, Rect::new(x, y, w, h));
    }

    manager.add_moveable_entity(CRATE, Rect::new(360.0, 365.0, 75.0, 15.0), 10.0);

    let coins = [
        (50.0, 130.0),
        (50.0, 205.0),
        (50.0, 280.0),
        (380.0, 380.0),
        (590.0, 305.0),
        (540.0, 230.0),
        (440.0, 130.0),
        (490.0, 55.0),
    ];
    for (x, y) in coins {
        manager.add_collectible(COIN, Rect::new(x, y, 20.0, 20.0));
    }
}

fn controls_at(frame: u32) -> PlayerControls {
    match frame {
        0..=29 => PlayerControls::none(),
        30..=89 => PlayerControls { up: false, left: true, right: false },
        90..=94 => PlayerControls { up: true, left: false, right: true },
        95..=179 => PlayerControls { up: false, left: false, right: true },
        _ => PlayerControls::none(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => PhysicsConfig::load_from_file(path)?,
        None => PhysicsConfig::default(),
    }
    .apply_env();
    config.validate()?;

    println!("=== Platform Physics: demo level ===\n");
    println!("Tick: {:?}, epsilon: {}, gravity: {}", config.tick_period(), config.epsilon, config.gravity);

    let manager = Arc::new(EntityManager::new(config));
    load_level(&manager);
    println!(
        "Loaded {} entities ({} moveable, {} collectibles)",
        manager.len(),
        manager.moveable_entities().len(),
        manager.collectibles().len()
    );

    let driver = FixedTickDriver::new(Arc::clone(&manager))?;
    driver.play();

    let frame_time = Duration::from_millis(16);
    for frame in 0..240 {
        let outcome = driver.update_frame(controls_at(frame), frame_time.as_secs_f64());
        if outcome == FrameOutcome::Won {
            println!("Frame {}: level complete", frame);
            break;
        }
        if frame % 60 == 0 {
            if let Some(player) = manager.player() {
                let rect = player.rect();
                println!("Frame {:3}: player at ({:.1}, {:.1})", frame, rect.x, rect.y);
            }
        }
        thread::sleep(frame_time);
    }

    let (collected, remaining) = collectible_progress(&manager);
    println!("\nCollected {} of {} collectibles after {} ticks", collected, collected + remaining, driver.tick_count());

    if let Some(player) = manager.player() {
        println!("\n{}", player.lock().describe(player.id()));
    }

    driver.stop();
    println!("Simulation stopped, level reset");
    Ok(())
}
