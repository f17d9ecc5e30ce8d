//! Enemy waves
//!
//! A wave is a resumable sequence driven by the combat world's scheduler:
//!
//! ```text
//!  Aim ──wait shot_interval──► Fire ──more shots──► Aim
//!                                └──last shot──► Drain ──no enemy projectile left──► Cooldown
//!  Drain ──enemies remain──► wait physics tick ──► Drain
//!  Cooldown ──wait wave_cooldown──► WaveEnded published
//! ```

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rampart_combat::{CombatWorld, ProjectileSpawner};
use rampart_core::{NodeId, Scheduler, Sequence, Step, TaskHandle, WaitPoint};
use rampart_event::{EventChannel, EventSender};

use crate::config::{Viewport, WaveConfig};

/// Published once a wave has fully played out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveEnded {
    pub wave: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Aim,
    Fire { start: Vec2, target: Vec2 },
    Drain,
    Cooldown,
    Finished,
}

/// One wave's procedure
pub struct WaveSequence {
    wave: u32,
    phase: Phase,
    fired: u32,
    shots: u32,
    shot_interval: WaitPoint,
    cooldown: WaitPoint,
    viewport: Viewport,
    spawner: ProjectileSpawner,
    enemy_node: NodeId,
    rng: ChaCha8Rng,
    ended: EventSender<WaveEnded>,
}

impl WaveSequence {
    fn aim(&mut self) -> Phase {
        let start = Vec2::new(self.viewport.random_x(&mut self.rng), self.viewport.y_max);
        let target = Vec2::new(self.viewport.random_x(&mut self.rng), self.viewport.y_min);
        Phase::Fire { start, target }
    }
}

impl Sequence<CombatWorld> for WaveSequence {
    fn resume(&mut self, world: &mut CombatWorld) -> Step {
        loop {
            match self.phase {
                Phase::Aim => {
                    if self.fired >= self.shots {
                        self.phase = Phase::Drain;
                        continue;
                    }
                    self.phase = self.aim();
                    return Step::Wait(self.shot_interval);
                }
                Phase::Fire { start, target } => {
                    if let Err(e) = self.spawner.fire(world, target, start, Some(self.enemy_node)) {
                        log::error!("Wave {} failed to fire: {}", self.wave, e);
                    }
                    self.fired += 1;
                    self.phase = Phase::Aim;
                }
                Phase::Drain => {
                    if world.entities().count_children(self.enemy_node) > 0 {
                        return Step::Wait(WaitPoint::FixedUpdate);
                    }
                    self.phase = Phase::Cooldown;
                    return Step::Wait(self.cooldown);
                }
                Phase::Cooldown => {
                    log::info!("Wave {} ended", self.wave);
                    self.ended.send(WaveEnded { wave: self.wave });
                    self.phase = Phase::Finished;
                    return Step::Done;
                }
                Phase::Finished => return Step::Done,
            }
        }
    }
}

/// Starts, stops and numbers waves
pub struct WaveController {
    wave_index: u32,
    config: WaveConfig,
    viewport: Viewport,
    spawner: ProjectileSpawner,
    enemy_node: NodeId,
    rng: ChaCha8Rng,
    current: Option<TaskHandle>,
    ended: EventChannel<WaveEnded>,
}

impl WaveController {
    pub fn new(
        config: WaveConfig,
        viewport: Viewport,
        spawner: ProjectileSpawner,
        enemy_node: NodeId,
        seed: u64,
    ) -> Self {
        Self {
            wave_index: 0,
            config,
            viewport,
            spawner,
            enemy_node,
            rng: ChaCha8Rng::seed_from_u64(seed),
            current: None,
            ended: EventChannel::new(),
        }
    }

    /// Start the current wave, replacing one still in flight
    pub fn start_wave(&mut self, scheduler: &mut Scheduler<CombatWorld>) -> TaskHandle {
        self.stop_current_wave();
        let sequence = WaveSequence {
            wave: self.wave_index,
            phase: Phase::Aim,
            fired: 0,
            shots: self.config.shots_per_wave,
            shot_interval: self.config.shot_interval,
            cooldown: self.config.wave_cooldown,
            viewport: self.viewport,
            spawner: self.spawner,
            enemy_node: self.enemy_node,
            rng: ChaCha8Rng::seed_from_u64(self.rng.gen()),
            ended: self.ended.sender(),
        };
        log::info!("Wave {} started", self.wave_index);
        let handle = scheduler.start(sequence);
        self.current = Some(handle.clone());
        handle
    }

    pub fn start_next_wave(&mut self, scheduler: &mut Scheduler<CombatWorld>) -> TaskHandle {
        self.wave_index += 1;
        self.start_wave(scheduler)
    }

    /// Interrupt the wave in flight, if any
    pub fn stop_current_wave(&mut self) -> bool {
        match self.current.take() {
            Some(handle) if handle.is_running() => {
                handle.cancel();
                log::info!("Wave {} stopped", self.wave_index);
                true
            }
            _ => false,
        }
    }

    pub fn reset_waves(&mut self) {
        self.wave_index = 0;
    }

    pub fn wave_index(&self) -> u32 {
        self.wave_index
    }

    pub fn is_running(&self) -> bool {
        self.current.as_ref().map_or(false, TaskHandle::is_running)
    }

    pub fn enemy_node(&self) -> NodeId {
        self.enemy_node
    }

    /// Waves that ended since the last call
    pub fn drain_ended(&mut self) -> Vec<WaveEnded> {
        let ended = self.ended.drain();
        if !ended.is_empty() && !self.is_running() {
            self.current = None;
        }
        ended
    }
}
