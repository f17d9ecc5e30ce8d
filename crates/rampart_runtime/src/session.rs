//! Headless session driver
//!
//! Runs the frame loop the engine would: physics step, contacts, frame
//! update. The autopilot stands in for the player.

use std::collections::HashSet;
use std::fmt;

use rampart_combat::EntityHandle;
use rampart_gamestate::{Gameplay, GameplayConfig, Result, SessionState};

use crate::physics::{ArenaPhysics, StaticBody, StepReport};
use crate::run_config::RunSettings;

/// Outcome of one wave
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveSummary {
    pub wave: u32,
    pub survived: bool,
    pub seconds: f32,
    pub standing: usize,
    pub funds: u64,
    pub missiles: u32,
    pub report: StepReport,
}

impl fmt::Display for WaveSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wave {:>3} | {:<8} | {:>6.1}s | buildings {} | funds {:>5} | missiles {:>3} | hits {:>3} | intercepted {:>3}",
            self.wave,
            if self.survived { "survived" } else { "lost" },
            self.seconds,
            self.standing,
            self.funds,
            self.missiles,
            self.report.hits,
            self.report.intercepted,
        )
    }
}

pub struct Session {
    game: Gameplay,
    physics: ArenaPhysics,
    settings: RunSettings,
    targeted: HashSet<EntityHandle>,
    missiles: u32,
}

impl Session {
    pub fn new(config: GameplayConfig, settings: RunSettings) -> Result<Self> {
        Ok(Self {
            game: Gameplay::new(config)?,
            physics: ArenaPhysics::new(),
            settings,
            targeted: HashSet::new(),
            missiles: 0,
        })
    }

    pub fn start(&mut self) -> Result<()> {
        self.physics.reset();
        self.targeted.clear();
        self.game.begin_new_game()
    }

    pub fn next_wave(&mut self) -> bool {
        self.game.begin_next_wave()
    }

    pub fn game(&self) -> &Gameplay {
        &self.game
    }

    /// One fixed tick followed by one frame
    pub fn tick(&mut self) -> Result<StepReport> {
        let dt = self.settings.tick();
        self.game.fixed_update(dt);

        let statics: Vec<StaticBody> = self
            .game
            .buildings()
            .standing()
            .iter()
            .map(|b| StaticBody {
                collider: b.collider,
                position: b.position,
                radius: b.radius,
            })
            .collect();
        let report = self.physics.step(self.game.world_mut(), &statics, dt);

        if self.settings.autopilot {
            self.aim()?;
        }
        self.game.update(dt);
        Ok(report)
    }

    /// Play the current wave until it ends, the game is lost or time runs out
    pub fn play_wave(&mut self) -> Result<WaveSummary> {
        let wave = self.game.waves().wave_index();
        let dt = self.settings.tick();
        let mut seconds = 0.0;
        let mut report = StepReport::default();
        self.missiles = 0;

        while self.game.state() == SessionState::WaveRunning(wave) {
            if seconds >= self.settings.max_wave_seconds {
                log::warn!("Wave {} still running after {:.0}s, giving up", wave, seconds);
                break;
            }
            report += self.tick()?;
            seconds += dt;
        }

        Ok(WaveSummary {
            wave,
            survived: self.game.state() == SessionState::WaveComplete(wave),
            seconds,
            standing: self.game.buildings().standing_count(),
            funds: self.game.economy().funds(),
            missiles: self.missiles,
            report,
        })
    }

    /// Fire at the highest untargeted hostile projectile, leading it
    fn aim(&mut self) -> Result<bool> {
        let game = &self.game;
        let world = game.world();
        let enemy_node = game.enemy_node();
        self.targeted.retain(|h| world.entities().is_active(*h));

        let targeted = &self.targeted;
        let target = world
            .entities()
            .iter_active()
            .filter(|(h, slot)| {
                slot.parent() == Some(enemy_node)
                    && slot.entity.is_enabled()
                    && !targeted.contains(h)
            })
            .filter_map(|(h, slot)| {
                let position = slot.pose.position;
                let launcher = game.ready_launcher(position)?;
                if position.y <= launcher.origin.y + 1.0 {
                    return None;
                }
                let eta = position.distance(launcher.origin) / launcher.missile_speed();
                let lead = position + slot.entity.velocity() * eta;
                (lead.y > 0.0).then_some((h, lead))
            })
            .max_by(|a, b| a.1.y.total_cmp(&b.1.y));

        let Some((hostile, lead)) = target else {
            return Ok(false);
        };
        if self.game.fire_missile(lead)?.is_some() {
            self.targeted.insert(hostile);
            self.missiles += 1;
            log::debug!("Missile fired at {} (aim {:?})", hostile, lead);
            return Ok(true);
        }
        Ok(false)
    }
}
