//! Session state machine and the `Gameplay` session

use glam::Vec2;
use rampart_combat::{
    CollisionLayer, CombatWorld, EntityHandle, Explosion, ExplosionSpawner, HealthHandle,
    InteractionMask, Projectile, ProjectileSpawner,
};
use rampart_core::{NodeId, PrototypeId, Scheduled};

use crate::building::{BuildingKind, Buildings};
use crate::config::GameplayConfig;
use crate::economy::Economy;
use crate::error::{GameplayError, Result};
use crate::launcher::{LauncherPost, MissileLauncher};
use crate::wave::{WaveController, WaveEnded};

/// Session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No game started yet
    Idle,
    /// A wave is playing
    WaveRunning(u32),
    /// Between waves, waiting for the player to start the next one
    WaveComplete(u32),
    /// No building is left standing
    GameOver,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

impl SessionState {
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::WaveRunning(_) | Self::WaveComplete(_))
    }
}

/// State transition record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: SessionState,
    pub to: SessionState,
}

/// One game session: combat world plus everything around it
pub struct Gameplay {
    config: GameplayConfig,
    world: CombatWorld,
    economy: Economy,
    buildings: Buildings,
    waves: WaveController,
    launchers: Vec<LauncherPost>,
    missile: PrototypeId,
    enemy_projectile: PrototypeId,
    player_node: NodeId,
    state: SessionState,
    pending: Vec<StateTransition>,
}

impl Gameplay {
    pub fn new(config: GameplayConfig) -> Result<Self> {
        config.validate()?;
        let mut world = CombatWorld::new(config.combat.clone());
        let enemy_node = world.create_node();

        let waves_cfg = &config.waves;
        let enemy_projectile = world.register_projectile(
            "enemy_projectile",
            Projectile::new(waves_cfg.projectile_damage)
                .with_mask(InteractionMask::from_layers(&[
                    CollisionLayer::BUILDINGS,
                    CollisionLayer::EXPLOSIONS,
                ]))
                .with_radius(waves_cfg.projectile_radius),
        );
        // On the enemy layer so a wave never shoots down its own projectiles
        let blast = world.register_explosion(
            "enemy_blast",
            Explosion::new(waves_cfg.projectile_damage, waves_cfg.explosion_radius)
                .with_duration(waves_cfg.explosion_duration)
                .with_layer(CollisionLayer::ENEMY_PROJECTILES),
        );
        ExplosionSpawner::new(blast).attach(&mut world, enemy_projectile)?;

        let spawner = ProjectileSpawner::new(
            enemy_projectile,
            waves_cfg.projectile_speed,
            waves_cfg.projectile_damage,
        );
        let waves = WaveController::new(
            waves_cfg.clone(),
            config.viewport,
            spawner,
            enemy_node,
            config.seed,
        );

        let player_node = world.create_node();
        let missile = world.register_projectile(
            "player_missile",
            Projectile::new(config.launcher.projectile_damage).with_mask(InteractionMask::NONE),
        );
        let missile_blast = world.register_explosion(
            "player_blast",
            Explosion::new(config.launcher.projectile_damage, waves_cfg.explosion_radius)
                .with_duration(waves_cfg.explosion_duration)
                .with_layer(CollisionLayer::EXPLOSIONS),
        );
        ExplosionSpawner::new(missile_blast).attach(&mut world, missile)?;

        let slots: Vec<Vec2> = config.slots.iter().map(|&p| Vec2::from(p)).collect();
        let mut buildings = Buildings::new(&slots, config.building_radius);
        buildings.watch(&mut world);

        Ok(Self {
            economy: Economy::new(config.starting_funds),
            config,
            world,
            buildings,
            waves,
            launchers: Vec::new(),
            missile,
            enemy_projectile,
            player_node,
            state: SessionState::Idle,
            pending: Vec::new(),
        })
    }

    /// Reset funds and waves, clear enemies, rebuild, start wave 0
    pub fn begin_new_game(&mut self) -> Result<()> {
        self.waves.stop_current_wave();
        self.world.cancel_sequences();
        self.economy.reset();
        self.waves.reset_waves();
        self.clear_enemies();
        self.world.release_children(self.player_node);

        self.launchers.clear();
        self.buildings.clear(&mut self.world);
        for setup in self.config.initial_buildings.clone() {
            self.install(setup.slot, setup.kind, setup.max_health)?;
        }

        self.waves.start_wave(self.world.scheduler_mut());
        self.set_state(SessionState::WaveRunning(self.waves.wave_index()));
        Ok(())
    }

    /// Start the next wave once the previous one is over
    pub fn begin_next_wave(&mut self) -> bool {
        if !matches!(self.state, SessionState::WaveComplete(_)) {
            return false;
        }
        for post in &mut self.launchers {
            post.launcher.refill();
        }
        self.waves.start_next_wave(self.world.scheduler_mut());
        self.set_state(SessionState::WaveRunning(self.waves.wave_index()));
        true
    }

    /// Buy `kind` into an empty slot at the shop price
    ///
    /// Fails without spending when no game is in progress, the slot is
    /// missing or taken, or funds fall short.
    pub fn build(&mut self, slot: usize, kind: BuildingKind) -> Result<HealthHandle> {
        if !self.state.is_playing() {
            return Err(GameplayError::NotPlaying);
        }
        self.buildings.vacant(slot)?;
        let offer = self.config.shop.offer(&kind);
        self.economy.spend(offer.cost)?;

        match self.install(slot, kind, offer.max_health) {
            Ok(health) => {
                log::info!(
                    "Built {:?} in slot {} for {} (funds {})",
                    kind,
                    slot,
                    offer.cost,
                    self.economy.funds()
                );
                Ok(health)
            }
            Err(e) => {
                self.economy.add(offer.cost);
                Err(e)
            }
        }
    }

    /// Place a building; launchers get a loaded launcher at the slot
    fn install(&mut self, slot: usize, kind: BuildingKind, max_health: f32) -> Result<HealthHandle> {
        let position = self.buildings.vacant(slot)?;
        let health = self.buildings.place(&mut self.world, slot, kind, max_health)?;
        if kind == BuildingKind::MissileLauncher {
            let launcher = MissileLauncher::new(self.missile, position, &self.config.launcher)
                .with_parent(self.player_node);
            self.launchers.push(LauncherPost {
                slot,
                health,
                launcher,
            });
        }
        Ok(health)
    }

    /// Release every enemy projectile and explosion still in play
    pub fn clear_enemies(&mut self) -> usize {
        let node = self.waves.enemy_node();
        self.world.release_children(node)
    }

    /// One physics step
    pub fn fixed_update(&mut self, dt: f32) {
        self.world.fixed_update(dt);
        self.settle();
    }

    /// Fire the ready launcher closest to `target`
    ///
    /// `Ok(None)` when no launcher is ready or no wave is running.
    pub fn fire_missile(&mut self, target: Vec2) -> Result<Option<EntityHandle>> {
        if self.state != SessionState::WaveRunning(self.waves.wave_index()) {
            return Ok(None);
        }
        let closest = self
            .launchers
            .iter_mut()
            .filter(|post| post.launcher.is_ready_to_fire())
            .min_by(|a, b| {
                let da = a.launcher.origin.distance_squared(target);
                let db = b.launcher.origin.distance_squared(target);
                da.total_cmp(&db)
            });
        match closest {
            Some(post) => post.launcher.fire(&mut self.world, target),
            None => Ok(None),
        }
    }

    /// The launcher `fire_missile` would use for `target`
    pub fn ready_launcher(&self, target: Vec2) -> Option<&MissileLauncher> {
        self.launchers
            .iter()
            .map(|post| &post.launcher)
            .filter(|launcher| launcher.is_ready_to_fire())
            .min_by(|a, b| {
                a.origin
                    .distance_squared(target)
                    .total_cmp(&b.origin.distance_squared(target))
            })
    }

    /// One rendered frame
    pub fn update(&mut self, dt: f32) {
        for post in &mut self.launchers {
            post.launcher.update(dt);
        }
        self.world.update(dt);
        self.settle();
    }

    /// Apply what combat produced: destroyed buildings, finished waves
    fn settle(&mut self) {
        for building in self.buildings.collect_destroyed(&mut self.world) {
            if building.kind == BuildingKind::MissileLauncher {
                self.launchers.retain(|post| post.health != building.health);
                log::info!("Launcher in slot {} lost", building.slot);
            }
        }

        if self.state.is_playing() && self.buildings.standing_count() == 0 {
            log::info!("Game over after wave {}", self.waves.wave_index());
            self.waves.stop_current_wave();
            self.set_state(SessionState::GameOver);
        }

        for WaveEnded { wave } in self.waves.drain_ended() {
            if self.state != SessionState::WaveRunning(wave) {
                continue;
            }
            let income = self.buildings.income();
            self.economy.add(income);
            log::info!(
                "Wave {} survived, income {} (funds {})",
                wave,
                income,
                self.economy.funds()
            );
            self.set_state(SessionState::WaveComplete(wave));
        }
    }

    fn set_state(&mut self, to: SessionState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        self.pending.push(StateTransition { from, to });
    }

    /// Drain pending transitions
    pub fn drain_transitions(&mut self) -> Vec<StateTransition> {
        std::mem::take(&mut self.pending)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_game_over(&self) -> bool {
        self.state == SessionState::GameOver
    }

    pub fn config(&self) -> &GameplayConfig {
        &self.config
    }

    pub fn world(&self) -> &CombatWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut CombatWorld {
        &mut self.world
    }

    pub fn economy(&self) -> &Economy {
        &self.economy
    }

    pub fn economy_mut(&mut self) -> &mut Economy {
        &mut self.economy
    }

    pub fn buildings(&self) -> &Buildings {
        &self.buildings
    }

    pub fn waves(&self) -> &WaveController {
        &self.waves
    }

    pub fn launchers(&self) -> &[LauncherPost] {
        &self.launchers
    }

    pub fn launcher_at(&self, slot: usize) -> Option<&MissileLauncher> {
        self.launchers
            .iter()
            .find(|post| post.slot == slot)
            .map(|post| &post.launcher)
    }

    /// For attaching upgrades
    pub fn launcher_at_mut(&mut self, slot: usize) -> Option<&mut MissileLauncher> {
        self.launchers
            .iter_mut()
            .find(|post| post.slot == slot)
            .map(|post| &mut post.launcher)
    }

    pub fn enemy_node(&self) -> NodeId {
        self.waves.enemy_node()
    }

    /// Parent of the player's missiles and blasts
    pub fn player_node(&self) -> NodeId {
        self.player_node
    }

    pub fn enemy_projectile(&self) -> PrototypeId {
        self.enemy_projectile
    }
}
