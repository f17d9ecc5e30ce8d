//! Session flow: waves, income, game over and restarts

use std::io::Write;

use glam::Vec2;
use rampart_core::WaitPoint;
use rampart_gamestate::prelude::*;

const DT: f32 = 1.0 / 60.0;

fn quick_waves() -> GameplayConfig {
    let mut config = GameplayConfig::default();
    config.waves.shots_per_wave = 1;
    config.waves.shot_interval = WaitPoint::TenthOfSecond;
    config.waves.wave_cooldown = WaitPoint::TenthOfSecond;
    config.waves.projectile_speed = 30.0;
    config
}

/// Tick until `done` holds; panics after `seconds` of simulated time
fn run_until(game: &mut Gameplay, seconds: f32, done: impl Fn(&Gameplay) -> bool) {
    let ticks = (seconds / DT) as usize;
    for _ in 0..ticks {
        if done(game) {
            return;
        }
        game.fixed_update(DT);
        game.update(DT);
    }
    assert!(done(game), "condition not reached after {}s", seconds);
}

#[test]
fn session_loads_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "starting_funds = 25").unwrap();
    writeln!(file, "seed = 3").unwrap();
    writeln!(file, "[waves]").unwrap();
    writeln!(file, "shots_per_wave = 4").unwrap();

    let config = GameplayConfig::load(file.path()).unwrap();
    assert_eq!(config.waves.shots_per_wave, 4);

    let mut game = Gameplay::new(config).unwrap();
    game.begin_new_game().unwrap();
    assert_eq!(game.economy().funds(), 25);
    assert_eq!(game.state(), SessionState::WaveRunning(0));
}

#[test]
fn invalid_config_is_rejected() {
    let mut config = GameplayConfig::default();
    config.launcher.reload_time = 10.0;
    assert!(matches!(
        Gameplay::new(config),
        Err(GameplayError::InvalidConfig(_))
    ));
}

#[test]
fn surviving_a_wave_pays_income() {
    let mut game = Gameplay::new(quick_waves()).unwrap();
    game.begin_new_game().unwrap();
    assert_eq!(game.economy().funds(), 0);

    run_until(&mut game, 10.0, |g| g.state() == SessionState::WaveComplete(0));

    // Two money structures at 10 each; no physics means nothing was hit
    assert_eq!(game.economy().funds(), 20);
    assert_eq!(game.buildings().standing_count(), 3);
    assert!(!game.waves().is_running());
    assert_eq!(game.world().entities().count_children(game.enemy_node()), 0);

    assert!(game.begin_next_wave());
    assert_eq!(game.state(), SessionState::WaveRunning(1));
    run_until(&mut game, 10.0, |g| g.state() == SessionState::WaveComplete(1));
    assert_eq!(game.economy().funds(), 40);

    let transitions = game.drain_transitions();
    assert_eq!(
        transitions.iter().map(|t| t.to).collect::<Vec<_>>(),
        vec![
            SessionState::WaveRunning(0),
            SessionState::WaveComplete(0),
            SessionState::WaveRunning(1),
            SessionState::WaveComplete(1),
        ]
    );
}

#[test]
fn wave_waits_for_enemies_to_clear() {
    let mut config = quick_waves();
    config.waves.projectile_speed = 1.0;
    let mut game = Gameplay::new(config).unwrap();
    game.begin_new_game().unwrap();

    run_until(&mut game, 1.0, |g| {
        g.world().entities().count_children(g.enemy_node()) > 0
    });
    // The shot needs several seconds to cross the field
    for _ in 0..60 {
        game.fixed_update(DT);
        game.update(DT);
    }
    assert_eq!(game.state(), SessionState::WaveRunning(0));
    assert!(game.waves().is_running());
}

#[test]
fn losing_every_building_ends_the_game() {
    let mut game = Gameplay::new(quick_waves()).unwrap();
    game.begin_new_game().unwrap();

    let healths: Vec<_> = game.buildings().standing().iter().map(|b| b.health).collect();
    for health in healths {
        assert!(game.world_mut().kill_outright(health));
    }
    game.update(DT);

    assert!(game.is_game_over());
    assert_eq!(game.buildings().standing_count(), 0);
    assert!(!game.waves().is_running());
    assert!(!game.begin_next_wave());
    assert_eq!(game.fire_missile(Vec2::new(0.0, 3.0)).unwrap(), None);

    // A new game rebuilds and starts over
    game.economy_mut().add(99);
    game.begin_new_game().unwrap();
    assert_eq!(game.state(), SessionState::WaveRunning(0));
    assert_eq!(game.buildings().standing_count(), 3);
    assert_eq!(game.launchers().len(), 1);
    assert_eq!(game.economy().funds(), 0);
    assert!(game.buildings().slots()[0].is_occupied());
    assert!(!game.buildings().slots()[1].is_occupied());
}

#[test]
fn destroyed_launcher_frees_its_slot_and_stops_firing() {
    let mut game = Gameplay::new(quick_waves()).unwrap();
    game.begin_new_game().unwrap();

    let post = game
        .buildings()
        .standing()
        .iter()
        .find(|b| b.kind == BuildingKind::MissileLauncher)
        .map(|b| (b.health, b.slot))
        .unwrap();
    game.world_mut().apply_damage(post.0, 1000.0, None);
    game.fixed_update(DT);

    assert_eq!(game.buildings().standing_count(), 2);
    assert!(!game.buildings().is_occupied(post.1));
    assert!(game.launchers().is_empty());
    assert_eq!(game.fire_missile(Vec2::new(0.0, 3.0)).unwrap(), None);
    assert_eq!(game.state(), SessionState::WaveRunning(0));
}

#[test]
fn building_costs_funds() {
    let mut game = Gameplay::new(quick_waves()).unwrap();
    game.begin_new_game().unwrap();
    game.economy_mut().add(60);
    let cost = game.config().shop.bunker.cost;

    let health = game.build(1, BuildingKind::Bunker).unwrap();
    assert_eq!(game.economy().funds(), 60 - cost);
    assert!(game.buildings().is_occupied(1));
    assert_eq!(game.buildings().standing_count(), 4);
    assert_eq!(
        game.world().health(health).unwrap().max(),
        game.config().shop.bunker.max_health
    );
}

#[test]
fn building_without_funds_changes_nothing() {
    let mut game = Gameplay::new(quick_waves()).unwrap();
    game.begin_new_game().unwrap();
    game.economy_mut().add(10);

    let result = game.build(1, BuildingKind::MissileLauncher);
    assert!(matches!(
        result,
        Err(GameplayError::InsufficientFunds {
            needed: 50,
            available: 10
        })
    ));
    assert_eq!(game.economy().funds(), 10);
    assert!(!game.buildings().is_occupied(1));
    assert_eq!(game.launchers().len(), 1);
}

#[test]
fn occupied_slot_is_not_charged() {
    let mut game = Gameplay::new(quick_waves()).unwrap();
    game.begin_new_game().unwrap();
    game.economy_mut().add(100);

    assert!(matches!(
        game.build(0, BuildingKind::Bunker),
        Err(GameplayError::SlotOccupied(0))
    ));
    assert!(matches!(
        game.build(9, BuildingKind::Bunker),
        Err(GameplayError::UnknownSlot(9))
    ));
    assert_eq!(game.economy().funds(), 100);
    assert_eq!(game.buildings().standing_count(), 3);
}

#[test]
fn bought_launcher_fires_from_its_slot() {
    let mut game = Gameplay::new(quick_waves()).unwrap();
    game.begin_new_game().unwrap();
    game.economy_mut().add(50);

    game.build(3, BuildingKind::MissileLauncher).unwrap();
    assert_eq!(game.economy().funds(), 0);
    assert_eq!(game.launchers().len(), 2);
    let origin = game.launcher_at(3).unwrap().origin;
    assert_eq!(origin, Vec2::new(3.0, -4.0));

    // The closer launcher answers first, the other one covers while it reloads
    let target = Vec2::new(3.0, 2.0);
    assert_eq!(game.ready_launcher(target).unwrap().origin, origin);
    assert!(game.fire_missile(target).unwrap().is_some());
    assert_eq!(game.launcher_at(3).unwrap().ammo(), 9);
    assert!(game.fire_missile(target).unwrap().is_some());
    assert_eq!(game.launcher_at(2).unwrap().ammo(), 9);
    assert_eq!(game.fire_missile(target).unwrap(), None);
}

#[test]
fn new_game_clears_enemies_in_flight() {
    let mut config = quick_waves();
    config.waves.projectile_speed = 1.0;
    let mut game = Gameplay::new(config).unwrap();
    game.begin_new_game().unwrap();
    run_until(&mut game, 1.0, |g| {
        g.world().entities().count_children(g.enemy_node()) > 0
    });

    game.begin_new_game().unwrap();
    assert_eq!(game.world().entities().count_children(game.enemy_node()), 0);
    assert_eq!(game.world().scheduler().len(), 1);
}

#[test]
fn launcher_fires_only_during_a_wave() {
    let mut game = Gameplay::new(quick_waves()).unwrap();
    assert_eq!(game.fire_missile(Vec2::new(0.0, 3.0)).unwrap(), None);

    game.begin_new_game().unwrap();
    let missile = game.fire_missile(Vec2::new(0.0, 3.0)).unwrap().unwrap();
    assert_eq!(
        game.world().entities().get(missile).unwrap().parent(),
        Some(game.player_node())
    );
    assert_eq!(game.launcher_at(2).unwrap().ammo(), 9);

    // Reloading
    assert_eq!(game.fire_missile(Vec2::new(0.0, 3.0)).unwrap(), None);
}

#[test]
fn same_seed_same_first_shot() {
    let first_shot = || {
        let mut game = Gameplay::new(quick_waves()).unwrap();
        game.begin_new_game().unwrap();
        run_until(&mut game, 1.0, |g| {
            g.world().entities().count_children(g.enemy_node()) > 0
        });
        let (handle, slot) = game.world().entities().iter_active().next().unwrap();
        (slot.pose.position, game.world().projectile(handle).unwrap().velocity)
    };

    assert_eq!(first_shot(), first_shot());
}
