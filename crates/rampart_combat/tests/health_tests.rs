//! Damage, death and healing through the combat world
//!
//! Listeners record into `Arc<Mutex<_>>` so the tests can inspect what ran
//! and in which order.

use std::sync::Arc;

use approx::assert_relative_eq;
use parking_lot::Mutex;
use rampart_combat::prelude::*;
use rampart_core::ColliderId;
use rampart_event::SubscriberId;

fn recorder<T>() -> Arc<Mutex<Vec<T>>> {
    Arc::new(Mutex::new(Vec::new()))
}

fn surface(world: &mut CombatWorld, owner: HealthHandle) -> (ColliderId, HitboxHandle) {
    let collider = world.register_collider(CollisionLayer::BUILDINGS);
    let hitbox = world.attach_hitbox(collider, Some(owner)).unwrap();
    (collider, hitbox)
}

#[test]
fn damage_is_clamped_to_current_health() {
    let mut world = CombatWorld::default();
    let target = world.add_health(Health::new(50.0));

    assert_eq!(world.apply_damage(target, -10.0, None), 0.0);
    assert_eq!(world.apply_damage(target, f32::NAN, None), 0.0);
    assert_eq!(world.health(target).unwrap().current(), 50.0);

    assert_eq!(world.apply_damage(target, 1000.0, None), 50.0);
    assert_eq!(world.health(target).unwrap().current(), 0.0);
    assert!(world.is_dead(target));

    // Dead targets take nothing
    assert_eq!(world.apply_damage(target, 10.0, None), 0.0);
    assert_eq!(world.outstanding_events(), 0);
}

#[test]
fn lethal_damage_deals_only_what_is_left() {
    let mut world = CombatWorld::default();
    let target = world.add_health(Health::new(100.0).with_current(30.0));

    let deaths = recorder();
    let d = deaths.clone();
    world.events.on_died.subscribe(move |_, death: &mut DeathEvent| {
        d.lock().push(death.clone());
    });

    let mut event = DamageEvent::new(50.0, None);
    world.take_damage(target, &mut event);

    assert_eq!(event.damage_dealt, 30.0);
    let health = world.health(target).unwrap();
    assert_eq!(health.current(), 0.0);
    assert!(health.is_dead());
    assert!(!health.is_enabled());

    let deaths = deaths.lock();
    assert_eq!(deaths.len(), 1);
    assert_eq!(deaths[0].target, Some(target));
    let cause = deaths[0].cause.as_ref().unwrap();
    assert_eq!(cause.damage_dealt, 30.0);
    assert_eq!(cause.damage, 50.0);
}

#[test]
fn listeners_run_in_transaction_order() {
    let mut world = CombatWorld::default();
    let target = world.add_health(Health::new(20.0));
    let log = recorder();

    let l = log.clone();
    world.events.on_damage.subscribe(move |world: &mut CombatWorld, _: &mut DamageEvent| {
        let hp = world.health(target).map_or(-1.0, Health::current);
        l.lock().push(format!("pre hp={}", hp));
    });
    let l = log.clone();
    world.events.on_damaged.subscribe(move |_, _: &mut DamageEvent| {
        l.lock().push("post".to_string());
    });
    let l = log.clone();
    world.events.on_die.subscribe(move |_, _: &mut DeathEvent| {
        l.lock().push("die".to_string());
    });
    let l = log.clone();
    world.events.on_died.subscribe(move |_, _: &mut DeathEvent| {
        l.lock().push("died".to_string());
    });

    let health = world.health_mut(target).unwrap();
    let l = log.clone();
    health.on_damaged.subscribe(move |world: &mut CombatWorld, _: &mut DamageEvent| {
        let hp = world.health(target).map_or(-1.0, Health::current);
        l.lock().push(format!("local hp={}", hp));
    });
    let l = log.clone();
    health.on_death.subscribe(move |_, _: &mut DeathEvent| {
        l.lock().push("local death".to_string());
    });

    world.apply_damage(target, 25.0, None);

    assert_eq!(
        *log.lock(),
        vec![
            "pre hp=20",
            "local hp=0",
            "post",
            "die",
            "local death",
            "died",
        ]
    );
}

#[test]
fn pre_damage_listener_can_rewrite_damage() {
    let mut world = CombatWorld::default();
    let target = world.add_health(Health::new(100.0));
    world.events.on_damage.subscribe(|_, event: &mut DamageEvent| {
        event.damage *= 0.5;
    });

    assert_relative_eq!(world.apply_damage(target, 40.0, None), 20.0);
    assert_relative_eq!(world.health(target).unwrap().current(), 80.0);
}

#[test]
fn prevented_death_keeps_health_enabled() {
    let mut world = CombatWorld::default();
    let target = world.add_health(Health::new(40.0));

    world.events.on_die.subscribe(|_, death: &mut DeathEvent| {
        death.prevented = true;
    });
    let died = recorder();
    let d = died.clone();
    world.events.on_died.subscribe(move |_, death: &mut DeathEvent| {
        d.lock().push(death.target);
    });
    let local = recorder();
    let l = local.clone();
    world
        .health_mut(target)
        .unwrap()
        .on_death
        .subscribe(move |_, death: &mut DeathEvent| {
            l.lock().push(death.target);
        });

    assert_eq!(world.apply_damage(target, 100.0, None), 40.0);

    let health = world.health(target).unwrap();
    assert_eq!(health.current(), 0.0);
    assert!(health.is_dead());
    assert!(health.is_enabled());
    assert!(died.lock().is_empty());
    assert!(local.lock().is_empty());

    assert!(!world.kill_outright(target));
    assert!(died.lock().is_empty());

    // Still alive as far as healing is concerned
    assert_eq!(world.restore_health(target, 15.0), 15.0);
    assert!(!world.is_dead(target));
}

#[test]
fn heal_restores_at_most_missing_health() {
    let mut world = CombatWorld::default();
    let target = world.add_health(Health::new(100.0).with_current(95.0));

    let healed = recorder();
    let h = healed.clone();
    world
        .health_mut(target)
        .unwrap()
        .on_healed
        .subscribe(move |_, event: &mut HealEvent| {
            h.lock().push(event.restored_health);
        });

    assert_eq!(world.restore_health(target, 20.0), 5.0);
    assert_eq!(world.health(target).unwrap().current(), 100.0);
    assert_eq!(world.restore_health(target, -3.0), 0.0);
    assert_eq!(*healed.lock(), vec![5.0, 0.0]);
}

#[test]
fn dead_health_cannot_be_healed() {
    let mut world = CombatWorld::default();
    let target = world.add_health(Health::new(10.0));
    assert!(world.kill_outright(target));
    assert!(!world.kill_outright(target));

    assert_eq!(world.restore_health(target, 5.0), 0.0);
    assert_eq!(world.health(target).unwrap().current(), 0.0);
}

#[test]
fn reentrant_damage_completes_before_outer_resumes() {
    let mut world = CombatWorld::default();
    let first = world.add_health(Health::new(100.0));
    let second = world.add_health(Health::new(100.0));

    world.events.on_damaged.subscribe(move |world: &mut CombatWorld, event: &mut DamageEvent| {
        if event.target == Some(first) {
            world.apply_damage(second, 10.0, None);
        }
    });
    let order = recorder();
    let o = order.clone();
    world.events.on_damaged.subscribe(move |_, event: &mut DamageEvent| {
        o.lock().push((event.target, event.damage_dealt));
    });

    assert_eq!(world.apply_damage(first, 5.0, None), 5.0);

    assert_eq!(*order.lock(), vec![(Some(second), 10.0), (Some(first), 5.0)]);
    assert_eq!(world.health(second).unwrap().current(), 90.0);
    assert_eq!(world.outstanding_events(), 0);
}

#[test]
fn died_listener_can_unsubscribe_itself() {
    let mut world = CombatWorld::default();
    let a = world.add_health(Health::new(1.0));
    let b = world.add_health(Health::new(1.0));

    let own_id: Arc<Mutex<Option<SubscriberId>>> = Arc::new(Mutex::new(None));
    let calls = Arc::new(Mutex::new(0));

    let slot = own_id.clone();
    let c = calls.clone();
    let id = world.events.on_died.subscribe(move |world: &mut CombatWorld, _: &mut DeathEvent| {
        *c.lock() += 1;
        if let Some(id) = slot.lock().take() {
            world.events.on_died.unsubscribe(id);
        }
    });
    *own_id.lock() = Some(id);

    let others = recorder();
    let o = others.clone();
    world.events.on_died.subscribe(move |_, death: &mut DeathEvent| {
        o.lock().push(death.target);
    });

    assert!(world.kill_outright(a));
    assert!(world.kill_outright(b));

    assert_eq!(*calls.lock(), 1);
    assert_eq!(*others.lock(), vec![Some(a), Some(b)]);
    assert_eq!(world.events.on_died.len(), 1);
}

#[test]
fn find_unique_keeps_one_hitbox_per_owner() {
    let mut world = CombatWorld::default();
    let a = world.add_health(Health::new(100.0));
    let b = world.add_health(Health::new(100.0));
    let (c1, _) = surface(&mut world, a);
    let (c2, h2) = surface(&mut world, b);
    let (c3, h3) = surface(&mut world, a);

    let mut out = Vec::new();
    world.find_unique(&[c3, c1, c2], &mut out);
    assert_eq!(out, vec![h3, h2]);

    // Disabled hitboxes and dead owners drop out
    world.set_hitbox_enabled(h3, false).unwrap();
    world.find_unique(&[c3, c1, c2], &mut out);
    assert_eq!(out.len(), 2);
    assert_eq!(world.hitbox(out[0]).unwrap().collider(), c1);

    world.kill_outright(b);
    world.find_unique(&[c3, c1, c2], &mut out);
    assert_eq!(out.len(), 1);
    assert_eq!(world.find_one(c2), None);
}

#[test]
fn hitbox_without_owner_stays_inert() {
    let mut world = CombatWorld::default();
    let collider = world.register_collider(CollisionLayer::BUILDINGS);

    let result = world.attach_hitbox(collider, None);
    assert!(matches!(result, Err(CombatError::MissingOwner(c)) if c == collider));
    assert_eq!(world.find_one(collider), None);

    let blast = world.register_explosion("blast", Explosion::new(10.0, 1.0));
    let explosion = world
        .spawn_explosion(blast, glam::Vec2::ZERO, None, 10.0)
        .unwrap();
    assert!(!world.on_contact(explosion, collider));
    assert_eq!(world.on_overlap(explosion, &[collider]), 0);
}

#[test]
fn hitbox_forwards_to_owner() {
    let mut world = CombatWorld::default();
    let owner = world.add_health(Health::new(100.0));
    let (_, left) = surface(&mut world, owner);
    let (_, right) = surface(&mut world, owner);
    assert_eq!(world.health(owner).unwrap().hitboxes(), &[left, right]);

    let mut event = DamageEvent::new(15.0, None);
    world.damage_hitbox(right, &mut event).unwrap();
    assert_eq!(event.target, Some(owner));
    assert_relative_eq!(world.normalized_health(owner).unwrap(), 0.85);

    world.remove_health(owner);
    assert!(world.hitbox(left).is_none());
    assert!(matches!(
        world.damage_hitbox(left, &mut event),
        Err(CombatError::UnknownHitbox(_))
    ));
}
