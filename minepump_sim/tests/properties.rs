//! Property tests over random products and stimulus scripts.

use minepump_core::{
    CapabilityStack, Environment, MinePump, MonitorId, Plant, PumpController, PumpState, WaterLevel,
};
use minepump_env::{CapabilitySet, Stimuli};
use minepump_sim::{is_fully_guarded, ScriptedDecisions, SimConfig, SimWorld};
use proptest::prelude::*;

fn world(index: u8, script: Vec<bool>, steps: u64, drain_steps: u64) -> SimWorld<ScriptedDecisions> {
    let config = SimConfig {
        steps,
        drain_steps,
        capabilities: Some(CapabilitySet::from_index(index)),
        ..Default::default()
    };
    SimWorld::with_decisions(config, ScriptedDecisions::new(script))
}

fn any_plant() -> impl Strategy<Value = Plant> {
    (0u8..=2, any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(level, methane, running, active)| {
        Plant::new(
            Environment::new(WaterLevel::new(level), methane),
            PumpState::new(running, active),
        )
    })
}

proptest! {
    #[test]
    fn prop_water_stays_in_range(ops in proptest::collection::vec(any::<bool>(), 0..64)) {
        let mut env = Environment::default();
        let mut model: i32 = 1;
        for raise in ops {
            if raise {
                env.raise_water();
                model = (model + 1).min(2);
            } else {
                env.lower_water();
                model = (model - 1).max(0);
            }
            prop_assert_eq!(env.water_level().get() as i32, model);
        }
    }

    #[test]
    fn prop_base_only_is_transparent(plant in any_plant()) {
        let base = CapabilityStack::new(&CapabilitySet::none());

        let mut processed = plant;
        PumpController::new(&mut processed, &base).process_environment();
        prop_assert_eq!(processed, plant);

        let mut activated = plant;
        PumpController::new(&mut activated, &base).activate_pump();
        prop_assert!(activated.pump.is_running());
    }

    #[test]
    fn prop_idle_drain_keeps_water(
        index in 0u8..64,
        script in proptest::collection::vec(any::<bool>(), 0..120),
    ) {
        let mut world = world(index, script, 20, 0);
        world.run().unwrap();

        for _ in 0..10 {
            let before = world.system().snapshot();
            let after = world.drain_step().snapshot;
            if !before.pump_running {
                prop_assert_eq!(after.water_level, before.water_level);
            }
        }
    }

    #[test]
    fn prop_monitor_one_and_four_fire(
        index in 0u8..64,
        script in proptest::collection::vec(any::<bool>(), 0..160),
    ) {
        let mut world = world(index, script, 30, 10);
        let mut checked = 0;
        world.run_observed(|_, outcome| {
            let snap = outcome.snapshot;
            let fired = |id: MonitorId| outcome.violations.iter().any(|v| v.monitor == id);

            assert_eq!(snap.methane_critical && snap.pump_running, fired(MonitorId::MethanePumping));
            assert_eq!(snap.water_level == WaterLevel::LOW && snap.pump_running, fired(MonitorId::DryRunning));
            checked += 1;
        }).unwrap();
        prop_assert_eq!(checked, 40);
    }

    #[test]
    fn prop_pump_never_starts_below_high_water(
        index in 0u8..64,
        script in proptest::collection::vec(any::<bool>(), 0..160),
    ) {
        let mut world = world(index, script, 30, 10);
        let mut previous = world.system().snapshot();
        world.run_observed(|_, outcome| {
            let now = outcome.snapshot;
            if !previous.pump_running && now.pump_running {
                // Only the high-water path starts the pump
                assert_eq!(now.water_level, WaterLevel::HIGH);
                assert!(CapabilitySet::from_index(index).high_water_sensor);
            }
            previous = now;
        }).unwrap();
        prop_assert_eq!(world.system().violations().count_for(MonitorId::UnexpectedStart), 0);
    }

    #[test]
    fn prop_inactive_system_never_pumps(
        index in 0u8..64,
        script in proptest::collection::vec(any::<bool>(), 0..160),
    ) {
        let mut world = world(index, script, 30, 10);
        world.run_observed(|stimuli, outcome| {
            if !outcome.snapshot.system_active {
                assert!(!outcome.snapshot.pump_running);
            }
            if stimuli.stop {
                assert!(!outcome.snapshot.system_active);
            }
        }).unwrap();
    }

    #[test]
    fn prop_guarded_products_stay_clean(
        start in any::<bool>(),
        script in proptest::collection::vec(any::<bool>(), 0..200),
    ) {
        let mut caps: CapabilitySet = "high_water_sensor,low_water_sensor,methane_query,methane_alarm"
            .parse()
            .unwrap();
        caps.start_command = start;
        prop_assert!(is_fully_guarded(&caps));

        let mut world = world(caps.index(), script, 60, 10);
        let summary = world.run().unwrap();
        prop_assert!(summary.is_clean(), "{:?}", summary);
    }

    #[test]
    fn prop_violation_count_never_decreases(
        index in 0u8..64,
        script in proptest::collection::vec(any::<bool>(), 0..160),
    ) {
        let config = SimConfig {
            capabilities: Some(CapabilitySet::from_index(index)),
            ..Default::default()
        };
        let mut world = SimWorld::with_decisions(config, ScriptedDecisions::new(script));
        let mut last = 0;
        for _ in 0..40 {
            let (_, outcome) = world.tick().unwrap();
            let count = world.violation_count();
            prop_assert_eq!(count, last + outcome.violations.len() as u64);
            last = count;
        }
    }
}

#[test]
fn test_scenario_a_single_step() {
    let plant = Plant::new(Environment::new(WaterLevel::HIGH, false), PumpState::new(false, true));
    let mut system = MinePump::with_plant("high_water_sensor".parse().unwrap(), plant);

    let outcome = system.run_step(&Stimuli::none());
    assert!(outcome.snapshot.pump_running);
    assert_eq!(system.violations().count_for(MonitorId::HighWaterIdle), 0);
}

#[test]
fn test_scenario_c_single_drain_step() {
    let plant = Plant::new(Environment::new(WaterLevel::LOW, false), PumpState::new(true, true));
    let mut system = MinePump::with_plant(CapabilitySet::none(), plant);

    let before = system.violation_count();
    system.drain_step();
    assert_eq!(system.violation_count(), before + 1);
    assert_eq!(system.violations().count_for(MonitorId::DryRunning), 1);
}
