//! The effect list under scripted add/remove churn
//!
//! Effects only request changes while they tick; the world applies them in
//! FIFO order once every effect has ticked, and an effect with a removal
//! already queued is never ticked again. A small model of those rules is
//! compared against the real world for random scripts.

use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

use proptest::prelude::*;

use ordnance::core::types::EffectId;
use ordnance::effects::{Effect, Renderable, TickContext, ViewerContext};
use ordnance::world::{FrameEndTask, World};
use ordnance::{SimulationConfig, WeaponRules};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Nothing,
    Spawn,
    Remove,
    SpawnAndRemove,
    /// Queue removal of the effect with the next id, whether or not it exists yet
    KillNext,
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => Just(Action::Nothing),
        2 => Just(Action::Spawn),
        2 => Just(Action::Remove),
        1 => Just(Action::SpawnAndRemove),
        1 => Just(Action::KillNext),
    ]
}

#[derive(Debug, Default)]
struct Shared {
    script: VecDeque<Action>,
    /// Ids in the order they were ticked
    log: Vec<u64>,
}

impl Shared {
    /// Once the script runs dry everything removes itself
    fn next_action(&mut self) -> Action {
        self.script.pop_front().unwrap_or(Action::Remove)
    }
}

#[derive(Debug)]
struct Probe {
    shared: Rc<RefCell<Shared>>,
}

impl Effect for Probe {
    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        let id = ctx.effect_id().unwrap();
        let action = {
            let mut shared = self.shared.borrow_mut();
            shared.log.push(id.0);
            shared.next_action()
        };
        match action {
            Action::Nothing => {}
            Action::Spawn => ctx.add_effect(Probe {
                shared: self.shared.clone(),
            }),
            Action::Remove => ctx.remove_self(),
            Action::SpawnAndRemove => {
                ctx.add_effect(Probe {
                    shared: self.shared.clone(),
                });
                ctx.remove_self();
            }
            Action::KillNext => ctx.add_frame_end_task(FrameEndTask::RemoveEffect(EffectId(id.0 + 1))),
        }
    }

    fn render<'a>(&'a self, _viewer: &'a ViewerContext) -> Box<dyn Iterator<Item = Renderable> + 'a> {
        Box::new(std::iter::empty())
    }

    fn kind(&self) -> &'static str {
        "probe"
    }
}

enum ModelTask {
    Add,
    Remove(u64),
}

/// Reference model of one world tick
struct Model {
    live: Vec<u64>,
    next_id: u64,
    script: VecDeque<Action>,
}

impl Model {
    fn tick(&mut self) -> Vec<u64> {
        let mut ticked = Vec::new();
        let mut queue = VecDeque::new();
        let mut pending = BTreeSet::new();
        for &id in &self.live {
            if pending.contains(&id) {
                continue;
            }
            ticked.push(id);
            match self.script.pop_front().unwrap_or(Action::Remove) {
                Action::Nothing => {}
                Action::Spawn => queue.push_back(ModelTask::Add),
                Action::Remove => {
                    pending.insert(id);
                    queue.push_back(ModelTask::Remove(id));
                }
                Action::SpawnAndRemove => {
                    queue.push_back(ModelTask::Add);
                    pending.insert(id);
                    queue.push_back(ModelTask::Remove(id));
                }
                Action::KillNext => {
                    pending.insert(id + 1);
                    queue.push_back(ModelTask::Remove(id + 1));
                }
            }
        }
        for task in queue {
            match task {
                ModelTask::Add => {
                    self.live.push(self.next_id);
                    self.next_id += 1;
                }
                ModelTask::Remove(id) => self.live.retain(|&x| x != id),
            }
        }
        ticked
    }
}

proptest! {
    #[test]
    fn prop_world_matches_queue_model(
        initial in 1usize..6,
        script in prop::collection::vec(action(), 0..80),
    ) {
        let shared = Rc::new(RefCell::new(Shared {
            script: script.iter().copied().collect(),
            log: Vec::new(),
        }));
        let mut world = World::new(SimulationConfig::default(), Arc::new(WeaponRules::empty())).unwrap();
        for _ in 0..initial {
            world.add_effect(Probe { shared: shared.clone() });
        }
        let mut model = Model {
            live: (1..=initial as u64).collect(),
            next_id: initial as u64 + 1,
            script: script.into_iter().collect(),
        };

        for tick in 0..200 {
            if world.effect_count() == 0 {
                break;
            }
            let expected = model.tick();
            shared.borrow_mut().log.clear();
            world.tick();
            let actual = std::mem::take(&mut shared.borrow_mut().log);
            prop_assert_eq!(&actual, &expected, "tick {} ticked the wrong effects", tick + 1);

            let live: Vec<u64> = world.effect_ids().iter().map(|id| id.0).collect();
            prop_assert_eq!(&live, &model.live, "tick {} left the wrong effects", tick + 1);
        }
        prop_assert_eq!(world.effect_count(), 0);
    }
}

#[test]
fn test_effect_removed_by_earlier_effect_is_not_ticked() {
    let shared = Rc::new(RefCell::new(Shared {
        script: [Action::KillNext, Action::Nothing].into_iter().collect(),
        log: Vec::new(),
    }));
    let mut world = World::new(SimulationConfig::default(), Arc::new(WeaponRules::empty())).unwrap();
    let first = world.add_effect(Probe { shared: shared.clone() });
    let second = world.add_effect(Probe { shared: shared.clone() });
    let third = world.add_effect(Probe { shared: shared.clone() });

    world.tick();
    assert_eq!(shared.borrow().log, vec![first.0, third.0]);
    assert_eq!(world.effect_ids(), vec![first, third]);
    assert_eq!(
        world.effect_state(second),
        Some(ordnance::effects::EffectState::Removed)
    );
}
