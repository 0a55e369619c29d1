use log::warn;
use rustc_hash::FxHashMap;

use super::{Screen, Stage, StageType};

pub type ScreenFactory = Box<dyn Fn() -> Box<dyn Screen>>;

/// Constructors for every stage type the manager may build. Stages are
/// built lazily, the first time a change targets them.
#[derive(Default)]
pub struct StageRegistry {
    factories: FxHashMap<StageType, ScreenFactory>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, kind: StageType, factory: F)
    where
        F: Fn() -> Box<dyn Screen> + 'static,
    {
        if self.factories.insert(kind, Box::new(factory)).is_some() {
            warn!("Stage {kind} was already registered and has been replaced");
        }
    }

    pub fn is_registered(&self, kind: StageType) -> bool {
        self.factories.contains_key(&kind)
    }

    pub(crate) fn build(&self, kind: StageType) -> Option<Stage> {
        self.factories
            .get(&kind)
            .map(|factory| Stage::new(kind, factory()))
    }
}
