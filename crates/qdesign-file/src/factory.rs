use indexmap::IndexMap;
use qdesign_core::library::{CpwStraight, RectanglePad};
use qdesign_core::{Component, ComponentBase};

use crate::error::Error;

/// Builds a component of one class from its saved name and options.
pub type Constructor = fn(ComponentBase) -> Box<dyn Component>;

/// Component constructors keyed by class name, used to bring saved components back to life.
#[derive(Debug, Clone, Default)]
pub struct ComponentFactory {
    constructors: IndexMap<String, Constructor>,
}

impl ComponentFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory knowing every class in [`qdesign_core::library`].
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut factory = Self::new();
        factory.register(RectanglePad::CLASS, |base| {
            Box::new(RectanglePad::from_base(base))
        });
        factory.register(CpwStraight::CLASS, |base| {
            Box::new(CpwStraight::from_base(base))
        });
        factory
    }

    /// Registers `constructor` for `class`, replacing any earlier one.
    pub fn register(&mut self, class: impl Into<String>, constructor: Constructor) {
        self.constructors.insert(class.into(), constructor);
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn create(&self, class: &str, base: ComponentBase) -> Result<Box<dyn Component>, Error> {
        let constructor = self
            .constructors
            .get(class)
            .ok_or_else(|| Error::UnknownComponentClass {
                class: class.to_string(),
                name: base.name.clone(),
            })?;
        Ok(constructor(base))
    }
}
