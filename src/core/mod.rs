pub mod config;
pub mod error;
pub mod modifiers;
pub mod random;
pub mod types;

pub use config::SimulationConfig;
pub use error::{OrdnanceError, Result};
pub use modifiers::{apply_percentage_modifiers, ModifierKind, ModifierTrait, ShotModifiers};
pub use random::{CosmeticRandom, SharedRandom};
pub use types::{ActorId, EffectId, PlayerId, Relationship, RelationshipSet, TargetTypes, Tick};
