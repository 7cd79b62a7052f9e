//! Database entities.

#![allow(missing_docs)]

pub mod category_sequence;
pub mod contestant;
pub mod registration;
pub mod vote;

pub use category_sequence::Entity as CategorySequence;
pub use contestant::Entity as Contestant;
pub use registration::Entity as Registration;
pub use vote::Entity as Vote;
