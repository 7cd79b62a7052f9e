//! Core business logic for the MWB audition backend.
//!
//! The pure pieces (code tables, identifiers, eligibility) have no I/O and can
//! be used on their own. Services tie them to the database, blob storage and
//! notification channels.

pub mod codes;
pub mod eligibility;
pub mod error;
pub mod identifier;
pub mod sequence;
pub mod services;

pub use error::{EligibilityError, IdentifierError};
pub use sequence::{
    DbSequenceAllocator, InMemorySequenceAllocator, SequenceAllocator, SequenceAllocatorService,
};
pub use services::*;
