//! SeaORM entity definitions for the nestsync database schema.

pub mod collection;
pub mod membership;
pub mod preference;
pub mod prelude;
pub mod property;
pub mod sync_run;
