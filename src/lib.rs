//! Precache - precompute every result of a function with a finite domain
//!
//! Functions whose parameters all range over enumerations or fixed value
//! sets are registered with a [`Precomputer`]. A run evaluates every
//! combination of parameter values once, persists the results in a JSON
//! store, and skips combinations already cached by earlier runs. Each
//! registration returns a [`CacheFront`] that answers live calls from the
//! store without invoking the function.
//!
//! ```rust,no_run
//! use precache::{Arguments, DomainValue, PersistentStore, Precomputer, Signature};
//! use std::sync::Arc;
//!
//! precache::finite_enum! {
//!     pub enum Region {
//!         Emea = "EMEA",
//!         Apac = "APAC",
//!     }
//! }
//!
//! # async fn demo() -> precache::PrecacheResult<()> {
//! let store = Arc::new(PersistentStore::new("store.json"));
//! let mut engine = Precomputer::new(store);
//!
//! let sales = engine.wrap(
//!     Signature::new("sales_report")
//!         .enumeration::<Region>("region")
//!         .literal("store", [101, 202]),
//!     |args: Arguments| async move {
//!         Ok::<_, String>(args.int("store").unwrap_or_default() * 10)
//!     },
//! )?;
//!
//! engine.run().await?;
//! let total: i64 = sales
//!     .call([("region", DomainValue::from("APAC")), ("store", 101.into())])
//!     .await?;
//! # let _ = total;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod combination;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod front;
pub mod journal;
pub mod key;
pub mod store;
pub mod target;
pub mod ui;

pub use combination::{Arguments, Combination};
pub use config::{Config, ConfigManager};
pub use domain::{DomainValue, Enumerable, ParameterSpec, Signature};
pub use engine::{FunctionSummary, Precomputer, RunOutcome, RunReport};
pub use error::{PrecacheError, PrecacheResult};
pub use front::CacheFront;
pub use key::CacheKey;
pub use store::{CacheStore, PersistentStore};
pub use target::{FnTarget, TargetFunction};
