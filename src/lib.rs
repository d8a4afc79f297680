//! Age calculator: validates a typed-in birth date, works out the elapsed
//! years, months and days, and reveals them with a slowing count-up.

pub mod age;
pub mod config;
pub mod reveal;
pub mod validate;
pub mod view;

pub use age::{AgeComponents, age_between};
pub use config::{Config, RevealDurations};
pub use reveal::{RevealCurve, RevealOutcome, reveal};
pub use validate::{Field, RawDateInput, ValidationError, ValidationErrors, validate};
pub use view::{AgeView, AgeViewState, Counter, Submission};
