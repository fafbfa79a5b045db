//! Policy data model: attack events, recipes, HSPLs and MSPLs, plus the
//! set-algebra optimizer that keeps HSPL sets minimal.

pub mod endpoint;
pub mod error;
pub mod hspl;
pub mod landscape;
pub mod model;
pub mod mspl;
pub mod optimize;
pub mod recipe;
pub mod xml;

pub use error::{PolicyError, Result};
pub use hspl::{Hspl, HsplContext, HsplSet, HsplTrafficConstraints};
pub use landscape::Landscape;
pub use model::{Attack, AttackEvent, FieldValue};
pub use mspl::{FilteringConfiguration, FilteringRule, ItResource, MsplContext, MsplSet, RuleSpec};
pub use optimize::{optimize, OptimizeConfig, OptimizeStats};
pub use recipe::{Evaluation, Filters, ObjectConstraints, Recipe, RecipeSet, TrafficConstraints};
