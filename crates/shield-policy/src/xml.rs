//! XML namespace constants shared by the recipe, HSPL and MSPL schemas
//! (spec §6).

pub const RECIPE_NAMESPACE: &str = "http://security.polito.it/shield/recipe";
pub const HSPL_NAMESPACE: &str = "http://security.polito.it/shield/hspl";
pub const MSPL_NAMESPACE: &str = "http://security.polito.it/shield/mspl";
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
