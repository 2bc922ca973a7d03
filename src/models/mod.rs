pub mod session;
pub mod shop;

pub use session::{AccessToken, SessionClaims, TenantSession};
pub use shop::ShopDomain;
