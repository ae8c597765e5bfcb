pub mod firebase;
pub mod interface;

pub use interface::IdentityProvider;
