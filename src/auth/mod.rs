pub mod credentials;
pub mod token;

pub use credentials::{Side, TenantConfig};
pub use token::TokenProvider;
