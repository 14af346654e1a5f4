//! Account authentication and the persisted credential cache.
//!
//! Both store clients share one [`CredentialCache`]: the secondary store
//! accepts sessions issued for the primary store's account. The cache is
//! loaded (or rebuilt through [`Authenticator::login`]) once by
//! [`bootstrap`] before any download starts, then only read.

mod bootstrap;
mod cache;
mod login;

pub use bootstrap::{BootstrapError, bootstrap};
pub use cache::{CacheError, CredentialCache, load_cache, store_cache};
pub use login::{Authenticator, LoginError, PasswordLogin};
