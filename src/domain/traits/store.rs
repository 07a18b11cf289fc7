use crate::application::errors::StorageError;
use crate::domain::entities::{Guild, User, Value};

/// Reserved guild key holding the ordered admin id list
pub const ADMIN_KEY: &str = "Admin";

/// Guild key holding the command prefix
pub const PREFIX_KEY: &str = "prefix";

/// Storage trait - scoped key/value capability shared by all commands
///
/// Every method is one atomic unit: implementations serialize all calls
/// through a single lock per store instance. Getters fall back to the
/// scope-wide default before reporting absence. Setters return an error only
/// when persistence fails; the in-memory mutation stands regardless.
pub trait Storage: Send + Sync {
    fn get_guild_value(&self, guild: &Guild, key: &str) -> Option<Value>;
    fn set_guild_value(&self, guild: &Guild, key: &str, value: Value) -> Result<(), StorageError>;
    fn set_default_guild_value(&self, key: &str, value: Value) -> Result<(), StorageError>;

    fn get_user_value(&self, user: &User, key: &str) -> Option<Value>;
    fn set_user_value(&self, user: &User, key: &str, value: Value) -> Result<(), StorageError>;
    fn set_default_user_value(&self, key: &str, value: Value) -> Result<(), StorageError>;

    fn get_global_value(&self, key: &str) -> Option<Value>;
    fn set_global_value(&self, key: &str, value: Value) -> Result<(), StorageError>;

    /// Fails with a corruption error if the `Admin` key is not a text list
    fn is_admin(&self, guild: &Guild, id: &str) -> Result<bool, StorageError>;
    /// Appends `id` to the guild's admin list; duplicates are kept
    fn set_admin(&self, guild: &Guild, id: &str) -> Result<(), StorageError>;
    /// Removes every occurrence of `id`
    fn unset_admin(&self, guild: &Guild, id: &str) -> Result<(), StorageError>;
}
