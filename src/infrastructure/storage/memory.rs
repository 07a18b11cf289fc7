use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::application::errors::{CorruptionError, StorageError};
use crate::domain::entities::{Guild, User, Value};
use crate::domain::traits::{Storage, ADMIN_KEY};

/// service id -> guild id or user name -> key -> value
pub type ScopeMap = BTreeMap<String, BTreeMap<String, BTreeMap<String, Value>>>;

/// Full scoped-value state, as persisted
///
/// Scopes are nested by component rather than joined into one string key, so
/// ids containing any separator character can never alias another tenant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub guild_defaults: BTreeMap<String, Value>,
    #[serde(default)]
    pub user_defaults: BTreeMap<String, Value>,
    #[serde(default)]
    pub guilds: ScopeMap,
    #[serde(default)]
    pub users: ScopeMap,
    #[serde(default)]
    pub global: BTreeMap<String, Value>,
}

fn scoped_get<'a>(map: &'a ScopeMap, service: &str, id: &str, key: &str) -> Option<&'a Value> {
    map.get(service)
        .and_then(|ids| ids.get(id))
        .and_then(|values| values.get(key))
}

fn scoped_set(map: &mut ScopeMap, service: &str, id: &str, key: &str, value: Value) {
    map.entry(service.to_string())
        .or_default()
        .entry(id.to_string())
        .or_default()
        .insert(key.to_string(), value);
}

impl Snapshot {
    /// True when no scoped or global value is stored
    pub fn is_empty(&self) -> bool {
        self.guilds.is_empty() && self.users.is_empty() && self.global.is_empty()
    }

    fn guild_value(&self, guild: &Guild, key: &str) -> Option<&Value> {
        scoped_get(&self.guilds, &guild.service_id, &guild.guild_id, key)
            .or_else(|| self.guild_defaults.get(key))
    }

    fn set_guild(&mut self, guild: &Guild, key: &str, value: Value) {
        scoped_set(&mut self.guilds, &guild.service_id, &guild.guild_id, key, value);
    }

    fn user_value(&self, user: &User, key: &str) -> Option<&Value> {
        scoped_get(&self.users, &user.service_id, &user.name, key)
            .or_else(|| self.user_defaults.get(key))
    }

    fn admins(&self, guild: &Guild) -> Result<Vec<String>, CorruptionError> {
        match self.guild_value(guild, ADMIN_KEY) {
            None => Ok(Vec::new()),
            Some(value) => value
                .as_text_list()
                .map(|ids| ids.to_vec())
                .ok_or_else(|| CorruptionError {
                    scope: format!("guild {}", guild),
                    key: ADMIN_KEY.to_string(),
                    expected: "text list",
                    found: value.kind(),
                }),
        }
    }
}

/// Thread-safe in-memory scoped store
///
/// One mutex guards the whole state, so composite read-modify-write
/// operations such as `set_admin` are atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            state: Mutex::new(snapshot),
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> Snapshot {
        self.lock().clone()
    }

    // Every critical section leaves the maps consistent, so a poisoned lock
    // is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Snapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Storage for MemoryStore {
    fn get_guild_value(&self, guild: &Guild, key: &str) -> Option<Value> {
        self.lock().guild_value(guild, key).cloned()
    }

    fn set_guild_value(&self, guild: &Guild, key: &str, value: Value) -> Result<(), StorageError> {
        self.lock().set_guild(guild, key, value);
        Ok(())
    }

    fn set_default_guild_value(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.lock().guild_defaults.insert(key.to_string(), value);
        Ok(())
    }

    fn get_user_value(&self, user: &User, key: &str) -> Option<Value> {
        self.lock().user_value(user, key).cloned()
    }

    fn set_user_value(&self, user: &User, key: &str, value: Value) -> Result<(), StorageError> {
        let mut state = self.lock();
        scoped_set(&mut state.users, &user.service_id, &user.name, key, value);
        Ok(())
    }

    fn set_default_user_value(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.lock().user_defaults.insert(key.to_string(), value);
        Ok(())
    }

    fn get_global_value(&self, key: &str) -> Option<Value> {
        self.lock().global.get(key).cloned()
    }

    fn set_global_value(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.lock().global.insert(key.to_string(), value);
        Ok(())
    }

    fn is_admin(&self, guild: &Guild, id: &str) -> Result<bool, StorageError> {
        let admins = self.lock().admins(guild)?;
        Ok(admins.iter().any(|a| a == id))
    }

    fn set_admin(&self, guild: &Guild, id: &str) -> Result<(), StorageError> {
        let mut state = self.lock();
        let mut admins = state.admins(guild)?;
        admins.push(id.to_string());
        state.set_guild(guild, ADMIN_KEY, Value::TextList(admins));
        Ok(())
    }

    fn unset_admin(&self, guild: &Guild, id: &str) -> Result<(), StorageError> {
        let mut state = self.lock();
        let mut admins = state.admins(guild)?;
        admins.retain(|a| a != id);
        state.set_guild(guild, ADMIN_KEY, Value::TextList(admins));
        Ok(())
    }
}
