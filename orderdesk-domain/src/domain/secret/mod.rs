use secrecy::SecretString;
use std::{
    collections::HashMap,
    fmt::{Debug, Formatter, Result as FmtResult},
};
use strum::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumString, AsRefStr, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum SecretKey {
    ConnectionString,
    Username,
    Password,
    Host,
    Database,
}

impl SecretKey {
    pub const DISCRETE: [SecretKey; 4] = [
        SecretKey::Username,
        SecretKey::Password,
        SecretKey::Host,
        SecretKey::Database,
    ];
}

/// Secrets resolved by a single bootstrap. Built once, never mutated afterwards.
#[derive(Clone, Default)]
pub struct SecretBundle {
    values: HashMap<SecretKey, SecretString>,
}

impl SecretBundle {
    pub fn from_connection_string(connection_string: SecretString) -> Self {
        Self {
            values: HashMap::from([(SecretKey::ConnectionString, connection_string)]),
        }
    }

    pub fn get(&self, key: SecretKey) -> Option<&SecretString> {
        self.values.get(&key)
    }

    pub fn has_discrete_fields(&self) -> bool {
        SecretKey::DISCRETE
            .iter()
            .all(|key| self.values.contains_key(key))
    }

    pub fn keys(&self) -> Vec<SecretKey> {
        let mut keys: Vec<SecretKey> = self.values.keys().copied().collect();
        keys.sort();
        keys
    }
}

impl FromIterator<(SecretKey, SecretString)> for SecretBundle {
    fn from_iter<T: IntoIterator<Item = (SecretKey, SecretString)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl Debug for SecretBundle {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_map()
            .entries(self.keys().into_iter().map(|key| (key, "****")))
            .finish()
    }
}
