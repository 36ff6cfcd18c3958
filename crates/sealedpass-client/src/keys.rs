//! Process-wide key store with atomic rotation.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use sealedpass_auth::{AuthError, JwkSet, KeyStore};

/// A [`KeyStore`] shared by every flow, replaceable without locking.
///
/// Flows take one [`snapshot`](Self::snapshot) when they start and keep it
/// until they finish; a rotation only affects flows started afterwards.
#[derive(Clone)]
pub struct SharedKeyStore {
    active: Arc<ArcSwap<KeyStore>>,
}

impl SharedKeyStore {
    pub fn new(keys: KeyStore) -> Self {
        Self {
            active: Arc::new(ArcSwap::from_pointee(keys)),
        }
    }

    /// The key store current at the time of the call.
    pub fn snapshot(&self) -> Arc<KeyStore> {
        self.active.load_full()
    }

    /// Install `keys` for new flows and return the store it replaced.
    pub fn rotate(&self, keys: KeyStore) -> Arc<KeyStore> {
        self.active.swap(Arc::new(keys))
    }

    /// Public halves of the current keys, for the relying party's `jwks_uri`.
    pub fn public_jwks(&self) -> Result<JwkSet, AuthError> {
        self.active.load().public_jwks()
    }
}

impl fmt::Debug for SharedKeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys = self.active.load();
        f.debug_struct("SharedKeyStore")
            .field("signing_kid", &keys.signing_key().kid())
            .field("encryption_kid", &keys.encryption_key().kid())
            .finish()
    }
}
