//! Key material behind one receiving address.

use pqcrypto_dilithium::dilithium3::{DetachedSignature, PublicKey, SecretKey};
use pqcrypto_traits::sign::PublicKey as _;

use crate::crypto::{self, Address};
use crate::transaction::SpendConditions;

/// A generated key pair together with the spend conditions it satisfies.
/// The secret key never leaves this struct; callers get signatures instead.
pub struct SpendAuthority {
    address: Address,
    spend_conditions: SpendConditions,
    pk: PublicKey,
    sk: SecretKey,
}

impl SpendAuthority {
    /// Generates a fresh key pair and wraps it in 1-of-1 spend conditions.
    pub fn generate() -> Self {
        let (pk, sk) = crypto::dilithium3_keypair();
        let spend_conditions = SpendConditions::single(pk.as_bytes().to_vec());
        let address = spend_conditions.address();
        SpendAuthority { address, spend_conditions, pk, sk }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn spend_conditions(&self) -> &SpendConditions {
        &self.spend_conditions
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.pk
    }

    /// Signs a message using the authority's secret key, returning the detached signature.
    pub fn sign(&self, message: &[u8]) -> DetachedSignature {
        crypto::sign(message, &self.sk)
    }

    pub fn verify(&self, message: &[u8], signature: &DetachedSignature) -> bool {
        crypto::verify(message, signature, &self.pk)
    }
}

impl std::fmt::Debug for SpendAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpendAuthority")
            .field("address", &hex::encode(self.address))
            .field("num_signatures", &self.spend_conditions.num_signatures)
            .finish_non_exhaustive()
    }
}
