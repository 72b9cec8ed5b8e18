use blake3::Hasher;
use pqcrypto_dilithium::dilithium3::{
    self, DetachedSignature, PublicKey, SecretKey, keypair,
};

pub const DILITHIUM3_PK_BYTES: usize = pqcrypto_dilithium::ffi::PQCLEAN_DILITHIUM3_CLEAN_CRYPTO_PUBLICKEYBYTES;

/// A 32-byte address, derived from a BLAKE3 hash of a set of spend conditions.
pub type Address = [u8; 32];

/// Hashes `data` under an explicit derivation context, so addresses,
/// transaction ids and output ids never collide with each other.
pub fn domain_hash(context: &str, data: &[u8]) -> [u8; 32] {
    *Hasher::new_derive_key(context).update(data).finalize().as_bytes()
}

pub fn dilithium3_keypair() -> (PublicKey, SecretKey) {
    keypair()
}

pub fn sign(message: &[u8], sk: &SecretKey) -> DetachedSignature {
    dilithium3::detached_sign(message, sk)
}

pub fn verify(message: &[u8], signature: &DetachedSignature, pk: &PublicKey) -> bool {
    dilithium3::verify_detached_signature(signature, message, pk).is_ok()
}

/// Short hex prefix for log lines.
pub fn short_hex(bytes: &[u8; 32]) -> String {
    hex::encode(&bytes[..6])
}
