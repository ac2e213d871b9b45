use crate::error::{PanelError, Result};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};
use x25519_dalek::{PublicKey, StaticSecret};

/// Derives a stable X25519 private scalar from arbitrary seed bytes.
pub fn derive_x25519(seed: &[u8]) -> [u8; 32] {
    let mut key: [u8; 32] = Sha256::digest(seed).into();

    // Clamp the key to be a valid X25519 private key
    key[0] &= 248;
    key[31] &= 127;
    key[31] |= 64;

    key
}

/// Reality private key for a node, a pure function of its type and token,
/// so restarts reproduce the same key without panel-side state.
pub fn derive_reality_key(node_type: &str, token: &str) -> String {
    let mut seed = Vec::with_capacity(node_type.len() + token.len());
    seed.extend_from_slice(node_type.as_bytes());
    seed.extend_from_slice(token.as_bytes());
    URL_SAFE_NO_PAD.encode(derive_x25519(&seed))
}

/// Public half of a base64url (unpadded) Reality private key.
pub fn reality_public_key(private_key: &str) -> Result<String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(private_key.trim())
        .map_err(|e| PanelError::RealityKey(e.to_string()))?;
    let key_arr: [u8; 32] = bytes
        .try_into()
        .map_err(|b: Vec<u8>| PanelError::RealityKey(format!("expected 32 bytes, got {}", b.len())))?;

    let secret = StaticSecret::from(key_arr);
    let public = PublicKey::from(&secret);
    Ok(URL_SAFE_NO_PAD.encode(public.as_bytes()))
}
