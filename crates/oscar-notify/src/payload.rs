//! Encrypted admin request bodies.
//!
//! MinIO only accepts configuration changes whose body is sealed with a key
//! derived from the admin secret key. The layout is
//!
//! ```text
//! salt (32) | AEAD id (1) | nonce (8) | sealed fragments
//! ```
//!
//! The key is Argon2id(secret, salt) with t=1, m=64 MiB, p=4. The
//! plaintext is cut into 16 KiB fragments, each sealed with AES-256-GCM.
//! Fragment `i` uses the nonce `nonce || le32(i + 1)` and the associated
//! data `flag || tag`. `flag` is `0x80` on the last fragment and `0x00`
//! otherwise. `tag` is the AEAD tag of an empty message under sequence
//! number 0, which binds every fragment to the stream.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;

use crate::error::AdminApiError;

const SALT_LEN: usize = 32;
const NONCE_LEN: usize = 8;
const HEADER_LEN: usize = SALT_LEN + 1 + NONCE_LEN;
const TAG_LEN: usize = 16;
const FRAGMENT_LEN: usize = 16 * 1024;

/// AEAD id for an Argon2id-derived key with AES-256-GCM.
const ARGON2ID_AES_GCM: u8 = 0x00;

const FLAG_FINAL: u8 = 0x80;

/// Encrypt an admin request body with `password` (the admin secret key).
pub fn encrypt_data(password: &str, data: &[u8]) -> Result<Vec<u8>, AdminApiError> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    let mut rng = rand::thread_rng();
    rng.fill_bytes(&mut salt);
    rng.fill_bytes(&mut nonce);

    let cipher = derive_cipher(password, &salt)?;
    let capacity = HEADER_LEN + data.len() + fragment_count(data.len()) * TAG_LEN;
    let mut out = Vec::with_capacity(capacity);
    out.extend_from_slice(&salt);
    out.push(ARGON2ID_AES_GCM);
    out.extend_from_slice(&nonce);
    seal_stream(&cipher, &nonce, data, &mut out)?;
    Ok(out)
}

/// Decrypt a body produced by [`encrypt_data`] or by a MinIO server.
pub fn decrypt_data(password: &str, data: &[u8]) -> Result<Vec<u8>, AdminApiError> {
    if data.len() < HEADER_LEN + TAG_LEN {
        return Err(encryption("payload too short"));
    }
    let (salt, rest) = data.split_at(SALT_LEN);
    let (id, rest) = rest.split_at(1);
    let (nonce, sealed) = rest.split_at(NONCE_LEN);
    if id[0] != ARGON2ID_AES_GCM {
        return Err(encryption(format!("unsupported AEAD id {:#04x}", id[0])));
    }

    let cipher = derive_cipher(password, salt)?;
    let nonce: [u8; NONCE_LEN] = nonce
        .try_into()
        .map_err(|_| encryption("malformed nonce"))?;
    open_stream(&cipher, &nonce, sealed)
}

fn derive_cipher(password: &str, salt: &[u8]) -> Result<Aes256Gcm, AdminApiError> {
    let params = Params::new(64 * 1024, 1, 4, Some(32)).map_err(encryption)?;
    let mut key = [0u8; 32];
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(encryption)?;
    Aes256Gcm::new_from_slice(&key).map_err(encryption)
}

/// Plaintext fragments in a stream; an empty body is one empty fragment.
fn fragment_count(len: usize) -> usize {
    len.div_ceil(FRAGMENT_LEN).max(1)
}

fn fragment_nonce(nonce: &[u8; NONCE_LEN], seq: u32) -> [u8; NONCE_LEN + 4] {
    let mut full = [0u8; NONCE_LEN + 4];
    full[..NONCE_LEN].copy_from_slice(nonce);
    full[NONCE_LEN..].copy_from_slice(&seq.to_le_bytes());
    full
}

/// Associated data shared by all fragments, minus the flag byte.
fn stream_tag(cipher: &Aes256Gcm, nonce: &[u8; NONCE_LEN]) -> Result<Vec<u8>, AdminApiError> {
    let nonce = fragment_nonce(nonce, 0);
    cipher
        .encrypt(Nonce::from_slice(&nonce), Payload { msg: &[], aad: &[] })
        .map_err(encryption)
}

fn seal_stream(
    cipher: &Aes256Gcm,
    nonce: &[u8; NONCE_LEN],
    data: &[u8],
    out: &mut Vec<u8>,
) -> Result<(), AdminApiError> {
    let mut aad = vec![0x00];
    aad.extend(stream_tag(cipher, nonce)?);

    let count = fragment_count(data.len());
    let mut fragments = data.chunks(FRAGMENT_LEN);
    for i in 0..count {
        let fragment = fragments.next().unwrap_or_default();
        if i + 1 == count {
            aad[0] = FLAG_FINAL;
        }
        let seq = u32::try_from(i + 1).map_err(|_| encryption("payload too large"))?;
        let sealed = cipher
            .encrypt(
                Nonce::from_slice(&fragment_nonce(nonce, seq)),
                Payload { msg: fragment, aad: aad.as_slice() },
            )
            .map_err(encryption)?;
        out.extend_from_slice(&sealed);
    }
    Ok(())
}

fn open_stream(
    cipher: &Aes256Gcm,
    nonce: &[u8; NONCE_LEN],
    sealed: &[u8],
) -> Result<Vec<u8>, AdminApiError> {
    let mut aad = vec![0x00];
    aad.extend(stream_tag(cipher, nonce)?);

    let fragments: Vec<&[u8]> = sealed.chunks(FRAGMENT_LEN + TAG_LEN).collect();
    let mut out = Vec::with_capacity(sealed.len());
    for (i, fragment) in fragments.iter().copied().enumerate() {
        if i + 1 == fragments.len() {
            aad[0] = FLAG_FINAL;
        }
        let seq = u32::try_from(i + 1).map_err(|_| encryption("payload too large"))?;
        let plain = cipher
            .decrypt(
                Nonce::from_slice(&fragment_nonce(nonce, seq)),
                Payload { msg: fragment, aad: aad.as_slice() },
            )
            .map_err(encryption)?;
        out.extend_from_slice(&plain);
    }
    Ok(out)
}

fn encryption(err: impl std::fmt::Display) -> AdminApiError {
    AdminApiError::Encryption(err.to_string())
}
