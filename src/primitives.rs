//! Pluggable cryptographic primitives.
//!
//! Every derivation entry point takes a [`Primitives`] by shared reference.
//! By default it runs the crate's own `hmac`/`pbkdf2`-backed implementations;
//! a caller may override either function (e.g. to hand derivation off to a
//! hardware-backed or WebCrypto-style implementation) without changing the
//! result, since both paths must be byte-identical.
//!
//! `Primitives` is cheap to clone (it only clones `Arc`s) and is never stashed
//! in a singleton — it is threaded through every call instead.

use std::sync::Arc;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;

use crate::error::{KeytreeError, KeytreeResult};

type HmacSha512 = Hmac<Sha512>;

/// Host-pluggable HMAC-SHA-512.
#[async_trait]
pub trait HmacSha512Fn: Send + Sync {
    async fn hmac_sha512(&self, key: &[u8], data: &[u8]) -> KeytreeResult<[u8; 64]>;
}

/// Host-pluggable PBKDF2-SHA-512.
#[async_trait]
pub trait Pbkdf2Sha512Fn: Send + Sync {
    async fn pbkdf2_sha512(
        &self,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        key_length: usize,
    ) -> KeytreeResult<Vec<u8>>;
}

/// Default HMAC-SHA-512, backed by the `hmac`/`sha2` crates.
struct DefaultHmac;

#[async_trait]
impl HmacSha512Fn for DefaultHmac {
    async fn hmac_sha512(&self, key: &[u8], data: &[u8]) -> KeytreeResult<[u8; 64]> {
        let mut mac = HmacSha512::new_from_slice(key)
            .map_err(|e| KeytreeError::InvalidParameters(format!("HMAC key error: {e}")))?;
        mac.update(data);
        let out = mac.finalize().into_bytes();
        let mut result = [0u8; 64];
        result.copy_from_slice(&out);
        Ok(result)
    }
}

/// Default PBKDF2-SHA-512, backed by the `pbkdf2` crate.
struct DefaultPbkdf2;

#[async_trait]
impl Pbkdf2Sha512Fn for DefaultPbkdf2 {
    async fn pbkdf2_sha512(
        &self,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        key_length: usize,
    ) -> KeytreeResult<Vec<u8>> {
        let mut out = vec![0u8; key_length];
        pbkdf2_hmac::<Sha512>(password, salt, iterations, &mut out);
        Ok(out)
    }
}

/// Pluggable-primitives bundle passed through every derivation entry point.
#[derive(Clone)]
pub struct Primitives {
    hmac: Arc<dyn HmacSha512Fn>,
    pbkdf2: Arc<dyn Pbkdf2Sha512Fn>,
}

impl Default for Primitives {
    fn default() -> Self {
        Self {
            hmac: Arc::new(DefaultHmac),
            pbkdf2: Arc::new(DefaultPbkdf2),
        }
    }
}

impl Primitives {
    /// Use the crate's built-in implementations for both functions.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Override the HMAC-SHA-512 implementation.
    pub fn with_hmac(mut self, hmac: Arc<dyn HmacSha512Fn>) -> Self {
        self.hmac = hmac;
        self
    }

    /// Override the PBKDF2-SHA-512 implementation.
    pub fn with_pbkdf2(mut self, pbkdf2: Arc<dyn Pbkdf2Sha512Fn>) -> Self {
        self.pbkdf2 = pbkdf2;
        self
    }

    pub(crate) async fn hmac_sha512(&self, key: &[u8], data: &[u8]) -> KeytreeResult<[u8; 64]> {
        self.hmac.hmac_sha512(key, data).await
    }

    pub(crate) async fn pbkdf2_sha512(
        &self,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        key_length: usize,
    ) -> KeytreeResult<Vec<u8>> {
        self.pbkdf2
            .pbkdf2_sha512(password, salt, iterations, key_length)
            .await
    }
}
