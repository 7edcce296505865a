//! # Legitimi
//!
//! `legitimi` is a minimal credential-and-token authentication service. It
//! registers user identities, verifies username/password pairs, issues signed
//! bearer tokens bound to the stored credentials, and lets token-holders
//! read, rename, or delete their own record.
//!
//! ## Tokens
//!
//! A token is a signed encoding of `{name, credential}`, not a cached grant:
//! every use re-resolves the embedded pair against the live store, so any
//! credential change invalidates all previously issued tokens for that
//! identity. Tokens carry no expiry.
//!
//! ## Storage
//!
//! The credential store is an abstract keyed collection behind the
//! [`store::CredentialStore`] trait, with Postgres and in-memory backends.
//! Credentials are persisted only as SHA-256 digests.

pub mod auth;
pub mod cli;
pub mod legitimi;
pub mod store;
pub mod token;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
