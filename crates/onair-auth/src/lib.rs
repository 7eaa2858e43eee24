//! Delegated authorization for the presence service.
//!
//! Implements the PKCE authorization-code flow, token refresh and
//! revocation, durable token storage, and the [`TokenBroker`] that the
//! rest of the system asks for "the current access token". Token changes
//! are announced on the shared [`onair_common::EventBus`].

mod broker;
mod client;
mod launcher;
mod pkce;
mod storage;

pub use broker::TokenBroker;
pub use client::{OAuthClient, TokenEndpoint, TokenGrant};
pub use launcher::{code_from_redirect, AuthorizationLauncher, StdinLauncher};
pub use pkce::PkcePair;
pub use storage::{StoredTokens, TokenStore};
