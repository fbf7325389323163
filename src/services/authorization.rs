// SPDX-License-Identifier: MPL-2.0

//! Media access authorization

use crate::backends::MediaKind;
use futures::future::BoxFuture;

/// Current authorization state for a media kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStatus {
    /// The user granted access
    Authorized,
    /// The user denied access; terminal until they change settings
    Denied,
    /// The user has not been asked yet; resolved by [`AuthorizationService::request_access`]
    NotDetermined,
}

/// Host authorization prompts.
///
/// `request_access` may take arbitrarily long (it is a user prompt); the
/// session worker suspends all queued work until it resolves.
pub trait AuthorizationService: Send + 'static {
    /// Current status without prompting
    fn status(&self, kind: MediaKind) -> AccessStatus;

    /// Prompt the user; resolves to whether access was granted
    fn request_access(&self, kind: MediaKind) -> BoxFuture<'static, bool>;
}

/// Authorization service that grants everything, for hosts without a
/// permission model
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysAuthorized;

impl AuthorizationService for AlwaysAuthorized {
    fn status(&self, _kind: MediaKind) -> AccessStatus {
        AccessStatus::Authorized
    }

    fn request_access(&self, _kind: MediaKind) -> BoxFuture<'static, bool> {
        Box::pin(async { true })
    }
}
