// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Provides the SASL "ANONYMOUS" mechanism.

use crate::client::{Mechanism, MechanismError};
use crate::common::Credentials;

/// A struct for the SASL ANONYMOUS mechanism.
///
/// Any credentials are ignored, the server assigns a temporary identity.
pub struct Anonymous;

impl Anonymous {
    /// Constructs a new struct for authenticating using the SASL ANONYMOUS mechanism.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Anonymous {
        Anonymous
    }
}

impl Mechanism for Anonymous {
    fn name(&self) -> &str {
        "ANONYMOUS"
    }

    fn from_credentials(_credentials: Credentials) -> Result<Anonymous, MechanismError> {
        Ok(Anonymous)
    }
}
