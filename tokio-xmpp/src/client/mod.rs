// Copyright (c) 2019 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Client-side stream logic: IQ response tracking and SASL authentication.

pub mod iq;
mod login;

pub use login::{negotiate_mechanisms, SaslNegotiator, DEFAULT_MECHANISMS};
