// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The player subsystem: a single control thread driving decoder bridges and
//! outputs through gapless and cross-fade transitions (§4.3).

mod control;
mod crossfade;
mod state;
mod thread;

pub use control::PlayerControl;
pub use thread::{spawn, PlayerConfig, StreamOpener};
