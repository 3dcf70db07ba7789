// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Output subsystem: one worker thread per configured device, each applying
//! a filter chain and obeying the §4.4 command table.

mod source;
mod state;
mod thread;

pub use source::{OutputSource, ReplayGainLookup};
pub use state::OutputControl;
pub use thread::{Output, DEFAULT_FAIL_TIMER};
