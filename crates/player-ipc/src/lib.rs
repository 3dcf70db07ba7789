// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Transport-agnostic types forming the player core's external control
//! surface (§6.1, §6.2). No wire format is defined here — a daemon wires
//! these types to whatever protocol (socket line protocol, D-Bus, ...) it
//! speaks; the core only needs the typed shapes.

pub mod command;
pub mod song;
pub mod status;

pub use command::{OutputCommand, PlayerCommand, PlayerState};
pub use song::SongRef;
pub use status::{OutputStatus, Status};
