// Opusmux
// Copyright (c) 2026 The Opusmux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `io` module implements the byte cursor used by every parser in the workspace.
//!
//! All input is a complete in-memory buffer, so there is no stream abstraction. Parsers thread a
//! [`BufReader`] value through each step instead of sharing mutable position state.

mod buf_reader;

pub use buf_reader::BufReader;
