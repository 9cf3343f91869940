// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

mod backend;
mod bridge;
mod catalog;
mod config;
mod dispatcher;
mod error;
mod machine;
mod publisher;
mod runner;
mod settings;
mod transport;

pub use backend::*;
pub use bridge::*;
pub use catalog::*;
pub use config::*;
pub use dispatcher::*;
pub use error::*;
pub use machine::*;
pub use publisher::*;
pub use runner::*;
pub use settings::*;
pub use transport::*;

pub use crate::spec::{
    Approach, BridgeFrame, ErrorEnvelope, Health, InboundCommand, MachineState, OutboundStatus,
    Stability, StatusReport, Tension, RUN_SCENARIO, UNKNOWN_REQUEST_ID,
};
