// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Payload splitting between the engine and the plugin pipeline.

use serde_json::Value;
use stint_core::PayloadError;
use stint_engine::Engine;
use stint_plugins::{Plugin, PluginError};
use thiserror::Error;

/// Why a payload could not be split.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("engine payload rejected: {0}")]
    Engine(#[source] PayloadError),
    #[error("could not derive plugin payload schema: {0}")]
    PluginSchema(#[source] PluginError),
    #[error("plugin payload rejected: {0}")]
    Plugins(#[source] PayloadError),
}

/// Split one payload object between the two schema owners.
///
/// Both schemas read the same object, engine first; neither sees the
/// other's output. Either rejection fails the task before any sandbox
/// work.
pub fn split_payload(
    engine: &dyn Engine,
    plugins: &dyn Plugin,
    payload: &Value,
) -> Result<(Value, Value), DispatchError> {
    let object = payload.as_object().ok_or(DispatchError::NotAnObject)?;

    let engine_payload = engine
        .payload_schema()
        .parse(object)
        .map_err(DispatchError::Engine)?;

    let plugin_schema = plugins
        .payload_schema()
        .map_err(DispatchError::PluginSchema)?;
    let plugin_payload = plugin_schema
        .parse(object)
        .map_err(DispatchError::Plugins)?;

    Ok((engine_payload, plugin_payload))
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
