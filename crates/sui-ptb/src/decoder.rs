// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Read-only rendering of a programmable transaction into the flat structure
//! presentation layers consume.
//!
//! Pure inputs carry no type information on the wire, so telling "bytes meant
//! to be shown as a blob" apart from "a scalar that happens to serialize to
//! bytes" is a heuristic. The rules, applied in order:
//!
//! 1. object inputs are `AddressOrObject`, rendered as the object id;
//! 2. 32 byte pure inputs are `AddressOrObject`, rendered as an address;
//! 3. pure inputs that decode exactly as a non-empty BCS `vector<u8>` are
//!    `RawBytes`, rendered as base64 of the vector contents, unless their
//!    length is also a scalar width (1, 2, 4, 8 or 16 bytes);
//! 4. everything else is `AddressOrObject`, rendered as a little endian
//!    unsigned integer for scalar widths and as hex otherwise.
//!
//! Ambiguous payloads always fall back to rule 4 and are logged, never
//! rejected.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::base_types::SUI_ADDRESS_LENGTH;
use crate::sui_serde::encode_base64;
use crate::transaction::{Argument, CallArg, Command, CommandKind, ProgrammableTransaction};

#[cfg(test)]
#[path = "unit_tests/decoder_tests.rs"]
mod decoder_tests;

const SCALAR_WIDTHS: [usize; 5] = [1, 2, 4, 8, 16];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputClassification {
    /// Opaque bytes, rendered as base64.
    RawBytes,
    /// An address, an object id, or a scalar rendered as text.
    AddressOrObject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedInput {
    pub index: usize,
    pub classification: InputClassification,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedCommand {
    pub index: usize,
    pub kind: CommandKind,
    pub arguments: String,
}

impl DecodedCommand {
    pub fn name(&self) -> &'static str {
        self.kind.into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedTransaction {
    pub inputs: Vec<DecodedInput>,
    pub commands: Vec<DecodedCommand>,
}

impl Display for DecodedTransaction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Inputs:")?;
        for input in &self.inputs {
            let tag = match input.classification {
                InputClassification::RawBytes => "bytes",
                InputClassification::AddressOrObject => "value",
            };
            writeln!(f, "  {:>3} [{tag}] {}", input.index, input.text)?;
        }
        writeln!(f, "Commands:")?;
        for command in &self.commands {
            writeln!(
                f,
                "  {:>3} {}({})",
                command.index,
                command.name(),
                command.arguments
            )?;
        }
        Ok(())
    }
}

/// Render every input and command of `tx`, in table order.
pub fn decode(tx: &ProgrammableTransaction) -> DecodedTransaction {
    let inputs = tx
        .inputs
        .iter()
        .enumerate()
        .map(|(index, arg)| {
            let (classification, text) = classify_input(index, arg);
            DecodedInput {
                index,
                classification,
                text,
            }
        })
        .collect();
    let commands = tx
        .commands
        .iter()
        .enumerate()
        .map(|(index, command)| DecodedCommand {
            index,
            kind: command.kind(),
            arguments: render_arguments(command),
        })
        .collect();
    DecodedTransaction { inputs, commands }
}

pub fn classify_input(index: usize, arg: &CallArg) -> (InputClassification, String) {
    let bytes = match arg {
        CallArg::Object(obj) => {
            return (InputClassification::AddressOrObject, obj.id().to_string());
        }
        CallArg::Pure(bytes) => bytes,
    };
    let as_vector = bcs::from_bytes::<Vec<u8>>(bytes)
        .ok()
        .filter(|inner| !inner.is_empty());

    if bytes.len() == SUI_ADDRESS_LENGTH {
        if as_vector.is_some() {
            debug!(
                index,
                "32 byte pure input also decodes as a byte vector, rendering as an address"
            );
        }
        return (
            InputClassification::AddressOrObject,
            format!("0x{}", hex::encode(bytes)),
        );
    }
    match as_vector {
        Some(inner) if !SCALAR_WIDTHS.contains(&bytes.len()) => {
            (InputClassification::RawBytes, encode_base64(&inner))
        }
        Some(_) => {
            debug!(
                index,
                len = bytes.len(),
                "Pure input is ambiguous between a byte vector and a scalar, rendering as a scalar"
            );
            (InputClassification::AddressOrObject, render_scalar(bytes))
        }
        None => (InputClassification::AddressOrObject, render_scalar(bytes)),
    }
}

fn render_scalar(bytes: &[u8]) -> String {
    if SCALAR_WIDTHS.contains(&bytes.len()) {
        let mut le = [0u8; 16];
        le[..bytes.len()].copy_from_slice(bytes);
        u128::from_le_bytes(le).to_string()
    } else {
        format!("0x{}", hex::encode(bytes))
    }
}

/// Array slots are joined element-wise (objects as JSON, scalars as-is),
/// scalar slots are JSON-stringified, and slots are separated by `, `.
pub fn render_arguments(command: &Command) -> String {
    argument_slots(command)
        .iter()
        .map(|slot| match slot {
            Value::Array(elements) => elements
                .iter()
                .map(|element| match element {
                    Value::String(s) => s.clone(),
                    Value::Object(_) | Value::Array(_) => element.to_string(),
                    scalar => scalar.to_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            scalar => scalar.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn argument_slots(command: &Command) -> Vec<Value> {
    let args = |args: &[Argument]| Value::Array(args.iter().map(argument_json).collect());
    match command {
        Command::MoveCall(call) => {
            let mut target = format!("{}::{}::{}", call.package, call.module, call.function);
            if !call.type_arguments.is_empty() {
                target = format!("{target}<{}>", call.type_arguments.join(","));
            }
            vec![json!(target), args(&call.arguments)]
        }
        Command::TransferObjects(objects, recipient) => {
            vec![args(objects), argument_json(recipient)]
        }
        Command::SplitCoins(coin, amounts) => vec![argument_json(coin), args(amounts)],
        Command::MergeCoins(target, sources) => vec![argument_json(target), args(sources)],
        Command::Publish(modules, deps) => vec![
            json!(modules.iter().map(|m| encode_base64(m)).collect::<Vec<_>>()),
            json!(deps.iter().map(|d| d.to_string()).collect::<Vec<_>>()),
        ],
        Command::MakeMoveVec(type_, elements) => vec![json!(type_), args(elements)],
        Command::Upgrade(modules, deps, package, ticket) => vec![
            json!(modules.iter().map(|m| encode_base64(m)).collect::<Vec<_>>()),
            json!(deps.iter().map(|d| d.to_string()).collect::<Vec<_>>()),
            json!(package.to_string()),
            argument_json(ticket),
        ],
    }
}

fn argument_json(argument: &Argument) -> Value {
    match argument {
        Argument::GasCoin => json!("GasCoin"),
        Argument::Input(i) => json!({ "Input": i }),
        Argument::Result(i) => json!({ "Result": i }),
        Argument::NestedResult(i, j) => json!({ "NestedResult": [i, j] }),
    }
}
