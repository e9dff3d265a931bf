// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Utility for generating programmable transactions, with the reference and
//! arity checks applied as each input and command is appended.

use std::fmt::Display;

use serde::Serialize;
use tracing::{debug, trace};

use crate::base_types::{ObjectID, ObjectRef, SuiAddress, SUI_FRAMEWORK_PACKAGE_ID};
use crate::config::PtbConfig;
use crate::decoder::{decode, DecodedTransaction};
use crate::error::{PtbError, PtbResult};
use crate::transaction::{
    Argument, CallArg, Command, CommandKind, ObjectArg, OutputArity, ProgrammableTransaction,
    SlotKind,
};
use crate::{fp_bail, fp_ensure};

#[cfg(test)]
#[path = "unit_tests/programmable_transaction_builder_tests.rs"]
mod programmable_transaction_builder_tests;

/// A field that may be filled exactly once. Setting it again with the same
/// value is a no-op, setting it with a different value is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Slot<T> {
    #[default]
    Unset,
    Set(T),
}

impl<T: PartialEq + Display> Slot<T> {
    fn set(&mut self, field: &str, value: T) -> PtbResult {
        match self {
            Slot::Unset => {
                *self = Slot::Set(value);
                Ok(())
            }
            Slot::Set(current) if *current == value => Ok(()),
            Slot::Set(current) => Err(PtbError::AlreadySet {
                field: field.to_string(),
                current: current.to_string(),
                attempted: value.to_string(),
            }),
        }
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Slot::Unset => None,
            Slot::Set(value) => Some(value),
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Slot::Set(_))
    }
}

#[derive(Debug, Default)]
pub struct ProgrammableTransactionBuilder {
    config: PtbConfig,
    inputs: Vec<CallArg>,
    commands: Vec<Command>,
    sender: Slot<SuiAddress>,
    gas_owner: Slot<SuiAddress>,
}

impl ProgrammableTransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PtbConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Rebuild a builder from kind bytes produced by [`Self::to_kind_bytes`].
    /// Sender and gas owner start out unset.
    pub fn from_kind_bytes(bytes: &[u8]) -> PtbResult<Self> {
        Self::from_kind_bytes_with_config(bytes, PtbConfig::default())
    }

    pub fn from_kind_bytes_with_config(bytes: &[u8], config: PtbConfig) -> PtbResult<Self> {
        let kind: ProgrammableTransaction = bcs::from_bytes(bytes)?;
        Self::from_kind(kind, config)
    }

    /// Replay `kind` through the validating append path, so a foreign
    /// transaction is held to the same rules as one built here.
    pub fn from_kind(kind: ProgrammableTransaction, config: PtbConfig) -> PtbResult<Self> {
        let ProgrammableTransaction { inputs, commands } = kind;
        let mut builder = Self::with_config(config);
        for input in inputs {
            builder.input(input)?;
        }
        for command in commands {
            builder.command(command)?;
        }
        debug!(
            inputs = builder.inputs.len(),
            commands = builder.commands.len(),
            "Rebuilt programmable transaction from kind bytes"
        );
        Ok(builder)
    }

    pub fn config(&self) -> &PtbConfig {
        &self.config
    }

    pub fn inputs(&self) -> &[CallArg] {
        &self.inputs
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn sender(&self) -> Option<SuiAddress> {
        self.sender.get().copied()
    }

    pub fn gas_owner(&self) -> Option<SuiAddress> {
        self.gas_owner.get().copied()
    }

    /// Append `call_arg` to the input table. The returned argument is
    /// `Input(n)` where `n` is the table length before the call.
    ///
    /// Values are stored verbatim: repeated objects and oversized pure
    /// payloads are left to the execution node, or to [`Self::check_pure_sizes`].
    pub fn input(&mut self, call_arg: CallArg) -> PtbResult<Argument> {
        let index = self.inputs.len();
        let limit = self.config.max_inputs().min(u16::MAX as usize + 1);
        fp_ensure!(
            index < limit,
            PtbError::SizeLimitExceeded {
                what: "number of inputs".to_string(),
                value: index as u64 + 1,
                limit: limit as u64,
            }
        );
        trace!(index, object = call_arg.is_object(), "Adding input");
        self.inputs.push(call_arg);
        Ok(Argument::Input(index as u16))
    }

    pub fn pure<T: Serialize>(&mut self, value: T) -> PtbResult<Argument> {
        self.input(CallArg::pure(&value)?)
    }

    pub fn pure_bytes(&mut self, bytes: Vec<u8>) -> PtbResult<Argument> {
        self.input(CallArg::pure_bytes(bytes))
    }

    pub fn obj(&mut self, obj_arg: ObjectArg) -> PtbResult<Argument> {
        self.input(CallArg::Object(obj_arg))
    }

    /// An object known only by id.
    pub fn object_id(&mut self, id: ObjectID) -> PtbResult<Argument> {
        self.obj(ObjectArg::Unresolved(id))
    }

    /// Append `command` after checking its shape and every argument it
    /// references. Nothing is appended when the check fails.
    pub fn command(&mut self, command: Command) -> PtbResult<Argument> {
        let index = self.commands.len();
        let limit = self.config.max_commands().min(u16::MAX as usize + 1);
        fp_ensure!(
            index < limit,
            PtbError::SizeLimitExceeded {
                what: "number of commands".to_string(),
                value: index as u64 + 1,
                limit: limit as u64,
            }
        );
        let index = index as u16;
        command.validity_check(&self.config)?;
        for (slot, argument) in command.typed_arguments() {
            self.check_argument(index, command.kind(), slot, argument)?;
        }
        debug!(index, kind = %command.kind(), "Adding command {command}");
        self.commands.push(command);
        Ok(Argument::Result(index))
    }

    /// Opt-in check of every pure input against the configured size limit.
    pub fn check_pure_sizes(&self) -> PtbResult {
        let max = self.config.max_pure_argument_size();
        for (index, input) in self.inputs.iter().enumerate() {
            if let CallArg::Pure(bytes) = input {
                fp_ensure!(
                    bytes.len() <= max,
                    PtbError::SizeLimitExceeded {
                        what: format!("pure input {index}"),
                        value: bytes.len() as u64,
                        limit: max as u64,
                    }
                );
            }
        }
        Ok(())
    }

    /// Handles on each output of command `index`, when their number is known
    /// without executing the transaction.
    pub fn command_outputs(&self, index: u16) -> Option<Vec<Argument>> {
        match self.commands.get(index as usize)?.output_arity() {
            OutputArity::Fixed(n) => {
                Some((0..n).map(|j| Argument::NestedResult(index, j)).collect())
            }
            OutputArity::Unknown => None,
        }
    }

    fn check_argument(
        &self,
        command: u16,
        kind: CommandKind,
        slot: SlotKind,
        argument: Argument,
    ) -> PtbResult {
        let dangling = |reason: String| PtbError::DanglingReference {
            command,
            argument,
            reason,
        };
        match argument {
            Argument::GasCoin => {
                fp_ensure!(
                    matches!(slot, SlotKind::Object | SlotKind::Any),
                    PtbError::arity(kind, "the gas coin cannot be used as a pure value")
                );
            }
            Argument::Input(i) => {
                let Some(input) = self.inputs.get(i as usize) else {
                    fp_bail!(dangling(format!(
                        "the input table has {} entries",
                        self.inputs.len()
                    )));
                };
                match (slot, input) {
                    (SlotKind::Object, CallArg::Pure(_)) => fp_bail!(PtbError::arity(
                        kind,
                        format!("{argument} is a pure value where an object is expected")
                    )),
                    (SlotKind::Pure | SlotKind::Address, CallArg::Object(_)) => {
                        fp_bail!(PtbError::arity(
                            kind,
                            format!("{argument} is an object where a pure value is expected")
                        ))
                    }
                    _ => (),
                }
            }
            Argument::Result(i) | Argument::NestedResult(i, _) => {
                // Only strictly earlier commands can be referenced, which keeps
                // the command list in dependency order.
                fp_ensure!(
                    i < command,
                    dangling("results may only reference earlier commands".to_string())
                );
                let source = &self.commands[i as usize];
                match (argument, source.output_arity()) {
                    (_, OutputArity::Unknown) | (Argument::Result(_), OutputArity::Fixed(1)) => (),
                    (Argument::NestedResult(_, j), OutputArity::Fixed(n)) if j < n => (),
                    (_, OutputArity::Fixed(n)) => fp_bail!(dangling(format!(
                        "command {i} ({}) produces {n} result(s)",
                        source.kind()
                    ))),
                }
                if matches!(slot, SlotKind::Pure | SlotKind::Address) {
                    fp_ensure!(
                        !source.outputs_are_objects(),
                        PtbError::arity(
                            kind,
                            format!(
                                "{argument} is an object produced by {} \
                                 where a pure value is expected",
                                source.kind()
                            )
                        )
                    );
                }
                if slot == SlotKind::Address {
                    fp_ensure!(
                        source.may_output_address(),
                        PtbError::arity(
                            kind,
                            format!(
                                "{argument} cannot be an address, it is produced by {}",
                                source.kind()
                            )
                        )
                    );
                }
            }
        }
        Ok(())
    }

    /// Run `f`, discarding every input and command it appended if it fails.
    fn atomically<T>(&mut self, f: impl FnOnce(&mut Self) -> PtbResult<T>) -> PtbResult<T> {
        let (inputs, commands) = (self.inputs.len(), self.commands.len());
        let result = f(self);
        if result.is_err() {
            self.inputs.truncate(inputs);
            self.commands.truncate(commands);
        }
        result
    }

    pub fn transfer_arg(&mut self, recipient: SuiAddress, arg: Argument) -> PtbResult {
        self.transfer_args(recipient, vec![arg])
    }

    pub fn transfer_args(&mut self, recipient: SuiAddress, args: Vec<Argument>) -> PtbResult {
        self.atomically(|builder| {
            let rec_arg = builder.pure(recipient)?;
            builder.command(Command::TransferObjects(args, rec_arg))?;
            Ok(())
        })
    }

    pub fn transfer_object(&mut self, recipient: SuiAddress, object_ref: ObjectRef) -> PtbResult {
        self.atomically(|builder| {
            let obj_arg = builder.obj(ObjectArg::ImmOrOwnedObject(object_ref))?;
            builder.transfer_arg(recipient, obj_arg)
        })
    }

    /// Send `amount` out of the gas coin to `recipient`, or the whole gas coin
    /// when no amount is given.
    pub fn transfer_sui(&mut self, recipient: SuiAddress, amount: Option<u64>) -> PtbResult {
        self.atomically(|builder| {
            let coin_arg = if let Some(amount) = amount {
                let amt_arg = builder.pure(amount)?;
                builder.command(Command::SplitCoins(Argument::GasCoin, vec![amt_arg]))?
            } else {
                Argument::GasCoin
            };
            builder.transfer_arg(recipient, coin_arg)
        })
    }

    /// Split `coin` into one new coin per amount, returning a handle on each.
    pub fn split_coins(&mut self, coin: Argument, amounts: Vec<u64>) -> PtbResult<Vec<Argument>> {
        self.atomically(|builder| {
            let amt_args = amounts
                .into_iter()
                .map(|amount| builder.pure(amount))
                .collect::<PtbResult<Vec<_>>>()?;
            let index = builder.commands.len() as u16;
            builder.command(Command::SplitCoins(coin, amt_args))?;
            Ok(builder.command_outputs(index).unwrap_or_default())
        })
    }

    /// Pay each recipient its amount out of the gas coin.
    pub fn pay_sui(&mut self, recipients: Vec<SuiAddress>, amounts: Vec<u64>) -> PtbResult {
        fp_ensure!(
            recipients.len() == amounts.len(),
            PtbError::arity(
                CommandKind::SplitCoins,
                format!(
                    "{} recipients but {} amounts",
                    recipients.len(),
                    amounts.len()
                )
            )
        );
        self.atomically(|builder| {
            let coins = builder.split_coins(Argument::GasCoin, amounts)?;
            for (recipient, coin) in recipients.into_iter().zip(coins) {
                builder.transfer_arg(recipient, coin)?;
            }
            Ok(())
        })
    }

    pub fn merge_coins(&mut self, target: ObjectRef, coins: Vec<ObjectRef>) -> PtbResult {
        self.atomically(|builder| {
            let target_arg = builder.obj(ObjectArg::ImmOrOwnedObject(target))?;
            let coin_args = coins
                .into_iter()
                .map(|coin| builder.obj(ObjectArg::ImmOrOwnedObject(coin)))
                .collect::<PtbResult<Vec<_>>>()?;
            builder.command(Command::MergeCoins(target_arg, coin_args))?;
            Ok(())
        })
    }

    /// Merge all of `coins` into the first one and return it.
    pub fn smash_coins(&mut self, coins: Vec<ObjectRef>) -> PtbResult<Argument> {
        let mut coins = coins.into_iter();
        let Some(target) = coins.next() else {
            fp_bail!(PtbError::arity(
                CommandKind::MergeCoins,
                "cannot smash an empty list of coins"
            ));
        };
        let rest: Vec<_> = coins.collect();
        self.atomically(|builder| {
            let target_arg = builder.obj(ObjectArg::ImmOrOwnedObject(target))?;
            if !rest.is_empty() {
                let coin_args = rest
                    .into_iter()
                    .map(|coin| builder.obj(ObjectArg::ImmOrOwnedObject(coin)))
                    .collect::<PtbResult<Vec<_>>>()?;
                builder.command(Command::MergeCoins(target_arg, coin_args))?;
            }
            Ok(target_arg)
        })
    }

    pub fn programmable_move_call(
        &mut self,
        package: ObjectID,
        module: impl Into<String>,
        function: impl Into<String>,
        type_arguments: Vec<String>,
        arguments: Vec<Argument>,
    ) -> PtbResult<Argument> {
        self.command(Command::move_call(
            package,
            module,
            function,
            type_arguments,
            arguments,
        ))
    }

    /// Like [`Self::programmable_move_call`], adding each call argument to the
    /// input table first.
    pub fn move_call(
        &mut self,
        package: ObjectID,
        module: impl Into<String>,
        function: impl Into<String>,
        type_arguments: Vec<String>,
        call_args: Vec<CallArg>,
    ) -> PtbResult<Argument> {
        let (module, function) = (module.into(), function.into());
        self.atomically(|builder| {
            let arguments = call_args
                .into_iter()
                .map(|arg| builder.input(arg))
                .collect::<PtbResult<Vec<_>>>()?;
            builder.programmable_move_call(package, module, function, type_arguments, arguments)
        })
    }

    pub fn make_move_vec(
        &mut self,
        type_: Option<String>,
        elements: Vec<Argument>,
    ) -> PtbResult<Argument> {
        self.command(Command::MakeMoveVec(type_, elements))
    }

    /// Publish a package and return its upgrade capability.
    pub fn publish_upgradeable(
        &mut self,
        modules: Vec<Vec<u8>>,
        dep_ids: Vec<ObjectID>,
    ) -> PtbResult<Argument> {
        self.command(Command::Publish(modules, dep_ids))
    }

    /// Publish a package and immediately give up the right to upgrade it.
    pub fn publish_immutable(
        &mut self,
        modules: Vec<Vec<u8>>,
        dep_ids: Vec<ObjectID>,
    ) -> PtbResult {
        self.atomically(|builder| {
            let cap = builder.publish_upgradeable(modules, dep_ids)?;
            builder.programmable_move_call(
                SUI_FRAMEWORK_PACKAGE_ID,
                "package",
                "make_immutable",
                vec![],
                vec![cap],
            )?;
            Ok(())
        })
    }

    pub fn upgrade(
        &mut self,
        current_package_object_id: ObjectID,
        upgrade_ticket: Argument,
        transitive_deps: Vec<ObjectID>,
        modules: Vec<Vec<u8>>,
    ) -> PtbResult<Argument> {
        self.command(Command::Upgrade(
            modules,
            transitive_deps,
            current_package_object_id,
            upgrade_ticket,
        ))
    }

    pub fn set_sender(&mut self, sender: SuiAddress) -> PtbResult {
        self.sender.set("sender", sender)
    }

    /// Name the account paying for gas. Left unset, the sender pays.
    pub fn set_gas_owner(&mut self, gas_owner: SuiAddress) -> PtbResult {
        self.gas_owner.set("gas owner", gas_owner)
    }

    /// The transaction kind so far, without sender or gas owner.
    pub fn to_kind(&self) -> ProgrammableTransaction {
        ProgrammableTransaction {
            inputs: self.inputs.clone(),
            commands: self.commands.clone(),
        }
    }

    pub fn to_kind_bytes(&self) -> PtbResult<Vec<u8>> {
        self.to_kind().to_kind_bytes()
    }

    pub fn finish(self) -> ProgrammableTransaction {
        ProgrammableTransaction {
            inputs: self.inputs,
            commands: self.commands,
        }
    }

    /// Seal the builder into an immutable [`TransactionBatch`]. The sender is
    /// never defaulted.
    pub fn finalize(self) -> PtbResult<TransactionBatch> {
        let Slot::Set(sender) = self.sender else {
            fp_bail!(PtbError::MissingSender);
        };
        let gas_owner = self.gas_owner.get().copied();
        debug!(
            %sender,
            sponsored = gas_owner.is_some_and(|owner| owner != sender),
            "Finalized programmable transaction"
        );
        Ok(TransactionBatch {
            kind: self.finish(),
            sender,
            gas_owner,
        })
    }
}

/// A finalized programmable transaction, ready to be handed to an execution
/// gateway. It can no longer be modified, only read, encoded and decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionBatch {
    kind: ProgrammableTransaction,
    sender: SuiAddress,
    gas_owner: Option<SuiAddress>,
}

impl TransactionBatch {
    pub fn kind(&self) -> &ProgrammableTransaction {
        &self.kind
    }

    pub fn inputs(&self) -> &[CallArg] {
        &self.kind.inputs
    }

    pub fn commands(&self) -> &[Command] {
        &self.kind.commands
    }

    pub fn sender(&self) -> SuiAddress {
        self.sender
    }

    /// The account paying for gas, which is the sender unless the
    /// transaction is sponsored.
    pub fn gas_owner(&self) -> SuiAddress {
        self.gas_owner.unwrap_or(self.sender)
    }

    pub fn is_sponsored(&self) -> bool {
        self.gas_owner() != self.sender
    }

    pub fn into_kind(self) -> ProgrammableTransaction {
        self.kind
    }

    pub fn to_kind_bytes(&self) -> PtbResult<Vec<u8>> {
        self.kind.to_kind_bytes()
    }

    /// BCS of the whole batch, sender and gas owner included. These are the
    /// bytes a signer commits to.
    pub fn to_bytes(&self) -> PtbResult<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }

    pub fn decode(&self) -> DecodedTransaction {
        decode(&self.kind)
    }
}
