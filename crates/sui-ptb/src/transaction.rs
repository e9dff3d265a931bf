// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use strum_macros::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};

use crate::base_types::{ObjectID, ObjectRef, SequenceNumber};
use crate::config::PtbConfig;
use crate::error::{PtbError, PtbResult};
use crate::fp_ensure;
use crate::sui_serde::{Base64, Readable};

#[cfg(test)]
#[path = "unit_tests/transaction_tests.rs"]
mod transaction_tests;

/// One slot of the shared input table.
#[serde_as]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
pub enum CallArg {
    /// Contains no structs or objects. The bytes are BCS of the value and are
    /// never inspected by the builder.
    Pure(#[serde_as(as = "Readable<Base64, _>")] Vec<u8>),
    /// An object reference, resolved or not.
    Object(ObjectArg),
}

impl CallArg {
    /// BCS-encode `value` into a pure input.
    pub fn pure<T: Serialize>(value: &T) -> PtbResult<Self> {
        Ok(Self::Pure(bcs::to_bytes(value)?))
    }

    /// Wrap bytes that are already the BCS encoding of a value.
    pub fn pure_bytes(bytes: Vec<u8>) -> Self {
        Self::Pure(bytes)
    }

    pub fn object(arg: ObjectArg) -> Self {
        Self::Object(arg)
    }

    /// `object(id)` for callers holding a textual identifier. This is the only
    /// syntactic check the value model performs on object inputs.
    pub fn object_from_str(id: &str) -> PtbResult<Self> {
        Ok(Self::Object(ObjectArg::Unresolved(id.parse()?)))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    pub fn object_id(&self) -> Option<ObjectID> {
        match self {
            Self::Pure(_) => None,
            Self::Object(arg) => Some(arg.id()),
        }
    }
}

impl From<ObjectArg> for CallArg {
    fn from(arg: ObjectArg) -> Self {
        Self::Object(arg)
    }
}

impl From<ObjectRef> for CallArg {
    fn from(oref: ObjectRef) -> Self {
        Self::Object(ObjectArg::ImmOrOwnedObject(oref))
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum ObjectArg {
    /// A Move object, either immutable, or owned mutable.
    ImmOrOwnedObject(ObjectRef),
    /// A Move object that's shared.
    /// SharedObject::mutable controls whether caller asks for a mutable reference to shared object.
    SharedObject {
        id: ObjectID,
        initial_shared_version: SequenceNumber,
        mutable: bool,
    },
    /// A Move object that can be received in this transaction.
    Receiving(ObjectRef),
    /// Only the id is known. Version, digest and ownership are left for the
    /// execution node to resolve.
    Unresolved(ObjectID),
}

impl ObjectArg {
    pub fn id(&self) -> ObjectID {
        match self {
            Self::Receiving((id, _, _))
            | Self::ImmOrOwnedObject((id, _, _))
            | Self::SharedObject { id, .. }
            | Self::Unresolved(id) => *id,
        }
    }
}

/// An argument to a programmable transaction command. Arguments are
/// references, never values.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Argument {
    /// The gas coin. The gas coin can only be used by-ref, except for with
    /// `TransferObjects`, which can use it by-value.
    GasCoin,
    /// One of the input objects or primitive values (from
    /// `ProgrammableTransaction` inputs)
    Input(u16),
    /// The result of another command (from `ProgrammableTransaction` commands)
    Result(u16),
    /// Like a `Result` but it accesses a nested result. Currently, the only usage
    /// of this is to access a value from a Move call with multiple return values.
    NestedResult(u16, u16),
}

impl Argument {
    /// The command this argument reads from, if any.
    pub fn command_index(&self) -> Option<u16> {
        match self {
            Self::Result(i) | Self::NestedResult(i, _) => Some(*i),
            Self::GasCoin | Self::Input(_) => None,
        }
    }
}

impl Display for Argument {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::GasCoin => write!(f, "GasCoin"),
            Self::Input(i) => write!(f, "Input({i})"),
            Self::Result(i) => write!(f, "Result({i})"),
            Self::NestedResult(i, j) => write!(f, "NestedResult({i},{j})"),
        }
    }
}

/// The command for calling a Move function, either an entry function or a public
/// function (which cannot return references).
#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
pub struct ProgrammableMoveCall {
    /// The package containing the module and function.
    pub package: ObjectID,
    /// The specific module in the package containing the function.
    pub module: String,
    /// The function to be called.
    pub function: String,
    /// The type arguments to the function.
    pub type_arguments: Vec<String>,
    /// The arguments to the function.
    pub arguments: Vec<Argument>,
}

impl Display for ProgrammableMoveCall {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            package,
            module,
            function,
            type_arguments,
            arguments,
        } = self;
        write!(f, "{package}::{module}::{function}")?;
        if !type_arguments.is_empty() {
            write!(f, "<")?;
            write_sep(f, type_arguments, ",")?;
            write!(f, ">")?;
        }
        write!(f, "(")?;
        write_sep(f, arguments, ",")?;
        write!(f, ")")
    }
}

/// A single command in a programmable transaction.
#[serde_as]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
pub enum Command {
    /// A call to either an entry or a public Move function
    MoveCall(Box<ProgrammableMoveCall>),
    /// `(Vec<forall T:key+store. T>, address)`
    /// It sends n-objects to the specified address. These objects must have store
    /// (public transfer) and either the previous owner must be an address or the object must
    /// be newly created.
    TransferObjects(Vec<Argument>, Argument),
    /// `(&mut Coin<T>, Vec<u64>)` -> `Vec<Coin<T>>`
    /// It splits off some amounts into a new coins with those amounts
    SplitCoins(Argument, Vec<Argument>),
    /// `(&mut Coin<T>, Vec<Coin<T>>)`
    /// It merges n-coins into the first coin
    MergeCoins(Argument, Vec<Argument>),
    /// Publishes a Move package. It takes the package bytes and a list of the package's transitive
    /// dependencies to link against on-chain.
    Publish(
        #[serde_as(as = "Vec<Readable<Base64, _>>")] Vec<Vec<u8>>,
        Vec<ObjectID>,
    ),
    /// `forall T: Vec<T> -> vector<T>`
    /// Given n-values of the same type, it constructs a vector. For non objects or an empty vector,
    /// the type tag must be specified.
    MakeMoveVec(Option<String>, Vec<Argument>),
    /// Upgrades a Move package
    /// Takes (in order):
    /// 1. A vector of serialized modules for the package.
    /// 2. A vector of object ids for the transitive dependencies of the new package.
    /// 3. The object ID of the package being upgraded.
    /// 4. An argument holding the `UpgradeTicket` that must have been produced from an earlier command in the same
    ///    programmable transaction.
    Upgrade(
        #[serde_as(as = "Vec<Readable<Base64, _>>")] Vec<Vec<u8>>,
        Vec<ObjectID>,
        ObjectID,
        Argument,
    ),
}

/// The closed set of command kinds, named the way they are displayed.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    StrumDisplay,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum CommandKind {
    MoveCall,
    TransferObjects,
    #[strum(serialize = "split")]
    #[serde(rename = "split")]
    SplitCoins,
    #[strum(serialize = "merge")]
    #[serde(rename = "merge")]
    MergeCoins,
    Publish,
    #[strum(serialize = "make-vec")]
    #[serde(rename = "make-vec")]
    MakeMoveVec,
    Upgrade,
}

/// What a command argument position statically accepts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SlotKind {
    /// The gas coin, an object input or a prior result.
    Object,
    /// A pure input, or a prior result not statically known to be an object.
    Pure,
    /// A pure value that must end up being an address.
    Address,
    /// Anything that resolves.
    Any,
}

/// How many values a command leaves behind for later commands.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OutputArity {
    Fixed(u16),
    /// Depends on the Move function signature, only known at execution.
    Unknown,
}

impl Command {
    pub fn move_call(
        package: ObjectID,
        module: impl Into<String>,
        function: impl Into<String>,
        type_arguments: Vec<String>,
        arguments: Vec<Argument>,
    ) -> Self {
        Command::MoveCall(Box::new(ProgrammableMoveCall {
            package,
            module: module.into(),
            function: function.into(),
            type_arguments,
            arguments,
        }))
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Command::MoveCall(_) => CommandKind::MoveCall,
            Command::TransferObjects(_, _) => CommandKind::TransferObjects,
            Command::SplitCoins(_, _) => CommandKind::SplitCoins,
            Command::MergeCoins(_, _) => CommandKind::MergeCoins,
            Command::Publish(_, _) => CommandKind::Publish,
            Command::MakeMoveVec(_, _) => CommandKind::MakeMoveVec,
            Command::Upgrade(_, _, _, _) => CommandKind::Upgrade,
        }
    }

    /// Every argument of the command paired with the kind of value its
    /// position expects, in declaration order.
    pub fn typed_arguments(&self) -> Vec<(SlotKind, Argument)> {
        match self {
            Command::MoveCall(call) => call
                .arguments
                .iter()
                .map(|arg| (SlotKind::Any, *arg))
                .collect(),
            Command::TransferObjects(objects, recipient) => objects
                .iter()
                .map(|arg| (SlotKind::Object, *arg))
                .chain(std::iter::once((SlotKind::Address, *recipient)))
                .collect(),
            Command::SplitCoins(coin, amounts) => std::iter::once((SlotKind::Object, *coin))
                .chain(amounts.iter().map(|arg| (SlotKind::Pure, *arg)))
                .collect(),
            Command::MergeCoins(target, sources) => std::iter::once((SlotKind::Object, *target))
                .chain(sources.iter().map(|arg| (SlotKind::Object, *arg)))
                .collect(),
            Command::Publish(_, _) => vec![],
            Command::MakeMoveVec(_, elements) => elements
                .iter()
                .map(|arg| (SlotKind::Any, *arg))
                .collect(),
            Command::Upgrade(_, _, _, ticket) => vec![(SlotKind::Object, *ticket)],
        }
    }

    pub fn output_arity(&self) -> OutputArity {
        match self {
            Command::MoveCall(_) => OutputArity::Unknown,
            Command::TransferObjects(_, _) | Command::MergeCoins(_, _) => OutputArity::Fixed(0),
            // validity_check caps the amount count at u16::MAX
            Command::SplitCoins(_, amounts) => OutputArity::Fixed(amounts.len() as u16),
            Command::Publish(_, _) | Command::MakeMoveVec(_, _) | Command::Upgrade(_, _, _, _) => {
                OutputArity::Fixed(1)
            }
        }
    }

    /// Outputs that are statically known to be objects (coins, upgrade caps,
    /// upgrade receipts) and can therefore never feed a pure position.
    pub fn outputs_are_objects(&self) -> bool {
        matches!(
            self,
            Command::SplitCoins(_, _) | Command::Publish(_, _) | Command::Upgrade(_, _, _, _)
        )
    }

    /// Whether the outputs may be an address. Only Move calls can produce one.
    pub fn may_output_address(&self) -> bool {
        matches!(self, Command::MoveCall(_))
    }

    /// Shape checks that do not need the rest of the transaction: argument
    /// counts, size limits and identifier syntax.
    pub fn validity_check(&self, config: &PtbConfig) -> PtbResult {
        let kind = self.kind();
        // Output counts and sub-indices are u16.
        let max_args = config.max_arguments().min(u16::MAX as usize);
        let check_len = |what: &str, len: usize, limit: usize| -> PtbResult {
            fp_ensure!(
                len <= limit,
                PtbError::SizeLimitExceeded {
                    what: format!("{what} of {kind}"),
                    value: len as u64,
                    limit: limit as u64,
                }
            );
            Ok(())
        };
        match self {
            Command::MoveCall(call) => {
                for identifier in [&call.module, &call.function] {
                    fp_ensure!(
                        is_valid_identifier(identifier),
                        PtbError::InvalidIdentifier {
                            identifier: identifier.clone(),
                        }
                    );
                }
                check_len("arguments", call.arguments.len(), max_args)?;
                check_len(
                    "type arguments",
                    call.type_arguments.len(),
                    config.max_type_arguments(),
                )?;
            }
            Command::TransferObjects(objects, _) => {
                fp_ensure!(
                    !objects.is_empty(),
                    PtbError::arity(kind, "at least one object must be transferred")
                );
                check_len("objects", objects.len(), max_args)?;
            }
            Command::SplitCoins(_, amounts) => {
                fp_ensure!(
                    !amounts.is_empty(),
                    PtbError::arity(kind, "at least one amount must be given")
                );
                check_len("amounts", amounts.len(), max_args)?;
            }
            Command::MergeCoins(_, sources) => {
                fp_ensure!(
                    !sources.is_empty(),
                    PtbError::arity(kind, "at least one source coin must be given")
                );
                check_len("source coins", sources.len(), max_args)?;
            }
            Command::MakeMoveVec(type_, elements) => {
                fp_ensure!(
                    type_.is_some() || !elements.is_empty(),
                    PtbError::arity(kind, "an empty vector needs an explicit element type")
                );
                check_len("elements", elements.len(), max_args)?;
            }
            Command::Publish(modules, _) | Command::Upgrade(modules, _, _, _) => {
                fp_ensure!(
                    !modules.is_empty(),
                    PtbError::arity(kind, "at least one module must be given")
                );
            }
        }
        Ok(())
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::MoveCall(p) => {
                write!(f, "MoveCall({p})")
            }
            Self::MakeMoveVec(ty_opt, elems) => {
                write!(f, "MakeMoveVec(")?;
                if let Some(ty) = ty_opt {
                    write!(f, "Some({ty})")?;
                } else {
                    write!(f, "None")?;
                }
                write!(f, ",[")?;
                write_sep(f, elems, ",")?;
                write!(f, "])")
            }
            Self::TransferObjects(objs, addr) => {
                write!(f, "TransferObjects([")?;
                write_sep(f, objs, ",")?;
                write!(f, "],{addr})")
            }
            Self::SplitCoins(coin, amounts) => {
                write!(f, "SplitCoins({coin},[")?;
                write_sep(f, amounts, ",")?;
                write!(f, "])")
            }
            Self::MergeCoins(target, coins) => {
                write!(f, "MergeCoins({target},")?;
                write_sep(f, coins, ",")?;
                write!(f, ")")
            }
            Self::Publish(_bytes, deps) => {
                write!(f, "Publish(_,")?;
                write_sep(f, deps, ",")?;
                write!(f, ")")
            }
            Self::Upgrade(_bytes, deps, current_package_id, ticket) => {
                write!(f, "Upgrade(_,")?;
                write_sep(f, deps, ",")?;
                write!(f, ", {current_package_id}")?;
                write!(f, ", {ticket})")
            }
        }
    }
}

/// A series of commands where the results of one command can be used in future
/// commands. This is the "kind" of a transaction: it carries neither a sender
/// nor a gas owner.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Default, Serialize, Deserialize)]
pub struct ProgrammableTransaction {
    /// Input objects or primitive values
    pub inputs: Vec<CallArg>,
    /// The commands to be executed sequentially. A failure in any command will
    /// result in the failure of the entire transaction.
    pub commands: Vec<Command>,
}

impl ProgrammableTransaction {
    pub fn input_objects(&self) -> impl Iterator<Item = &ObjectArg> + '_ {
        self.inputs.iter().filter_map(|arg| match arg {
            CallArg::Object(obj) => Some(obj),
            CallArg::Pure(_) => None,
        })
    }

    pub fn to_kind_bytes(&self) -> PtbResult<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }
}

impl Display for ProgrammableTransaction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self { inputs, commands } = self;
        writeln!(f, "Inputs: {inputs:?}")?;
        writeln!(f, "Commands: [")?;
        for c in commands {
            writeln!(f, "  {c},")?;
        }
        writeln!(f, "]")
    }
}

/// Move identifier syntax: `[a-zA-Z][a-zA-Z0-9_]*` or `_[a-zA-Z0-9_]+`.
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let valid_rest = |c: char| c.is_ascii_alphanumeric() || c == '_';
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => chars.all(valid_rest),
        Some('_') => s.len() > 1 && chars.all(valid_rest),
        _ => false,
    }
}

fn write_sep<T: Display>(
    f: &mut Formatter<'_>,
    items: impl IntoIterator<Item = T>,
    sep: &str,
) -> fmt::Result {
    let mut xs = items.into_iter().peekable();
    while let Some(x) = xs.next() {
        write!(f, "{x}")?;
        if xs.peek().is_some() {
            write!(f, "{sep}")?;
        }
    }
    Ok(())
}
