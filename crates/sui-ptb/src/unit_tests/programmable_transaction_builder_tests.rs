// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt::Debug;

use crate::base_types::{random_object_ref, ObjectID, SuiAddress, SUI_FRAMEWORK_PACKAGE_ID};
use crate::config::PtbConfig;
use crate::error::{PtbError, PtbResult};
use crate::programmable_transaction_builder::ProgrammableTransactionBuilder;
use crate::transaction::Argument::{GasCoin, Input, NestedResult};
use crate::transaction::{
    Argument, CallArg, Command, CommandKind, ObjectArg, ProgrammableTransaction,
};

fn assert_arity_mismatch(result: PtbResult<impl Debug>, expected: CommandKind) {
    match result {
        Err(PtbError::ArityMismatch { kind, .. }) => assert_eq!(kind, expected),
        other => panic!("expected an arity mismatch for {expected}, got {other:?}"),
    }
}

fn assert_dangling(result: PtbResult<impl Debug>, expected_command: u16) {
    match result {
        Err(PtbError::DanglingReference { command, .. }) => assert_eq!(command, expected_command),
        other => panic!("expected a dangling reference, got {other:?}"),
    }
}

#[test]
fn test_builder_merge_coins_one_source() {
    let mut builder = ProgrammableTransactionBuilder::new();
    let target_coin_ref = random_object_ref();
    let coins_ref = random_object_ref();

    builder
        .merge_coins(target_coin_ref, vec![coins_ref])
        .unwrap();

    let tx = builder.finish();

    assert_eq!(
        tx.inputs,
        vec![
            CallArg::Object(ObjectArg::ImmOrOwnedObject(target_coin_ref)),
            CallArg::Object(ObjectArg::ImmOrOwnedObject(coins_ref))
        ]
    );
    assert_eq!(
        tx.commands,
        vec![Command::MergeCoins(Input(0), vec![Input(1)])]
    );
}

#[test]
fn test_builder_merge_coins_two_sources() {
    let mut builder = ProgrammableTransactionBuilder::new();
    let target_coin_ref = random_object_ref();
    let source_coin1_ref = random_object_ref();
    let source_coin2_ref = random_object_ref();

    builder
        .merge_coins(target_coin_ref, vec![source_coin1_ref, source_coin2_ref])
        .unwrap();

    let tx = builder.finish();

    assert_eq!(
        tx.inputs,
        vec![
            CallArg::Object(ObjectArg::ImmOrOwnedObject(target_coin_ref)),
            CallArg::Object(ObjectArg::ImmOrOwnedObject(source_coin1_ref)),
            CallArg::Object(ObjectArg::ImmOrOwnedObject(source_coin2_ref)),
        ]
    );
    assert_eq!(
        tx.commands,
        vec![Command::MergeCoins(Input(0), vec![Input(1), Input(2)])]
    );
}

#[test]
fn test_builder_merge_coins_zero_source_is_rolled_back() {
    let mut builder = ProgrammableTransactionBuilder::new();
    let target_coin_ref = random_object_ref();
    let source_coin_ref = random_object_ref();

    assert_arity_mismatch(
        builder.merge_coins(target_coin_ref, vec![]),
        CommandKind::MergeCoins,
    );
    assert!(builder.inputs().is_empty());
    assert!(builder.commands().is_empty());

    // The failed call left nothing behind.
    builder
        .merge_coins(target_coin_ref, vec![source_coin_ref])
        .unwrap();
    assert_eq!(
        builder.commands(),
        &[Command::MergeCoins(Input(0), vec![Input(1)])]
    );
}

#[test]
fn test_builder_smash_coins_zero_coins() {
    let mut builder = ProgrammableTransactionBuilder::new();
    assert_arity_mismatch(builder.smash_coins(vec![]), CommandKind::MergeCoins);
    assert_eq!(builder.finish(), ProgrammableTransaction::default());
}

#[test]
fn test_builder_smash_coins_one_coin() {
    let mut builder = ProgrammableTransactionBuilder::new();
    let target_coin_ref = random_object_ref();

    let arg = builder.smash_coins(vec![target_coin_ref]).unwrap();

    let tx = builder.finish();

    assert_eq!(arg, Input(0));
    assert_eq!(
        tx.inputs,
        vec![CallArg::Object(ObjectArg::ImmOrOwnedObject(
            target_coin_ref
        ))]
    );
    assert!(tx.commands.is_empty());
}

#[test]
fn test_builder_smash_coins_two_coins() {
    let mut builder = ProgrammableTransactionBuilder::new();
    let target_coin_ref = random_object_ref();
    let source_coin_ref = random_object_ref();

    let arg = builder
        .smash_coins(vec![target_coin_ref, source_coin_ref])
        .unwrap();

    let tx = builder.finish();

    assert_eq!(arg, Input(0));
    assert_eq!(
        tx.inputs,
        vec![
            CallArg::Object(ObjectArg::ImmOrOwnedObject(target_coin_ref)),
            CallArg::Object(ObjectArg::ImmOrOwnedObject(source_coin_ref))
        ]
    );
    assert_eq!(
        tx.commands,
        vec![Command::MergeCoins(Input(0), vec![Input(1)])]
    );
}

#[test]
fn test_builder_smash_coins_three_coins() {
    let mut builder = ProgrammableTransactionBuilder::new();
    let target_coin_ref = random_object_ref();
    let source_coin1_ref = random_object_ref();
    let source_coin2_ref = random_object_ref();

    let arg = builder
        .smash_coins(vec![target_coin_ref, source_coin1_ref, source_coin2_ref])
        .unwrap();

    let tx = builder.finish();

    assert_eq!(arg, Input(0));
    assert_eq!(tx.inputs.len(), 3);
    assert_eq!(
        tx.commands,
        vec![Command::MergeCoins(Input(0), vec![Input(1), Input(2)])]
    );
}

#[test]
fn test_transfer_sui_with_amount() {
    let mut builder = ProgrammableTransactionBuilder::new();
    let recipient = SuiAddress::random_for_testing_only();

    builder.transfer_sui(recipient, Some(1_000)).unwrap();

    let tx = builder.finish();
    assert_eq!(
        tx.inputs,
        vec![
            CallArg::pure(&1_000u64).unwrap(),
            CallArg::pure(&recipient).unwrap()
        ]
    );
    assert_eq!(
        tx.commands,
        vec![
            Command::SplitCoins(GasCoin, vec![Input(0)]),
            Command::TransferObjects(vec![Argument::Result(0)], Input(1)),
        ]
    );
}

#[test]
fn test_transfer_whole_gas_coin() {
    let mut builder = ProgrammableTransactionBuilder::new();
    builder
        .transfer_sui(SuiAddress::random_for_testing_only(), None)
        .unwrap();
    assert_eq!(
        builder.commands(),
        &[Command::TransferObjects(vec![GasCoin], Input(0))]
    );
}

#[test]
fn test_pay_sui() {
    let mut builder = ProgrammableTransactionBuilder::new();
    let (a, b) = (
        SuiAddress::random_for_testing_only(),
        SuiAddress::random_for_testing_only(),
    );

    builder.pay_sui(vec![a, b], vec![10, 20]).unwrap();

    let tx = builder.finish();
    assert_eq!(tx.inputs.len(), 4);
    assert_eq!(
        tx.commands,
        vec![
            Command::SplitCoins(GasCoin, vec![Input(0), Input(1)]),
            Command::TransferObjects(vec![NestedResult(0, 0)], Input(2)),
            Command::TransferObjects(vec![NestedResult(0, 1)], Input(3)),
        ]
    );
}

#[test]
fn test_pay_sui_length_mismatch() {
    let mut builder = ProgrammableTransactionBuilder::new();
    assert_arity_mismatch(
        builder.pay_sui(vec![SuiAddress::ZERO], vec![1, 2]),
        CommandKind::SplitCoins,
    );
    assert!(builder.inputs().is_empty());
}

#[test]
fn test_split_coins_returns_each_output() {
    let mut builder = ProgrammableTransactionBuilder::new();
    let coins = builder.split_coins(GasCoin, vec![1, 2, 3]).unwrap();
    assert_eq!(
        coins,
        vec![NestedResult(0, 0), NestedResult(0, 1), NestedResult(0, 2)]
    );
    assert_eq!(builder.command_outputs(0), Some(coins));
    assert_eq!(builder.command_outputs(1), None);

    assert_arity_mismatch(
        builder.split_coins(GasCoin, vec![]),
        CommandKind::SplitCoins,
    );
    assert_eq!(builder.inputs().len(), 3);
}

#[test]
fn test_move_call_outputs_are_unknown() {
    let mut builder = ProgrammableTransactionBuilder::new();
    let coin = builder
        .programmable_move_call(
            SUI_FRAMEWORK_PACKAGE_ID,
            "coin",
            "zero",
            vec!["0x2::sui::SUI".into()],
            vec![],
        )
        .unwrap();
    assert_eq!(coin, Argument::Result(0));
    assert_eq!(builder.command_outputs(0), None);
    // Any element of an unknown output list can be addressed.
    builder
        .command(Command::MergeCoins(NestedResult(0, 7), vec![Argument::Result(0)]))
        .unwrap();
}

#[test]
fn test_reference_to_self_or_later_command() {
    let mut builder = ProgrammableTransactionBuilder::new();
    let recipient = builder.pure(SuiAddress::ZERO).unwrap();

    assert_dangling(
        builder.command(Command::TransferObjects(vec![Argument::Result(0)], recipient)),
        0,
    );
    assert_dangling(
        builder.command(Command::SplitCoins(GasCoin, vec![Input(5)])),
        0,
    );

    builder.transfer_sui(SuiAddress::ZERO, Some(1)).unwrap();
    assert_eq!(builder.commands().len(), 2);
    assert_dangling(
        builder.command(Command::TransferObjects(vec![Argument::Result(2)], recipient)),
        2,
    );
    assert_dangling(
        builder.command(Command::TransferObjects(vec![NestedResult(9, 0)], recipient)),
        2,
    );
    assert_eq!(builder.commands().len(), 2);
}

#[test]
fn test_reference_to_commands_without_that_output() {
    let mut builder = ProgrammableTransactionBuilder::new();
    let coins = builder.split_coins(GasCoin, vec![1, 2]).unwrap();
    let recipient = builder.pure(SuiAddress::ZERO).unwrap();

    // A multi-output command must be addressed element-wise.
    assert_dangling(
        builder.command(Command::TransferObjects(vec![Argument::Result(0)], recipient)),
        1,
    );
    assert_dangling(
        builder.command(Command::TransferObjects(vec![NestedResult(0, 2)], recipient)),
        1,
    );
    assert_eq!(
        builder
            .command(Command::TransferObjects(vec![coins[1]], recipient))
            .unwrap(),
        Argument::Result(1)
    );
    // Transfers produce nothing.
    assert_dangling(
        builder.command(Command::MergeCoins(GasCoin, vec![Argument::Result(1)])),
        2,
    );
}

#[test]
fn test_input_kind_mismatch() {
    let mut builder = ProgrammableTransactionBuilder::new();
    let amount = builder.pure(5u64).unwrap();
    let coin = builder.object_id(ObjectID::random()).unwrap();

    assert_arity_mismatch(
        builder.command(Command::MergeCoins(amount, vec![GasCoin])),
        CommandKind::MergeCoins,
    );
    assert_arity_mismatch(
        builder.command(Command::SplitCoins(GasCoin, vec![coin])),
        CommandKind::SplitCoins,
    );
    assert_arity_mismatch(
        builder.command(Command::TransferObjects(vec![coin], GasCoin)),
        CommandKind::TransferObjects,
    );
    assert!(builder.commands().is_empty());
}

#[test]
fn test_recipient_must_be_able_to_hold_an_address() {
    let mut builder = ProgrammableTransactionBuilder::new();
    let coins = builder.split_coins(GasCoin, vec![1]).unwrap();
    let coin = builder.object_id(ObjectID::random()).unwrap();
    assert_eq!(coins, vec![NestedResult(0, 0)]);

    // A freshly split coin is an object, not an address.
    assert_arity_mismatch(
        builder.command(Command::TransferObjects(vec![coin], Argument::Result(0))),
        CommandKind::TransferObjects,
    );

    let address = builder.pure(SuiAddress::ZERO).unwrap();
    let vector = builder
        .make_move_vec(Some("address".to_string()), vec![address])
        .unwrap();
    assert_arity_mismatch(
        builder.command(Command::TransferObjects(vec![coin], vector)),
        CommandKind::TransferObjects,
    );

    let sender = builder
        .programmable_move_call(SUI_FRAMEWORK_PACKAGE_ID, "tx_context", "sender", vec![], vec![])
        .unwrap();
    builder
        .command(Command::TransferObjects(vec![coin], sender))
        .unwrap();
    assert_eq!(builder.commands().len(), 4);
}

#[test]
fn test_repeated_inputs_get_their_own_index() {
    let mut builder = ProgrammableTransactionBuilder::new();
    let id = ObjectID::random();
    assert_eq!(builder.object_id(id).unwrap(), Input(0));
    assert_eq!(
        builder
            .obj(ObjectArg::SharedObject {
                id,
                initial_shared_version: Default::default(),
                mutable: true,
            })
            .unwrap(),
        Input(1)
    );
    assert_eq!(builder.pure(1u64).unwrap(), Input(2));
    assert_eq!(builder.pure(1u64).unwrap(), Input(3));
    // Oversized payloads are stored as given.
    assert_eq!(builder.pure_bytes(vec![0; 20_000]).unwrap(), Input(4));
    assert_eq!(builder.inputs().len(), 5);
}

#[test]
fn test_failed_helpers_leave_builder_untouched() {
    let mut builder = ProgrammableTransactionBuilder::new();
    let object_ref = random_object_ref();
    builder.obj(ObjectArg::ImmOrOwnedObject(object_ref)).unwrap();
    let before = builder.to_kind();

    assert_arity_mismatch(
        builder.transfer_args(SuiAddress::ZERO, vec![]),
        CommandKind::TransferObjects,
    );
    assert!(matches!(
        builder.move_call(
            SUI_FRAMEWORK_PACKAGE_ID,
            "coin",
            "1bad",
            vec![],
            vec![CallArg::pure(&1u64).unwrap(), CallArg::from(random_object_ref())],
        ),
        Err(PtbError::InvalidIdentifier { .. })
    ));

    assert_eq!(builder.to_kind(), before);
}

#[test]
fn test_move_call_adds_inputs_in_order() {
    let mut builder = ProgrammableTransactionBuilder::new();
    let coin = random_object_ref();
    let result = builder
        .move_call(
            SUI_FRAMEWORK_PACKAGE_ID,
            "pay",
            "split",
            vec!["0x2::sui::SUI".to_string()],
            vec![CallArg::from(coin), CallArg::pure(&5u64).unwrap()],
        )
        .unwrap();
    assert_eq!(result, Argument::Result(0));
    assert_eq!(
        builder.commands(),
        &[Command::move_call(
            SUI_FRAMEWORK_PACKAGE_ID,
            "pay",
            "split",
            vec!["0x2::sui::SUI".to_string()],
            vec![Input(0), Input(1)],
        )]
    );
}

#[test]
fn test_publish_immutable() {
    let mut builder = ProgrammableTransactionBuilder::new();
    let modules = vec![vec![0xa1, 0x1c, 0xeb, 0x0b]];
    builder
        .publish_immutable(modules.clone(), vec![SUI_FRAMEWORK_PACKAGE_ID])
        .unwrap();
    assert_eq!(
        builder.commands(),
        &[
            Command::Publish(modules, vec![SUI_FRAMEWORK_PACKAGE_ID]),
            Command::move_call(
                SUI_FRAMEWORK_PACKAGE_ID,
                "package",
                "make_immutable",
                vec![],
                vec![Argument::Result(0)],
            ),
        ]
    );
}

#[test]
fn test_upgrade_ticket() {
    let mut builder = ProgrammableTransactionBuilder::new();
    let package = ObjectID::random();
    let cap = builder.object_id(ObjectID::random()).unwrap();
    let ticket = builder
        .programmable_move_call(
            SUI_FRAMEWORK_PACKAGE_ID,
            "package",
            "authorize_upgrade",
            vec![],
            vec![cap],
        )
        .unwrap();
    assert_eq!(
        builder
            .upgrade(package, ticket, vec![SUI_FRAMEWORK_PACKAGE_ID], vec![vec![1, 2]])
            .unwrap(),
        Argument::Result(1)
    );

    let not_a_ticket = builder.pure(0u8).unwrap();
    assert_arity_mismatch(
        builder.upgrade(package, not_a_ticket, vec![], vec![vec![1, 2]]),
        CommandKind::Upgrade,
    );
}

#[test]
fn test_sender_and_gas_owner_are_set_once() {
    let mut builder = ProgrammableTransactionBuilder::new();
    let (a, b) = (
        SuiAddress::random_for_testing_only(),
        SuiAddress::random_for_testing_only(),
    );

    builder.set_sender(a).unwrap();
    builder.set_sender(a).unwrap();
    assert_eq!(
        builder.set_sender(b),
        Err(PtbError::AlreadySet {
            field: "sender".to_string(),
            current: a.to_string(),
            attempted: b.to_string(),
        })
    );
    assert_eq!(builder.sender(), Some(a));

    assert_eq!(builder.gas_owner(), None);
    builder.set_gas_owner(b).unwrap();
    builder.set_gas_owner(b).unwrap();
    assert!(matches!(
        builder.set_gas_owner(a),
        Err(PtbError::AlreadySet { .. })
    ));
    assert_eq!(builder.gas_owner(), Some(b));
}

#[test]
fn test_finalize_requires_sender() {
    let mut builder = ProgrammableTransactionBuilder::new();
    builder.transfer_sui(SuiAddress::ZERO, None).unwrap();
    assert_eq!(builder.finalize().unwrap_err(), PtbError::MissingSender);

    let mut builder = ProgrammableTransactionBuilder::new();
    builder.set_gas_owner(SuiAddress::ZERO).unwrap();
    assert_eq!(builder.finalize().unwrap_err(), PtbError::MissingSender);
}

#[test]
fn test_finalize_gas_owner_defaults_to_sender() {
    let sender = SuiAddress::random_for_testing_only();
    let mut builder = ProgrammableTransactionBuilder::new();
    builder.transfer_sui(SuiAddress::ZERO, Some(5)).unwrap();
    builder.set_sender(sender).unwrap();
    let batch = builder.finalize().unwrap();

    assert_eq!(batch.sender(), sender);
    assert_eq!(batch.gas_owner(), sender);
    assert!(!batch.is_sponsored());
    assert_eq!(batch.commands().len(), 2);

    let sponsor = SuiAddress::random_for_testing_only();
    let kind_bytes = batch.to_kind_bytes().unwrap();
    let mut builder = ProgrammableTransactionBuilder::from_kind_bytes(&kind_bytes).unwrap();
    builder.set_sender(sender).unwrap();
    builder.set_gas_owner(sponsor).unwrap();
    let sponsored = builder.finalize().unwrap();
    assert!(sponsored.is_sponsored());
    assert_eq!(sponsored.gas_owner(), sponsor);
    assert_eq!(sponsored.kind(), batch.kind());
    assert_ne!(sponsored.to_bytes().unwrap(), batch.to_bytes().unwrap());
}

#[test]
fn test_kind_bytes_round_trip() {
    let mut builder = ProgrammableTransactionBuilder::new();
    builder
        .pay_sui(vec![SuiAddress::random_for_testing_only()], vec![42])
        .unwrap();
    builder.smash_coins(vec![random_object_ref(), random_object_ref()]).unwrap();
    builder.set_sender(SuiAddress::ZERO).unwrap();
    let bytes = builder.to_kind_bytes().unwrap();

    let rebuilt = ProgrammableTransactionBuilder::from_kind_bytes(&bytes).unwrap();
    assert_eq!(rebuilt.to_kind(), builder.to_kind());
    assert_eq!(rebuilt.to_kind_bytes().unwrap(), bytes);
    assert_eq!(rebuilt.sender(), None);
    assert_eq!(rebuilt.gas_owner(), None);
}

#[test]
fn test_from_kind_bytes_rejects_malformed_transactions() {
    let forward = ProgrammableTransaction {
        inputs: vec![CallArg::pure(&SuiAddress::ZERO).unwrap()],
        commands: vec![Command::TransferObjects(vec![Argument::Result(0)], Input(0))],
    };
    assert_dangling(
        ProgrammableTransactionBuilder::from_kind_bytes(&forward.to_kind_bytes().unwrap()),
        0,
    );


    let mut trailing = ProgrammableTransaction::default().to_kind_bytes().unwrap();
    trailing.push(0);
    assert!(matches!(
        ProgrammableTransactionBuilder::from_kind_bytes(&trailing),
        Err(PtbError::Serialization { .. })
    ));
    assert!(matches!(
        ProgrammableTransactionBuilder::from_kind_bytes(&[0xff]),
        Err(PtbError::Serialization { .. })
    ));
}

#[test]
fn test_configured_limits() {
    let mut builder = ProgrammableTransactionBuilder::with_config(PtbConfig {
        max_inputs: Some(2),
        ..Default::default()
    });
    builder.pure(1u8).unwrap();
    builder.pure(2u8).unwrap();
    assert!(matches!(
        builder.pure(3u8),
        Err(PtbError::SizeLimitExceeded {
            value: 3,
            limit: 2,
            ..
        })
    ));

    let mut builder = ProgrammableTransactionBuilder::with_config(PtbConfig {
        max_pure_argument_size: Some(4),
        ..Default::default()
    });
    builder.pure(1u32).unwrap();
    builder.check_pure_sizes().unwrap();
    assert_eq!(builder.pure(1u64).unwrap(), Input(1));
    assert_eq!(
        builder.check_pure_sizes(),
        Err(PtbError::SizeLimitExceeded {
            what: "pure input 1".to_string(),
            value: 8,
            limit: 4,
        })
    );

    let mut builder = ProgrammableTransactionBuilder::with_config(PtbConfig {
        max_commands: Some(1),
        ..Default::default()
    });
    builder.transfer_sui(SuiAddress::ZERO, None).unwrap();
    assert!(matches!(
        builder.transfer_sui(SuiAddress::ZERO, None),
        Err(PtbError::SizeLimitExceeded { .. })
    ));
    assert_eq!(builder.inputs().len(), 1);
}

#[test]
fn test_split_beyond_index_space_is_rejected() {
    let mut builder = ProgrammableTransactionBuilder::with_config(PtbConfig {
        max_arguments: Some(70_000),
        ..Default::default()
    });
    let amount = builder.pure(1u64).unwrap();
    assert!(matches!(
        builder.command(Command::SplitCoins(GasCoin, vec![amount; 65_537])),
        Err(PtbError::SizeLimitExceeded { .. })
    ));
    assert!(builder.commands().is_empty());

    builder
        .command(Command::SplitCoins(GasCoin, vec![amount; 3]))
        .unwrap();
    let recipient = builder.pure(SuiAddress::ZERO).unwrap();
    assert_dangling(
        builder.command(Command::TransferObjects(vec![Argument::Result(0)], recipient)),
        1,
    );
    builder
        .command(Command::TransferObjects(vec![NestedResult(0, 2)], recipient))
        .unwrap();
}

#[test]
fn test_indices_follow_table_lengths() {
    let mut builder = ProgrammableTransactionBuilder::new();
    for i in 0..5u16 {
        assert_eq!(builder.pure(i as u64).unwrap(), Input(i));
        assert_eq!(
            builder
                .command(Command::SplitCoins(GasCoin, vec![Input(i)]))
                .unwrap(),
            Argument::Result(i)
        );
    }
    assert_eq!(builder.inputs().len(), 5);
    assert_eq!(builder.commands().len(), 5);
}
