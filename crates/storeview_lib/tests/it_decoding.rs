use alloy_primitives::U256;
use storeview_common_types::HexString;
use storeview_lib::decode::{DecodeError, Value};
use storeview_lib::records::{fetch_records, FetchError};
use storeview_lib::schema::world;
use storeview_lib::test_utils::{encode_key, encode_value_args, MockLogSource};
use storeview_indexer_client::{RecordArgs, StoreLog, SET_RECORD_EVENT};

#[tokio::test]
async fn encoded_records_decode_back_to_their_field_values() {
    //// Given
    let mut source = MockLogSource::new(7);

    let key = vec![Value::Bytes(vec![0x0c; 32])];
    let value = vec![
        Value::U256(U256::from(123u64)),
        Value::Address(HexString([0x33; 20])),
        Value::Bytes(vec![0x0a; 14]),
        Value::U256(U256::from(5000u64)),
        Value::U256(U256::from(200u64)),
        Value::U256(U256::from(1u64) << 128),
        Value::U32(9),
    ];
    source.push_record(&world().order, &key, &value);

    let name_key = vec![Value::Bytes(vec![0x0d; 32])];
    let name_value = vec![Value::String("pod one".to_owned())];
    source.push_record(&world().name, &name_key, &name_value);

    let machines_key = vec![Value::Bytes(vec![0x0e; 32])];
    let machines_value = vec![Value::Array(vec![
        Value::Bytes(vec![0x01; 32]),
        Value::Bytes(vec![0x02; 32]),
    ])];
    source.push_record(&world().machines_in_pod, &machines_key, &machines_value);

    //// When
    let records = fetch_records(&source, &world().all()).await.unwrap();

    //// Then
    assert_eq!(records.latest_block, 7);
    assert_eq!(records.records.len(), 3);

    let order = records.by_table(&world().order).next().unwrap();
    assert_eq!(order.key["orderId"], key[0]);
    assert_eq!(order.value["creationBlock"], value[0]);
    assert_eq!(order.value["creator"], value[1]);
    assert_eq!(order.value["materialId"], value[2]);
    assert_eq!(order.value["amount"], value[3]);
    assert_eq!(order.value["expirationBlock"], value[4]);
    assert_eq!(order.value["reward"], value[5]);
    assert_eq!(order.value["maxPlayers"], value[6]);
    // Merged fields carry both sides.
    assert_eq!(order.fields["orderId"], key[0]);
    assert_eq!(order.fields["maxPlayers"], value[6]);

    let name = records.by_table(&world().name).next().unwrap();
    assert_eq!(name.fields["value"], name_value[0]);

    let machines = records.by_table(&world().machines_in_pod).next().unwrap();
    assert_eq!(machines.fields["value"], machines_value[0]);
}

#[tokio::test]
async fn events_for_unknown_tables_are_skipped() {
    //// Given
    let mut source = MockLogSource::new(7);
    source.push_record(
        &world().completed_players,
        &[Value::Bytes(vec![0x0c; 32])],
        &[Value::U32(2)],
    );

    // Same payload, but logged under a table id we have no schema for.
    let (static_data, encoded_lengths, dynamic_data) = encode_value_args(
        &world().completed_players,
        &[Value::U32(2)],
    );
    source.logs.push(StoreLog {
        event_name: SET_RECORD_EVENT.to_owned(),
        args: RecordArgs {
            table_id: HexString([0xff; 32]),
            key_tuple: encode_key(&world().completed_players, &[Value::Bytes(vec![0x0c; 32])]),
            static_data: HexString(static_data),
            encoded_lengths,
            dynamic_data: HexString(dynamic_data),
        },
    });

    //// When
    let records = fetch_records(
        &source,
        &[&world().completed_players],
    )
    .await
    .unwrap();

    //// Then: the known event decodes, the unknown one is dropped.
    assert_eq!(records.records.len(), 1);
    assert_eq!(records.records[0].table.name, "CompletedPlayers");
}

#[tokio::test]
async fn unexpected_event_kinds_fail_the_fetch() {
    //// Given
    let mut source = MockLogSource::new(7);
    source.push_record(
        &world().completed_players,
        &[Value::Bytes(vec![0x0c; 32])],
        &[Value::U32(2)],
    );
    source.logs[0].event_name = "Store_SpliceStaticData".to_owned();

    //// When
    let result = fetch_records(&source, &world().all()).await;

    //// Then
    assert!(matches!(
        result,
        Err(FetchError::Decode(DecodeError::UnexpectedEventKind(kind))) if kind == "Store_SpliceStaticData"
    ));
}

#[tokio::test]
async fn out_of_range_enum_index_fails_the_fetch() {
    //// Given
    let mut source = MockLogSource::new(7);
    // machineType has 12 labels; index 12 is one past the end.
    source.push_record(
        &world().machine_type,
        &[Value::Bytes(vec![0x01; 32])],
        &[Value::EnumIndex(12)],
    );

    //// When
    let result = fetch_records(&source, &world().all()).await;

    //// Then
    assert!(matches!(
        result,
        Err(FetchError::Decode(DecodeError::EnumIndexOutOfRange {
            index: 12,
            len: 12,
            ..
        }))
    ));
}
