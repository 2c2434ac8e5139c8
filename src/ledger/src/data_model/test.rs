#![cfg(test)]
#![allow(missing_docs)]

use {super::*, rust_decimal::Decimal, serde_json::json};

fn btc(amount: i64, coins: Decimal) -> HoldingEntry {
    HoldingEntry {
        name: "first buy".to_owned(),
        symbol: "BTC".to_owned(),
        kind: TxnType::Bought,
        amount: Decimal::from(amount),
        time_transacted: "01-02-2021".to_owned(),
        time_created: "01-03-2021".to_owned(),
        price_purchased_at: Decimal::new(3_500_000, 2),
        no_of_coins: coins,
    }
}

#[test]
fn addresses_are_namespaced_and_stable() {
    let names = ["", "name", "a-twenty-char-name!!", "日本語", "x"];
    for name in names.iter() {
        let addr = derive_address(name);
        assert_eq!(addr.len(), ADDRESS_LEN);
        assert_eq!(&addr[..NAMESPACE_PREFIX_LEN], NAMESPACE_PREFIX.as_str());
        assert_eq!(addr, derive_address(name));
        assert!(is_family_address(&addr));
    }
    assert_ne!(derive_address("a"), derive_address("b"));
    assert_eq!(namespace_prefix(), &sha512_hex("cryptoport")[..6]);
    assert!(!is_family_address(&"0".repeat(ADDRESS_LEN)));
}

#[test]
fn payload_encoding_is_canonical() {
    let p = Payload::new(Verb::Insert, "name", &json!({"b": 1, "a": 2})).unwrap();
    let q = Payload::from_raw(
        "insert".to_owned(),
        "name".to_owned(),
        r#"{"a":2,"b":1}"#.to_owned(),
    );
    assert_eq!(p.to_cbor().unwrap(), q.to_cbor().unwrap());
    assert_eq!(p.sha512().unwrap().len(), 128);
    assert_eq!(p.sha512().unwrap(), sha512_hex(p.to_cbor().unwrap()));

    // keys are written sorted: Name < Value < Verb
    let bytes = p.to_cbor().unwrap();
    let at = |key: &str| {
        bytes
            .windows(key.len())
            .position(|w| w == key.as_bytes())
            .unwrap()
    };
    assert_eq!(bytes[0], 0xa3);
    assert!(at("Name") < at("Value"));
    assert!(at("Value") < at("Verb"));
}

#[test]
fn payload_round_trip() {
    let entry = btc(100, Decimal::new(1, 2));
    let p = Payload::new(Verb::Insert, "name", &entry).unwrap();
    let back = Payload::from_cbor(p.to_cbor().unwrap()).unwrap();
    assert_eq!(back, p);
    assert_eq!(back.verb(), "insert");
    assert_eq!(back.name(), "name");
    assert_eq!(serde_json::from_str::<HoldingEntry>(back.value()).unwrap(), entry);

    assert!(Payload::from_cbor(b"\x80").is_err());
    let mut partial = BTreeMap::new();
    partial.insert("Verb", "insert");
    assert!(Payload::from_cbor(&serde_cbor::to_vec(&partial).unwrap()).is_err());
}

#[test]
fn holding_entry_wire_shape() {
    let entry = btc(100, Decimal::new(1, 2));
    let v = serde_json::to_value(&entry).unwrap();
    assert_eq!(v["type"], json!(1));
    assert_eq!(v["no_of_coins"], json!("0.01"));

    // float-era entries still decode
    let legacy = json!({
        "name": "n", "symbol": "ETH", "type": 0, "amount": 5000,
        "time_transacted": "01-01-2021", "time_created": "01-01-2021",
        "price_purchased_at": 1800.5, "no_of_coins": 0.25
    });
    let e: HoldingEntry = serde_json::from_value(legacy).unwrap();
    assert_eq!(e.kind, TxnType::Sold);
    assert_eq!(e.no_of_coins, Decimal::new(25, 2));
    assert_eq!(e.price_purchased_at, Decimal::new(18005, 1));

    assert!(serde_json::from_value::<TxnType>(json!(2)).is_err());
}

#[test]
fn state_codec() {
    assert!(decode_state(&[]).unwrap().is_empty());

    let mut state = EntityState::new();
    state
        .entry("name".to_owned())
        .or_default()
        .push(serde_cbor::value::to_value(btc(1, Decimal::ONE)).unwrap());
    let bytes = encode_state(&state).unwrap();
    assert_eq!(decode_state(&bytes).unwrap(), state);

    // typed view of the same bytes
    let typed: BTreeMap<String, Vec<HoldingEntry>> = serde_cbor::from_slice(&bytes).unwrap();
    assert_eq!(typed["name"][0], btc(1, Decimal::ONE));
    assert_eq!(decode_holdings(&bytes, "name").unwrap(), vec![btc(1, Decimal::ONE)]);
    assert!(decode_holdings(&bytes, "other").unwrap().is_empty());
    assert!(decode_holdings(&[], "name").unwrap().is_empty());

    let mut foreign = EntityState::new();
    foreign.insert("name".to_owned(), vec![serde_cbor::Value::Integer(7)]);
    assert!(decode_holdings(&encode_state(&foreign).unwrap(), "name").is_err());
}

#[test]
fn verbs_and_statuses() {
    assert_eq!("insert".parse::<Verb>().unwrap(), Verb::Insert);
    assert!("delete".parse::<Verb>().is_err());
    assert_eq!(Verb::Insert.to_string(), "insert");

    for s in ["COMMITTED", "INVALID", "PENDING", "UNKNOWN"] {
        assert_eq!(s.parse::<CommitStatus>().unwrap().to_string(), s);
    }
    assert!("DONE".parse::<CommitStatus>().is_err());
    assert!(CommitStatus::Pending.is_pending());
    assert!(!CommitStatus::Committed.is_pending());
}
