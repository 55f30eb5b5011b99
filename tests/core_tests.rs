#![cfg(feature = "core")]

use moadian::core::*;
use rust_decimal_macros::dec;

fn scope() -> FiscalScope {
    FiscalScope::parse("A3NFZT").unwrap()
}

fn calc() -> AmountCalculator {
    AmountCalculator::new()
}

// --- Line arithmetic ---

#[test]
fn single_line_ten_percent() {
    let a = calc()
        .compute_line(dec!(10000), dec!(1), dec!(0), dec!(10))
        .unwrap();
    assert_eq!((a.net, a.vat, a.total), (dec!(10000), dec!(1000), dec!(11000)));
}

#[test]
fn two_identical_nine_percent_lines() {
    let c = calc();
    let line = || {
        LineItemBuilder::new("2330004219206", "Service", dec!(100000))
            .quantity(dec!(2))
            .vat_rate(dec!(9))
            .build(&c)
            .unwrap()
    };
    let lines = vec![line(), line()];
    assert_eq!(lines[0].net(), dec!(200000));
    assert_eq!(lines[0].vat(), dec!(18000));
    assert_eq!(lines[0].total(), dec!(218000));

    let totals = c.compute_invoice(&lines).unwrap();
    assert_eq!(totals.net_total, dec!(400000));
    assert_eq!(totals.vat_total, dec!(36000));
    assert_eq!(totals.grand_total, dec!(436000));
}

#[test]
fn invoice_vat_is_sum_of_rounded_lines() {
    let c = calc();
    // 1005 * 9% = 90.45 → 90 per line; three lines → 270.
    // Rounding the pre-summed base would give 3015 * 9% = 271.35 → 271.
    let lines: Vec<_> = (0..3)
        .map(|_| {
            LineItemBuilder::new("2330004219206", "Item", dec!(1005))
                .vat_rate(dec!(9))
                .build(&c)
                .unwrap()
        })
        .collect();
    let totals = c.compute_invoice(&lines).unwrap();
    assert_eq!(totals.net_total, dec!(3015));
    assert_eq!(totals.vat_total, dec!(270));
    assert_eq!(totals.grand_total, dec!(3285));
}

#[test]
fn totals_include_discounts() {
    let c = calc();
    let lines = vec![
        LineItemBuilder::new("2330004219206", "A", dec!(5000))
            .quantity(dec!(3))
            .discount(dec!(1500))
            .build(&c)
            .unwrap(),
        LineItemBuilder::new("2330004219207", "B", dec!(20000))
            .vat_rate(dec!(9))
            .build(&c)
            .unwrap(),
    ];
    let totals = c.compute_invoice(&lines).unwrap();
    assert_eq!(totals.pre_discount_total, dec!(35000));
    assert_eq!(totals.discount_total, dec!(1500));
    assert_eq!(totals.net_total, dec!(33500));
    // 1350 + 1800
    assert_eq!(totals.vat_total, dec!(3150));
    assert_eq!(totals.grand_total, dec!(36650));
}

#[test]
fn invoice_from_serialized_line_inputs() {
    let c = calc();
    let inputs: Vec<LineItemBuilder> = serde_json::from_str(
        r#"[
            {"product_id": "2330004219206", "description": "A", "unit_fee": "10000"},
            {"product_id": "2330004219207", "description": "B", "unit_fee": "50000",
             "quantity": "2", "vat_rate": "9"}
        ]"#,
    )
    .unwrap();
    let lines: Vec<_> = inputs.into_iter().map(|b| b.build(&c).unwrap()).collect();
    let totals = c.compute_invoice(&lines).unwrap();
    assert_eq!(totals.net_total, dec!(110000));
    // 1000 + 9000
    assert_eq!(totals.vat_total, dec!(10000));
    assert_eq!(totals.grand_total, dec!(120000));
}

#[test]
fn invoice_total_overflow_fails() {
    let c = calc();
    let fee = (rust_decimal::Decimal::MAX / dec!(3)).trunc();
    let lines: Vec<_> = (0..4)
        .map(|_| {
            LineItemBuilder::new("2330004219206", "Item", fee)
                .vat_rate(dec!(0))
                .build(&c)
                .unwrap()
        })
        .collect();
    let err = c.compute_invoice(&lines).unwrap_err();
    assert!(matches!(err, MoadianError::Validation(_)));
}

#[test]
fn discount_exceeding_amount_fails() {
    let err = calc()
        .compute_line(dec!(1000), dec!(2), dec!(2001), dec!(10))
        .unwrap_err();
    assert!(matches!(err, MoadianError::Validation(_)));
}

// --- Identifiers ---

#[test]
fn identifier_and_invoice_number_share_serial() {
    let encoder = TaxIdEncoder::new(scope());
    for serial in [0, 1, 42, 255, 65_536, MAX_SERIAL] {
        let id = encoder.encode(1_718_409_600_000, serial).unwrap();
        let inno = encoder.invoice_number(serial).unwrap();
        assert_eq!(id.serial(), serial);
        assert_eq!(id.invoice_number(), &inno);
        assert_eq!(&id.as_str()[11..21], inno.as_str());
    }
}

#[test]
fn identifier_width_is_fixed() {
    for (ts, serial) in [(0, 0), (1_700_000_000_000, 1), (1_718_409_600_000, MAX_SERIAL)] {
        let id = encode_identifier(&scope(), ts, serial).unwrap();
        assert_eq!(id.as_str().len(), TAX_ID_LEN);
    }
}

#[test]
fn identifier_serial_overflow_fails() {
    assert!(matches!(
        encode_identifier(&scope(), 1_700_000_000_000, MAX_SERIAL + 1),
        Err(MoadianError::Format(_))
    ));
}

#[test]
fn generated_identifiers_validate() {
    let id = encode_identifier(&scope(), 1_700_000_000_000, 1234).unwrap();
    assert!(validate_tax_id(id.as_str()));
    assert_eq!(TaxIdentifier::parse(id.as_str()).unwrap(), id);
    assert!(checksum::validate(
        &[id.numeric_derivation(), vec![id.check_digit()]].concat()
    ));
}

#[test]
fn invoice_number_decode() {
    let inno = encode_invoice_number(0xABCDE).unwrap();
    assert_eq!(inno.as_str(), "00000ABCDE");
    assert_eq!(decode_invoice_number(inno.as_str()).unwrap(), 0xABCDE);
}

#[test]
fn tax_identifier_serializes_as_string() {
    let id = encode_identifier(&scope(), 1_700_000_000_000, 42).unwrap();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"A3NFZT04CDB000000002A8\"");
    let back: TaxIdentifier = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
    assert!(serde_json::from_str::<TaxIdentifier>("\"A3NFZT04CDB000000002A1\"").is_err());
}

#[test]
fn error_messages() {
    let err = FiscalScope::parse("ABC").unwrap_err();
    assert!(err.to_string().starts_with("scope error:"));
    let err = encode_invoice_number(u64::MAX).unwrap_err();
    assert!(err.to_string().starts_with("format error:"));
    let err = TaxIdentifier::parse("A3NFZT04CDB000000002A1").unwrap_err();
    assert_eq!(err.to_string(), "checksum mismatch: expected 8, found 1");
}
