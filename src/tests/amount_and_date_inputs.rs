use super::*;

const AMOUNT_FORM: &str = r#"
<form>
  <input type="number" min="0" id="amount" name="amount" value="10">
  <input type="number" id="delta" name="delta" value="0">
</form>
"#;

#[test]
fn negative_amount_is_clamped_to_zero() {
    let (mut page, _enhancer) = enhanced(AMOUNT_FORM);
    page.change_value("#amount", "-5").unwrap();
    assert_eq!(page.value_of("#amount").unwrap(), "0");
}

#[test]
fn positive_amount_is_left_alone() {
    let (mut page, _enhancer) = enhanced(AMOUNT_FORM);
    page.change_value("#amount", "12.5").unwrap();
    assert_eq!(page.value_of("#amount").unwrap(), "12.5");
}

#[test]
fn non_numeric_amount_is_left_alone() {
    let (mut page, _enhancer) = enhanced(AMOUNT_FORM);
    page.change_value("#amount", "abc").unwrap();
    assert_eq!(page.value_of("#amount").unwrap(), "abc");
}

#[test]
fn numeric_prefix_still_counts_as_negative() {
    let (mut page, _enhancer) = enhanced(AMOUNT_FORM);
    page.change_value("#amount", "-3.50 MXN").unwrap();
    assert_eq!(page.value_of("#amount").unwrap(), "0");
}

#[test]
fn inputs_without_the_zero_floor_are_not_clamped() {
    let (mut page, _enhancer) = enhanced(AMOUNT_FORM);
    page.change_value("#delta", "-5").unwrap();
    assert_eq!(page.value_of("#delta").unwrap(), "-5");
}

#[test]
fn typing_alone_does_not_clamp_until_change() {
    let (mut page, _enhancer) = enhanced(AMOUNT_FORM);
    page.type_text("#amount", "-5").unwrap();
    assert_eq!(page.value_of("#amount").unwrap(), "-5");
    page.dispatch("#amount", "change").unwrap();
    assert_eq!(page.value_of("#amount").unwrap(), "0");
}

#[test]
fn empty_date_inputs_are_filled_with_today() {
    let mut page = page(r#"
    <form>
      <input type="date" id="when" name="when">
      <input type="date" id="fixed" name="fixed" value="2025-12-31">
    </form>
    "#);
    page.set_clock_ms(AUG_30_2026_MS);
    let _enhancer = Enhancer::install(&mut page).unwrap();

    assert_eq!(page.value_of("#when").unwrap(), "2026-08-30");
    assert_eq!(page.value_of("#fixed").unwrap(), "2025-12-31");
}

#[test]
fn date_autofill_at_epoch_default_clock() {
    let (page, _enhancer) = enhanced(r#"<form><input type="date" id="when"></form>"#);
    assert_eq!(page.value_of("#when").unwrap(), "1970-01-01");
}
