use super::*;

const FILTER_FORM: &str = r#"
<form>
  <select id="date-range-select" name="range">
    <option value="monthly">Mensual</option>
    <option value="custom">Personalizado</option>
  </select>
  <div class="mb-3" id="start-group">
    <label>Desde</label>
    <input type="date" id="start-date" value="2026-01-01">
  </div>
  <div class="mb-3" id="end-group">
    <label>Hasta</label>
    <input type="date" id="end-date" value="2026-01-31">
  </div>
</form>
"#;

#[test]
fn preset_range_hides_custom_fields_on_install() {
    let (page, _enhancer) = enhanced(FILTER_FORM);
    assert_eq!(page.display_of("#start-group").unwrap(), "none");
    assert_eq!(page.display_of("#end-group").unwrap(), "none");
}

#[test]
fn choosing_custom_reveals_both_fields() {
    let (mut page, _enhancer) = enhanced(FILTER_FORM);
    page.select_value("#date-range-select", "custom").unwrap();
    assert_eq!(page.display_of("#start-group").unwrap(), "block");
    assert_eq!(page.display_of("#end-group").unwrap(), "block");

    page.select_value("#date-range-select", "monthly").unwrap();
    assert_eq!(page.display_of("#start-group").unwrap(), "none");
    assert_eq!(page.display_of("#end-group").unwrap(), "none");
}

#[test]
fn custom_preselected_shows_fields_on_install() {
    let html = FILTER_FORM.replace(
        r#"<option value="custom">"#,
        r#"<option value="custom" selected>"#,
    );
    let (page, _enhancer) = enhanced(&html);
    assert_eq!(page.display_of("#start-group").unwrap(), "block");
    assert_eq!(page.display_of("#end-group").unwrap(), "block");
}

#[test]
fn falls_back_to_parent_without_known_container_class() {
    let html = r#"
    <form>
      <select id="date-range-select">
        <option value="monthly">Mensual</option>
        <option value="custom">Personalizado</option>
      </select>
      <div id="start-wrap"><input type="date" id="start-date" value="2026-01-01"></div>
      <div id="end-wrap"><input type="date" id="end-date" value="2026-01-31"></div>
    </form>
    "#;
    let (page, _enhancer) = enhanced(html);
    assert_eq!(page.display_of("#start-wrap").unwrap(), "none");
    assert_eq!(page.display_of("#end-wrap").unwrap(), "none");
}

#[test]
fn nearest_container_wins_over_outer_one() {
    let html = r#"
    <form>
      <select id="date-range-select">
        <option value="monthly">Mensual</option>
        <option value="custom">Personalizado</option>
      </select>
      <div class="col-md-6" id="outer-start">
        <div class="mb-3" id="inner-start"><input type="date" id="start-date" value="2026-01-01"></div>
      </div>
      <div class="mb-3" id="end-group"><input type="date" id="end-date" value="2026-01-31"></div>
    </form>
    "#;
    let (page, _enhancer) = enhanced(html);
    assert_eq!(page.display_of("#inner-start").unwrap(), "none");
    assert_eq!(page.display_of("#outer-start").unwrap(), "");
}

#[test]
fn install_skips_pages_without_the_range_select() {
    let (page, _enhancer) = enhanced("<form><input type=\"text\" name=\"q\"></form>");
    assert!(!page.exists("#date-range-select").unwrap());
}

#[test]
fn teardown_disconnects_the_toggle() {
    let (mut page, enhancer) = enhanced(FILTER_FORM);
    enhancer.teardown(&mut page).unwrap();
    page.select_value("#date-range-select", "custom").unwrap();
    assert_eq!(page.display_of("#start-group").unwrap(), "none");
}
