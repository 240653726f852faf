use super::*;

const CATEGORY_FORM: &str = r##"
<form>
  <div class="mb-3">
    <select name="color" id="color-select">
      <option value="#0d6efd">Azul</option>
      <option value="#dc3545">Rojo</option>
      <option value="#198754">Verde</option>
    </select>
  </div>
</form>
"##;

fn swatch_style(page: &Page) -> String {
    page.attr_of(".color-preview", "style").unwrap().unwrap()
}

#[test]
fn swatch_is_created_next_to_the_select() {
    let (page, _enhancer) = enhanced(CATEGORY_FORM);
    assert_eq!(page.count(".color-preview").unwrap(), 1);
    assert!(page.has_class(".color-preview", "ms-2").unwrap());
    assert!(page.exists(".mb-3 > .color-preview").unwrap());
}

#[test]
fn swatch_is_painted_with_the_initial_value() {
    let (page, _enhancer) = enhanced(CATEGORY_FORM);
    assert!(swatch_style(&page).contains("background-color: #0d6efd;"));
}

#[test]
fn change_repaints_the_swatch() {
    let (mut page, _enhancer) = enhanced(CATEGORY_FORM);
    page.select_value("#color-select", "#dc3545").unwrap();
    assert!(swatch_style(&page).contains("background-color: #dc3545;"));
}

#[test]
fn reinstall_reuses_the_existing_swatch() {
    let (mut page, _enhancer) = enhanced(CATEGORY_FORM);
    let _second = Enhancer::install(&mut page).unwrap();
    assert_eq!(page.count(".color-preview").unwrap(), 1);
}

#[test]
fn modal_show_repaints_a_select_inside_it() {
    let html = r##"
    <div class="modal" id="category-modal">
      <form>
        <select name="color" id="modal-color">
          <option value="#0d6efd">Azul</option>
          <option value="#ffc107">Amarillo</option>
        </select>
      </form>
    </div>
    "##;
    let (mut page, _enhancer) = enhanced(html);

    // A silent value edit leaves the swatch stale until the modal is shown.
    page.type_text("#modal-color", "#ffc107").unwrap();
    assert!(swatch_style(&page).contains("background-color: #0d6efd;"));

    page.show_modal("#category-modal").unwrap();
    assert!(swatch_style(&page).contains("background-color: #ffc107;"));
}

#[test]
fn each_select_gets_its_own_swatch() {
    let html = r##"
    <form>
      <div class="mb-3" id="first">
        <select name="color"><option value="#111111">Uno</option></select>
      </div>
      <div class="mb-3" id="second">
        <select name="color"><option value="#222222">Dos</option></select>
      </div>
    </form>
    "##;
    let (page, _enhancer) = enhanced(html);
    assert_eq!(page.count(".color-preview").unwrap(), 2);
    assert!(page.exists("#first > .color-preview").unwrap());
    assert!(page.exists("#second > .color-preview").unwrap());
}
