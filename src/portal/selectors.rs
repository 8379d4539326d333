//! SII portal URLs and element locators.

use crate::browser::Locator;
use crate::models::{Category, Section};

pub const LOGIN_URL: &str =
    "https://zeusr.sii.cl//AUT2000/InicioAutenticacion/IngresoRutClave.html?https://misiir.sii.cl/cgi_misii/siihome.cgi";

// login form
pub static RUT_INPUT: Locator = Locator::id("rutcntr");
pub static PASSWORD_INPUT: Locator = Locator::id("clave");
pub static LOGIN_BUTTON: Locator = Locator::id("bt_ingresar");
pub static CERTIFICATE_LINK: Locator = Locator::id("mienlace");

// menu traversal
pub static SERVICES_MENU: Locator = Locator::link_text("Servicios online");
pub static INVOICE_MENU: Locator = Locator::link_text("Factura electrónica");
pub static REGISTRY_ACCORDION: Locator = Locator::css("p.accordion_special a[href='1039-3256.html']");
pub static REGISTRY_ENTRY: Locator = Locator::link_text("Ingresar al Registro de Compras y Ventas");

// registry query form
pub static RUT_SELECT: Locator = Locator::css("select[name='rut']");
pub static RUT_OPTIONS: Locator = Locator::css("select[name='rut'] option");
pub static CONSULT_BUTTON: Locator = Locator::css("form[name='formContribuyente'] button[type='submit']");

// detail view
pub static BACK_BUTTON: Locator = Locator::xpath("//button[contains(normalize-space(.),'Volver')]");
pub static MODAL_CLOSE: Locator = Locator::css(".modal.in button.close, .modal.show button.close");

pub const PAGE_SIZE: &str = "100";

pub fn section_tab(section: Section) -> Locator {
    Locator::xpath_owned(format!(
        "//ul[contains(@class,'nav-tabs')]//a[contains(normalize-space(.),'{}')]",
        section.tab_label()
    ))
}

/// Summary link of a category, only the one inside the active tab pane.
pub fn category_link(category: Category) -> Locator {
    Locator::xpath_owned(category_link_xpath(category))
}

/// Count cell next to the category link (pending tab).
pub fn category_count(category: Category) -> Locator {
    Locator::xpath_owned(format!("{}/ancestor::tr[1]/td[2]", category_link_xpath(category)))
}

fn category_link_xpath(category: Category) -> String {
    format!(
        "//div[contains(@class,'tab-pane') and contains(@class,'active')]//a[contains(text(),'{}') and @ui-sref]",
        category.kind.link_text()
    )
}

pub fn page_size_select(table_id: &str) -> Locator {
    Locator::css_owned(format!("select[name='{}_length']", table_id))
}

pub fn table_rows(table_id: &str) -> Locator {
    Locator::css_owned(format!("#{} tbody tr", table_id))
}

pub fn next_page(table_id: &str) -> Locator {
    Locator::css_owned(format!("#{}_next:not(.disabled)", table_id))
}
