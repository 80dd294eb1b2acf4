use serde::{Deserialize, Serialize};

/// The named selectors one storefront automation acts on. Owned by the
/// automation, fixed for the run; defaults address saucedemo.com.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorSet {
    pub username_field: String,
    pub password_field: String,
    pub login_button: String,
    pub inventory_container: String,
    pub inventory_item: String,
    pub item_name: String,
    pub add_to_cart_button: String,
    pub cart_link: String,
    pub cart_item: String,
    pub remove_button: String,
    pub menu_button: String,
    pub logout_link: String,
}

impl Default for SelectorSet {
    fn default() -> Self {
        Self {
            username_field: "#user-name".to_string(),
            password_field: "#password".to_string(),
            login_button: "#login-button".to_string(),
            inventory_container: ".inventory_list".to_string(),
            inventory_item: ".inventory_item".to_string(),
            item_name: ".inventory_item_name".to_string(),
            add_to_cart_button: ".btn_inventory".to_string(),
            cart_link: ".shopping_cart_link".to_string(),
            cart_item: ".cart_item".to_string(),
            remove_button: ".btn_secondary".to_string(),
            menu_button: "#menu_button_container .bm-burger-button".to_string(),
            logout_link: "#logout_sidebar_link".to_string(),
        }
    }
}

impl SelectorSet {
    /// Selector addressing the nth (1-based) product tile on the inventory
    /// view. Per-tile addressing keeps strict resolution meaningful when
    /// many tiles share the base selector.
    pub fn nth_inventory_item(&self, index: usize) -> String {
        format!("{}:nth-of-type({})", self.inventory_item, index)
    }

    pub fn nth_item_name(&self, index: usize) -> String {
        format!("{} {}", self.nth_inventory_item(index), self.item_name)
    }

    pub fn nth_cart_item(&self, index: usize) -> String {
        format!("{}:nth-of-type({})", self.cart_item, index)
    }

    pub fn nth_cart_item_name(&self, index: usize) -> String {
        format!("{} {}", self.nth_cart_item(index), self.item_name)
    }

    pub fn nth_cart_remove(&self, index: usize) -> String {
        format!("{} {}", self.nth_cart_item(index), self.remove_button)
    }
}
