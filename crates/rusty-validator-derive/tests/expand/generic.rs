use rusty_validator::{Validate, Validator};

#[derive(Validate)]
struct Page<T> {
    #[validate("required,dive")]
    items: Vec<T>,

    #[validate("gte=1")]
    number: u32,
}

#[derive(Validate)]
struct Item {
    #[validate("required")]
    sku: String,
}

fn main() {
    let page = Page { items: vec![Item { sku: String::new() }], number: 1 };
    let err = Validator::new().validate(&page).unwrap_err();
    assert_eq!(err.errors().unwrap().len(), 1);
}
