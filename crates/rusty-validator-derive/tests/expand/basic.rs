use rusty_validator::{Record, Validate, Validator};

#[derive(Validate)]
struct Address {
    #[validate("required")]
    city: String,
}

#[derive(Validate)]
struct User {
    #[validate("required")]
    name: String,

    #[validate("gte=0,lte=130")]
    age: u8,

    #[validate("omitempty")]
    nickname: Option<String>,

    address: Address,

    r#type: String,
}

fn main() {
    let user = User {
        name: "Ada".to_string(),
        age: 36,
        nickname: None,
        address: Address { city: "London".to_string() },
        r#type: "admin".to_string(),
    };

    let descriptor = user.descriptor();
    assert_eq!(descriptor.name, "User");
    assert_eq!(descriptor.fields.len(), 5);
    assert!(descriptor.fields[2].indirect);
    assert_eq!(descriptor.fields[4].name, "type");

    assert!(Validator::new().validate(&user).is_ok());
}
