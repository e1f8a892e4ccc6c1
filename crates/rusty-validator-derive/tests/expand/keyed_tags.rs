use rusty_validator::{Record, Validate};

#[derive(Validate)]
struct Login {
    #[validate("required", binding = "required,email", json = "login")]
    email: String,

    #[validate(binding = "min=8")]
    password: String,
}

fn main() {
    let login = Login { email: String::new(), password: String::new() };
    let fields = login.descriptor().fields;

    assert_eq!(fields[0].tag("validate"), Some("required"));
    assert_eq!(fields[0].tag("binding"), Some("required,email"));
    assert_eq!(fields[0].tag("json"), Some("login"));
    assert_eq!(fields[1].tag("validate"), None);
}
