// Partial validation, cancellation, cycles, caching and configuration

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;

use pretty_assertions::assert_eq;
use rusty_validator::{
    FieldLevel, Reflect, StructLevel, Validate, ValidateError, Validator, ValidatorConfig, Value,
};

fn namespaces(err: &ValidateError) -> Vec<String> {
    err.errors()
        .expect("rule failures")
        .iter()
        .map(|e| e.namespace().to_string())
        .collect()
}

#[derive(Validate)]
struct Address {
    #[validate("required")]
    city: String,

    #[validate("required")]
    zip: String,
}

#[derive(Validate)]
struct Account {
    #[validate("required")]
    name: String,

    #[validate("required,email")]
    email: String,

    address: Address,
}

fn empty_account() -> Account {
    Account {
        name: String::new(),
        email: String::new(),
        address: Address { city: String::new(), zip: String::new() },
    }
}

#[test]
fn test_full_validation_baseline() {
    let err = Validator::new().validate(&empty_account()).unwrap_err();
    assert_eq!(
        namespaces(&err),
        vec!["Account.name", "Account.email", "Account.address.city", "Account.address.zip"]
    );
}

#[test]
fn test_validate_partial_includes_prefixes() {
    let v = Validator::new();
    let err = v.validate_partial(&empty_account(), &["name", "address.city"]).unwrap_err();
    assert_eq!(namespaces(&err), vec!["Account.name", "Account.address.city"]);
}

#[test]
fn test_validate_except() {
    let v = Validator::new();
    let err = v.validate_except(&empty_account(), &["email", "address.zip"]).unwrap_err();
    assert_eq!(namespaces(&err), vec!["Account.name", "Account.address.city"]);
}

#[test]
fn test_validate_filtered() {
    let v = Validator::new();
    let skip = |ns: &str| ns.ends_with(".zip") || ns.ends_with(".email");
    let err = v.validate_filtered(&empty_account(), &skip).unwrap_err();
    assert_eq!(namespaces(&err), vec!["Account.name", "Account.address.city"]);
}

#[test]
fn test_validate_except_whole_record() {
    let v = Validator::new();
    let err = v.validate_except(&empty_account(), &["address"]).unwrap_err();
    assert_eq!(namespaces(&err), vec!["Account.name", "Account.email"]);
}

#[test]
fn test_cancel_before_start() {
    let v = Validator::new();
    let cancel = AtomicBool::new(true);
    assert!(matches!(v.validate_with_cancel(&empty_account(), &cancel), Err(ValidateError::Cancelled)));

    let cancel = AtomicBool::new(false);
    assert!(matches!(v.validate_with_cancel(&empty_account(), &cancel), Err(ValidateError::Failed(_))));
}

#[derive(Validate)]
struct Step {
    #[validate("required")]
    label: String,
}

#[derive(Validate)]
struct Plan {
    first: Step,
    second: Step,
}

#[test]
fn test_cancel_between_records() {
    let cancel = Arc::new(AtomicBool::new(false));
    let mut v = Validator::new();
    let flag = Arc::clone(&cancel);
    v.register_struct_validation::<Step, _>(move |_: &mut StructLevel<'_>, _: &Step| {
        flag.store(true, Ordering::SeqCst);
    });

    let plan = Plan { first: Step { label: "a".into() }, second: Step { label: String::new() } };
    assert!(matches!(v.validate_with_cancel(&plan, &cancel), Err(ValidateError::Cancelled)));
}

struct Link(OnceLock<&'static Node>);

impl Reflect for Link {
    fn reflect(&self) -> Value<'_> {
        Value::Indirect(self.0.get().map(|node| *node as &dyn Reflect))
    }
}

#[derive(Validate)]
struct Node {
    #[validate("required")]
    name: String,

    next: Link,
}

#[test]
fn test_detect_cycles_stops_at_revisited_record() {
    let a: &'static Node = Box::leak(Box::new(Node { name: "a".into(), next: Link(OnceLock::new()) }));
    let b: &'static Node = Box::leak(Box::new(Node { name: String::new(), next: Link(OnceLock::new()) }));
    assert!(a.next.0.set(b).is_ok());
    assert!(b.next.0.set(a).is_ok());

    let config = ValidatorConfig { detect_cycles: true, ..Default::default() };
    let v = Validator::with_config(config);
    let err = v.validate(a).unwrap_err();
    assert_eq!(namespaces(&err), vec!["Node.next.name"]);
}

#[derive(Validate)]
struct Reading {
    #[validate("required")]
    sensor: String,

    #[validate("gte=-40,lte=85")]
    celsius: i32,
}

#[test]
fn test_concurrent_validation_shares_compiled_struct() {
    let v = Arc::new(Validator::new());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let v = Arc::clone(&v);
            thread::spawn(move || {
                let reading = Reading { sensor: format!("s{i}"), celsius: i * 20 };
                let outcome = v.validate(&reading).is_ok();
                (outcome, v.compiled_struct(&reading))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let passed: Vec<bool> = results.iter().map(|(ok, _)| *ok).collect();
    assert_eq!(passed, vec![true, true, true, true, true, false, false, false]);
    assert!(results.windows(2).all(|w| Arc::ptr_eq(&w[0].1, &w[1].1)));
    assert_eq!(v.cached_struct_count(), 1);
}

#[test]
fn test_validation_is_idempotent() {
    let v = Validator::new();
    let first = v.validate(&empty_account()).unwrap_err().into_errors().unwrap();
    let second = v.validate(&empty_account()).unwrap_err().into_errors().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_registration_clears_caches() {
    let mut v = Validator::new();
    let _ = v.validate(&empty_account());
    assert_eq!(v.cached_struct_count(), 2);

    v.register_validation("always", |_: &FieldLevel<'_>| true).unwrap();
    assert_eq!(v.cached_struct_count(), 0);
}

#[test]
fn test_compiled_struct_metadata() {
    let v = Validator::new();
    let compiled = v.compiled_struct(&empty_account());

    assert_eq!(compiled.name(), "Account");
    let names: Vec<&str> = compiled.fields().iter().map(|f| f.name()).collect();
    assert_eq!(names, vec!["name", "email", "address"]);

    let email = compiled.field("email").unwrap();
    let chain: Vec<&str> = email.chain().unwrap().iter().map(|t| t.name()).collect();
    assert_eq!(chain, vec!["required", "email"]);
    assert!(compiled.field("address").unwrap().chain().is_none());
}

#[test]
fn test_config_file_drives_validator() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
tag_name = "binding"
detect_cycles = true

[aliases]
contact = "email|e164"
"#
    )
    .unwrap();

    let config = ValidatorConfig::load(file.path()).unwrap();
    assert_eq!(config.tag_name, "binding");
    assert!(config.detect_cycles);
    assert_eq!(config.pool_capacity, 16);

    #[derive(Validate)]
    struct Lead {
        #[validate(binding = "required,contact")]
        reach: String,
    }

    let v = Validator::with_config(config);
    assert!(v.validate(&Lead { reach: "+14155552671".into() }).is_ok());

    let err = v.validate(&Lead { reach: "nope".into() }).unwrap_err();
    assert_eq!(err.errors().unwrap().as_slice()[0].tag(), "contact");
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = ValidatorConfig::load(dir.path().join("validator.toml")).unwrap();
    assert_eq!(config, ValidatorConfig::default());
}

#[test]
fn test_malformed_config_reports_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "tag_name = [").unwrap();

    let err = ValidatorConfig::load(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse validator config"));
}
