//! The optional process-wide registry.

mod common;

use serial_test::serial;
use themeview::ThemeRegistry;

#[test]
#[serial]
fn test_global_is_created_once() {
    let first = ThemeRegistry::global_or_init(common::fixtures(), "tests").unwrap();
    assert_eq!(first.theme(), "tests");

    // Later arguments are ignored.
    let second = ThemeRegistry::global_or_init("/not/a/real/base", "other").unwrap();
    assert!(std::ptr::eq(first, second));
    assert_eq!(second.theme(), "tests");

    let fetched = ThemeRegistry::global().unwrap();
    assert!(std::ptr::eq(first, fetched));
}

#[test]
#[serial]
fn test_global_configuration_is_shared() {
    let registry = ThemeRegistry::global_or_init(common::fixtures(), "tests").unwrap();
    registry.set_data("site", "global");

    let again = ThemeRegistry::global().unwrap();
    assert_eq!(again.get_data("site"), Some(serde_json::json!("global")));
}
