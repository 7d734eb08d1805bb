//! One registry shared by several threads while it is being reconfigured.

mod common;

use std::thread;

use serde_json::json;
use themeview::ViewOptions;

const RENDERS_PER_THREAD: usize = 50;

fn two_themes() -> common::ThemeDir {
    let themes = common::ThemeDir::with_default_layout();
    themes
        .write("a/views/page.jinja", "A[{{ import('partials/item') }}]")
        .write("a/views/partials/item.jinja", "a{{ n }}")
        .write("b/views/page.jinja", "B[{{ import('partials/item') }}]")
        .write("b/views/partials/item.jinja", "b{{ n }}");
    themes
}

fn is_expected_view(output: &str) -> bool {
    let Some(inner) = output
        .strip_prefix("A[")
        .or_else(|| output.strip_prefix("B["))
        .and_then(|rest| rest.strip_suffix(']'))
    else {
        return false;
    };
    let digits = inner.strip_prefix('a').or_else(|| inner.strip_prefix('b'));
    digits.is_some_and(|d| !d.is_empty() && d.chars().all(|c| c.is_ascii_digit()))
}

#[test]
fn test_renders_while_theme_and_data_change() {
    let themes = two_themes();
    let registry = themes.registry("a");
    registry.set_data("n", 0);

    thread::scope(|s| {
        let writer = registry.clone();
        s.spawn(move || {
            for i in 0..RENDERS_PER_THREAD {
                writer.set_theme(if i % 2 == 0 { "b" } else { "a" }).unwrap();
                writer.set_data("n", i);
            }
        });

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let reader = registry.clone();
                s.spawn(move || {
                    for _ in 0..RENDERS_PER_THREAD {
                        let view = reader
                            .render_view("page", &(), ViewOptions::default())
                            .unwrap();
                        assert!(is_expected_view(&view), "unexpected view {:?}", view);

                        let page = reader.render(String::new(), "page", &()).unwrap();
                        let content = page.strip_prefix("<title>default</title>").unwrap();
                        assert!(is_expected_view(content), "unexpected page {:?}", page);
                    }
                })
            })
            .collect();

        for reader in readers {
            reader.join().unwrap();
        }
    });

    assert!(["a", "b"].contains(&registry.theme().as_str()));
}

#[test]
fn test_local_data_is_never_seen_by_other_threads() {
    let themes = two_themes();
    let registry = themes.registry("a");

    thread::scope(|s| {
        for n in 1..=4 {
            let reader = registry.clone();
            s.spawn(move || {
                for _ in 0..RENDERS_PER_THREAD {
                    let view = reader
                        .render_view("partials/item", &json!({ "n": n }), ViewOptions::default())
                        .unwrap();
                    assert_eq!(view, format!("a{}", n));
                }
            });
        }
    });

    assert_eq!(registry.get_data("n"), None);
}
