//! Render-once reuse of data-invariant fragments.

mod common;

use common::ThemeDir;
use serde_json::json;
use themeview::ViewOptions;

fn reuse() -> ViewOptions {
    ViewOptions::new().reuse(true)
}

#[test]
fn test_reuse_ignores_new_data() {
    let theme = common::registry("tests");

    let first = theme.render_view("bar", &json!({"foo": "first"}), reuse()).unwrap();
    let second = theme.render_view("bar", &json!({"foo": "second"}), reuse()).unwrap();

    assert_eq!(first, "<p>bar says first</p>");
    assert_eq!(first, second);
}

#[test]
fn test_reuse_does_not_execute_template_again() {
    let themes = ThemeDir::with_default_layout();
    themes.write("site/views/nav.jinja", "nav v1 {{ n }}");
    let theme = themes.registry("site");

    let first = theme.render_view("nav", &json!({"n": 1}), reuse()).unwrap();

    // Any re-execution would pick up the new body.
    themes.write("site/views/nav.jinja", "nav v2 {{ n }}");
    let second = theme.render_view("nav", &json!({"n": 2}), reuse()).unwrap();
    let control = theme
        .render_view("nav", &json!({"n": 3}), ViewOptions::default())
        .unwrap();

    assert_eq!(first, "nav v1 1");
    assert_eq!(second, "nav v1 1");
    assert_eq!(control, "nav v2 3");

    let stats = theme.cache_stats();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[test]
fn test_forgotten_entry_is_rendered_again() {
    let themes = ThemeDir::with_default_layout();
    themes.write("site/views/nav.jinja", "nav v1");
    let theme = themes.registry("site");

    theme.render_view("nav", &(), reuse()).unwrap();
    themes.write("site/views/nav.jinja", "nav v2");

    let path = theme.resolve_view_path("nav", true).unwrap();
    assert!(theme.forget(&path));
    assert_eq!(theme.render_view("nav", &(), reuse()).unwrap(), "nav v2");
}

#[test]
fn test_cached_view_still_needs_its_file() {
    let themes = ThemeDir::with_default_layout();
    themes.write("site/views/nav.jinja", "nav");
    let theme = themes.registry("site");

    theme.render_view("nav", &(), reuse()).unwrap();
    themes.remove("site/views/nav.jinja");

    // Resolution runs before the cache is consulted.
    assert!(theme.render_view("nav", &(), reuse()).unwrap_err().is_not_found());
}

#[test]
fn test_plain_renders_do_not_populate_cache() {
    let theme = common::registry("tests");
    theme
        .render_view("bar", &json!({"foo": 1}), ViewOptions::default())
        .unwrap();
    assert_eq!(theme.cached_len(), 0);
}

#[test]
fn test_cache_keyed_by_resolved_path_not_name() {
    let themes = ThemeDir::with_default_layout();
    themes
        .write("one/views/nav.jinja", "one")
        .write("two/views/nav.jinja", "two");
    let theme = themes.registry("one");

    assert_eq!(theme.render_view("nav", &(), reuse()).unwrap(), "one");
    theme.set_theme("two").unwrap();
    assert_eq!(theme.render_view("nav", &(), reuse()).unwrap(), "two");
    assert_eq!(theme.cached_len(), 2);

    // Same path via the extension-qualified name is the same entry.
    assert_eq!(theme.render_view("nav.jinja", &(), reuse()).unwrap(), "two");
    assert_eq!(theme.cached_len(), 2);
}

#[test]
fn test_shared_fragment_cached_once_across_themes() {
    let themes = ThemeDir::with_default_layout();
    themes.write("default/views/footer.jinja", "footer {{ year }}");
    let theme = themes.registry("one");
    theme.share("views/footer", "default").unwrap();

    let a = theme.render_view("footer", &json!({"year": 2020}), reuse()).unwrap();
    theme.set_theme("two").unwrap();
    let b = theme.render_view("footer", &json!({"year": 2030}), reuse()).unwrap();

    assert_eq!(a, "footer 2020");
    assert_eq!(b, "footer 2020");
    assert_eq!(theme.cached_len(), 1);
}

#[test]
fn test_reuse_from_inside_templates() {
    let themes = ThemeDir::with_default_layout();
    themes
        .write("site/views/page.jinja", "{{ import('nav', {'n': n}, true, true) }}")
        .write("site/views/nav.jinja", "nav {{ n }}");
    let theme = themes.registry("site");

    assert_eq!(theme.render_view("page", &json!({"n": 1}), ViewOptions::default()).unwrap(), "nav 1");
    assert_eq!(theme.render_view("page", &json!({"n": 2}), ViewOptions::default()).unwrap(), "nav 1");
    assert_eq!(theme.cached_len(), 1);
}

#[test]
fn test_cached_empty_output_is_reused() {
    let themes = ThemeDir::with_default_layout();
    themes.write("site/views/blank.jinja", "{% if show %}shown{% endif %}");
    let theme = themes.registry("site");

    assert_eq!(theme.render_view("blank", &(), reuse()).unwrap(), "");
    assert_eq!(
        theme.render_view("blank", &json!({"show": true}), reuse()).unwrap(),
        ""
    );
    assert_eq!(theme.cache_stats().hits, 1);
}
