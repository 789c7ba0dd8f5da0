//! Jinja templates for the two possible check outcomes
//!
//! Both templates are compiled in via `include_str!` rather than read from
//! disk at runtime, so the binary has no dependency on the working
//! directory beyond `static/` (served separately by `tower_http`).

use minijinja::{Environment, context};

const CONFIRMATION_TEMPLATE: &str = include_str!("../templates/confirmation.html.jinja");
const BLOCK_TEMPLATE: &str = include_str!("../templates/block.html.jinja");

/// Build the template environment once at startup
pub fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.add_template("confirmation", CONFIRMATION_TEMPLATE)
        .expect("confirmation template must parse");
    env.add_template("block", BLOCK_TEMPLATE)
        .expect("block template must parse");
    env
}

/// Render the "continue to link" page for a URL that passed every check
pub fn render_confirmation(env: &Environment<'static>, destination: &str) -> String {
    env.get_template("confirmation")
        .expect("confirmation template registered at startup")
        .render(context! { destination })
        .expect("confirmation template render is infallible for a plain string context")
}

/// Render the "blocked" page for a URL flagged by any provider
pub fn render_block(env: &Environment<'static>, destination: &str) -> String {
    env.get_template("block")
        .expect("block template registered at startup")
        .render(context! { destination })
        .expect("block template render is infallible for a plain string context")
}

#[cfg(test)]
mod tests {
    use super::{environment, render_block, render_confirmation};

    #[test]
    fn both_templates_render_with_the_destination_embedded() {
        let env = environment();
        let confirmation = render_confirmation(&env, "https://example.com/path");
        assert!(confirmation.contains("https://example.com/path"));

        let block = render_block(&env, "https://evil.example/path");
        assert!(block.contains("https://evil.example/path"));
    }
}
