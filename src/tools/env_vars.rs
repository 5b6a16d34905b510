#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::collections::HashMap;
#[cfg(not(test))]
use std::env;

/// Retrieve the value of an environment variable.
/// Empty values are treated as absent.
///
/// /!\ As this works on the process environment,
/// a function using `retrieve_var_value` could be tricky to test.
/// To do so, wrap your test with `with_env_vars(vars, fn)`.
/// This function is only available in a test context.
pub fn retrieve_var_value(name: &str) -> Option<String> {
    get_env_var(name).filter(|value| !value.trim().is_empty())
}

/// Retrieve a variable value, or the given default when it is absent.
pub fn retrieve_var_value_or(name: &str, default: &str) -> String {
    retrieve_var_value(name).unwrap_or_else(|| default.to_owned())
}

#[cfg(not(test))]
fn get_env_var(name: &str) -> Option<String> {
    env::var(name).ok()
}

#[cfg(test)]
thread_local! {
    /// A mutable map hosting env vars for tests.
    /// When a test is run with `with_env_vars`,
    /// the inner map is set to whatever param is passed.
    /// It is then reset to its previous state.
    static ENV_VARS: RefCell<HashMap<String, String>> = RefCell::new(HashMap::new());
}

#[cfg(test)]
fn get_env_var(name: &str) -> Option<String> {
    ENV_VARS.with(|vars| vars.borrow().get(name).cloned())
}

#[cfg(test)]
/// When running tests, env vars are never read from the process.
/// You can set them up from there by wrapping your test with this function.
pub fn with_env_vars<F, T>(vars: Vec<(&str, &str)>, function: F) -> T
where
    F: FnOnce() -> T,
{
    ENV_VARS.with(|refcell| {
        let vars = vars
            .into_iter()
            .map(|(name, value)| (name.to_owned(), value.to_owned()))
            .collect();
        let old_value = refcell.replace(vars);
        let result = function();
        refcell.replace(old_value);
        result
    })
}
