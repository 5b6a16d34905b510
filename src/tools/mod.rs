pub mod email;
pub mod env_vars;

use std::fmt::Debug;

pub fn log_error_and_message<E: Debug, T>(message: &str, value_to_return: T) -> impl FnOnce(E) -> T {
    move |e| {
        error!("{message}\n{e:#?}");
        value_to_return
    }
}
