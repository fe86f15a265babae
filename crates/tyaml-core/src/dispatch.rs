//! Fault boundary around [`Marshaler`] hooks.
//!
//! A hook is host code. It can return an error or panic; both come back
//! from [`invoke`] as [`Error::Encode`] with the original message, so the
//! failure stays local to the sub-document the hook was producing. This is
//! the only place the encoder catches unwinding.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{Error, MarshalError, Result};
use crate::host::{Marshaled, Marshaler};

/// Run `hook` exactly once.
pub(crate) fn invoke(hook: &dyn Marshaler, type_name: &str) -> Result<Marshaled> {
    match panic::catch_unwind(AssertUnwindSafe(|| hook.marshal_yaml())) {
        Ok(Ok(marshaled)) => Ok(marshaled),
        Ok(Err(err)) => {
            tracing::warn!(type_name, error = %err, "marshal hook failed");
            Err(Error::Encode(err.message().to_string()))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!(type_name, error = %message, "marshal hook panicked");
            Err(Error::Encode(message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(err) = payload.downcast_ref::<MarshalError>() {
        err.message().to_string()
    } else {
        "marshal hook panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    struct Hook(fn() -> std::result::Result<Marshaled, MarshalError>);

    impl Marshaler for Hook {
        fn marshal_yaml(&self) -> std::result::Result<Marshaled, MarshalError> {
            (self.0)()
        }
    }

    #[test]
    fn test_success_passes_through() {
        let hook = Hook(|| Ok(Marshaled::Value(Value::Int(1))));
        assert_eq!(invoke(&hook, "Hook").unwrap(), Marshaled::Value(Value::Int(1)));
    }

    #[test]
    fn test_error_keeps_message() {
        let hook = Hook(|| Err(MarshalError::new("errFailing")));
        assert_eq!(invoke(&hook, "Hook"), Err(Error::Encode("errFailing".into())));
    }

    #[test]
    fn test_str_panic() {
        let hook = Hook(|| panic!("boom"));
        assert_eq!(invoke(&hook, "Hook"), Err(Error::Encode("boom".into())));
    }

    #[test]
    fn test_formatted_panic() {
        let hook = Hook(|| panic!("bad value {}", 42));
        assert_eq!(invoke(&hook, "Hook"), Err(Error::Encode("bad value 42".into())));
    }

    #[test]
    fn test_marshal_error_payload() {
        let hook = Hook(|| std::panic::panic_any(MarshalError::new("payload")));
        assert_eq!(invoke(&hook, "Hook"), Err(Error::Encode("payload".into())));
    }

    #[test]
    fn test_opaque_payload() {
        let hook = Hook(|| std::panic::panic_any(17u8));
        assert_eq!(
            invoke(&hook, "Hook"),
            Err(Error::Encode("marshal hook panicked".into()))
        );
    }
}
