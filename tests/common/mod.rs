//! Common test utilities.

pub mod connectors;

/// Route `log` output through env_logger; safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Assert that a validation outcome or gate decision carries a violation of the
/// given kind on the given field.
#[macro_export]
macro_rules! assert_violation {
    ($violations:expr, $kind:expr, $field:expr) => {{
        let violations = $violations;
        assert!(
            violations.iter().any(|v| v.kind == $kind && v.field == $field),
            "Expected {:?} on '{}', got {:?}",
            $kind,
            $field,
            violations
        );
    }};
}

/// Assert that a shaped response has the given status pattern.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:pat) => {
        match &$response.status {
            $status => {}
            other => panic!(
                "Expected status {}, got {:?}",
                stringify!($status),
                other
            ),
        }
    };
}
