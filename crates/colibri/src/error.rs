use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ColibriError {
    #[error("expected <stats xmlns='{expected_ns}'/>, found <{name} xmlns='{ns}'/>")]
    UnexpectedElement {
        name: String,
        ns: String,
        expected_ns: &'static str,
    },
}
