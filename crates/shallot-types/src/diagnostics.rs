//! Response envelopes for diagnostics, acknowledgements and errors.

use serde::{Deserialize, Serialize};

/// `{ "result": ... }` envelope returned by diagnostic getters.
///
/// `result` is `null` until the role has observed a value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultBody<T> {
    pub result: Option<T>,
}

impl<T> ResultBody<T> {
    pub fn new(result: Option<T>) -> Self {
        Self { result }
    }
}

/// `{ "error": ... }` envelope for every failed request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// `{ "message": ... }` acknowledgement returned by the registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckBody {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_is_null() {
        let body: ResultBody<String> = ResultBody::new(None);
        let json = serde_json::to_string(&body).expect("serialize");
        assert_eq!(json, r#"{"result":null}"#);
    }

    #[test]
    fn test_circuit_result() {
        let body = ResultBody::new(Some(vec![1u32, 2, 3]));
        let json = serde_json::to_string(&body).expect("serialize");
        assert_eq!(json, r#"{"result":[1,2,3]}"#);
    }
}
