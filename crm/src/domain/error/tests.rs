//! Error construction and classification.

use super::*;
use rstest::rstest;

#[rstest]
#[case(DomainError::invalid_request("bad email"), ErrorCode::InvalidRequest)]
#[case(DomainError::unauthorized("no session"), ErrorCode::Unauthorized)]
#[case(DomainError::forbidden("not yours"), ErrorCode::Forbidden)]
#[case(DomainError::not_found("client 4 not found"), ErrorCode::NotFound)]
#[case(DomainError::service_unavailable("db down"), ErrorCode::ServiceUnavailable)]
#[case(DomainError::internal("bug"), ErrorCode::InternalError)]
fn helpers_set_the_code(#[case] err: DomainError, #[case] expected: ErrorCode) {
    assert_eq!(err.code(), expected);
    assert_eq!(err.is_system(), expected.is_system());
}

#[rstest]
#[case("")]
#[case("   ")]
fn blank_messages_fall_back_to_the_code_description(#[case] message: &str) {
    let err = DomainError::forbidden(message);
    assert_eq!(err.message(), "access denied");
}

#[rstest]
fn only_infrastructure_codes_are_system_failures() {
    let system: Vec<ErrorCode> = [
        ErrorCode::InvalidRequest,
        ErrorCode::Unauthorized,
        ErrorCode::Forbidden,
        ErrorCode::NotFound,
        ErrorCode::ServiceUnavailable,
        ErrorCode::InternalError,
    ]
    .into_iter()
    .filter(|code| code.is_system())
    .collect();
    assert_eq!(
        system,
        vec![ErrorCode::ServiceUnavailable, ErrorCode::InternalError]
    );
}

#[rstest]
fn display_is_the_bare_message() {
    let err = DomainError::not_found("client 4 not found");
    assert_eq!(err.to_string(), "client 4 not found");
}
